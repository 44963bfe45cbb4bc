pub mod analytics_service;
pub mod claim_service;
pub mod prize_selection;
pub mod rate_limiter;
pub mod restaurant_service;
pub mod spin_service;

pub use analytics_service::*;
pub use claim_service::*;
pub use prize_selection::{DEFAULT_MISS_RATIO, select_prize};
pub use rate_limiter::*;
pub use restaurant_service::*;
pub use spin_service::{DrawSource, SpinService, ThreadRngDraw};
