pub mod analytics;
pub mod catalog;
pub mod claim;
pub mod common;
pub mod spin;

pub use analytics::*;
pub use catalog::*;
pub use claim::*;
pub use common::*;
pub use spin::*;
