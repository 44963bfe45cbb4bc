pub mod claim_token;
pub mod identity;
pub mod local_date;
pub mod slug;

pub use claim_token::{generate_claim_credentials, short_code};
pub use identity::{IdentityKind, SpinIdentity, UNKNOWN_IDENTITY, hash_identity};
pub use local_date::local_date;
pub use slug::validate_slug;
