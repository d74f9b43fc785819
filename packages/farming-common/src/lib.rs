pub mod address;
pub mod coins;
pub mod types;

pub use address::{derive_account, MODULE_NAME};
pub use types::{PlanKind, PlanType, MAX_NAME_LENGTH};
