pub mod allocation;
pub mod bank;
pub mod contract;
pub mod epoch;
pub mod error;
pub mod execute;
pub mod harvest;
pub mod historical;
pub mod msg;
pub mod plan;
pub mod query;
pub mod staking;
pub mod state;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use crate::bank::{BankKeeper, FarmingDeps, FarmingDepsMut};
pub use crate::error::FarmingError;
