use cosmwasm_std::{OverflowError, StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FarmingError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("invalid plan: {reason}")]
    InvalidPlan { reason: String },

    #[error("plan {plan_id} not found")]
    PlanNotFound { plan_id: u64 },

    #[error("plan {plan_id} is terminated")]
    PlanTerminated { plan_id: u64 },

    #[error("invalid coins: {reason}")]
    InvalidCoins { reason: String },

    #[error("insufficient funds: {available}{denom} is smaller than {requested}{denom}")]
    InsufficientFunds {
        denom: String,
        available: Uint128,
        requested: Uint128,
    },

    #[error("no staking found for {farmer} in {denom}")]
    NoStakingFound { farmer: String, denom: String },

    #[error("staking coin denoms must not be empty")]
    EmptyDenoms,

    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },
}
