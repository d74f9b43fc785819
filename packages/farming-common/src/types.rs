use std::fmt;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Coin, Decimal};

/// Maximum length of a plan name.
pub const MAX_NAME_LENGTH: usize = 140;

/// Who created a plan: any account (private) or the module admin (public).
#[cw_serde]
#[derive(Copy, Eq)]
pub enum PlanType {
    Private,
    Public,
}

impl PlanType {
    pub fn as_u8(&self) -> u8 {
        match self {
            PlanType::Private => 1,
            PlanType::Public => 2,
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanType::Private => write!(f, "private"),
            PlanType::Public => write!(f, "public"),
        }
    }
}

/// Payout policy of a plan.
#[cw_serde]
pub enum PlanKind {
    /// Emit a fixed amount of coins every epoch.
    FixedAmount { epoch_amount: Vec<Coin> },
    /// Emit a fraction of the farming pool's balance every epoch.
    Ratio { epoch_ratio: Decimal },
}

impl PlanKind {
    pub fn name(&self) -> &'static str {
        match self {
            PlanKind::FixedAmount { .. } => "fixed_amount",
            PlanKind::Ratio { .. } => "ratio",
        }
    }

    pub fn epoch_ratio(&self) -> Option<Decimal> {
        match self {
            PlanKind::Ratio { epoch_ratio } => Some(*epoch_ratio),
            PlanKind::FixedAmount { .. } => None,
        }
    }
}
