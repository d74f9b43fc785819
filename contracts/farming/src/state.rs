use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, DecCoin, Empty, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};
use farming_common::types::{PlanKind, PlanType};

pub const CONFIG: Item<Config> = Item::new("config");
pub const NEXT_PLAN_ID: Item<u64> = Item::new("next_plan_id");
/// Block time of the most recent epoch tick.
pub const LAST_EPOCH_TIME: Item<Timestamp> = Item::new("last_epoch_time");

pub const PLANS: Map<u64, Plan> = Map::new("plans");

/// (staking denom, farmer) → staked position.
pub const STAKINGS: Map<(&str, &Addr), Staking> = Map::new("stakings");
/// (farmer, staking denom) index over `STAKINGS`.
pub const STAKINGS_BY_FARMER: Map<(&Addr, &str), Empty> = Map::new("stakings_by_farmer");
/// (staking denom, farmer) → coins waiting for the next epoch tick.
pub const QUEUED_STAKINGS: Map<(&str, &Addr), QueuedStaking> = Map::new("queued_stakings");
pub const QUEUED_STAKINGS_BY_FARMER: Map<(&Addr, &str), Empty> =
    Map::new("queued_stakings_by_farmer");
/// Sum of all staked amounts of a denom. Queued coins are not included.
pub const TOTAL_STAKINGS: Map<&str, TotalStaking> = Map::new("total_stakings");

/// (staking denom, epoch) → cumulative reward per unit of stake.
pub const HISTORICAL_REWARDS: Map<(&str, u64), HistoricalRewards> =
    Map::new("historical_rewards");
/// Staking denom → epoch that the next allocation will close.
pub const CURRENT_EPOCHS: Map<&str, u64> = Map::new("current_epochs");
/// Staking denom → allocated rewards not yet withdrawn.
pub const OUTSTANDING_REWARDS: Map<&str, OutstandingRewards> = Map::new("outstanding_rewards");

#[cw_serde]
pub struct Config {
    pub admin: Addr,
    /// Account allowed to force epoch ticks.
    pub operator: Addr,
    /// Fee charged to the creator of a private plan.
    pub private_plan_creation_fee: Vec<Coin>,
    /// Length of an epoch in days.
    pub epoch_days: u32,
    pub farming_fee_collector: Addr,
}

impl Config {
    pub fn epoch_seconds(&self) -> u64 {
        u64::from(self.epoch_days) * 24 * 60 * 60
    }
}

#[cw_serde]
pub struct Plan {
    pub id: u64,
    pub name: String,
    pub plan_type: PlanType,
    pub kind: PlanKind,
    /// Account the rewards are paid from.
    pub farming_pool_address: Addr,
    pub reward_pool_address: Addr,
    /// Account receiving the pool's leftovers on termination.
    pub termination_address: Addr,
    /// Staking denom → share of the plan's rewards. Shares sum to 1.
    pub staking_coin_weights: Vec<DecCoin>,
    pub start_time: Timestamp,
    /// Exclusive.
    pub end_time: Timestamp,
    pub terminated: bool,
    pub last_distribution_time: Option<Timestamp>,
    pub distributed_coins: Vec<Coin>,
}

impl Plan {
    pub fn is_active_at(&self, t: Timestamp) -> bool {
        !self.terminated && self.start_time <= t && t < self.end_time
    }
}

#[cw_serde]
pub struct Staking {
    pub amount: Uint128,
    /// First epoch whose rewards this position earns.
    pub starting_epoch: u64,
}

#[cw_serde]
pub struct QueuedStaking {
    pub amount: Uint128,
}

#[cw_serde]
pub struct TotalStaking {
    pub amount: Uint128,
}

#[cw_serde]
pub struct HistoricalRewards {
    pub cumulative_unit_rewards: Vec<DecCoin>,
    /// Holders: the epoch tracker (latest record) and every staking that
    /// started right after this epoch.
    pub reference_count: u32,
}

#[cw_serde]
pub struct OutstandingRewards {
    pub rewards: Vec<DecCoin>,
}
