use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Coin, DecCoin, Timestamp, Uint128};
use farming_common::types::PlanKind;

use crate::state::{Config, HistoricalRewards, Plan, Staking};

#[cw_serde]
pub struct InstantiateMsg {
    pub operator: String,
    pub private_plan_creation_fee: Vec<Coin>,
    pub epoch_days: u32,
    /// Defaults to the derived fee collector account.
    pub farming_fee_collector: Option<String>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Create a private plan funded from a fresh pool account. Anyone may
    /// create one by paying the private plan creation fee.
    CreatePlan {
        name: String,
        staking_coin_weights: Vec<DecCoin>,
        start_time: Timestamp,
        end_time: Timestamp,
        kind: PlanKind,
    },
    /// Register a plan paid from an existing account. Admin only.
    AddPublicPlan {
        name: String,
        farming_pool_address: String,
        termination_address: String,
        staking_coin_weights: Vec<DecCoin>,
        start_time: Timestamp,
        end_time: Timestamp,
        kind: PlanKind,
    },
    UpdatePlan { plan_id: u64, update: PlanUpdate },
    /// Sweep the plan's pool to its termination address and stop it.
    TerminatePlan { plan_id: u64 },
    /// Lock coins. They earn rewards from the next epoch on.
    Stake { amount: Vec<Coin> },
    Unstake { amount: Vec<Coin> },
    Harvest { staking_coin_denoms: Vec<String> },
    /// Run an epoch tick now. Operator only.
    AdvanceEpoch {},
    /// Admin only.
    UpdateConfig {
        admin: Option<String>,
        operator: Option<String>,
        private_plan_creation_fee: Option<Vec<Coin>>,
        epoch_days: Option<u32>,
        farming_fee_collector: Option<String>,
    },
}

/// Fields of a plan that may change after creation. `None` keeps the value.
#[cw_serde]
#[derive(Default)]
pub struct PlanUpdate {
    pub name: Option<String>,
    /// Public plans only.
    pub farming_pool_address: Option<String>,
    /// Public plans only.
    pub termination_address: Option<String>,
    pub staking_coin_weights: Option<Vec<DecCoin>>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub kind: Option<PlanKind>,
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(Config)]
    Config {},
    #[returns(Plan)]
    Plan { plan_id: u64 },
    #[returns(PlansResponse)]
    Plans {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(Option<Staking>)]
    Staking {
        farmer: String,
        staking_coin_denom: String,
    },
    #[returns(Uint128)]
    QueuedStaking {
        farmer: String,
        staking_coin_denom: String,
    },
    #[returns(Uint128)]
    TotalStaking { staking_coin_denom: String },
    /// Staked and queued coins of a farmer.
    #[returns(StakingsResponse)]
    Stakings { farmer: String },
    /// Truncated rewards of one staked denom, or of all of them.
    #[returns(RewardsResponse)]
    Rewards {
        farmer: String,
        staking_coin_denom: Option<String>,
    },
    #[returns(u64)]
    CurrentEpoch { staking_coin_denom: String },
    #[returns(Vec<HistoricalRewardsEntry>)]
    HistoricalRewards {
        staking_coin_denom: String,
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(Vec<DecCoin>)]
    OutstandingRewards { staking_coin_denom: String },
    #[returns(Option<Timestamp>)]
    LastEpochTime {},
    #[returns(ModuleAccountsResponse)]
    ModuleAccounts {},
}

#[cw_serde]
pub struct PlansResponse {
    pub plans: Vec<Plan>,
}

#[cw_serde]
pub struct StakingsResponse {
    pub staked_coins: Vec<Coin>,
    pub queued_coins: Vec<Coin>,
}

#[cw_serde]
pub struct RewardsResponse {
    pub rewards: Vec<Coin>,
}

#[cw_serde]
pub struct HistoricalRewardsEntry {
    pub epoch: u64,
    pub rewards: HistoricalRewards,
}

#[cw_serde]
pub struct ModuleAccountsResponse {
    pub staking_reserve: Addr,
    pub rewards_reserve: Addr,
    pub farming_fee_collector: Addr,
}
