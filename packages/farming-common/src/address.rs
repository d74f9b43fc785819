use cosmwasm_std::{Addr, Api, CanonicalAddr, StdResult};
use sha2::{Digest, Sha256};

use crate::types::PlanType;

/// Module name every farming account is derived under.
pub const MODULE_NAME: &str = "farming";

/// Seed of the account that custodies staked coins.
pub const STAKING_RESERVE_ACC: &str = "StakingReserveAcc";
/// Seed of the account that custodies allocated-but-unharvested rewards.
pub const REWARDS_RESERVE_ACC: &str = "RewardsReserveAcc";
/// Seed of the default private plan creation fee collector.
pub const FARMING_FEE_COLLECTOR_ACC: &str = "FarmingFeeCollectorAcc";

const REWARD_POOL_ACC_PREFIX: &str = "RewardPoolAcc";
const PRIVATE_PLAN_ACC_PREFIX: &str = "PrivatePlan";

/// Raw 32-byte account derived for a module and seed.
///
/// `account = sha256( sha256("module") || module || 0x00 || seed )`
///
/// The zero byte separates the module name from the seed so that
/// `("ab", "c")` and `("a", "bc")` never collide.
pub fn derive_account_bytes(module: &str, seed: &[u8]) -> [u8; 32] {
    let type_hash = Sha256::digest(b"module");

    let mut hasher = Sha256::new();
    hasher.update(type_hash);
    hasher.update(module.as_bytes());
    hasher.update([0x00]);
    hasher.update(seed);
    hasher.finalize().into()
}

/// Derive a module account and humanize it with the host's address codec.
pub fn derive_account(api: &dyn Api, module: &str, seed: &[u8]) -> StdResult<Addr> {
    let canonical = CanonicalAddr::from(derive_account_bytes(module, seed).as_slice());
    api.addr_humanize(&canonical)
}

/// Unique key of a plan: `{id}/{plan_type}/{farming_pool_address}`.
pub fn plan_unique_key(plan_id: u64, plan_type: PlanType, farming_pool: &Addr) -> String {
    format!("{}/{}/{}", plan_id, plan_type.as_u8(), farming_pool)
}

/// Reward pool account of a plan, derived from the plan's unique key.
pub fn reward_pool_address(
    api: &dyn Api,
    plan_id: u64,
    plan_type: PlanType,
    farming_pool: &Addr,
) -> StdResult<Addr> {
    let seed = format!(
        "{}/{}",
        REWARD_POOL_ACC_PREFIX,
        plan_unique_key(plan_id, plan_type, farming_pool)
    );
    derive_account(api, MODULE_NAME, seed.as_bytes())
}

/// Farming pool account of a private plan: `PrivatePlan|{id}|{name}`.
pub fn private_plan_farming_pool_address(
    api: &dyn Api,
    plan_id: u64,
    name: &str,
) -> StdResult<Addr> {
    let seed = format!("{}|{}|{}", PRIVATE_PLAN_ACC_PREFIX, plan_id, name);
    derive_account(api, MODULE_NAME, seed.as_bytes())
}

pub fn staking_reserve_address(api: &dyn Api) -> StdResult<Addr> {
    derive_account(api, MODULE_NAME, STAKING_RESERVE_ACC.as_bytes())
}

pub fn rewards_reserve_address(api: &dyn Api) -> StdResult<Addr> {
    derive_account(api, MODULE_NAME, REWARDS_RESERVE_ACC.as_bytes())
}

pub fn default_fee_collector_address(api: &dyn Api) -> StdResult<Addr> {
    derive_account(api, MODULE_NAME, FARMING_FEE_COLLECTOR_ACC.as_bytes())
}
