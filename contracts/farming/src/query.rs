use cosmwasm_std::{to_json_binary, Binary, Order, StdResult};
use cw_storage_plus::Bound;
use farming_common::address::{rewards_reserve_address, staking_reserve_address};
use farming_common::coins::truncate_dec_coins;

use crate::bank::FarmingDeps;
use crate::epoch::current_epoch;
use crate::error::FarmingError;
use crate::harvest::{all_rewards, rewards};
use crate::historical::outstanding_rewards;
use crate::msg::{
    HistoricalRewardsEntry, ModuleAccountsResponse, PlansResponse, RewardsResponse,
    StakingsResponse,
};
use crate::plan::get_plan;
use crate::staking::{
    queued_coins_by_farmer, queued_staking, staked_coins_by_farmer, staking, total_staking,
};
use crate::state::{CONFIG, HISTORICAL_REWARDS, LAST_EPOCH_TIME, PLANS};

pub fn query_config(deps: FarmingDeps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

pub fn query_plan(deps: FarmingDeps, plan_id: u64) -> Result<Binary, FarmingError> {
    let plan = get_plan(deps.storage, plan_id)?;
    Ok(to_json_binary(&plan)?)
}

pub fn query_plans(
    deps: FarmingDeps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(30).min(100) as usize;
    let start = start_after.map(Bound::exclusive);

    let plans = PLANS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, plan)| plan))
        .collect::<StdResult<Vec<_>>>()?;

    to_json_binary(&PlansResponse { plans })
}

pub fn query_staking(deps: FarmingDeps, farmer: String, denom: String) -> StdResult<Binary> {
    let farmer = deps.api.addr_validate(&farmer)?;
    to_json_binary(&staking(deps.storage, &denom, &farmer)?)
}

pub fn query_queued_staking(deps: FarmingDeps, farmer: String, denom: String) -> StdResult<Binary> {
    let farmer = deps.api.addr_validate(&farmer)?;
    to_json_binary(&queued_staking(deps.storage, &denom, &farmer)?)
}

pub fn query_total_staking(deps: FarmingDeps, denom: String) -> StdResult<Binary> {
    to_json_binary(&total_staking(deps.storage, &denom)?)
}

pub fn query_stakings(deps: FarmingDeps, farmer: String) -> StdResult<Binary> {
    let farmer = deps.api.addr_validate(&farmer)?;
    to_json_binary(&StakingsResponse {
        staked_coins: staked_coins_by_farmer(deps.storage, &farmer)?,
        queued_coins: queued_coins_by_farmer(deps.storage, &farmer)?,
    })
}

pub fn query_rewards(
    deps: FarmingDeps,
    farmer: String,
    denom: Option<String>,
) -> Result<Binary, FarmingError> {
    let farmer = deps.api.addr_validate(&farmer)?;
    let accrued = match denom {
        Some(denom) => truncate_dec_coins(&rewards(deps.storage, &farmer, &denom)?)?,
        None => all_rewards(deps.storage, &farmer)?,
    };
    Ok(to_json_binary(&RewardsResponse { rewards: accrued })?)
}

pub fn query_current_epoch(deps: FarmingDeps, denom: String) -> StdResult<Binary> {
    to_json_binary(&current_epoch(deps.storage, &denom)?)
}

pub fn query_historical_rewards(
    deps: FarmingDeps,
    denom: String,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(30).min(100) as usize;
    let start = start_after.map(Bound::exclusive);

    let entries = HISTORICAL_REWARDS
        .prefix(denom.as_str())
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(epoch, rewards)| HistoricalRewardsEntry { epoch, rewards }))
        .collect::<StdResult<Vec<_>>>()?;

    to_json_binary(&entries)
}

pub fn query_outstanding_rewards(deps: FarmingDeps, denom: String) -> StdResult<Binary> {
    to_json_binary(&outstanding_rewards(deps.storage, &denom)?)
}

pub fn query_last_epoch_time(deps: FarmingDeps) -> StdResult<Binary> {
    to_json_binary(&LAST_EPOCH_TIME.may_load(deps.storage)?)
}

pub fn query_module_accounts(deps: FarmingDeps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&ModuleAccountsResponse {
        staking_reserve: staking_reserve_address(deps.api)?,
        rewards_reserve: rewards_reserve_address(deps.api)?,
        farming_fee_collector: config.farming_fee_collector,
    })
}
