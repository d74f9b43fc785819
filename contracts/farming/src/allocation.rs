//! Apportioning plan budgets to staking denoms.
//!
//! Each tick computes what every active plan owes for the time elapsed since
//! its last payout, drops the plans of any farming pool that cannot cover all
//! of its plans, splits the rest across staking denoms by weight and folds the
//! per-denom sums into the historical reward ratios.

use std::collections::BTreeMap;

use cosmwasm_std::{Addr, Coin, Decimal256, Event, StdResult, Timestamp};
use farming_common::address::rewards_reserve_address;
use farming_common::coins::{
    add_coins, add_dec_coins, coins_to_dec_coins, coins_to_string, is_all_gte, mul_coins,
    mul_coins_truncate, quo_coins, sub_coins,
};
use farming_common::types::PlanKind;

use crate::bank::{FarmingDeps, FarmingDepsMut};
use crate::epoch::{advance_epoch, current_epoch};
use crate::error::FarmingError;
use crate::historical::{
    add_outstanding_rewards, decrease_reference_count, historical_rewards,
    set_historical_rewards,
};
use crate::plan::all_plans;
use crate::staking::total_staking;
use crate::state::{HistoricalRewards, Plan, CONFIG, PLANS};

/// Budget a plan owes at one tick.
#[derive(Debug, Clone)]
pub struct AllocationInfo {
    pub plan: Plan,
    pub amount: Vec<Coin>,
}

/// Whole epochs a plan owes at `now`. A plan that never paid owes one.
fn elapsed_epochs(plan: &Plan, now: Timestamp, epoch_seconds: u64) -> u64 {
    match plan.last_distribution_time {
        None => 1,
        Some(last) => {
            let from = last.max(plan.start_time).seconds();
            let to = now.min(plan.end_time).seconds();
            to.saturating_sub(from) / epoch_seconds
        }
    }
}

/// Sum of `floor(remaining × ratio)` over `epochs` epochs, each epoch drawing
/// from what the previous ones left. Never exceeds `balances`.
fn ratio_budget(balances: &[Coin], ratio: Decimal256, epochs: u64) -> StdResult<Vec<Coin>> {
    let mut remaining = balances.to_vec();
    let mut total = vec![];
    for _ in 0..epochs {
        let share = mul_coins_truncate(&remaining, ratio)?;
        if share.is_empty() {
            break;
        }
        remaining = sub_coins(&remaining, &share)?;
        total = add_coins(&total, &share)?;
    }
    Ok(total)
}

/// Budgets of every plan active at `now`.
pub fn allocation_infos(
    deps: FarmingDeps,
    now: Timestamp,
) -> Result<Vec<AllocationInfo>, FarmingError> {
    let config = CONFIG.load(deps.storage)?;
    let epoch_seconds = config.epoch_seconds();

    let mut infos = vec![];
    for plan in all_plans(deps.storage)? {
        if !plan.is_active_at(now) {
            continue;
        }
        let epochs = elapsed_epochs(&plan, now, epoch_seconds);
        if epochs == 0 {
            continue;
        }

        let amount = match &plan.kind {
            PlanKind::FixedAmount { epoch_amount } => mul_coins(epoch_amount, epochs)?,
            PlanKind::Ratio { epoch_ratio } => {
                let balances = deps.bank.all_balances(&plan.farming_pool_address)?;
                ratio_budget(&balances, Decimal256::from(*epoch_ratio), epochs)?
            }
        };
        if amount.is_empty() {
            continue;
        }
        infos.push(AllocationInfo { plan, amount });
    }
    Ok(infos)
}

/// Pay every plan whose farming pool can cover all of its plans in full.
/// The rest are skipped this tick and reported with an event.
fn payable_infos(
    deps: FarmingDeps,
    infos: Vec<AllocationInfo>,
    events: &mut Vec<Event>,
) -> Result<Vec<AllocationInfo>, FarmingError> {
    let mut required: BTreeMap<Addr, Vec<Coin>> = BTreeMap::new();
    for info in &infos {
        let pool = required
            .entry(info.plan.farming_pool_address.clone())
            .or_default();
        *pool = add_coins(pool, &info.amount)?;
    }

    let mut short_pools = BTreeMap::new();
    for (pool, amount) in &required {
        let balances = deps.bank.all_balances(pool)?;
        if !is_all_gte(&balances, amount) {
            short_pools.insert(pool.clone(), balances);
        }
    }

    let mut payable = vec![];
    for info in infos {
        match short_pools.get(&info.plan.farming_pool_address) {
            Some(balances) => events.push(
                Event::new("farming_allocation_skipped")
                    .add_attribute("plan_id", info.plan.id.to_string())
                    .add_attribute("reason", "insufficient_balance")
                    .add_attribute(
                        "farming_pool_address",
                        info.plan.farming_pool_address.to_string(),
                    )
                    .add_attribute("amount", coins_to_string(&info.amount))
                    .add_attribute("balances", coins_to_string(balances)),
            ),
            None => payable.push(info),
        }
    }
    Ok(payable)
}

/// Allocate this tick's rewards. Returns one event per paid or skipped plan.
pub fn allocate_rewards(
    mut deps: FarmingDepsMut,
    now: Timestamp,
) -> Result<Vec<Event>, FarmingError> {
    let mut events = vec![];
    let infos = allocation_infos(deps.as_ref(), now)?;
    let infos = payable_infos(deps.as_ref(), infos, &mut events)?;

    let rewards_reserve = rewards_reserve_address(deps.api)?;
    let mut portions: BTreeMap<String, Vec<Coin>> = BTreeMap::new();

    for AllocationInfo { mut plan, amount } in infos {
        let total_weight = plan
            .staking_coin_weights
            .iter()
            .try_fold(Decimal256::zero(), |acc, w| acc.checked_add(w.amount))?;

        let mut distributed: Vec<Coin> = vec![];
        let mut forfeited: Vec<String> = vec![];
        for weight in &plan.staking_coin_weights {
            let staked = total_staking(deps.storage, &weight.denom)?;
            if staked.is_zero() {
                forfeited.push(weight.denom.clone());
                continue;
            }
            let share = weight.amount.checked_div(total_weight).map_err(|e| {
                FarmingError::InvalidPlan {
                    reason: e.to_string(),
                }
            })?;
            let portion = mul_coins_truncate(&amount, share)?;
            if portion.is_empty() {
                continue;
            }
            let acc = portions.entry(weight.denom.clone()).or_default();
            *acc = add_coins(acc, &portion)?;
            distributed = add_coins(&distributed, &portion)?;
        }

        if distributed.is_empty() {
            // Forfeited epochs are not owed later.
            plan.last_distribution_time = Some(now);
            PLANS.save(deps.storage, plan.id, &plan)?;
            events.push(
                Event::new("farming_allocation_skipped")
                    .add_attribute("plan_id", plan.id.to_string())
                    .add_attribute("reason", "no_staking")
                    .add_attribute("forfeited_denoms", forfeited.join(",")),
            );
            continue;
        }

        deps.bank
            .send_coins(&plan.farming_pool_address, &rewards_reserve, &distributed)?;
        plan.distributed_coins = add_coins(&plan.distributed_coins, &distributed)?;
        plan.last_distribution_time = Some(now);
        PLANS.save(deps.storage, plan.id, &plan)?;

        events.push(
            Event::new("farming_rewards_allocated")
                .add_attribute("plan_id", plan.id.to_string())
                .add_attribute("amount", coins_to_string(&distributed))
                .add_attribute("forfeited_denoms", forfeited.join(",")),
        );
    }

    for (denom, portion) in portions {
        fold_rewards(deps.branch(), &denom, &portion)?;
    }

    Ok(events)
}

/// Close the open epoch of `denom` with `portion` spread over its total stake.
fn fold_rewards(deps: FarmingDepsMut, denom: &str, portion: &[Coin]) -> Result<(), FarmingError> {
    let staked = total_staking(deps.storage, denom)?;
    let unit = quo_coins(portion, staked)?;

    let current = current_epoch(deps.storage, denom)?;
    let previous = historical_rewards(deps.storage, denom, current - 1)?;
    let cumulative = add_dec_coins(&previous.cumulative_unit_rewards, &unit)?;
    set_historical_rewards(
        deps.storage,
        denom,
        current,
        &HistoricalRewards {
            cumulative_unit_rewards: cumulative,
            reference_count: 1,
        },
    )?;
    decrease_reference_count(deps.storage, denom, current - 1)?;
    advance_epoch(deps.storage, denom)?;

    add_outstanding_rewards(deps.storage, denom, &coins_to_dec_coins(portion))?;
    Ok(())
}
