use cosmwasm_std::{Addr, Coin, DecCoin, Event, Order, Response, StdResult, Storage};
use farming_common::address::rewards_reserve_address;
use farming_common::coins::{
    add_coins, coins_to_string, mul_dec_coins, sub_dec_coins, truncate_dec_coins,
};

use crate::bank::FarmingDepsMut;
use crate::epoch::current_epoch;
use crate::error::FarmingError;
use crate::historical::{
    decrease_reference_count, historical_rewards, increase_reference_count,
    sub_outstanding_rewards,
};
use crate::state::{STAKINGS, STAKINGS_BY_FARMER};

/// Accrued, unwithdrawn rewards of a staking position, in decimals.
///
/// `(HR[current - 1] - HR[starting_epoch - 1]) × amount`
pub fn rewards(
    storage: &dyn Storage,
    farmer: &Addr,
    denom: &str,
) -> Result<Vec<DecCoin>, FarmingError> {
    let staking = STAKINGS
        .may_load(storage, (denom, farmer))?
        .ok_or_else(|| FarmingError::NoStakingFound {
            farmer: farmer.to_string(),
            denom: denom.to_string(),
        })?;

    let current = current_epoch(storage, denom)?;
    if staking.starting_epoch >= current {
        return Ok(vec![]);
    }

    let ending = historical_rewards(storage, denom, current - 1)?;
    let starting = historical_rewards(storage, denom, staking.starting_epoch - 1)?;
    let unit = sub_dec_coins(
        &ending.cumulative_unit_rewards,
        &starting.cumulative_unit_rewards,
    )?;
    Ok(mul_dec_coins(&unit, staking.amount)?)
}

/// Rewards of every staked denom of a farmer, truncated.
pub fn all_rewards(storage: &dyn Storage, farmer: &Addr) -> Result<Vec<Coin>, FarmingError> {
    let denoms = STAKINGS_BY_FARMER
        .prefix(farmer)
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<String>>>()?;

    let mut total = vec![];
    for denom in denoms {
        let accrued = truncate_dec_coins(&rewards(storage, farmer, &denom)?)?;
        total = add_coins(&total, &accrued)?;
    }
    Ok(total)
}

/// Pay out a position's rewards and restart its accrual at the current epoch.
///
/// The farmer receives the truncated amount while outstanding rewards drop by
/// the full decimal amount; the fractional dust stays in the rewards reserve.
pub fn withdraw_rewards(
    deps: FarmingDepsMut,
    farmer: &Addr,
    denom: &str,
) -> Result<Vec<Coin>, FarmingError> {
    let accrued = rewards(deps.storage, farmer, denom)?;
    let payout = truncate_dec_coins(&accrued)?;

    if !payout.is_empty() {
        let reserve = rewards_reserve_address(deps.api)?;
        deps.bank.send_coins(&reserve, farmer, &payout)?;
    }
    sub_outstanding_rewards(deps.storage, denom, &accrued)?;

    let mut staking = STAKINGS.load(deps.storage, (denom, farmer))?;
    let current = current_epoch(deps.storage, denom)?;
    if staking.starting_epoch != current {
        // Take the new reference before releasing the old one: both may be
        // the same record when nothing was folded in between.
        increase_reference_count(deps.storage, denom, current - 1)?;
        decrease_reference_count(deps.storage, denom, staking.starting_epoch - 1)?;
        staking.starting_epoch = current;
        STAKINGS.save(deps.storage, (denom, farmer), &staking)?;
    }

    Ok(payout)
}

/// Withdraw the rewards of the given staking denoms.
pub fn harvest(
    mut deps: FarmingDepsMut,
    farmer: &Addr,
    denoms: Vec<String>,
) -> Result<Response, FarmingError> {
    if denoms.is_empty() {
        return Err(FarmingError::EmptyDenoms);
    }
    for denom in &denoms {
        if !STAKINGS.has(deps.storage, (denom.as_str(), farmer)) {
            return Err(FarmingError::NoStakingFound {
                farmer: farmer.to_string(),
                denom: denom.clone(),
            });
        }
    }

    let mut response = Response::new()
        .add_attribute("action", "harvest")
        .add_attribute("farmer", farmer.to_string());

    let mut total = vec![];
    for denom in denoms {
        let payout = withdraw_rewards(deps.branch(), farmer, &denom)?;
        if payout.is_empty() {
            continue;
        }
        total = add_coins(&total, &payout)?;
        response = response.add_event(
            Event::new("farming_harvest")
                .add_attribute("farmer", farmer.to_string())
                .add_attribute("staking_coin_denom", denom)
                .add_attribute("rewards", coins_to_string(&payout)),
        );
    }

    Ok(response.add_attribute("rewards", coins_to_string(&total)))
}
