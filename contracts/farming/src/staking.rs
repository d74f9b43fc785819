use cosmwasm_std::{Addr, Coin, Empty, Event, Order, Response, StdResult, Storage, Uint128};
use farming_common::address::staking_reserve_address;
use farming_common::coins::{add_coins, coins_to_string, validate_coins};

use crate::bank::FarmingDepsMut;
use crate::epoch::{current_epoch, initialize_epoch};
use crate::error::FarmingError;
use crate::harvest::withdraw_rewards;
use crate::historical::{decrease_reference_count, increase_reference_count};
use crate::state::{
    QueuedStaking, Staking, TotalStaking, QUEUED_STAKINGS, QUEUED_STAKINGS_BY_FARMER, STAKINGS,
    STAKINGS_BY_FARMER, TOTAL_STAKINGS,
};

pub fn staking(storage: &dyn Storage, denom: &str, farmer: &Addr) -> StdResult<Option<Staking>> {
    STAKINGS.may_load(storage, (denom, farmer))
}

pub fn queued_staking(storage: &dyn Storage, denom: &str, farmer: &Addr) -> StdResult<Uint128> {
    Ok(QUEUED_STAKINGS
        .may_load(storage, (denom, farmer))?
        .map(|q| q.amount)
        .unwrap_or_default())
}

pub fn total_staking(storage: &dyn Storage, denom: &str) -> StdResult<Uint128> {
    Ok(TOTAL_STAKINGS
        .may_load(storage, denom)?
        .map(|t| t.amount)
        .unwrap_or_default())
}

/// All staked positions of a farmer, by denom.
pub fn stakings_by_farmer(storage: &dyn Storage, farmer: &Addr) -> StdResult<Vec<(String, Staking)>> {
    let denoms = STAKINGS_BY_FARMER
        .prefix(farmer)
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<String>>>()?;
    denoms
        .into_iter()
        .map(|denom| {
            let staking = STAKINGS.load(storage, (denom.as_str(), farmer))?;
            Ok((denom, staking))
        })
        .collect()
}

pub fn queued_coins_by_farmer(storage: &dyn Storage, farmer: &Addr) -> StdResult<Vec<Coin>> {
    let denoms = QUEUED_STAKINGS_BY_FARMER
        .prefix(farmer)
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<String>>>()?;
    denoms
        .into_iter()
        .map(|denom| {
            let queued = QUEUED_STAKINGS.load(storage, (denom.as_str(), farmer))?;
            Ok(Coin::new(queued.amount, denom))
        })
        .collect()
}

pub fn staked_coins_by_farmer(storage: &dyn Storage, farmer: &Addr) -> StdResult<Vec<Coin>> {
    Ok(stakings_by_farmer(storage, farmer)?
        .into_iter()
        .map(|(denom, staking)| Coin::new(staking.amount, denom))
        .collect())
}

fn save_staking(
    storage: &mut dyn Storage,
    denom: &str,
    farmer: &Addr,
    staking: &Staking,
) -> StdResult<()> {
    STAKINGS.save(storage, (denom, farmer), staking)?;
    STAKINGS_BY_FARMER.save(storage, (farmer, denom), &Empty {})
}

fn remove_staking(storage: &mut dyn Storage, denom: &str, farmer: &Addr) {
    STAKINGS.remove(storage, (denom, farmer));
    STAKINGS_BY_FARMER.remove(storage, (farmer, denom));
}

fn save_queued_staking(
    storage: &mut dyn Storage,
    denom: &str,
    farmer: &Addr,
    amount: Uint128,
) -> StdResult<()> {
    if amount.is_zero() {
        QUEUED_STAKINGS.remove(storage, (denom, farmer));
        QUEUED_STAKINGS_BY_FARMER.remove(storage, (farmer, denom));
        return Ok(());
    }
    QUEUED_STAKINGS.save(storage, (denom, farmer), &QueuedStaking { amount })?;
    QUEUED_STAKINGS_BY_FARMER.save(storage, (farmer, denom), &Empty {})
}

fn save_total_staking(storage: &mut dyn Storage, denom: &str, amount: Uint128) -> StdResult<()> {
    if amount.is_zero() {
        TOTAL_STAKINGS.remove(storage, denom);
        return Ok(());
    }
    TOTAL_STAKINGS.save(storage, denom, &TotalStaking { amount })
}

/// Lock coins in the staking reserve. They start earning rewards once the
/// next epoch tick promotes them out of the queue.
pub fn stake(
    deps: FarmingDepsMut,
    farmer: &Addr,
    amount: Vec<Coin>,
) -> Result<Response, FarmingError> {
    validate_coins(&amount).map_err(|e| FarmingError::InvalidCoins {
        reason: e.to_string(),
    })?;

    let reserve = staking_reserve_address(deps.api)?;
    deps.bank.send_coins(farmer, &reserve, &amount)?;

    for coin in &amount {
        let queued = queued_staking(deps.storage, &coin.denom, farmer)?.checked_add(coin.amount)?;
        save_queued_staking(deps.storage, &coin.denom, farmer, queued)?;
    }

    Ok(Response::new()
        .add_attribute("action", "stake")
        .add_attribute("farmer", farmer.to_string())
        .add_event(
            Event::new("farming_stake")
                .add_attribute("farmer", farmer.to_string())
                .add_attribute("staking_coins", coins_to_string(&amount)),
        ))
}

/// Withdraw staked and queued coins. Queued coins are released first.
pub fn unstake(
    mut deps: FarmingDepsMut,
    farmer: &Addr,
    amount: Vec<Coin>,
) -> Result<Response, FarmingError> {
    validate_coins(&amount).map_err(|e| FarmingError::InvalidCoins {
        reason: e.to_string(),
    })?;

    for coin in &amount {
        let staked = staking(deps.storage, &coin.denom, farmer)?
            .map(|s| s.amount)
            .unwrap_or_default();
        let available = staked.checked_add(queued_staking(deps.storage, &coin.denom, farmer)?)?;
        if available < coin.amount {
            return Err(FarmingError::InsufficientFunds {
                denom: coin.denom.clone(),
                available,
                requested: coin.amount,
            });
        }
    }

    let mut harvested = vec![];
    for coin in &amount {
        let denom = coin.denom.as_str();
        if staking(deps.storage, denom, farmer)?.is_some() {
            let payout = withdraw_rewards(deps.branch(), farmer, denom)?;
            harvested = add_coins(&harvested, &payout)?;
        }

        let queued = queued_staking(deps.storage, denom, farmer)?;
        let from_queue = queued.min(coin.amount);
        save_queued_staking(deps.storage, denom, farmer, queued - from_queue)?;

        let from_staking = coin.amount - from_queue;
        if from_staking.is_zero() {
            continue;
        }

        let mut position = STAKINGS.load(deps.storage, (denom, farmer))?;
        position.amount = position.amount.checked_sub(from_staking)?;
        if position.amount.is_zero() {
            remove_staking(deps.storage, denom, farmer);
            decrease_reference_count(deps.storage, denom, position.starting_epoch - 1)?;
        } else {
            save_staking(deps.storage, denom, farmer, &position)?;
        }

        let total = total_staking(deps.storage, denom)?.checked_sub(from_staking)?;
        save_total_staking(deps.storage, denom, total)?;
    }

    let reserve = staking_reserve_address(deps.api)?;
    deps.bank.send_coins(&reserve, farmer, &amount)?;

    Ok(Response::new()
        .add_attribute("action", "unstake")
        .add_attribute("farmer", farmer.to_string())
        .add_event(
            Event::new("farming_unstake")
                .add_attribute("farmer", farmer.to_string())
                .add_attribute("unstaking_coins", coins_to_string(&amount))
                .add_attribute("rewards", coins_to_string(&harvested)),
        ))
}

/// Promote every queued position into a staked one at the denom's current
/// epoch. Existing positions are harvested first so their accrual restarts
/// with the new amount. Returns the number of promoted positions.
pub fn process_queued_coins(mut deps: FarmingDepsMut) -> Result<u64, FarmingError> {
    let queued = QUEUED_STAKINGS
        .range(deps.storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;

    let mut promoted = 0u64;
    for ((denom, farmer), entry) in queued {
        initialize_epoch(deps.storage, &denom)?;

        let existing = staking(deps.storage, &denom, &farmer)?;
        if existing.is_some() {
            withdraw_rewards(deps.branch(), &farmer, &denom)?;
        }

        save_queued_staking(deps.storage, &denom, &farmer, Uint128::zero())?;

        let current = current_epoch(deps.storage, &denom)?;
        let amount = match existing {
            Some(position) => position.amount.checked_add(entry.amount)?,
            None => {
                increase_reference_count(deps.storage, &denom, current - 1)?;
                entry.amount
            }
        };
        save_staking(
            deps.storage,
            &denom,
            &farmer,
            &Staking {
                amount,
                starting_epoch: current,
            },
        )?;

        let total = total_staking(deps.storage, &denom)?.checked_add(entry.amount)?;
        save_total_staking(deps.storage, &denom, total)?;
        promoted += 1;
    }

    Ok(promoted)
}
