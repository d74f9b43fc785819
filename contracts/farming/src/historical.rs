use cosmwasm_std::{DecCoin, StdError, StdResult, Storage};
use farming_common::coins::{add_dec_coins, sub_dec_coins_saturating};

use crate::state::{HistoricalRewards, OutstandingRewards, HISTORICAL_REWARDS, OUTSTANDING_REWARDS};

pub fn historical_rewards(
    storage: &dyn Storage,
    denom: &str,
    epoch: u64,
) -> StdResult<HistoricalRewards> {
    HISTORICAL_REWARDS
        .may_load(storage, (denom, epoch))?
        .ok_or_else(|| {
            StdError::not_found(format!("historical rewards of {} at epoch {}", denom, epoch))
        })
}

pub fn set_historical_rewards(
    storage: &mut dyn Storage,
    denom: &str,
    epoch: u64,
    rewards: &HistoricalRewards,
) -> StdResult<()> {
    HISTORICAL_REWARDS.save(storage, (denom, epoch), rewards)
}

pub fn increase_reference_count(storage: &mut dyn Storage, denom: &str, epoch: u64) -> StdResult<()> {
    let mut rewards = historical_rewards(storage, denom, epoch)?;
    rewards.reference_count = rewards
        .reference_count
        .checked_add(1)
        .ok_or_else(|| StdError::generic_err("reference count overflow"))?;
    set_historical_rewards(storage, denom, epoch, &rewards)
}

/// Release one holder of a record, deleting it once nobody holds it.
pub fn decrease_reference_count(storage: &mut dyn Storage, denom: &str, epoch: u64) -> StdResult<()> {
    let mut rewards = historical_rewards(storage, denom, epoch)?;
    if rewards.reference_count == 0 {
        return Err(StdError::generic_err(format!(
            "reference count of {} at epoch {} is already zero",
            denom, epoch
        )));
    }
    rewards.reference_count -= 1;
    if rewards.reference_count == 0 {
        HISTORICAL_REWARDS.remove(storage, (denom, epoch));
        Ok(())
    } else {
        set_historical_rewards(storage, denom, epoch, &rewards)
    }
}

pub fn outstanding_rewards(storage: &dyn Storage, denom: &str) -> StdResult<Vec<DecCoin>> {
    Ok(OUTSTANDING_REWARDS
        .may_load(storage, denom)?
        .map(|o| o.rewards)
        .unwrap_or_default())
}

pub fn add_outstanding_rewards(
    storage: &mut dyn Storage,
    denom: &str,
    rewards: &[DecCoin],
) -> StdResult<()> {
    let total = add_dec_coins(&outstanding_rewards(storage, denom)?, rewards)?;
    save_outstanding(storage, denom, total)
}

/// Subtract withdrawn rewards, clamping each denom at zero.
pub fn sub_outstanding_rewards(
    storage: &mut dyn Storage,
    denom: &str,
    rewards: &[DecCoin],
) -> StdResult<()> {
    let left = sub_dec_coins_saturating(&outstanding_rewards(storage, denom)?, rewards);
    save_outstanding(storage, denom, left)
}

fn save_outstanding(storage: &mut dyn Storage, denom: &str, rewards: Vec<DecCoin>) -> StdResult<()> {
    if rewards.is_empty() {
        OUTSTANDING_REWARDS.remove(storage, denom);
        Ok(())
    } else {
        OUTSTANDING_REWARDS.save(storage, denom, &OutstandingRewards { rewards })
    }
}
