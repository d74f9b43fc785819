//! Per-denom epoch counters.
//!
//! The counter of a denom names the epoch still open for rewards. Folding an
//! allocation closes it: the record at `current` is written and the counter
//! moves on, so the latest closed record always sits at `current - 1`.

use cosmwasm_std::{StdResult, Storage};

use crate::historical::set_historical_rewards;
use crate::state::{HistoricalRewards, CURRENT_EPOCHS};

/// Current epoch of a denom, `0` when the denom never had staked funds.
pub fn current_epoch(storage: &dyn Storage, denom: &str) -> StdResult<u64> {
    Ok(CURRENT_EPOCHS.may_load(storage, denom)?.unwrap_or_default())
}

/// Create the zero-point record of a denom. Returns `false` when the denom is
/// already tracked.
pub fn initialize_epoch(storage: &mut dyn Storage, denom: &str) -> StdResult<bool> {
    if CURRENT_EPOCHS.has(storage, denom) {
        return Ok(false);
    }
    set_historical_rewards(
        storage,
        denom,
        0,
        &HistoricalRewards {
            cumulative_unit_rewards: vec![],
            reference_count: 1,
        },
    )?;
    CURRENT_EPOCHS.save(storage, denom, &1)?;
    Ok(true)
}

pub fn advance_epoch(storage: &mut dyn Storage, denom: &str) -> StdResult<u64> {
    let next = current_epoch(storage, denom)? + 1;
    CURRENT_EPOCHS.save(storage, denom, &next)?;
    Ok(next)
}
