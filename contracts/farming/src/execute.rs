use cosmwasm_std::{Addr, Coin, Env, Event, MessageInfo, Response, Timestamp};
use farming_common::coins::validate_coins;

use crate::allocation::allocate_rewards;
use crate::bank::FarmingDepsMut;
use crate::error::FarmingError;
use crate::plan::terminate_ended_plans;
use crate::staking::process_queued_coins;
use crate::state::{CONFIG, LAST_EPOCH_TIME};

/// Run one epoch: promote queued coins, allocate rewards, terminate plans that
/// have ended.
pub fn tick(mut deps: FarmingDepsMut, now: Timestamp) -> Result<Vec<Event>, FarmingError> {
    let promoted = process_queued_coins(deps.branch())?;
    let mut events = allocate_rewards(deps.branch(), now)?;
    events.extend(terminate_ended_plans(deps.branch(), now)?);
    LAST_EPOCH_TIME.save(deps.storage, &now)?;

    events.push(
        Event::new("farming_epoch_advanced")
            .add_attribute("time", now.seconds().to_string())
            .add_attribute("promoted_stakings", promoted.to_string()),
    );
    Ok(events)
}

/// Host hook, called once per block. Ticks when a full epoch has passed since
/// the last tick; the first call only starts the clock.
pub fn end_blocker(deps: FarmingDepsMut, env: &Env) -> Result<Response, FarmingError> {
    let now = env.block.time;
    let config = CONFIG.load(deps.storage)?;

    let Some(last) = LAST_EPOCH_TIME.may_load(deps.storage)? else {
        LAST_EPOCH_TIME.save(deps.storage, &now)?;
        return Ok(Response::new().add_attribute("action", "end_blocker"));
    };
    if now < last.plus_seconds(config.epoch_seconds()) {
        return Ok(Response::new().add_attribute("action", "end_blocker"));
    }

    let events = tick(deps, now)?;
    Ok(Response::new()
        .add_attribute("action", "end_blocker")
        .add_events(events))
}

/// Force an epoch tick. Operator only.
pub fn advance_epoch(
    deps: FarmingDepsMut,
    env: &Env,
    info: &MessageInfo,
) -> Result<Response, FarmingError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.operator {
        return Err(FarmingError::Unauthorized {
            reason: "only operator can advance epochs".to_string(),
        });
    }

    let events = tick(deps, env.block.time)?;
    Ok(Response::new()
        .add_attribute("action", "advance_epoch")
        .add_attribute("time", env.block.time.seconds().to_string())
        .add_events(events))
}

/// Update module configuration. Admin only.
pub fn update_config(
    deps: FarmingDepsMut,
    sender: &Addr,
    admin: Option<String>,
    operator: Option<String>,
    private_plan_creation_fee: Option<Vec<Coin>>,
    epoch_days: Option<u32>,
    farming_fee_collector: Option<String>,
) -> Result<Response, FarmingError> {
    let mut config = CONFIG.load(deps.storage)?;

    if *sender != config.admin {
        return Err(FarmingError::Unauthorized {
            reason: "only admin can update config".to_string(),
        });
    }

    if let Some(new_admin) = admin {
        config.admin = deps.api.addr_validate(&new_admin)?;
    }
    if let Some(new_operator) = operator {
        config.operator = deps.api.addr_validate(&new_operator)?;
    }
    if let Some(fee) = private_plan_creation_fee {
        validate_creation_fee(&fee)?;
        config.private_plan_creation_fee = fee;
    }
    if let Some(days) = epoch_days {
        validate_epoch_days(days)?;
        config.epoch_days = days;
    }
    if let Some(collector) = farming_fee_collector {
        config.farming_fee_collector = deps.api.addr_validate(&collector)?;
    }

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_config")
        .add_attribute("epoch_days", config.epoch_days.to_string()))
}

/// An empty fee is allowed; otherwise it must be a valid coin list.
pub fn validate_creation_fee(fee: &[Coin]) -> Result<(), FarmingError> {
    if fee.is_empty() {
        return Ok(());
    }
    validate_coins(fee).map_err(|e| FarmingError::InvalidConfig {
        reason: format!("private plan creation fee: {}", e),
    })
}

pub fn validate_epoch_days(days: u32) -> Result<(), FarmingError> {
    if days == 0 {
        return Err(FarmingError::InvalidConfig {
            reason: "epoch days must be positive".to_string(),
        });
    }
    Ok(())
}
