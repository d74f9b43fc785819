use std::collections::BTreeSet;

use cosmwasm_std::{
    Addr, Coin, DecCoin, Decimal, Decimal256, Event, Order, Response, StdResult, Storage,
    Timestamp,
};
use farming_common::address::{private_plan_farming_pool_address, reward_pool_address};
use farming_common::coins::{coins_to_string, validate_coins};
use farming_common::types::{PlanKind, PlanType, MAX_NAME_LENGTH};

use crate::bank::FarmingDepsMut;
use crate::error::FarmingError;
use crate::msg::PlanUpdate;
use crate::state::{Plan, CONFIG, NEXT_PLAN_ID, PLANS};

/// Fields shared by both ways of creating a plan.
pub struct PlanParams {
    pub name: String,
    pub staking_coin_weights: Vec<DecCoin>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub kind: PlanKind,
}

pub fn get_plan(storage: &dyn Storage, plan_id: u64) -> Result<Plan, FarmingError> {
    PLANS
        .may_load(storage, plan_id)?
        .ok_or(FarmingError::PlanNotFound { plan_id })
}

pub fn all_plans(storage: &dyn Storage) -> StdResult<Vec<Plan>> {
    PLANS
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, plan)| plan))
        .collect()
}

fn next_plan_id(storage: &dyn Storage) -> StdResult<u64> {
    Ok(NEXT_PLAN_ID.may_load(storage)?.unwrap_or(1))
}

fn save_new_plan(storage: &mut dyn Storage, plan: &Plan) -> StdResult<()> {
    PLANS.save(storage, plan.id, plan)?;
    NEXT_PLAN_ID.save(storage, &(plan.id + 1))
}

fn invalid(reason: impl Into<String>) -> FarmingError {
    FarmingError::InvalidPlan {
        reason: reason.into(),
    }
}

/// Checks a plan on its own, without looking at other plans.
pub fn validate_plan(plan: &Plan) -> Result<(), FarmingError> {
    if plan.name.len() > MAX_NAME_LENGTH {
        return Err(invalid(format!(
            "plan name cannot be longer than {} characters",
            MAX_NAME_LENGTH
        )));
    }
    validate_staking_coin_weights(&plan.staking_coin_weights)?;
    if plan.end_time <= plan.start_time {
        return Err(invalid(format!(
            "end time {} must be greater than start time {}",
            plan.end_time, plan.start_time
        )));
    }
    match &plan.kind {
        PlanKind::FixedAmount { epoch_amount } => validate_coins(epoch_amount)
            .map_err(|e| invalid(format!("invalid epoch amount: {}", e)))?,
        PlanKind::Ratio { epoch_ratio } => {
            if epoch_ratio.is_zero() || *epoch_ratio > Decimal::one() {
                return Err(invalid(format!(
                    "epoch ratio {} must be in (0, 1]",
                    epoch_ratio
                )));
            }
        }
    }
    Ok(())
}

fn validate_staking_coin_weights(weights: &[DecCoin]) -> Result<(), FarmingError> {
    if weights.is_empty() {
        return Err(invalid("staking coin weights must not be empty"));
    }
    let mut seen = BTreeSet::new();
    let mut total = Decimal256::zero();
    for weight in weights {
        if weight.denom.is_empty() {
            return Err(invalid("staking coin denom must not be empty"));
        }
        if weight.amount.is_zero() {
            return Err(invalid(format!(
                "weight of {} must be positive",
                weight.denom
            )));
        }
        if !seen.insert(weight.denom.as_str()) {
            return Err(invalid(format!("duplicate staking coin {}", weight.denom)));
        }
        total = total.checked_add(weight.amount)?;
    }
    if total != Decimal256::one() {
        return Err(invalid(format!(
            "total weight must be 1, got {}",
            total
        )));
    }
    Ok(())
}

/// Checks a plan against every other stored plan: names are unique, and the
/// ratio plans of one farming pool never promise more than its whole balance.
pub fn validate_against_plans(storage: &dyn Storage, plan: &Plan) -> Result<(), FarmingError> {
    let mut ratio_sum = plan.kind.epoch_ratio().unwrap_or_default();
    for other in all_plans(storage)? {
        if other.id == plan.id {
            continue;
        }
        if other.name == plan.name {
            return Err(invalid(format!("plan name '{}' already exists", plan.name)));
        }
        if other.terminated || other.farming_pool_address != plan.farming_pool_address {
            continue;
        }
        if let (Some(_), Some(ratio)) = (plan.kind.epoch_ratio(), other.kind.epoch_ratio()) {
            ratio_sum = ratio_sum.checked_add(ratio)?;
        }
    }
    if ratio_sum > Decimal::one() {
        return Err(invalid(format!(
            "total epoch ratio of farming pool {} must not exceed 1, got {}",
            plan.farming_pool_address, ratio_sum
        )));
    }
    Ok(())
}

fn plan_created_event(plan: &Plan) -> Event {
    Event::new("farming_plan_created")
        .add_attribute("plan_id", plan.id.to_string())
        .add_attribute("plan_name", plan.name.clone())
        .add_attribute("plan_type", plan.plan_type.to_string())
        .add_attribute("plan_kind", plan.kind.name())
        .add_attribute("farming_pool_address", plan.farming_pool_address.to_string())
        .add_attribute("reward_pool_address", plan.reward_pool_address.to_string())
        .add_attribute("termination_address", plan.termination_address.to_string())
        .add_attribute("start_time", plan.start_time.seconds().to_string())
        .add_attribute("end_time", plan.end_time.seconds().to_string())
}

fn build_plan(
    deps: &FarmingDepsMut,
    id: u64,
    plan_type: PlanType,
    farming_pool_address: Addr,
    termination_address: Addr,
    params: PlanParams,
) -> StdResult<Plan> {
    Ok(Plan {
        id,
        reward_pool_address: reward_pool_address(deps.api, id, plan_type, &farming_pool_address)?,
        name: params.name,
        plan_type,
        kind: params.kind,
        farming_pool_address,
        termination_address,
        staking_coin_weights: params.staking_coin_weights,
        start_time: params.start_time,
        end_time: params.end_time,
        terminated: false,
        last_distribution_time: None,
        distributed_coins: vec![],
    })
}

/// Create a private plan. The creator pays the creation fee, funds the derived
/// farming pool afterwards and receives the pool's leftovers on termination.
pub fn create_private_plan(
    deps: FarmingDepsMut,
    creator: &Addr,
    params: PlanParams,
) -> Result<Response, FarmingError> {
    let config = CONFIG.load(deps.storage)?;

    let id = next_plan_id(deps.storage)?;
    let farming_pool = private_plan_farming_pool_address(deps.api, id, &params.name)?;
    let plan = build_plan(
        &deps,
        id,
        PlanType::Private,
        farming_pool,
        creator.clone(),
        params,
    )?;
    validate_plan(&plan)?;
    validate_against_plans(deps.storage, &plan)?;

    let fee = config.private_plan_creation_fee;
    for coin in &fee {
        let balance = deps.bank.balance(creator, &coin.denom)?;
        if balance.amount < coin.amount {
            return Err(FarmingError::InsufficientFunds {
                denom: coin.denom.clone(),
                available: balance.amount,
                requested: coin.amount,
            });
        }
    }
    if !fee.is_empty() {
        deps.bank
            .send_coins(creator, &config.farming_fee_collector, &fee)?;
    }

    save_new_plan(deps.storage, &plan)?;

    Ok(Response::new()
        .add_attribute("action", "create_plan")
        .add_attribute("plan_id", id.to_string())
        .add_attribute("creation_fee", coins_to_string(&fee))
        .add_event(plan_created_event(&plan)))
}

/// Register a plan paid from an existing account. Admin only.
pub fn add_public_plan(
    deps: FarmingDepsMut,
    sender: &Addr,
    farming_pool_address: String,
    termination_address: String,
    params: PlanParams,
) -> Result<Response, FarmingError> {
    let config = CONFIG.load(deps.storage)?;
    if *sender != config.admin {
        return Err(FarmingError::Unauthorized {
            reason: "only admin can add public plans".to_string(),
        });
    }

    let farming_pool = deps.api.addr_validate(&farming_pool_address)?;
    let termination = deps.api.addr_validate(&termination_address)?;

    let id = next_plan_id(deps.storage)?;
    let plan = build_plan(&deps, id, PlanType::Public, farming_pool, termination, params)?;
    validate_plan(&plan)?;
    validate_against_plans(deps.storage, &plan)?;

    save_new_plan(deps.storage, &plan)?;

    Ok(Response::new()
        .add_attribute("action", "add_public_plan")
        .add_attribute("plan_id", id.to_string())
        .add_event(plan_created_event(&plan)))
}

/// Change a live plan. Public plans answer to the admin, private plans to
/// their creator.
pub fn update_plan(
    deps: FarmingDepsMut,
    sender: &Addr,
    plan_id: u64,
    update: PlanUpdate,
) -> Result<Response, FarmingError> {
    let config = CONFIG.load(deps.storage)?;
    let mut plan = get_plan(deps.storage, plan_id)?;

    match plan.plan_type {
        PlanType::Public if *sender != config.admin => {
            return Err(FarmingError::Unauthorized {
                reason: "only admin can update public plans".to_string(),
            })
        }
        PlanType::Private if *sender != plan.termination_address => {
            return Err(FarmingError::Unauthorized {
                reason: "only the creator can update a private plan".to_string(),
            })
        }
        _ => {}
    }
    if plan.terminated {
        return Err(FarmingError::PlanTerminated { plan_id });
    }

    if plan.plan_type == PlanType::Private
        && (update.farming_pool_address.is_some() || update.termination_address.is_some())
    {
        return Err(invalid(
            "farming pool and termination addresses of a private plan are fixed",
        ));
    }

    if let Some(name) = update.name {
        plan.name = name;
    }
    if let Some(pool) = update.farming_pool_address {
        plan.farming_pool_address = deps.api.addr_validate(&pool)?;
        plan.reward_pool_address =
            reward_pool_address(deps.api, plan.id, plan.plan_type, &plan.farming_pool_address)?;
    }
    if let Some(termination) = update.termination_address {
        plan.termination_address = deps.api.addr_validate(&termination)?;
    }
    if let Some(weights) = update.staking_coin_weights {
        plan.staking_coin_weights = weights;
    }
    if let Some(start_time) = update.start_time {
        plan.start_time = start_time;
    }
    if let Some(end_time) = update.end_time {
        plan.end_time = end_time;
    }
    if let Some(kind) = update.kind {
        plan.kind = kind;
    }

    validate_plan(&plan)?;
    validate_against_plans(deps.storage, &plan)?;
    PLANS.save(deps.storage, plan_id, &plan)?;

    Ok(Response::new()
        .add_attribute("action", "update_plan")
        .add_attribute("plan_id", plan_id.to_string())
        .add_event(
            Event::new("farming_plan_updated")
                .add_attribute("plan_id", plan_id.to_string())
                .add_attribute("plan_name", plan.name.clone())
                .add_attribute("plan_kind", plan.kind.name()),
        ))
}

/// Sweep the farming pool to the termination address and mark the plan
/// terminated. Returns `None` when it already was.
pub fn terminate(deps: FarmingDepsMut, plan: &mut Plan) -> Result<Option<Event>, FarmingError> {
    if plan.terminated {
        return Ok(None);
    }

    let mut swept: Vec<Coin> = vec![];
    if plan.farming_pool_address != plan.termination_address {
        swept = deps.bank.all_balances(&plan.farming_pool_address)?;
        if !swept.is_empty() {
            deps.bank.send_coins(
                &plan.farming_pool_address,
                &plan.termination_address,
                &swept,
            )?;
        }
    }

    plan.terminated = true;
    PLANS.save(deps.storage, plan.id, plan)?;

    Ok(Some(
        Event::new("farming_plan_terminated")
            .add_attribute("plan_id", plan.id.to_string())
            .add_attribute("farming_pool_address", plan.farming_pool_address.to_string())
            .add_attribute("termination_address", plan.termination_address.to_string())
            .add_attribute("swept_coins", coins_to_string(&swept)),
    ))
}

/// Terminate a plan on request. Admin or the plan's termination address.
pub fn terminate_plan(
    deps: FarmingDepsMut,
    sender: &Addr,
    plan_id: u64,
) -> Result<Response, FarmingError> {
    let config = CONFIG.load(deps.storage)?;
    let mut plan = get_plan(deps.storage, plan_id)?;
    if *sender != config.admin && *sender != plan.termination_address {
        return Err(FarmingError::Unauthorized {
            reason: "only admin or the termination address can terminate a plan".to_string(),
        });
    }

    let response = Response::new()
        .add_attribute("action", "terminate_plan")
        .add_attribute("plan_id", plan_id.to_string());
    Ok(match terminate(deps, &mut plan)? {
        Some(event) => response.add_event(event),
        None => response.add_attribute("already_terminated", "true"),
    })
}

/// Terminate every live plan whose end time has passed.
pub fn terminate_ended_plans(
    mut deps: FarmingDepsMut,
    now: Timestamp,
) -> Result<Vec<Event>, FarmingError> {
    let mut events = vec![];
    for mut plan in all_plans(deps.storage)? {
        if plan.terminated || plan.end_time > now {
            continue;
        }
        if let Some(event) = terminate(deps.branch(), &mut plan)? {
            events.push(event);
        }
    }
    Ok(events)
}
