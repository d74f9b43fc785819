use cosmwasm_std::{Binary, Env, MessageInfo, Response};
use cw2::set_contract_version;
use farming_common::address::default_fee_collector_address;

use crate::bank::{FarmingDeps, FarmingDepsMut};
use crate::error::FarmingError;
use crate::execute;
use crate::harvest;
use crate::msg::{ExecuteMsg, InstantiateMsg, QueryMsg};
use crate::plan::{self, PlanParams};
use crate::query;
use crate::staking;
use crate::state::{Config, CONFIG, NEXT_PLAN_ID};

const CONTRACT_NAME: &str = "crates.io:farming";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn instantiate(
    deps: FarmingDepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, FarmingError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    execute::validate_epoch_days(msg.epoch_days)?;
    execute::validate_creation_fee(&msg.private_plan_creation_fee)?;

    let farming_fee_collector = match msg.farming_fee_collector {
        Some(addr) => deps.api.addr_validate(&addr)?,
        None => default_fee_collector_address(deps.api)?,
    };

    let config = Config {
        admin: info.sender.clone(),
        operator: deps.api.addr_validate(&msg.operator)?,
        private_plan_creation_fee: msg.private_plan_creation_fee,
        epoch_days: msg.epoch_days,
        farming_fee_collector,
    };
    CONFIG.save(deps.storage, &config)?;
    NEXT_PLAN_ID.save(deps.storage, &1)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("module", "farming")
        .add_attribute("admin", info.sender.to_string())
        .add_attribute("epoch_days", config.epoch_days.to_string()))
}

pub fn execute(
    deps: FarmingDepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, FarmingError> {
    match msg {
        ExecuteMsg::CreatePlan {
            name,
            staking_coin_weights,
            start_time,
            end_time,
            kind,
        } => plan::create_private_plan(
            deps,
            &info.sender,
            PlanParams {
                name,
                staking_coin_weights,
                start_time,
                end_time,
                kind,
            },
        ),
        ExecuteMsg::AddPublicPlan {
            name,
            farming_pool_address,
            termination_address,
            staking_coin_weights,
            start_time,
            end_time,
            kind,
        } => plan::add_public_plan(
            deps,
            &info.sender,
            farming_pool_address,
            termination_address,
            PlanParams {
                name,
                staking_coin_weights,
                start_time,
                end_time,
                kind,
            },
        ),
        ExecuteMsg::UpdatePlan { plan_id, update } => {
            plan::update_plan(deps, &info.sender, plan_id, update)
        }
        ExecuteMsg::TerminatePlan { plan_id } => plan::terminate_plan(deps, &info.sender, plan_id),
        ExecuteMsg::Stake { amount } => staking::stake(deps, &info.sender, amount),
        ExecuteMsg::Unstake { amount } => staking::unstake(deps, &info.sender, amount),
        ExecuteMsg::Harvest {
            staking_coin_denoms,
        } => harvest::harvest(deps, &info.sender, staking_coin_denoms),
        ExecuteMsg::AdvanceEpoch {} => execute::advance_epoch(deps, &env, &info),
        ExecuteMsg::UpdateConfig {
            admin,
            operator,
            private_plan_creation_fee,
            epoch_days,
            farming_fee_collector,
        } => execute::update_config(
            deps,
            &info.sender,
            admin,
            operator,
            private_plan_creation_fee,
            epoch_days,
            farming_fee_collector,
        ),
    }
}

pub fn query(deps: FarmingDeps, _env: Env, msg: QueryMsg) -> Result<Binary, FarmingError> {
    match msg {
        QueryMsg::Config {} => Ok(query::query_config(deps)?),
        QueryMsg::Plan { plan_id } => query::query_plan(deps, plan_id),
        QueryMsg::Plans { start_after, limit } => Ok(query::query_plans(deps, start_after, limit)?),
        QueryMsg::Staking {
            farmer,
            staking_coin_denom,
        } => Ok(query::query_staking(deps, farmer, staking_coin_denom)?),
        QueryMsg::QueuedStaking {
            farmer,
            staking_coin_denom,
        } => Ok(query::query_queued_staking(deps, farmer, staking_coin_denom)?),
        QueryMsg::TotalStaking { staking_coin_denom } => {
            Ok(query::query_total_staking(deps, staking_coin_denom)?)
        }
        QueryMsg::Stakings { farmer } => Ok(query::query_stakings(deps, farmer)?),
        QueryMsg::Rewards {
            farmer,
            staking_coin_denom,
        } => query::query_rewards(deps, farmer, staking_coin_denom),
        QueryMsg::CurrentEpoch { staking_coin_denom } => {
            Ok(query::query_current_epoch(deps, staking_coin_denom)?)
        }
        QueryMsg::HistoricalRewards {
            staking_coin_denom,
            start_after,
            limit,
        } => Ok(query::query_historical_rewards(
            deps,
            staking_coin_denom,
            start_after,
            limit,
        )?),
        QueryMsg::OutstandingRewards { staking_coin_denom } => {
            Ok(query::query_outstanding_rewards(deps, staking_coin_denom)?)
        }
        QueryMsg::LastEpochTime {} => Ok(query::query_last_epoch_time(deps)?),
        QueryMsg::ModuleAccounts {} => Ok(query::query_module_accounts(deps)?),
    }
}

/// Host hook run at the end of every block.
pub fn end_blocker(deps: FarmingDepsMut, env: Env) -> Result<Response, FarmingError> {
    execute::end_blocker(deps, &env)
}
