//! Integration tests for the farming engine.
//!
//! These tests drive the `instantiate` / `execute` / `query` / `end_blocker`
//! entry points of the `farming` crate over mock storage, the mock address
//! codec and the in-memory bank from its `testing` feature.
//!
//! Run:
//! ```bash
//! cargo test -p farming-integration-tests
//! ```

use std::str::FromStr;

use cosmwasm_std::testing::{message_info, mock_env};
use cosmwasm_std::{
    coin, from_json, Addr, Coin, DecCoin, Decimal, Decimal256, Env, Event, Order, Response,
    Timestamp, Uint128,
};
use farming::contract::{end_blocker, execute, instantiate, query};
use farming::msg::{
    ExecuteMsg, HistoricalRewardsEntry, InstantiateMsg, ModuleAccountsResponse, QueryMsg,
    RewardsResponse, StakingsResponse,
};
use farming::state::{Plan, NEXT_PLAN_ID, PLANS, STAKINGS, TOTAL_STAKINGS};
use farming::testing::{mock_farming_deps, MockFarmingDeps};
use farming::FarmingError;
use farming_common::address::{private_plan_farming_pool_address, reward_pool_address};
use farming_common::coins::truncate_dec_coins;
use farming_common::types::{PlanKind, PlanType};
use serde_json::json;

// ─── Constants ───

const DAY: u64 = 86_400;
/// 2021-07-26T23:59:59Z
const BEFORE_START: u64 = 1_627_343_999;
/// 2021-07-27T00:00:00Z
const START: u64 = 1_627_344_000;
/// 2021-07-28T00:00:00Z
const END_OF_FIRST_DAY: u64 = 1_627_430_400;

// ─── Helpers ───

struct Suite {
    deps: MockFarmingDeps,
    admin: Addr,
    operator: Addr,
}

impl Suite {
    fn new() -> Self {
        let mut deps = mock_farming_deps();
        let admin = deps.api.addr_make("admin");
        let operator = deps.api.addr_make("operator");

        let msg = InstantiateMsg {
            operator: operator.to_string(),
            private_plan_creation_fee: vec![coin(100_000_000, "stake")],
            epoch_days: 1,
            farming_fee_collector: None,
        };
        instantiate(deps.as_mut(), mock_env(), message_info(&admin, &[]), msg).unwrap();

        Suite {
            deps,
            admin,
            operator,
        }
    }

    fn addr(&self, name: &str) -> Addr {
        self.deps.api.addr_make(name)
    }

    fn fund(&mut self, address: &Addr, coins: &[Coin]) {
        self.deps.bank.fund(address, coins);
    }

    fn balance(&self, address: &Addr, denom: &str) -> Uint128 {
        self.deps.bank.amount_of(address, denom)
    }

    fn exec(&mut self, sender: &Addr, msg: ExecuteMsg) -> Result<Response, FarmingError> {
        execute(self.deps.as_mut(), mock_env(), message_info(sender, &[]), msg)
    }

    fn add_public_plan(
        &mut self,
        name: &str,
        pool: &Addr,
        weights: Vec<DecCoin>,
        start: u64,
        end: u64,
        kind: PlanKind,
    ) -> Result<Response, FarmingError> {
        let admin = self.admin.clone();
        self.exec(
            &admin,
            ExecuteMsg::AddPublicPlan {
                name: name.to_string(),
                farming_pool_address: pool.to_string(),
                termination_address: pool.to_string(),
                staking_coin_weights: weights,
                start_time: Timestamp::from_seconds(start),
                end_time: Timestamp::from_seconds(end),
                kind,
            },
        )
    }

    fn stake(&mut self, farmer: &Addr, amount: Vec<Coin>) {
        self.fund(farmer, &amount);
        self.exec(farmer, ExecuteMsg::Stake { amount }).unwrap();
    }

    fn unstake(&mut self, farmer: &Addr, amount: Vec<Coin>) -> Result<Response, FarmingError> {
        self.exec(farmer, ExecuteMsg::Unstake { amount })
    }

    fn harvest(&mut self, farmer: &Addr, denoms: &[&str]) -> Response {
        self.exec(
            farmer,
            ExecuteMsg::Harvest {
                staking_coin_denoms: denoms.iter().map(|d| d.to_string()).collect(),
            },
        )
        .unwrap()
    }

    /// Operator-forced epoch tick at `seconds`.
    fn tick(&mut self, seconds: u64) -> Response {
        execute(
            self.deps.as_mut(),
            env_at(seconds),
            message_info(&self.operator, &[]),
            ExecuteMsg::AdvanceEpoch {},
        )
        .unwrap()
    }

    fn rewards(&self, farmer: &Addr) -> Vec<Coin> {
        let res: RewardsResponse = from_json(
            query(
                self.deps.as_ref(),
                mock_env(),
                QueryMsg::Rewards {
                    farmer: farmer.to_string(),
                    staking_coin_denom: None,
                },
            )
            .unwrap(),
        )
        .unwrap();
        res.rewards
    }

    fn outstanding(&self, denom: &str) -> Vec<DecCoin> {
        from_json(
            query(
                self.deps.as_ref(),
                mock_env(),
                QueryMsg::OutstandingRewards {
                    staking_coin_denom: denom.to_string(),
                },
            )
            .unwrap(),
        )
        .unwrap()
    }

    fn historical_epochs(&self, denom: &str) -> Vec<HistoricalRewardsEntry> {
        from_json(
            query(
                self.deps.as_ref(),
                mock_env(),
                QueryMsg::HistoricalRewards {
                    staking_coin_denom: denom.to_string(),
                    start_after: None,
                    limit: None,
                },
            )
            .unwrap(),
        )
        .unwrap()
    }

    fn total_staking(&self, denom: &str) -> Uint128 {
        from_json(
            query(
                self.deps.as_ref(),
                mock_env(),
                QueryMsg::TotalStaking {
                    staking_coin_denom: denom.to_string(),
                },
            )
            .unwrap(),
        )
        .unwrap()
    }

    fn stakings(&self, farmer: &Addr) -> StakingsResponse {
        from_json(
            query(
                self.deps.as_ref(),
                mock_env(),
                QueryMsg::Stakings {
                    farmer: farmer.to_string(),
                },
            )
            .unwrap(),
        )
        .unwrap()
    }

    fn plan(&self, plan_id: u64) -> Plan {
        from_json(
            query(self.deps.as_ref(), mock_env(), QueryMsg::Plan { plan_id }).unwrap(),
        )
        .unwrap()
    }

    fn module_accounts(&self) -> ModuleAccountsResponse {
        from_json(query(self.deps.as_ref(), mock_env(), QueryMsg::ModuleAccounts {}).unwrap())
            .unwrap()
    }

    /// `TotalStaking` of every denom equals the sum of its stakings.
    fn assert_total_staking_consistent(&self) {
        let mut sums: std::collections::BTreeMap<String, Uint128> = Default::default();
        for item in STAKINGS.range(&self.deps.storage, None, None, Order::Ascending) {
            let ((denom, _), staking) = item.unwrap();
            assert!(!staking.amount.is_zero());
            *sums.entry(denom).or_default() += staking.amount;
        }
        let totals: std::collections::BTreeMap<String, Uint128> = TOTAL_STAKINGS
            .range(&self.deps.storage, None, None, Order::Ascending)
            .map(|item| item.map(|(denom, total)| (denom, total.amount)))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(sums, totals);
    }
}

fn env_at(seconds: u64) -> Env {
    let mut env = mock_env();
    env.block.time = Timestamp::from_seconds(seconds);
    env
}

fn dec(s: &str) -> Decimal256 {
    Decimal256::from_str(s).unwrap()
}

fn weight(denom: &str, w: &str) -> DecCoin {
    DecCoin::new(dec(w), denom)
}

fn fixed(amount: u128, denom: &str) -> PlanKind {
    PlanKind::FixedAmount {
        epoch_amount: vec![coin(amount, denom)],
    }
}

fn ratio(percent: u64) -> PlanKind {
    PlanKind::Ratio {
        epoch_ratio: Decimal::percent(percent),
    }
}

fn events_of<'a>(res: &'a Response, ty: &str) -> Vec<&'a Event> {
    res.events.iter().filter(|e| e.ty == ty).collect()
}

fn attr<'a>(event: &'a Event, key: &str) -> &'a str {
    event
        .attributes
        .iter()
        .find(|a| a.key == key)
        .map(|a| a.value.as_str())
        .unwrap_or_default()
}

// ─── Allocation scenarios ───

#[test]
fn test_plan_pays_nothing_before_start_and_one_epoch_at_start() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    let farmer = suite.addr("farmer");
    suite.fund(&pool, &[coin(10_000_000, "denom3")]);

    suite
        .add_public_plan(
            "scenario-a",
            &pool,
            vec![weight("denom1", "1")],
            START,
            END_OF_FIRST_DAY,
            fixed(1_000_000, "denom3"),
        )
        .unwrap();
    suite.stake(&farmer, vec![coin(1_000_000, "denom1")]);

    // One second before the plan starts: stake is promoted, nothing is paid.
    let res = suite.tick(BEFORE_START);
    assert!(events_of(&res, "farming_rewards_allocated").is_empty());
    assert_eq!(suite.total_staking("denom1"), Uint128::new(1_000_000));
    assert!(suite.rewards(&farmer).is_empty());

    let res = suite.tick(START);
    let allocated = events_of(&res, "farming_rewards_allocated");
    assert_eq!(allocated.len(), 1);
    assert_eq!(attr(allocated[0], "amount"), "1000000denom3");
    assert_eq!(suite.rewards(&farmer), vec![coin(1_000_000, "denom3")]);

    let plan = suite.plan(1);
    assert_eq!(plan.distributed_coins, vec![coin(1_000_000, "denom3")]);
    assert_eq!(plan.last_distribution_time, Some(Timestamp::from_seconds(START)));

    // At the end time the plan is over and gets terminated.
    let res = suite.tick(END_OF_FIRST_DAY);
    assert!(events_of(&res, "farming_rewards_allocated").is_empty());
    assert_eq!(events_of(&res, "farming_plan_terminated").len(), 1);
    assert!(suite.plan(1).terminated);
    assert_eq!(suite.rewards(&farmer), vec![coin(1_000_000, "denom3")]);
}

#[test]
fn test_two_fixed_plans_drain_shared_pool_exactly() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    let farmer = suite.addr("farmer");
    suite.fund(&pool, &[coin(1_000_000, "denom3")]);

    let weights = vec![weight("denom1", "0.5"), weight("denom2", "0.5")];
    for (name, amount) in [("plan-a", 600_000), ("plan-b", 400_000)] {
        suite
            .add_public_plan(
                name,
                &pool,
                weights.clone(),
                START,
                START + 10 * DAY,
                fixed(amount, "denom3"),
            )
            .unwrap();
    }
    suite.stake(
        &farmer,
        vec![coin(1_000_000, "denom1"), coin(1_000_000, "denom2")],
    );

    suite.tick(START);
    assert_eq!(suite.rewards(&farmer), vec![coin(1_000_000, "denom3")]);
    assert!(suite.balance(&pool, "denom3").is_zero());

    // The drained pool cannot pay the next epoch; both plans are skipped.
    let res = suite.tick(START + DAY);
    assert_eq!(events_of(&res, "farming_allocation_skipped").len(), 2);
    assert_eq!(suite.rewards(&farmer), vec![coin(1_000_000, "denom3")]);

    suite.harvest(&farmer, &["denom1", "denom2"]);
    assert_eq!(suite.balance(&farmer, "denom3"), Uint128::new(1_000_000));
}

#[test]
fn test_two_ratio_plans_drain_shared_pool_exactly() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    let farmer = suite.addr("farmer");
    suite.fund(&pool, &[coin(1_000_000, "denom3")]);

    let weights = vec![weight("denom1", "0.5"), weight("denom2", "0.5")];
    for name in ["ratio-a", "ratio-b"] {
        suite
            .add_public_plan(name, &pool, weights.clone(), START, START + 10 * DAY, ratio(50))
            .unwrap();
    }
    suite.stake(
        &farmer,
        vec![coin(1_000_000, "denom1"), coin(1_000_000, "denom2")],
    );

    suite.tick(START);
    suite.tick(START + DAY);
    assert_eq!(suite.rewards(&farmer), vec![coin(1_000_000, "denom3")]);
    assert!(suite.balance(&pool, "denom3").is_zero());
}

#[test]
fn test_ratio_plan_pays_share_of_every_pool_coin() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    let farmer = suite.addr("farmer");
    suite.fund(&pool, &[coin(1_000, "denom3"), coin(3, "denom4")]);

    suite
        .add_public_plan(
            "ratio",
            &pool,
            vec![weight("denom1", "1")],
            START,
            START + 10 * DAY,
            ratio(10),
        )
        .unwrap();
    suite.stake(&farmer, vec![coin(1_000, "denom1")]);

    suite.tick(START);
    // 10% of 3 truncates to nothing.
    assert_eq!(suite.rewards(&farmer), vec![coin(100, "denom3")]);
    assert_eq!(suite.balance(&pool, "denom3"), Uint128::new(900));
    assert_eq!(suite.balance(&pool, "denom4"), Uint128::new(3));
}

#[test]
fn test_underfunded_pool_skips_all_of_its_plans() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    let farmer = suite.addr("farmer");
    suite.fund(&pool, &[coin(1_000_000, "denom3")]);

    for (name, amount) in [("plan-a", 700_000), ("plan-b", 400_000)] {
        suite
            .add_public_plan(
                name,
                &pool,
                vec![weight("denom1", "1")],
                START,
                START + 10 * DAY,
                fixed(amount, "denom3"),
            )
            .unwrap();
    }
    suite.stake(&farmer, vec![coin(1_000_000, "denom1")]);

    let res = suite.tick(START);
    let skipped = events_of(&res, "farming_allocation_skipped");
    assert_eq!(skipped.len(), 2);
    assert!(skipped
        .iter()
        .all(|e| attr(e, "reason") == "insufficient_balance"));
    assert!(suite.rewards(&farmer).is_empty());
    assert_eq!(suite.balance(&pool, "denom3"), Uint128::new(1_000_000));
    assert!(suite.plan(1).last_distribution_time.is_none());
}

#[test]
fn test_overcommitted_ratio_plans_are_skipped() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    let farmer = suite.addr("farmer");
    suite.fund(&pool, &[coin(1_000_000, "denom3")]);

    suite
        .add_public_plan(
            "ratio-a",
            &pool,
            vec![weight("denom1", "1")],
            START,
            START + 10 * DAY,
            ratio(80),
        )
        .unwrap();

    // A second ratio plan on the same pool would promise 130%.
    let err = suite
        .add_public_plan(
            "ratio-b",
            &pool,
            vec![weight("denom1", "1")],
            START,
            START + 10 * DAY,
            ratio(50),
        )
        .unwrap_err();
    assert!(matches!(err, FarmingError::InvalidPlan { .. }));

    // Store it anyway, as if it predated the check.
    let id = NEXT_PLAN_ID.load(&suite.deps.storage).unwrap();
    let overcommitted = Plan {
        id,
        name: "ratio-b".to_string(),
        plan_type: PlanType::Public,
        kind: ratio(50),
        farming_pool_address: pool.clone(),
        reward_pool_address: reward_pool_address(&suite.deps.api, id, PlanType::Public, &pool)
            .unwrap(),
        termination_address: pool.clone(),
        staking_coin_weights: vec![weight("denom1", "1")],
        start_time: Timestamp::from_seconds(START),
        end_time: Timestamp::from_seconds(START + 10 * DAY),
        terminated: false,
        last_distribution_time: None,
        distributed_coins: vec![],
    };
    PLANS.save(&mut suite.deps.storage, id, &overcommitted).unwrap();

    suite.stake(&farmer, vec![coin(1_000_000, "denom1")]);
    let res = suite.tick(START);
    assert_eq!(events_of(&res, "farming_allocation_skipped").len(), 2);
    assert!(suite.rewards(&farmer).is_empty());
    assert_eq!(suite.balance(&pool, "denom3"), Uint128::new(1_000_000));
}

#[test]
fn test_rewards_for_unstaked_denom_are_forfeited() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    let farmer = suite.addr("farmer");
    suite.fund(&pool, &[coin(10_000, "denom3")]);

    suite
        .add_public_plan(
            "half-forfeit",
            &pool,
            vec![weight("denom1", "0.5"), weight("denom2", "0.5")],
            START,
            START + 10 * DAY,
            fixed(1_000, "denom3"),
        )
        .unwrap();
    suite.stake(&farmer, vec![coin(1_000_000, "denom1")]);

    let res = suite.tick(START);
    let allocated = events_of(&res, "farming_rewards_allocated");
    assert_eq!(attr(allocated[0], "amount"), "500denom3");
    assert_eq!(attr(allocated[0], "forfeited_denoms"), "denom2");

    // The denom2 half never leaves the pool.
    assert_eq!(suite.balance(&pool, "denom3"), Uint128::new(9_500));
    assert_eq!(suite.plan(1).distributed_coins, vec![coin(500, "denom3")]);
    assert_eq!(suite.rewards(&farmer), vec![coin(500, "denom3")]);
}

#[test]
fn test_no_stakers_forfeits_whole_epoch() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    suite.fund(&pool, &[coin(10_000, "denom3")]);

    suite
        .add_public_plan(
            "nobody",
            &pool,
            vec![weight("denom1", "1")],
            START,
            START + 10 * DAY,
            fixed(1_000, "denom3"),
        )
        .unwrap();

    let res = suite.tick(START);
    let skipped = events_of(&res, "farming_allocation_skipped");
    assert_eq!(skipped.len(), 1);
    assert_eq!(attr(skipped[0], "reason"), "no_staking");
    assert_eq!(suite.balance(&pool, "denom3"), Uint128::new(10_000));
    assert_eq!(
        suite.plan(1).last_distribution_time,
        Some(Timestamp::from_seconds(START))
    );

    let alice = suite.addr("alice");
    suite.stake(&alice, vec![coin(1_000, "denom1")]);
    suite.tick(START + DAY);
    assert_eq!(suite.rewards(&alice), vec![coin(1_000, "denom3")]);
    suite.unstake(&alice, vec![coin(1_000, "denom1")]).unwrap();

    // Two epochs with nobody staked are forfeited, not owed to later stakers.
    for day in [2, 3] {
        let res = suite.tick(START + day * DAY);
        assert_eq!(events_of(&res, "farming_allocation_skipped").len(), 1);
    }

    let bob = suite.addr("bob");
    suite.stake(&bob, vec![coin(1_000, "denom1")]);
    suite.tick(START + 4 * DAY);

    assert_eq!(suite.rewards(&bob), vec![coin(1_000, "denom3")]);
    assert_eq!(suite.plan(1).distributed_coins, vec![coin(2_000, "denom3")]);
    assert_eq!(suite.balance(&pool, "denom3"), Uint128::new(8_000));
}

#[test]
fn test_ratio_plan_catches_up_on_declining_balance() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    let farmer = suite.addr("farmer");
    suite.fund(&pool, &[coin(1_000_000, "denom3")]);

    suite
        .add_public_plan(
            "ratio",
            &pool,
            vec![weight("denom1", "1")],
            START,
            START + 10 * DAY,
            ratio(60),
        )
        .unwrap();
    suite.stake(&farmer, vec![coin(1_000, "denom1")]);

    suite.tick(START);
    assert_eq!(suite.rewards(&farmer), vec![coin(600_000, "denom3")]);

    // No tick for a day: the next one owes two epochs, 240,000 then 96,000.
    let res = suite.tick(START + 2 * DAY);
    assert!(events_of(&res, "farming_allocation_skipped").is_empty());
    assert_eq!(suite.rewards(&farmer), vec![coin(936_000, "denom3")]);
    assert_eq!(suite.balance(&pool, "denom3"), Uint128::new(64_000));

    suite.tick(START + 3 * DAY);
    assert_eq!(suite.rewards(&farmer), vec![coin(974_400, "denom3")]);
    assert_eq!(suite.plan(1).distributed_coins, vec![coin(974_400, "denom3")]);
}

#[test]
fn test_missed_epochs_are_paid_together() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    let farmer = suite.addr("farmer");
    suite.fund(&pool, &[coin(10_000, "denom3")]);

    suite
        .add_public_plan(
            "catch-up",
            &pool,
            vec![weight("denom1", "1")],
            START,
            START + 10 * DAY,
            fixed(1_000, "denom3"),
        )
        .unwrap();
    suite.stake(&farmer, vec![coin(1_000, "denom1")]);

    suite.tick(START);
    // Half a day later nothing is owed yet.
    let res = suite.tick(START + DAY / 2);
    assert!(events_of(&res, "farming_rewards_allocated").is_empty());
    suite.tick(START + 3 * DAY);

    assert_eq!(suite.rewards(&farmer), vec![coin(4_000, "denom3")]);
    assert_eq!(suite.plan(1).distributed_coins, vec![coin(4_000, "denom3")]);
}

// ─── Harvest ───

#[test]
fn test_harvest_three_times_in_one_epoch_pays_once() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    let farmer = suite.addr("farmer");
    suite.fund(&pool, &[coin(10_000_000, "denom3")]);

    suite
        .add_public_plan(
            "plan",
            &pool,
            vec![weight("denom1", "1")],
            START,
            START + 10 * DAY,
            fixed(1_000_000, "denom3"),
        )
        .unwrap();
    suite.stake(&farmer, vec![coin(1_000_000, "denom1")]);
    suite.tick(START);

    let first = suite.harvest(&farmer, &["denom1"]);
    assert_eq!(events_of(&first, "farming_harvest").len(), 1);
    let second = suite.harvest(&farmer, &["denom1"]);
    let third = suite.harvest(&farmer, &["denom1"]);
    assert!(events_of(&second, "farming_harvest").is_empty());
    assert!(events_of(&third, "farming_harvest").is_empty());

    assert_eq!(suite.balance(&farmer, "denom3"), Uint128::new(1_000_000));
    assert!(suite.rewards(&farmer).is_empty());
}

#[test]
fn test_harvest_with_unknown_denom_pays_nothing() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    let farmer = suite.addr("farmer");
    suite.fund(&pool, &[coin(10_000, "denom3")]);

    suite
        .add_public_plan(
            "plan",
            &pool,
            vec![weight("denom1", "1")],
            START,
            START + 10 * DAY,
            fixed(1_000, "denom3"),
        )
        .unwrap();
    suite.stake(&farmer, vec![coin(1_000, "denom1")]);
    suite.tick(START);

    let err = suite
        .exec(
            &farmer,
            ExecuteMsg::Harvest {
                staking_coin_denoms: vec!["denom1".to_string(), "denom2".to_string()],
            },
        )
        .unwrap_err();
    assert!(matches!(err, FarmingError::NoStakingFound { denom, .. } if denom == "denom2"));
    assert!(suite.balance(&farmer, "denom3").is_zero());
    assert_eq!(suite.rewards(&farmer), vec![coin(1_000, "denom3")]);

    suite.harvest(&farmer, &["denom1"]);
    assert_eq!(suite.balance(&farmer, "denom3"), Uint128::new(1_000));
}

#[test]
fn test_outstanding_rewards_keep_only_dust_after_harvest() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    suite.fund(&pool, &[coin(10_000, "denom3")]);

    suite
        .add_public_plan(
            "split",
            &pool,
            vec![weight("denom1", "1")],
            START,
            START + 10 * DAY,
            fixed(1_000, "denom3"),
        )
        .unwrap();
    let farmers: Vec<Addr> = ["f1", "f2", "f3"].iter().map(|n| suite.addr(n)).collect();
    for farmer in &farmers {
        suite.stake(farmer, vec![coin(1_000_000, "denom1")]);
    }
    suite.tick(START);

    assert_eq!(suite.outstanding("denom1"), vec![weight("denom3", "1000")]);
    for farmer in &farmers {
        assert_eq!(suite.rewards(farmer), vec![coin(333, "denom3")]);
        suite.harvest(farmer, &["denom1"]);
        assert_eq!(suite.balance(farmer, "denom3"), Uint128::new(333));
    }

    // 1000 - 3 × 333.333333333333 leaves a sub-unit remainder.
    let outstanding = suite.outstanding("denom1");
    assert_eq!(outstanding, vec![weight("denom3", "0.000000000001")]);
    assert!(truncate_dec_coins(&outstanding).unwrap().is_empty());

    let reserve = suite.module_accounts().rewards_reserve;
    assert_eq!(suite.balance(&reserve, "denom3"), Uint128::new(1));
}

#[test]
fn test_unused_historical_records_are_pruned() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    let farmer = suite.addr("farmer");
    suite.fund(&pool, &[coin(10_000, "denom3")]);

    suite
        .add_public_plan(
            "plan",
            &pool,
            vec![weight("denom1", "1")],
            START,
            START + 10 * DAY,
            fixed(1_000, "denom3"),
        )
        .unwrap();
    suite.stake(&farmer, vec![coin(1_000_000, "denom1")]);
    for day in 0..3 {
        suite.tick(START + day * DAY);
    }

    // The staking holds epoch 0, the tracker the latest closed epoch.
    let epochs: Vec<(u64, u32)> = suite
        .historical_epochs("denom1")
        .iter()
        .map(|e| (e.epoch, e.rewards.reference_count))
        .collect();
    assert_eq!(epochs, vec![(0, 1), (3, 1)]);
    assert_eq!(suite.rewards(&farmer), vec![coin(3_000, "denom3")]);

    suite.harvest(&farmer, &["denom1"]);
    let epochs: Vec<(u64, u32)> = suite
        .historical_epochs("denom1")
        .iter()
        .map(|e| (e.epoch, e.rewards.reference_count))
        .collect();
    assert_eq!(epochs, vec![(3, 2)]);
}

// ─── Staking ───

#[test]
fn test_unstake_exact_available_deletes_everything() {
    let mut suite = Suite::new();
    let farmer = suite.addr("farmer");

    suite.stake(&farmer, vec![coin(1_000, "denom1")]);
    suite.tick(START);
    suite.stake(&farmer, vec![coin(500, "denom1")]);

    let err = suite
        .unstake(&farmer, vec![coin(1_501, "denom1")])
        .unwrap_err();
    match err {
        FarmingError::InsufficientFunds {
            denom,
            available,
            requested,
        } => {
            assert_eq!(denom, "denom1");
            assert_eq!(available, Uint128::new(1_500));
            assert_eq!(requested, Uint128::new(1_501));
        }
        other => panic!("unexpected error: {}", other),
    }

    suite.unstake(&farmer, vec![coin(1_500, "denom1")]).unwrap();
    let stakings = suite.stakings(&farmer);
    assert!(stakings.staked_coins.is_empty());
    assert!(stakings.queued_coins.is_empty());
    assert!(suite.total_staking("denom1").is_zero());
    assert_eq!(suite.balance(&farmer, "denom1"), Uint128::new(1_500));
    suite.assert_total_staking_consistent();
}

#[test]
fn test_unstake_draws_from_queue_first() {
    let mut suite = Suite::new();
    let farmer = suite.addr("farmer");

    suite.stake(&farmer, vec![coin(1_000, "denom1")]);
    suite.tick(START);
    suite.stake(&farmer, vec![coin(500, "denom1")]);

    suite.unstake(&farmer, vec![coin(700, "denom1")]).unwrap();
    let stakings = suite.stakings(&farmer);
    assert_eq!(stakings.staked_coins, vec![coin(800, "denom1")]);
    assert!(stakings.queued_coins.is_empty());
    assert_eq!(suite.total_staking("denom1"), Uint128::new(800));

    // Only queued coins: total staking is untouched.
    suite.stake(&farmer, vec![coin(300, "denom1")]);
    suite.unstake(&farmer, vec![coin(200, "denom1")]).unwrap();
    let stakings = suite.stakings(&farmer);
    assert_eq!(stakings.staked_coins, vec![coin(800, "denom1")]);
    assert_eq!(stakings.queued_coins, vec![coin(100, "denom1")]);
    assert_eq!(suite.total_staking("denom1"), Uint128::new(800));
}

#[test]
fn test_unstake_validates_every_denom_before_moving_funds() {
    let mut suite = Suite::new();
    let farmer = suite.addr("farmer");
    suite.stake(&farmer, vec![coin(1_000, "denom1")]);

    let err = suite
        .unstake(&farmer, vec![coin(1_000, "denom1"), coin(1, "denom2")])
        .unwrap_err();
    assert!(matches!(err, FarmingError::InsufficientFunds { .. }));
    assert_eq!(
        suite.stakings(&farmer).queued_coins,
        vec![coin(1_000, "denom1")]
    );
    assert!(suite.balance(&farmer, "denom1").is_zero());
}

#[test]
fn test_unstake_harvests_first() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    let farmer = suite.addr("farmer");
    suite.fund(&pool, &[coin(10_000, "denom3")]);

    suite
        .add_public_plan(
            "plan",
            &pool,
            vec![weight("denom1", "1")],
            START,
            START + 10 * DAY,
            fixed(1_000, "denom3"),
        )
        .unwrap();
    suite.stake(&farmer, vec![coin(1_000, "denom1")]);
    suite.tick(START);

    let res = suite.unstake(&farmer, vec![coin(500, "denom1")]).unwrap();
    assert_eq!(attr(events_of(&res, "farming_unstake")[0], "rewards"), "1000denom3");
    assert_eq!(suite.balance(&farmer, "denom3"), Uint128::new(1_000));
    assert!(suite.rewards(&farmer).is_empty());

    // The remaining 500 earn the whole next epoch.
    suite.tick(START + DAY);
    assert_eq!(suite.rewards(&farmer), vec![coin(1_000, "denom3")]);
}

#[test]
fn test_restaking_harvests_existing_position() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    let farmer = suite.addr("farmer");
    suite.fund(&pool, &[coin(10_000, "denom3")]);

    suite
        .add_public_plan(
            "plan",
            &pool,
            vec![weight("denom1", "1")],
            START,
            START + 10 * DAY,
            fixed(1_000, "denom3"),
        )
        .unwrap();
    suite.stake(&farmer, vec![coin(1_000, "denom1")]);
    suite.tick(START);
    suite.stake(&farmer, vec![coin(1_000, "denom1")]);

    // Promotion pays out the first epoch before merging the new coins.
    suite.tick(START + DAY);
    assert_eq!(suite.balance(&farmer, "denom3"), Uint128::new(1_000));
    assert_eq!(suite.stakings(&farmer).staked_coins, vec![coin(2_000, "denom1")]);
    assert_eq!(suite.rewards(&farmer), vec![coin(1_000, "denom3")]);
}

#[test]
fn test_interleaved_operations_keep_books_consistent() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    suite.fund(&pool, &[coin(1_000_000_000, "denom3")]);
    suite
        .add_public_plan(
            "long",
            &pool,
            vec![weight("denom1", "0.3"), weight("denom2", "0.7")],
            START,
            START + 30 * DAY,
            fixed(7_777, "denom3"),
        )
        .unwrap();

    let alice = suite.addr("alice");
    let bob = suite.addr("bob");
    let carol = suite.addr("carol");

    let mut latest: Option<Vec<DecCoin>> = None;
    for day in 0..8u64 {
        match day % 4 {
            0 => {
                suite.stake(&alice, vec![coin(1_000 + day as u128, "denom1")]);
                suite.stake(&bob, vec![coin(333, "denom2")]);
            }
            1 => {
                suite.stake(&carol, vec![coin(2_500, "denom1"), coin(10, "denom2")]);
                suite.harvest(&alice, &["denom1"]);
            }
            2 => {
                suite.unstake(&alice, vec![coin(500, "denom1")]).unwrap();
                suite.harvest(&bob, &["denom2"]);
            }
            _ => {
                suite.unstake(&carol, vec![coin(5, "denom2")]).unwrap();
            }
        }
        suite.tick(START + day * DAY);
        suite.assert_total_staking_consistent();

        // The cumulative ratio never decreases.
        let records = suite.historical_epochs("denom1");
        let newest = records.last().unwrap().rewards.cumulative_unit_rewards.clone();
        if let Some(previous) = &latest {
            for c in previous {
                let now = newest
                    .iter()
                    .find(|n| n.denom == c.denom)
                    .map(|n| n.amount)
                    .unwrap_or_default();
                assert!(now >= c.amount);
            }
        }
        latest = Some(newest);
    }

    // Everything still owed is covered by the rewards reserve.
    let reserve = suite.module_accounts().rewards_reserve;
    let owed: u128 = [&alice, &bob, &carol]
        .iter()
        .flat_map(|f| suite.rewards(f))
        .map(|c| c.amount.u128())
        .sum();
    assert!(suite.balance(&reserve, "denom3").u128() >= owed);
}

// ─── Plans ───

#[test]
fn test_private_plan_lifecycle() {
    let mut suite = Suite::new();
    let creator = suite.addr("creator");
    let farmer = suite.addr("farmer");
    suite.fund(&creator, &[coin(100_000_000, "stake")]);

    suite
        .exec(
            &creator,
            ExecuteMsg::CreatePlan {
                name: "private".to_string(),
                staking_coin_weights: vec![weight("denom1", "1")],
                start_time: Timestamp::from_seconds(START),
                end_time: Timestamp::from_seconds(START + 2 * DAY),
                kind: fixed(1_000, "denom3"),
            },
        )
        .unwrap();
    let plan = suite.plan(1);
    let pool = private_plan_farming_pool_address(&suite.deps.api, 1, "private").unwrap();
    assert_eq!(plan.farming_pool_address, pool);
    assert_eq!(
        plan.reward_pool_address,
        reward_pool_address(&suite.deps.api, 1, PlanType::Private, &pool).unwrap()
    );
    let collector = suite.module_accounts().farming_fee_collector;
    assert_eq!(suite.balance(&collector, "stake"), Uint128::new(100_000_000));

    suite.fund(&pool, &[coin(5_000, "denom3")]);
    suite.stake(&farmer, vec![coin(10, "denom1")]);
    suite.tick(START);
    suite.tick(START + DAY);
    assert_eq!(suite.rewards(&farmer), vec![coin(2_000, "denom3")]);

    // Ended plans are terminated by the tick and their pool swept back.
    let res = suite.tick(START + 2 * DAY);
    assert_eq!(events_of(&res, "farming_plan_terminated").len(), 1);
    assert!(suite.plan(1).terminated);
    assert_eq!(suite.balance(&creator, "denom3"), Uint128::new(3_000));
    assert!(suite.balance(&pool, "denom3").is_zero());

    suite.harvest(&farmer, &["denom1"]);
    assert_eq!(suite.balance(&farmer, "denom3"), Uint128::new(2_000));
}

#[test]
fn test_terminate_is_idempotent() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    suite
        .add_public_plan(
            "plan",
            &pool,
            vec![weight("denom1", "1")],
            START,
            START + DAY,
            ratio(100),
        )
        .unwrap();

    let admin = suite.admin.clone();
    for _ in 0..2 {
        suite
            .exec(&admin, ExecuteMsg::TerminatePlan { plan_id: 1 })
            .unwrap();
        assert!(suite.plan(1).terminated);
    }

    // Terminated plans do not count against the pool's ratio budget.
    suite
        .add_public_plan(
            "full",
            &pool,
            vec![weight("denom1", "1")],
            START,
            START + DAY,
            ratio(100),
        )
        .unwrap();
}

#[test]
fn test_end_blocker_drives_epochs() {
    let mut suite = Suite::new();
    let pool = suite.addr("pool");
    let farmer = suite.addr("farmer");
    suite.fund(&pool, &[coin(10_000, "denom3")]);
    suite
        .add_public_plan(
            "plan",
            &pool,
            vec![weight("denom1", "1")],
            START,
            START + 10 * DAY,
            fixed(1_000, "denom3"),
        )
        .unwrap();
    suite.stake(&farmer, vec![coin(1_000, "denom1")]);

    for seconds in [START, START + 600, START + DAY, START + DAY + 600, START + 2 * DAY] {
        end_blocker(suite.deps.as_mut(), env_at(seconds)).unwrap();
    }

    // Ticks ran at START + DAY (promote, first payout) and START + 2 * DAY.
    assert_eq!(suite.rewards(&farmer), vec![coin(2_000, "denom3")]);
    let last: Option<Timestamp> =
        from_json(query(suite.deps.as_ref(), mock_env(), QueryMsg::LastEpochTime {}).unwrap())
            .unwrap();
    assert_eq!(last, Some(Timestamp::from_seconds(START + 2 * DAY)));
}

// ─── Messages ───

#[test]
fn test_message_json_shape() {
    let msg = ExecuteMsg::Harvest {
        staking_coin_denoms: vec!["denom1".to_string()],
    };
    assert_eq!(
        serde_json::to_value(&msg).unwrap(),
        json!({ "harvest": { "staking_coin_denoms": ["denom1"] } })
    );

    let kind: PlanKind =
        serde_json::from_value(json!({ "ratio": { "epoch_ratio": "0.25" } })).unwrap();
    assert_eq!(kind, ratio(25));

    assert_eq!(
        serde_json::to_value(fixed(1_000, "denom3")).unwrap(),
        json!({ "fixed_amount": { "epoch_amount": [{ "denom": "denom3", "amount": "1000" }] } })
    );
}
