use grid_lp_domain::config::GridConfig;
use grid_lp_domain::entities::{PositionId, Principal};
use grid_lp_domain::enums::{Asset, DistributionKind, GridType};
use grid_lp_domain::error::GridError;
use grid_lp_domain::value_objects::Balances;
use grid_lp_execution::prelude::*;
use grid_lp_protocols::memory::{MemoryVenue, MemoryVenueState, VenueOp};
use grid_lp_protocols::prelude::*;

const START_TICK: i32 = 1005;

fn owner() -> Principal {
    Principal::new("owner")
}

fn params(grid_type: GridType) -> DistributionParams {
    DistributionParams::new(100, grid_type, DistributionKind::Flat)
}

fn setup() -> GridPositionManager<MemoryVenue> {
    let venue = MemoryVenue::new(START_TICK, 10, 3000, 10_000);
    let mut manager = GridPositionManager::new(owner(), venue);
    manager
        .initialize(&owner(), GridConfig::new(6, 2).unwrap())
        .unwrap();
    manager
}

/// Moves the price and lets the oracle settle on it.
fn settle_at(manager: &mut GridPositionManager<MemoryVenue>, tick: i32) {
    let venue = manager.venue_mut();
    venue.set_tick(tick);
    venue.advance_time(400);
}

fn assert_consistent(manager: &GridPositionManager<MemoryVenue>) {
    manager.check_invariant().unwrap();
    for index in 0..manager.position_count() {
        let position = manager.position_at(index).unwrap();
        assert_eq!(manager.is_active(position.id), position.liquidity > 0);
        let on_venue = manager.venue().position(position.id).unwrap();
        assert_eq!(on_venue.liquidity, position.liquidity);
    }
}

#[test]
fn test_directional_grids_fund_one_side() {
    let mut manager = setup();
    let placement = manager
        .deposit(&owner(), 0, 1_000_000, params(GridType::Buy))
        .unwrap();
    assert_eq!(placement.amount0, 0);
    assert!(placement.amount1 > 0);
    for position in manager.active_positions() {
        assert!(position.tick_upper <= START_TICK);
    }

    let mut manager = setup();
    let placement = manager
        .deposit(&owner(), 1_000_000, 0, params(GridType::Sell))
        .unwrap();
    assert_eq!(placement.amount1, 0);
    // [1000, 1020) straddles the price and is skipped.
    assert_eq!(placement.cells_placed, 5);
    for position in manager.active_positions() {
        assert!(position.tick_lower > START_TICK);
    }
}

#[test]
fn test_failed_deposit_leaves_no_trace() {
    let mut manager = setup();
    let events_before = manager.events().len();
    manager.venue_mut().fail_on(VenueOp::Mint, 3);

    let result = manager.deposit(&owner(), 6_000_000, 6_000_000, params(GridType::Neutral));
    assert!(matches!(result, Err(GridError::Venue(_))));

    assert_eq!(manager.position_count(), 0);
    assert!(manager.active_position_ids().is_empty());
    assert_eq!(manager.balances(), Balances::default());
    assert_eq!(manager.events().len(), events_before);
    assert_eq!(manager.venue().position_count(), 0);
    assert_eq!(manager.venue().call_count(VenueOp::Mint), 3);

    // The fault fired once; the same deposit now goes through.
    manager
        .deposit(&owner(), 6_000_000, 6_000_000, params(GridType::Neutral))
        .unwrap();
    assert_eq!(manager.position_count(), 5);
    assert_consistent(&manager);
}

#[test]
fn test_failed_compound_restores_fees_on_venue() {
    let mut manager = setup();
    manager
        .deposit(&owner(), 6_000_000, 6_000_000, params(GridType::Neutral))
        .unwrap();
    let earner = manager
        .active_positions()
        .into_iter()
        .find(|p| p.tick_lower == 1020)
        .map(|p| p.id)
        .unwrap();

    manager.venue_mut().set_tick(1025);
    assert_eq!(manager.venue_mut().accrue_fees(10, 10), (10, 10));
    manager.venue_mut().set_tick(START_TICK);

    manager.set_min_fees(&owner(), 1_000, 1_000).unwrap();
    assert_eq!(
        manager.compound(&owner(), params(GridType::Neutral)),
        Err(GridError::InsufficientFees {
            amount0: 10,
            amount1: 10
        })
    );
    assert_eq!(manager.venue().position(earner).unwrap().tokens_owed0, 10);

    manager.set_min_fees(&owner(), 9, 1_000).unwrap();
    let report = manager
        .compound(&owner(), params(GridType::Neutral))
        .unwrap();
    assert_eq!((report.fees0, report.fees1), (10, 10));
    assert!(!report.placement.increased.is_empty());
    assert_eq!(manager.venue().position(earner).unwrap().tokens_owed0, 0);
    assert_consistent(&manager);
}

#[test]
fn test_failed_increase_rolls_back_collected_fees() {
    let mut manager = setup();
    manager
        .deposit(&owner(), 6_000_000, 6_000_000, params(GridType::Neutral))
        .unwrap();
    manager.venue_mut().set_tick(1025);
    manager.venue_mut().accrue_fees(500, 500);
    manager.venue_mut().set_tick(START_TICK);

    let balances = manager.balances();
    let liquidity: Vec<u128> = manager.active_positions().iter().map(|p| p.liquidity).collect();
    manager.venue_mut().fail_on(VenueOp::IncreaseLiquidity, 2);

    let result = manager.compound(&owner(), params(GridType::Neutral));
    assert!(matches!(result, Err(GridError::Venue(_))));
    assert_eq!(manager.balances(), balances);
    let after: Vec<u128> = manager.active_positions().iter().map(|p| p.liquidity).collect();
    assert_eq!(after, liquidity);
    assert_consistent(&manager);
}

#[test]
fn test_sweep_rejects_manipulated_price() {
    let mut manager = setup();
    manager
        .deposit(&owner(), 6_000_000, 6_000_000, params(GridType::Neutral))
        .unwrap();
    settle_at(&mut manager, START_TICK);

    // Instant jump, no time for the oracle to follow.
    manager.venue_mut().set_tick(1400);
    assert_eq!(
        manager.sweep(&owner(), params(GridType::Neutral)),
        Err(GridError::PriceDeviationTooHigh {
            current: 1400,
            twap: START_TICK,
            max_deviation: 100
        })
    );
    assert_eq!(manager.active_position_ids().len(), 5);
}

#[test]
fn test_sweep_retires_out_of_band_positions() {
    let mut manager = setup();
    manager
        .deposit(&owner(), 6_000_000, 6_000_000, params(GridType::Neutral))
        .unwrap();
    let original: Vec<PositionId> = manager.active_position_ids().to_vec();

    settle_at(&mut manager, 1400);
    let report = manager.sweep(&owner(), params(GridType::Neutral)).unwrap();

    assert_eq!(report.reference_tick, 1400);
    assert_eq!(report.twap_tick, 1400);
    let mut retired = report.retired.clone();
    retired.sort();
    let mut expected = original.clone();
    expected.sort();
    assert_eq!(retired, expected);

    for id in &original {
        assert!(!manager.is_active(*id));
        assert_eq!(manager.position(*id).unwrap().liquidity, 0);
    }
    for position in manager.active_positions() {
        assert!(position.tick_lower >= 1340 && position.tick_upper <= 1460);
    }
    assert!(report.placement.unwrap().cells_placed > 0);
    assert_consistent(&manager);
}

#[test]
fn test_sweep_keeps_positions_overlapping_the_band() {
    let mut manager = setup();
    manager
        .deposit(&owner(), 6_000_000, 6_000_000, params(GridType::Neutral))
        .unwrap();
    let before = manager.active_position_ids().len();

    settle_at(&mut manager, 1030);
    let report = manager.sweep(&owner(), params(GridType::Neutral)).unwrap();
    // Band [970, 1090]: only [940, 960) falls fully outside.
    assert_eq!(report.retired.len(), 1);
    assert!(manager.active_position_ids().len() >= before - 1);
    assert_consistent(&manager);
}

#[test]
fn test_sweep_after_directional_deposit_retires_nothing() {
    for (grid_type, amount0, amount1) in [
        (GridType::Buy, 0, 6_000_000),
        (GridType::Sell, 6_000_000, 0),
    ] {
        let mut manager = setup();
        manager
            .deposit(&owner(), amount0, amount1, params(grid_type))
            .unwrap();
        let before = manager.active_position_ids().to_vec();

        settle_at(&mut manager, START_TICK);
        let report = manager.sweep(&owner(), params(grid_type)).unwrap();

        assert!(report.retired.is_empty(), "{grid_type:?} retired {:?}", report.retired);
        if let Some(placement) = report.placement {
            assert!(placement.minted.is_empty());
        }
        assert_eq!(manager.active_position_ids(), before.as_slice());
        assert_consistent(&manager);
    }
}

#[test]
fn test_wide_fibonacci_grid_deposits() {
    let venue = MemoryVenue::new(START_TICK, 10, 3000, 10_000);
    let mut manager = GridPositionManager::new(owner(), venue);
    manager
        .initialize(&owner(), GridConfig::new(800, 1).unwrap())
        .unwrap();

    let params = DistributionParams::new(100, GridType::Buy, DistributionKind::Fibonacci);
    let placement = manager.deposit(&owner(), 0, 6_000_000, params).unwrap();

    // The far cells round to a zero weight and stay empty.
    assert!(placement.cells_placed > 0 && placement.cells_placed < 800);
    for position in manager.active_positions() {
        assert!(position.tick_upper <= START_TICK);
    }
    assert_consistent(&manager);
}

#[test]
fn test_active_set_invariant_across_operations() {
    let mut manager = setup();
    manager
        .deposit(&owner(), 6_000_000, 6_000_000, params(GridType::Neutral))
        .unwrap();
    assert_consistent(&manager);

    for tick in [1005, 1100, 1250, 990, 800, 1003] {
        settle_at(&mut manager, tick);
        manager.venue_mut().accrue_fees(1_000, 1_000);

        match manager.compound(&owner(), params(GridType::Neutral)) {
            Ok(_) => {}
            Err(err) => assert!(err.is_economic_guard(), "compound failed: {err}"),
        }
        assert_consistent(&manager);

        match manager.sweep(&owner(), params(GridType::Neutral)) {
            Ok(_) => {}
            Err(err) => assert!(err.is_economic_guard(), "sweep failed: {err}"),
        }
        assert_consistent(&manager);
    }

    manager.withdraw(&owner()).unwrap();
    assert!(manager.active_position_ids().is_empty());
    assert_consistent(&manager);
}

#[test]
fn test_withdraw_returns_capital() {
    let mut manager = setup();
    manager
        .deposit(&owner(), 6_000_000, 6_000_000, params(GridType::Neutral))
        .unwrap();
    let payout = manager.withdraw(&owner()).unwrap();

    // Each position loses at most one unit to rounding.
    assert!(6_000_000 - payout.token0 <= 5);
    assert!(6_000_000 - payout.token1 <= 5);
    assert_eq!(payout.native, 0);
    assert!(!manager.balances().has_tokens());
    assert_eq!(manager.position_count(), 5);
}

#[test]
fn test_close_requires_empty_active_set_and_is_idempotent() {
    let mut manager = setup();
    manager
        .deposit(&owner(), 6_000_000, 6_000_000, params(GridType::Neutral))
        .unwrap();
    assert_eq!(
        manager.close(&owner()),
        Err(GridError::ActivePositionsRemaining(5))
    );

    manager.withdraw(&owner()).unwrap();
    assert_eq!(manager.close(&owner()).unwrap(), 5);
    assert_eq!(manager.position_count(), 0);
    assert_eq!(manager.venue().position_count(), 0);

    assert_eq!(manager.close(&owner()).unwrap(), 0);
    assert_eq!(manager.position_count(), 0);

    // The instance stays usable after a close.
    manager
        .deposit(&owner(), 6_000_000, 6_000_000, params(GridType::Neutral))
        .unwrap();
    assert_eq!(manager.position_count(), 5);
}

#[test]
fn test_emergency_withdraw_drains_everything() {
    let mut manager = setup();
    manager.absorb_forced_native(7).unwrap();
    manager
        .deposit(&owner(), 6_000_000, 6_000_000, params(GridType::Neutral))
        .unwrap();

    let payout = manager.emergency_withdraw(&owner()).unwrap();
    assert_eq!(payout.native, 7);
    assert!(payout.token0 > 5_999_990);
    assert!(manager.active_position_ids().is_empty());
    assert_eq!(manager.balances(), Balances::default());
    assert_eq!(
        manager.recover_native(&owner()),
        Err(GridError::NothingToRecover)
    );
}

#[test]
fn test_held_lock_blocks_mutations() {
    let mut manager = setup();
    let guard = manager.reentrancy_lock().enter().unwrap();
    assert_eq!(
        manager.deposit(&owner(), 6_000_000, 6_000_000, params(GridType::Neutral)),
        Err(GridError::ReentrancyDetected)
    );
    assert_eq!(
        manager.set_grid_step(&owner(), 3),
        Err(GridError::ReentrancyDetected)
    );
    drop(guard);
    assert!(manager.set_grid_step(&owner(), 3).is_ok());
}

/// Venue that tries to re-enter the manager from inside `mint`.
struct ReentrantVenue {
    inner: MemoryVenue,
    lock: Option<grid_lp_execution::guard::ReentrancyLock>,
    attempts: Vec<Result<(), GridError>>,
    fail_when_blocked: bool,
}

impl LiquidityVenue for ReentrantVenue {
    type Snapshot = MemoryVenueState;

    fn current_state(&self) -> Result<PoolState, VenueError> {
        self.inner.current_state()
    }

    fn tick_spacing(&self) -> i32 {
        self.inner.tick_spacing()
    }

    fn fee_tier(&self) -> u32 {
        self.inner.fee_tier()
    }

    fn timestamp(&self) -> u64 {
        self.inner.timestamp()
    }

    fn time_weighted_tick(&self, window_secs: u32) -> Result<i32, VenueError> {
        self.inner.time_weighted_tick(window_secs)
    }

    fn approve(&mut self, asset: Asset, amount: u128) -> Result<(), VenueError> {
        self.inner.approve(asset, amount)
    }

    fn mint(&mut self, params: &MintParams) -> Result<MintResult, VenueError> {
        if let Some(lock) = &self.lock {
            let attempt = lock.enter().map(drop);
            let blocked = attempt.is_err();
            self.attempts.push(attempt);
            if blocked && self.fail_when_blocked {
                return Err(VenueError::Math("re-entry refused"));
            }
        }
        self.inner.mint(params)
    }

    fn increase_liquidity(
        &mut self,
        params: &IncreaseLiquidityParams,
    ) -> Result<LiquidityResult, VenueError> {
        self.inner.increase_liquidity(params)
    }

    fn decrease_liquidity(
        &mut self,
        params: &DecreaseLiquidityParams,
    ) -> Result<(u128, u128), VenueError> {
        self.inner.decrease_liquidity(params)
    }

    fn collect(&mut self, params: &CollectParams) -> Result<(u128, u128), VenueError> {
        self.inner.collect(params)
    }

    fn burn(&mut self, position: PositionId) -> Result<(), VenueError> {
        self.inner.burn(position)
    }

    fn snapshot(&self) -> Self::Snapshot {
        self.inner.snapshot()
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        self.inner.restore(snapshot);
    }
}

fn reentrant_setup(fail_when_blocked: bool) -> GridPositionManager<ReentrantVenue> {
    let venue = ReentrantVenue {
        inner: MemoryVenue::new(START_TICK, 10, 3000, 10_000),
        lock: None,
        attempts: Vec::new(),
        fail_when_blocked,
    };
    let mut manager = GridPositionManager::new(owner(), venue);
    let lock = manager.reentrancy_lock();
    manager.venue_mut().lock = Some(lock);
    manager
        .initialize(&owner(), GridConfig::new(6, 2).unwrap())
        .unwrap();
    manager
}

#[test]
fn test_reentry_from_venue_is_detected() {
    let mut manager = reentrant_setup(false);
    manager
        .deposit(&owner(), 6_000_000, 6_000_000, params(GridType::Neutral))
        .unwrap();

    let attempts = &manager.venue().attempts;
    assert_eq!(attempts.len(), 5);
    assert!(
        attempts
            .iter()
            .all(|a| a == &Err(GridError::ReentrancyDetected))
    );
    // Released once the deposit returned.
    assert!(!manager.reentrancy_lock().is_entered());
}

#[test]
fn test_refused_reentry_aborts_the_operation() {
    let mut manager = reentrant_setup(true);
    let result = manager.deposit(&owner(), 6_000_000, 6_000_000, params(GridType::Neutral));
    assert!(matches!(result, Err(GridError::Venue(_))));
    assert_eq!(manager.position_count(), 0);
    assert_eq!(manager.balances(), Balances::default());
    assert!(!manager.reentrancy_lock().is_entered());
}
