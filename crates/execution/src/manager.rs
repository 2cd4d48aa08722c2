//! Grid position manager.
//!
//! Orchestrates deposit, withdraw, compound, sweep and close against a
//! [`LiquidityVenue`]. Every mutating entry point runs as one unit of work:
//! it holds the reentrancy lock for its whole duration and, on failure,
//! restores the ledger, balances, configuration, event log and venue to the
//! state they had when the call started.

use crate::guard::ReentrancyLock;
use crate::ledger::PositionLedger;
use crate::lifecycle::{
    CellPlacedData, ClosedData, ConfigUpdatedData, DecommissionedData, DistributionData,
    FeesData, InitializedData, LifecycleEvent, LifecycleEventType, LifecycleTracker, NativeData,
    PayoutData, TrackerCheckpoint,
};
use grid_lp_domain::config::{GridConfig, validate_grid_quantity, validate_grid_step};
use grid_lp_domain::entities::{GridPosition, PositionId, Principal};
use grid_lp_domain::enums::{Asset, DistributionKind, GridType, StraddlePolicy};
use grid_lp_domain::error::{GridError, Result};
use grid_lp_domain::math::concentrated_liquidity::{
    get_amounts_for_liquidity, get_liquidity_for_amounts,
};
use grid_lp_domain::math::distribution::distribution_weights;
use grid_lp_domain::math::price_tick::tick_to_sqrt_price;
use grid_lp_domain::math::tick_grid::calculate_grid_ticks;
use grid_lp_domain::value_objects::{Balances, GridCell, Payout, Slippage};
use grid_lp_protocols::venue::{
    CollectParams, DecreaseLiquidityParams, IncreaseLiquidityParams, LiquidityResult,
    LiquidityVenue, MintParams,
};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// How capital is spread by deposit, compound and sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributionParams {
    /// Slippage tolerance for one-sided cells, at most 500 bps.
    pub slippage_bps: u32,
    pub grid_type: GridType,
    pub distribution: DistributionKind,
}

impl DistributionParams {
    pub fn new(slippage_bps: u32, grid_type: GridType, distribution: DistributionKind) -> Self {
        Self {
            slippage_bps,
            grid_type,
            distribution,
        }
    }
}

/// Capital placed by one distribution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    pub reference_tick: i32,
    pub cells_placed: usize,
    /// Positions minted by this pass.
    pub minted: Vec<PositionId>,
    /// Existing positions topped up by this pass.
    pub increased: Vec<PositionId>,
    pub amount0: u128,
    pub amount1: u128,
    pub liquidity: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundReport {
    /// Token0 fees collected by this call.
    pub fees0: u128,
    /// Token1 fees collected by this call.
    pub fees1: u128,
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub reference_tick: i32,
    pub twap_tick: i32,
    /// Positions decommissioned for lying outside the band.
    pub retired: Vec<PositionId>,
    /// `None` when there was nothing to redeploy.
    pub placement: Option<Placement>,
}

struct Checkpoint<S> {
    ledger: PositionLedger,
    balances: Balances,
    config: GridConfig,
    keeper: Option<Principal>,
    initialized: bool,
    tracker: TrackerCheckpoint,
    venue: S,
}

/// Manages a grid of concentrated-liquidity positions on one venue pool.
pub struct GridPositionManager<V: LiquidityVenue> {
    /// Identity the manager collects venue proceeds under.
    principal: Principal,
    owner: Principal,
    keeper: Option<Principal>,
    venue: V,
    config: GridConfig,
    initialized: bool,
    ledger: PositionLedger,
    balances: Balances,
    tracker: LifecycleTracker,
    lock: ReentrancyLock,
}

impl<V: LiquidityVenue> GridPositionManager<V> {
    /// Creates an uninitialized manager owned by `owner`.
    pub fn new(owner: Principal, venue: V) -> Self {
        Self {
            principal: Principal::new(format!("grid-manager-{}", uuid::Uuid::new_v4())),
            owner,
            keeper: None,
            venue,
            config: GridConfig::default(),
            initialized: false,
            ledger: PositionLedger::new(),
            balances: Balances::default(),
            tracker: LifecycleTracker::new(),
            lock: ReentrancyLock::new(),
        }
    }

    /// One-time activation: stores the configuration and grants the venue
    /// unlimited allowance on both assets.
    pub fn initialize(&mut self, caller: &Principal, config: GridConfig) -> Result<()> {
        self.ensure_owner(caller)?;
        if self.initialized {
            return Err(GridError::AlreadyInitialized);
        }
        config.validate()?;

        self.atomically("initialize", |m| {
            m.venue.approve(Asset::Token0, u128::MAX)?;
            m.venue.approve(Asset::Token1, u128::MAX)?;
            m.config = config;
            m.initialized = true;
            let now = m.venue.timestamp();
            let data = InitializedData {
                owner: m.owner.clone(),
                config: m.config.clone(),
            };
            m.tracker.record_initialized(now, data);
            Ok(())
        })
    }

    /// Pulls `amount0`/`amount1` from the caller and distributes them over a new grid.
    ///
    /// # Errors
    ///
    /// * [`GridError::InvalidAmount`] if the amounts do not fit the grid type.
    /// * [`GridError::SlippageTooHigh`] above 500 bps.
    /// * [`GridError::InsufficientBalance`] if no cell can receive liquidity.
    pub fn deposit(
        &mut self,
        caller: &Principal,
        amount0: u128,
        amount1: u128,
        params: DistributionParams,
    ) -> Result<Placement> {
        self.ensure_owner(caller)?;
        self.ensure_initialized()?;
        let slippage = Slippage::from_bps(params.slippage_bps)?;
        params.grid_type.validate_amounts(amount0, amount1)?;

        self.atomically("deposit", |m| {
            m.balances.credit(amount0, amount1)?;
            let placement = m.distribute(amount0, amount1, &params, slippage)?;
            m.record_distribution(LifecycleEventType::Deposited, &params, &placement, 0);
            Ok(placement)
        })
    }

    /// Decommissions every active position and pays the token balances to the caller.
    pub fn withdraw(&mut self, caller: &Principal) -> Result<Payout> {
        self.ensure_owner(caller)?;
        self.ensure_initialized()?;

        self.atomically("withdraw", |m| {
            m.decommission_active()?;
            let payout = m.balances.take_tokens();
            m.record_payout(LifecycleEventType::Withdrawn, caller, payout);
            Ok(payout)
        })
    }

    /// Collects fees from every active position and reinvests the idle balance.
    ///
    /// # Errors
    ///
    /// [`GridError::InsufficientFees`] unless the fees collected by this call
    /// exceed one of the configured minimums.
    pub fn compound(
        &mut self,
        caller: &Principal,
        params: DistributionParams,
    ) -> Result<CompoundReport> {
        self.ensure_operator(caller)?;
        self.ensure_initialized()?;
        let slippage = Slippage::from_bps(params.slippage_bps)?;

        self.atomically("compound", |m| {
            let (mut fees0, mut fees1) = (0u128, 0u128);
            for id in m.ledger.active().to_vec() {
                let (amount0, amount1) = m.collect_fees(id)?;
                fees0 = fees0.saturating_add(amount0);
                fees1 = fees1.saturating_add(amount1);
            }

            if fees0 <= m.config.token0_min_fees && fees1 <= m.config.token1_min_fees {
                debug!(
                    fees0,
                    fees1,
                    min0 = m.config.token0_min_fees,
                    min1 = m.config.token1_min_fees,
                    "Fees below compounding threshold"
                );
                return Err(GridError::InsufficientFees {
                    amount0: fees0,
                    amount1: fees1,
                });
            }

            let (total0, total1) = (m.balances.token0, m.balances.token1);
            let placement = m.distribute(total0, total1, &params, slippage)?;
            m.record_distribution(LifecycleEventType::Compounded, &params, &placement, 0);
            Ok(CompoundReport {
                fees0,
                fees1,
                placement,
            })
        })
    }

    /// Retires positions outside the band around the price and redeploys the proceeds.
    ///
    /// # Errors
    ///
    /// [`GridError::PriceDeviationTooHigh`] when the reference tick is too far
    /// from the time-weighted tick.
    pub fn sweep(&mut self, caller: &Principal, params: DistributionParams) -> Result<SweepReport> {
        self.ensure_operator(caller)?;
        self.ensure_initialized()?;
        let slippage = Slippage::from_bps(params.slippage_bps)?;

        self.atomically("sweep", |m| {
            let state = m.venue.current_state()?;
            let twap_tick = m.venue.time_weighted_tick(m.config.twap_window_secs)?;
            let deviation = (i64::from(state.tick) - i64::from(twap_tick)).abs();
            if deviation > i64::from(m.config.max_twap_deviation) {
                return Err(GridError::PriceDeviationTooHigh {
                    current: state.tick,
                    twap: twap_tick,
                    max_deviation: m.config.max_twap_deviation,
                });
            }

            let band = m
                .config
                .sweep_band(m.venue.tick_spacing(), params.grid_type)?;
            let retired: Vec<PositionId> = m
                .ledger
                .active_positions()
                .filter(|p| p.is_outside_band(state.tick, band))
                .map(|p| p.id)
                .collect();
            for id in &retired {
                m.decommission(*id)?;
            }

            if retired.is_empty() && !m.balances.has_tokens() {
                debug!(reference_tick = state.tick, band, "Nothing to sweep");
                return Ok(SweepReport {
                    reference_tick: state.tick,
                    twap_tick,
                    retired,
                    placement: None,
                });
            }

            let (total0, total1) = (m.balances.token0, m.balances.token1);
            let placement = m.distribute(total0, total1, &params, slippage)?;
            m.record_distribution(
                LifecycleEventType::Swept,
                &params,
                &placement,
                retired.len(),
            );
            Ok(SweepReport {
                reference_tick: state.tick,
                twap_tick,
                retired,
                placement: Some(placement),
            })
        })
    }

    /// Burns every tracked position and clears the ledger; returns how many were burned.
    ///
    /// Requires the active set to be empty. Closing an empty ledger is a no-op.
    pub fn close(&mut self, caller: &Principal) -> Result<usize> {
        self.ensure_owner(caller)?;
        self.ensure_initialized()?;

        self.atomically("close", |m| {
            let remaining = m.ledger.active_len();
            if remaining > 0 {
                return Err(GridError::ActivePositionsRemaining(remaining));
            }
            if m.ledger.is_empty() {
                return Ok(0);
            }

            let ids: Vec<PositionId> = m.ledger.all().map(|p| p.id).collect();
            let now = m.venue.timestamp();
            for id in &ids {
                m.venue.burn(*id)?;
                m.tracker.record_burned(now, *id);
            }
            m.ledger.clear();
            m.tracker.record_closed(now, ClosedData { burned: ids.len() });
            Ok(ids.len())
        })
    }

    /// Decommissions every active position and pays out all assets, native included.
    pub fn emergency_withdraw(&mut self, caller: &Principal) -> Result<Payout> {
        self.ensure_owner(caller)?;

        self.atomically("emergency_withdraw", |m| {
            warn!(active = m.ledger.active_len(), "Emergency withdraw requested");
            m.decommission_active()?;
            let payout = m.balances.take_all();
            m.record_payout(LifecycleEventType::EmergencyWithdrawn, caller, payout);
            Ok(payout)
        })
    }

    /// Pays out the stray native balance.
    ///
    /// # Errors
    ///
    /// [`GridError::NothingToRecover`] when there is none.
    pub fn recover_native(&mut self, caller: &Principal) -> Result<u128> {
        self.ensure_owner(caller)?;

        self.atomically("recover_native", |m| {
            let amount = m.balances.native;
            if amount == 0 {
                return Err(GridError::NothingToRecover);
            }
            m.balances.native = 0;
            let payout = Payout {
                native: amount,
                ..Payout::default()
            };
            m.record_payout(LifecycleEventType::NativeRecovered, caller, payout);
            Ok(amount)
        })
    }

    /// Native currency sent to the manager is always refused.
    pub fn receive_native(&self, amount: u128) -> Result<()> {
        warn!(amount, "Rejected native transfer");
        Err(GridError::NativeTransferRejected)
    }

    /// Records native currency that reached the manager without going through
    /// [`receive_native`](Self::receive_native).
    pub fn absorb_forced_native(&mut self, amount: u128) -> Result<()> {
        self.atomically("absorb_forced_native", |m| {
            m.balances.native = m
                .balances
                .native
                .checked_add(amount)
                .ok_or(GridError::InvalidAmount("native balance overflow"))?;
            let now = m.venue.timestamp();
            m.tracker.record_native_absorbed(now, NativeData { amount });
            Ok(())
        })
    }

    pub fn set_grid_step(&mut self, caller: &Principal, grid_step: u32) -> Result<()> {
        self.ensure_owner(caller)?;
        validate_grid_step(grid_step)?;
        self.update_config("grid_step", grid_step.to_string(), |c| {
            c.grid_step = grid_step;
        })
    }

    pub fn set_grid_quantity(&mut self, caller: &Principal, grid_quantity: u32) -> Result<()> {
        self.ensure_owner(caller)?;
        validate_grid_quantity(grid_quantity)?;
        self.update_config("grid_quantity", grid_quantity.to_string(), |c| {
            c.grid_quantity = grid_quantity;
        })
    }

    pub fn set_min_fees(
        &mut self,
        caller: &Principal,
        token0_min_fees: u128,
        token1_min_fees: u128,
    ) -> Result<()> {
        self.ensure_owner(caller)?;
        self.update_config(
            "min_fees",
            format!("{token0_min_fees}/{token1_min_fees}"),
            |c| {
                c.token0_min_fees = token0_min_fees;
                c.token1_min_fees = token1_min_fees;
            },
        )
    }

    pub fn set_straddle_policy(&mut self, caller: &Principal, policy: StraddlePolicy) -> Result<()> {
        self.ensure_owner(caller)?;
        self.update_config("straddle_policy", format!("{policy:?}"), |c| {
            c.straddle_policy = policy;
        })
    }

    /// Lets `keeper` call `compound` and `sweep`. `None` revokes it.
    pub fn set_keeper(&mut self, caller: &Principal, keeper: Option<Principal>) -> Result<()> {
        self.ensure_owner(caller)?;
        self.atomically("set_keeper", |m| {
            let value = keeper
                .as_ref()
                .map_or_else(|| "none".to_string(), Principal::to_string);
            m.keeper = keeper;
            let now = m.venue.timestamp();
            m.tracker.record_config_updated(
                now,
                ConfigUpdatedData {
                    field: "keeper".into(),
                    value,
                },
            );
            Ok(())
        })
    }

    // Views

    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    /// Identity under which venue proceeds are collected.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn keeper(&self) -> Option<&Principal> {
        self.keeper.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn grid_quantity(&self) -> u32 {
        self.config.grid_quantity
    }

    pub fn grid_step(&self) -> u32 {
        self.config.grid_step
    }

    /// Idle assets held by the manager.
    pub fn balances(&self) -> Balances {
        self.balances
    }

    /// Number of tracked positions, active or not.
    pub fn position_count(&self) -> usize {
        self.ledger.len()
    }

    pub fn active_position_ids(&self) -> &[PositionId] {
        self.ledger.active()
    }

    pub fn position(&self, id: PositionId) -> Result<&GridPosition> {
        self.ledger.position(id)
    }

    /// Position at `index` in mint order.
    pub fn position_at(&self, index: usize) -> Result<&GridPosition> {
        self.ledger
            .position_at(index)
            .ok_or(GridError::IndexOutOfBounds {
                index,
                len: self.ledger.len(),
            })
    }

    pub fn active_positions(&self) -> Vec<&GridPosition> {
        self.ledger.active_positions().collect()
    }

    pub fn is_active(&self, id: PositionId) -> bool {
        self.ledger.is_active(id)
    }

    /// Token amounts represented by all active liquidity at the current reference tick.
    pub fn total_liquidity_in_token_units(&self) -> Result<(u128, u128)> {
        let state = self.venue.current_state()?;
        let current = sqrt_price(state.tick)?;
        let mut totals = (0u128, 0u128);
        for position in self.ledger.active_positions() {
            let (amount0, amount1) = get_amounts_for_liquidity(
                current,
                sqrt_price(position.tick_lower)?,
                sqrt_price(position.tick_upper)?,
                position.liquidity,
                false,
            )
            .map_err(GridError::InvalidAmount)?;
            totals.0 = totals
                .0
                .checked_add(amount0)
                .ok_or(GridError::InvalidAmount("token0 total overflow"))?;
            totals.1 = totals
                .1
                .checked_add(amount1)
                .ok_or(GridError::InvalidAmount("token1 total overflow"))?;
        }
        Ok(totals)
    }

    pub fn is_reference_tick_in_any_active_position(&self) -> Result<bool> {
        let tick = self.venue.current_state()?.tick;
        Ok(self
            .ledger
            .active_positions()
            .any(|p| p.contains_tick(tick)))
    }

    /// Verifies `is_active(id) <=> liquidity(id) > 0` over the whole ledger.
    pub fn check_invariant(&self) -> Result<()> {
        self.ledger.check_invariant()
    }

    pub fn events(&self) -> &[LifecycleEvent] {
        self.tracker.events()
    }

    pub fn tracker(&self) -> &LifecycleTracker {
        &self.tracker
    }

    pub fn venue(&self) -> &V {
        &self.venue
    }

    /// Mutable venue access, for driving market state from outside the manager.
    pub fn venue_mut(&mut self) -> &mut V {
        &mut self.venue
    }

    /// A handle on the lock held by mutating operations.
    pub fn reentrancy_lock(&self) -> ReentrancyLock {
        self.lock.clone()
    }

    // Orchestration

    fn atomically<T>(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let _guard = self.lock.enter()?;
        let checkpoint = self.checkpoint();

        let result = f(self).and_then(|value| {
            self.ledger.check_invariant()?;
            Ok(value)
        });
        if let Err(err) = &result {
            self.rollback(checkpoint);
            warn!(operation, error = %err, "Operation rolled back");
        }
        result
    }

    fn checkpoint(&self) -> Checkpoint<V::Snapshot> {
        Checkpoint {
            ledger: self.ledger.clone(),
            balances: self.balances,
            config: self.config.clone(),
            keeper: self.keeper.clone(),
            initialized: self.initialized,
            tracker: self.tracker.checkpoint(),
            venue: self.venue.snapshot(),
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint<V::Snapshot>) {
        self.ledger = checkpoint.ledger;
        self.balances = checkpoint.balances;
        self.config = checkpoint.config;
        self.keeper = checkpoint.keeper;
        self.initialized = checkpoint.initialized;
        self.tracker.rollback(checkpoint.tracker);
        self.venue.restore(checkpoint.venue);
    }

    fn update_config(
        &mut self,
        field: &'static str,
        value: String,
        apply: impl FnOnce(&mut GridConfig),
    ) -> Result<()> {
        self.atomically("update_config", |m| {
            let mut config = m.config.clone();
            apply(&mut config);
            config.validate()?;
            m.config = config;
            let now = m.venue.timestamp();
            m.tracker.record_config_updated(
                now,
                ConfigUpdatedData {
                    field: field.into(),
                    value,
                },
            );
            Ok(())
        })
    }

    /// Spreads `total0`/`total1` over the grid around the current reference tick.
    fn distribute(
        &mut self,
        total0: u128,
        total1: u128,
        params: &DistributionParams,
        slippage: Slippage,
    ) -> Result<Placement> {
        let state = self.venue.current_state()?;
        let grid = calculate_grid_ticks(
            state.tick,
            params.grid_type,
            self.config.grid_quantity,
            self.config.grid_step,
            self.venue.tick_spacing(),
        )?;
        let cells = grid.cells(state.tick, self.config.straddle_policy);
        let weights = distribution_weights(cells.len(), params.distribution)?;
        let deadline = self.deadline()?;
        let current = sqrt_price(state.tick)?;

        debug!(
            reference_tick = state.tick,
            lower = grid.lower(),
            upper = grid.upper(),
            cells = cells.len(),
            total0,
            total1,
            "Distributing capital"
        );

        let mut placement = Placement {
            reference_tick: state.tick,
            ..Placement::default()
        };
        for (&(tick_lower, tick_upper), weight) in cells.iter().zip(weights) {
            let cell = GridCell::allocate(tick_lower, tick_upper, state.tick, weight, total0, total1)?;
            if !cell.is_fundable() {
                debug!(tick_lower, tick_upper, side = ?cell.side(), "Cell skipped");
                continue;
            }
            let liquidity = get_liquidity_for_amounts(
                current,
                sqrt_price(tick_lower)?,
                sqrt_price(tick_upper)?,
                cell.token0_share,
                cell.token1_share,
            )
            .map_err(GridError::InvalidAmount)?;
            if liquidity == 0 {
                debug!(tick_lower, tick_upper, "Cell share backs no liquidity");
                continue;
            }

            let (min0, min1) = slippage.min_amounts(cell.token0_share, cell.token1_share);
            self.place(&cell, min0, min1, deadline, &mut placement)?;
        }

        if placement.cells_placed == 0 {
            return Err(GridError::InsufficientBalance);
        }
        Ok(placement)
    }

    /// Mints a position for `cell`, or tops up the one already covering its range.
    fn place(
        &mut self,
        cell: &GridCell,
        amount0_min: u128,
        amount1_min: u128,
        deadline: u64,
        placement: &mut Placement,
    ) -> Result<()> {
        let (id, result, minted) = match self.ledger.find(cell.tick_lower, cell.tick_upper) {
            Some(id) => {
                let result = self.venue.increase_liquidity(&IncreaseLiquidityParams {
                    position: id,
                    amount0_desired: cell.token0_share,
                    amount1_desired: cell.token1_share,
                    amount0_min,
                    amount1_min,
                    deadline,
                })?;
                (id, result, false)
            }
            None => {
                let minted = self.venue.mint(&MintParams {
                    tick_lower: cell.tick_lower,
                    tick_upper: cell.tick_upper,
                    amount0_desired: cell.token0_share,
                    amount1_desired: cell.token1_share,
                    amount0_min,
                    amount1_min,
                    deadline,
                })?;
                let result = LiquidityResult {
                    liquidity: minted.liquidity,
                    amount0: minted.amount0,
                    amount1: minted.amount1,
                };
                (minted.position, result, true)
            }
        };

        self.ledger
            .upsert(id, cell.tick_lower, cell.tick_upper, result.liquidity)?;
        self.balances.debit(result.amount0, result.amount1)?;
        let new_liquidity = self.ledger.position(id)?.liquidity;

        let now = self.venue.timestamp();
        self.tracker.record_cell_placed(
            now,
            id,
            minted,
            CellPlacedData {
                tick_lower: cell.tick_lower,
                tick_upper: cell.tick_upper,
                liquidity_delta: result.liquidity,
                new_liquidity,
                amount0: result.amount0,
                amount1: result.amount1,
            },
        );

        placement.cells_placed += 1;
        if minted {
            placement.minted.push(id);
        } else {
            placement.increased.push(id);
        }
        placement.amount0 = placement.amount0.saturating_add(result.amount0);
        placement.amount1 = placement.amount1.saturating_add(result.amount1);
        placement.liquidity = placement.liquidity.saturating_add(result.liquidity);
        Ok(())
    }

    fn decommission_active(&mut self) -> Result<()> {
        for id in self.ledger.active().to_vec() {
            self.decommission(id)?;
        }
        Ok(())
    }

    /// Removes all liquidity from `id` and collects everything it owes.
    fn decommission(&mut self, id: PositionId) -> Result<DecommissionedData> {
        let liquidity = self.ledger.position(id)?.liquidity;
        let deadline = self.deadline()?;

        let (amount0, amount1) = if liquidity > 0 {
            self.venue.decrease_liquidity(&DecreaseLiquidityParams {
                position: id,
                liquidity,
                amount0_min: 0,
                amount1_min: 0,
                deadline,
            })?
        } else {
            (0, 0)
        };
        let (collected0, collected1) = self
            .venue
            .collect(&CollectParams::all(id, self.principal.clone()))?;

        self.ledger.decrease(id, liquidity)?;
        self.balances.credit(collected0, collected1)?;

        let data = DecommissionedData {
            liquidity_removed: liquidity,
            amount0,
            amount1,
            fees0: collected0.saturating_sub(amount0),
            fees1: collected1.saturating_sub(amount1),
        };
        let now = self.venue.timestamp();
        self.tracker.record_decommissioned(now, id, data.clone());
        Ok(data)
    }

    fn collect_fees(&mut self, id: PositionId) -> Result<(u128, u128)> {
        let (fees0, fees1) = self
            .venue
            .collect(&CollectParams::all(id, self.principal.clone()))?;
        self.balances.credit(fees0, fees1)?;
        if fees0 > 0 || fees1 > 0 {
            let now = self.venue.timestamp();
            self.tracker
                .record_fees_collected(now, id, FeesData { fees0, fees1 });
        }
        Ok((fees0, fees1))
    }

    fn record_distribution(
        &mut self,
        event_type: LifecycleEventType,
        params: &DistributionParams,
        placement: &Placement,
        retired: usize,
    ) {
        let now = self.venue.timestamp();
        self.tracker.record_distribution(
            now,
            event_type,
            DistributionData {
                grid_type: params.grid_type,
                distribution: params.distribution,
                reference_tick: placement.reference_tick,
                cells_placed: placement.cells_placed,
                amount0: placement.amount0,
                amount1: placement.amount1,
                retired,
            },
        );
        info!(
            event = ?event_type,
            active = self.ledger.active_len(),
            idle0 = self.balances.token0,
            idle1 = self.balances.token1,
            "Grid updated"
        );
    }

    fn record_payout(&mut self, event_type: LifecycleEventType, recipient: &Principal, payout: Payout) {
        let now = self.venue.timestamp();
        self.tracker.record_payout(
            now,
            event_type,
            PayoutData {
                recipient: recipient.clone(),
                token0: payout.token0,
                token1: payout.token1,
                native: payout.native,
            },
        );
    }

    fn deadline(&self) -> Result<u64> {
        self.venue
            .timestamp()
            .checked_add(self.config.deadline_secs)
            .ok_or_else(|| GridError::InvalidConfiguration("deadline overflows the venue clock".into()))
    }

    fn ensure_owner(&self, caller: &Principal) -> Result<()> {
        if caller != &self.owner {
            return Err(GridError::Unauthorized(caller.to_string()));
        }
        Ok(())
    }

    /// Owner or keeper.
    fn ensure_operator(&self, caller: &Principal) -> Result<()> {
        if caller == &self.owner || self.keeper.as_ref() == Some(caller) {
            return Ok(());
        }
        Err(GridError::Unauthorized(caller.to_string()))
    }

    fn ensure_initialized(&self) -> Result<()> {
        if !self.initialized {
            return Err(GridError::NotInitialized);
        }
        Ok(())
    }
}

fn sqrt_price(tick: i32) -> Result<Decimal> {
    tick_to_sqrt_price(tick).map_err(GridError::RangeOverflow)
}
