//! Grid backtest over a tick path.
//!
//! Each step moves the venue to the next tick, lets time pass there, credits
//! the step's swap fees to the in-range positions and runs one keeper round.
//! The capital is withdrawn after the last step.

use crate::price_path::prices_to_ticks;
use crate::volume::VolumeModel;
use grid_lp_domain::config::GridConfig;
use grid_lp_domain::entities::Principal;
use grid_lp_domain::error::GridError;
use grid_lp_domain::value_objects::{Balances, Payout};
use grid_lp_execution::keeper::run_maintenance;
use grid_lp_execution::manager::{DistributionParams, GridPositionManager};
use grid_lp_protocols::memory::MemoryVenue;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that stop a backtest.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("price path is empty")]
    EmptyPath,

    #[error("price conversion failed: {0}")]
    PriceConversion(&'static str),

    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Backtest parameters.
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub grid: GridConfig,
    pub params: DistributionParams,
    /// Initial deposit.
    pub amount0: u128,
    pub amount1: u128,
    pub tick_spacing: i32,
    /// Venue fee tier in hundredths of a bip (3000 = 0.3%).
    pub fee_tier: u32,
    /// Seconds spent at each tick of the path.
    pub step_secs: u64,
    pub start_time: u64,
}

impl BacktestConfig {
    pub fn new(grid: GridConfig, params: DistributionParams, amount0: u128, amount1: u128) -> Self {
        Self {
            grid,
            params,
            amount0,
            amount1,
            tick_spacing: 10,
            fee_tier: 3000,
            step_secs: 3600,
            start_time: 1_700_000_000,
        }
    }
}

/// State after one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacktestSnapshot {
    pub step: usize,
    pub tick: i32,
    /// Some active position contains the tick.
    pub in_range: bool,
    pub active_positions: usize,
    /// Fees credited to the grid during this step.
    pub fees0: u128,
    pub fees1: u128,
    /// Token amounts held by the active liquidity.
    pub deployed0: u128,
    pub deployed1: u128,
    pub idle_balance: Balances,
    pub compounded: bool,
    pub swept: bool,
    /// Keeper actions that failed for a reason other than an economic guard.
    pub failures: u32,
}

/// Totals over a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacktestSummary {
    pub steps: usize,
    pub compounds: u64,
    pub sweeps: u64,
    /// Rounds where neither action ran nor failed.
    pub skipped_rounds: u64,
    pub failures: u64,
    pub total_fees0: u128,
    pub total_fees1: u128,
    /// Share of steps with the tick inside an active position.
    pub time_in_range: Decimal,
    pub final_tick: i32,
    pub final_balances: Balances,
    /// Positions ever minted.
    pub final_position_count: usize,
    pub final_active_positions: usize,
    /// What the closing withdraw paid out.
    pub payout: Payout,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub snapshots: Vec<BacktestSnapshot>,
    pub summary: BacktestSummary,
}

/// Replays tick paths through a fresh grid manager.
pub struct GridBacktest {
    config: BacktestConfig,
    owner: Principal,
}

impl GridBacktest {
    /// # Errors
    ///
    /// Fails if the grid configuration is invalid.
    pub fn new(config: BacktestConfig) -> Result<Self, BacktestError> {
        config.grid.validate()?;
        Ok(Self {
            config,
            owner: Principal::new("backtest-owner"),
        })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Runs over a price path, converting it to ticks first.
    pub fn run_prices(
        &self,
        prices: &[Decimal],
        volume: &mut dyn VolumeModel,
    ) -> Result<BacktestResult, BacktestError> {
        let ticks = prices_to_ticks(prices).map_err(BacktestError::PriceConversion)?;
        self.run(&ticks, volume)
    }

    /// Deposits at the first tick, then steps through every tick of the path.
    pub fn run(
        &self,
        ticks: &[i32],
        volume: &mut dyn VolumeModel,
    ) -> Result<BacktestResult, BacktestError> {
        let first = *ticks.first().ok_or(BacktestError::EmptyPath)?;
        let config = &self.config;

        let venue = MemoryVenue::new(
            first,
            config.tick_spacing,
            config.fee_tier,
            config.start_time,
        );
        let mut manager = GridPositionManager::new(self.owner.clone(), venue);
        manager.initialize(&self.owner, config.grid.clone())?;
        manager.deposit(&self.owner, config.amount0, config.amount1, config.params)?;

        info!(
            steps = ticks.len(),
            start_tick = first,
            grid_type = ?config.params.grid_type,
            distribution = ?config.params.distribution,
            "Starting grid backtest"
        );

        let mut snapshots = Vec::with_capacity(ticks.len());
        let mut previous = first;
        for (step, &tick) in ticks.iter().enumerate() {
            snapshots.push(self.step(&mut manager, step, previous, tick, volume)?);
            previous = tick;
        }

        let summary = self.summarize(&mut manager, &snapshots)?;
        info!(
            compounds = summary.compounds,
            sweeps = summary.sweeps,
            failures = summary.failures,
            fees0 = summary.total_fees0,
            fees1 = summary.total_fees1,
            time_in_range = %summary.time_in_range,
            "Grid backtest finished"
        );
        Ok(BacktestResult { snapshots, summary })
    }

    fn step(
        &self,
        manager: &mut GridPositionManager<MemoryVenue>,
        step: usize,
        previous: i32,
        tick: i32,
        volume: &mut dyn VolumeModel,
    ) -> Result<BacktestSnapshot, BacktestError> {
        let venue = manager.venue_mut();
        venue.set_tick(tick);
        venue.advance_time(self.config.step_secs);

        // Fees are paid in the token swapped in.
        let fee = volume.next_fee(step, self.config.fee_tier);
        let (fee0, fee1) = match tick.cmp(&previous) {
            std::cmp::Ordering::Greater => (0, fee),
            std::cmp::Ordering::Less => (fee, 0),
            std::cmp::Ordering::Equal => (fee / 2, fee - fee / 2),
        };
        let (fees0, fees1) = venue.accrue_fees(fee0, fee1);
        let in_range = manager.is_reference_tick_in_any_active_position()?;

        let report = run_maintenance(manager, &self.owner, self.config.params, step as u64 + 1);
        let (deployed0, deployed1) = manager.total_liquidity_in_token_units()?;
        let failures = u32::from(report.compound.is_failed()) + u32::from(report.sweep.is_failed());

        debug!(step, tick, in_range, fees0, fees1, "Backtest step");
        Ok(BacktestSnapshot {
            step,
            tick,
            in_range,
            active_positions: manager.active_position_ids().len(),
            fees0,
            fees1,
            deployed0,
            deployed1,
            idle_balance: manager.balances(),
            compounded: report.compound.is_executed(),
            swept: report.sweep.is_executed(),
            failures,
        })
    }

    fn summarize(
        &self,
        manager: &mut GridPositionManager<MemoryVenue>,
        snapshots: &[BacktestSnapshot],
    ) -> Result<BacktestSummary, BacktestError> {
        let steps = snapshots.len();
        let in_range_steps = snapshots.iter().filter(|s| s.in_range).count();
        let time_in_range = if steps == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(in_range_steps) / Decimal::from(steps)
        };

        let count = |f: fn(&BacktestSnapshot) -> bool| snapshots.iter().filter(|s| f(s)).count() as u64;

        let mut summary = BacktestSummary {
            steps,
            compounds: count(|s| s.compounded),
            sweeps: count(|s| s.swept),
            skipped_rounds: count(|s| !s.compounded && !s.swept && s.failures == 0),
            failures: snapshots.iter().map(|s| u64::from(s.failures)).sum(),
            total_fees0: snapshots.iter().map(|s| s.fees0).sum(),
            total_fees1: snapshots.iter().map(|s| s.fees1).sum(),
            time_in_range,
            final_tick: manager.venue().tick(),
            final_balances: manager.balances(),
            final_position_count: manager.position_count(),
            final_active_positions: manager.active_position_ids().len(),
            payout: Payout::default(),
        };
        summary.payout = manager.withdraw(&self.owner)?;
        Ok(summary)
    }
}
