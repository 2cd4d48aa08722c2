//! Keeper for scheduled grid maintenance.
//!
//! A keeper round attempts `compound` and then `sweep`. Economic guards
//! (insufficient fees or balance, price deviation) mean there was nothing to
//! do; any other error is a failure worth reporting.

use crate::manager::{CompoundReport, DistributionParams, GridPositionManager, SweepReport};
use grid_lp_domain::entities::Principal;
use grid_lp_domain::error::GridError;
use grid_lp_protocols::venue::LiquidityVenue;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// Outcome of one keeper action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome<T> {
    /// The action ran and committed.
    Executed(T),
    /// An economic guard declined the action.
    Skipped(GridError),
    /// The action failed for any other reason.
    Failed(GridError),
}

impl<T> ActionOutcome<T> {
    fn from_result(result: Result<T, GridError>) -> Self {
        match result {
            Ok(report) => Self::Executed(report),
            Err(err) if err.is_economic_guard() => Self::Skipped(err),
            Err(err) => Self::Failed(err),
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcome of one keeper round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    pub round: u64,
    pub compound: ActionOutcome<CompoundReport>,
    pub sweep: ActionOutcome<SweepReport>,
}

impl RoundReport {
    /// Neither action committed and neither failed.
    pub fn is_idle(&self) -> bool {
        !self.compound.is_executed()
            && !self.sweep.is_executed()
            && !self.compound.is_failed()
            && !self.sweep.is_failed()
    }
}

/// Runs one maintenance round directly on a manager.
pub fn run_maintenance<V: LiquidityVenue>(
    manager: &mut GridPositionManager<V>,
    caller: &Principal,
    params: DistributionParams,
    round: u64,
) -> RoundReport {
    let compound = ActionOutcome::from_result(manager.compound(caller, params));
    let sweep = ActionOutcome::from_result(manager.sweep(caller, params));

    if let ActionOutcome::Failed(err) = &compound {
        warn!(round, action = "compound", error = %err, "Keeper action failed");
    }
    if let ActionOutcome::Failed(err) = &sweep {
        warn!(round, action = "sweep", error = %err, "Keeper action failed");
    }

    debug!(
        round,
        compounded = compound.is_executed(),
        swept = sweep.is_executed(),
        "Keeper round finished"
    );
    RoundReport {
        round,
        compound,
        sweep,
    }
}

/// Keeper schedule and distribution settings.
#[derive(Debug, Clone)]
pub struct KeeperConfig {
    /// Time between rounds.
    pub interval: Duration,
    /// Stop after this many rounds. `None` runs until stopped.
    pub max_rounds: Option<u64>,
    pub params: DistributionParams,
}

/// Counters over the rounds a keeper ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeeperStats {
    pub rounds: u64,
    pub compounds: u64,
    pub sweeps: u64,
    pub idle_rounds: u64,
    pub failures: u64,
}

impl KeeperStats {
    fn record(&mut self, report: &RoundReport) {
        self.rounds += 1;
        if report.compound.is_executed() {
            self.compounds += 1;
        }
        if report.sweep.is_executed() {
            self.sweeps += 1;
        }
        if report.compound.is_failed() {
            self.failures += 1;
        }
        if report.sweep.is_failed() {
            self.failures += 1;
        }
        if report.is_idle() {
            self.idle_rounds += 1;
        }
    }
}

/// Drives compound and sweep on a shared manager at a fixed interval.
pub struct Keeper<V: LiquidityVenue> {
    manager: Arc<Mutex<GridPositionManager<V>>>,
    principal: Principal,
    config: KeeperConfig,
    running: Arc<AtomicBool>,
    stats: Mutex<KeeperStats>,
}

impl<V: LiquidityVenue> Keeper<V> {
    pub fn new(
        manager: Arc<Mutex<GridPositionManager<V>>>,
        principal: Principal,
        config: KeeperConfig,
    ) -> Self {
        Self {
            manager,
            principal,
            config,
            running: Arc::new(AtomicBool::new(false)),
            stats: Mutex::new(KeeperStats::default()),
        }
    }

    /// Runs a single round now.
    pub async fn run_round(&self) -> RoundReport {
        let mut stats = self.stats.lock().await;
        let round = stats.rounds + 1;
        let report = {
            let mut manager = self.manager.lock().await;
            run_maintenance(&mut manager, &self.principal, self.config.params, round)
        };
        stats.record(&report);
        report
    }

    /// Runs rounds on the configured interval until stopped or the round limit is hit.
    pub async fn run(&self) -> KeeperStats {
        self.running.store(true, Ordering::SeqCst);
        info!(
            keeper = %self.principal,
            interval_ms = self.config.interval.as_millis() as u64,
            max_rounds = ?self.config.max_rounds,
            "Starting keeper"
        );

        let mut ticker = interval(self.config.interval);
        while self.running.load(Ordering::SeqCst) {
            ticker.tick().await;
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            let report = self.run_round().await;
            if let Some(max_rounds) = self.config.max_rounds
                && report.round >= max_rounds
            {
                break;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        let stats = self.stats().await;
        info!(
            rounds = stats.rounds,
            compounds = stats.compounds,
            sweeps = stats.sweeps,
            failures = stats.failures,
            "Keeper stopped"
        );
        stats
    }

    /// Asks a running keeper to stop after its current round.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn stats(&self) -> KeeperStats {
        self.stats.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_lp_domain::config::GridConfig;
    use grid_lp_domain::enums::{DistributionKind, GridType};
    use grid_lp_protocols::memory::MemoryVenue;

    fn params() -> DistributionParams {
        DistributionParams::new(100, GridType::Neutral, DistributionKind::Flat)
    }

    fn funded_manager(owner: &Principal) -> GridPositionManager<MemoryVenue> {
        let venue = MemoryVenue::new(1005, 10, 3000, 10_000);
        let mut manager = GridPositionManager::new(owner.clone(), venue);
        manager
            .initialize(owner, GridConfig::new(6, 2).unwrap())
            .unwrap();
        manager
            .deposit(owner, 6_000_000, 6_000_000, params())
            .unwrap();
        // Give the oracle a full look-back window.
        manager.venue_mut().advance_time(600);
        manager
    }

    #[test]
    fn test_outcome_classification() {
        let skipped: ActionOutcome<()> =
            ActionOutcome::from_result(Err(GridError::InsufficientBalance));
        assert!(matches!(skipped, ActionOutcome::Skipped(_)));

        let failed: ActionOutcome<()> =
            ActionOutcome::from_result(Err(GridError::Venue("down".into())));
        assert!(failed.is_failed());
    }

    #[test]
    fn test_maintenance_compounds_after_fees() {
        let owner = Principal::new("owner");
        let mut manager = funded_manager(&owner);

        // Fees land on the position just above the price.
        manager.venue_mut().set_tick(1025);
        manager.venue_mut().accrue_fees(50_000, 50_000);
        manager.venue_mut().set_tick(1005);

        let report = run_maintenance(&mut manager, &owner, params(), 1);
        assert!(report.compound.is_executed());
        manager.check_invariant().unwrap();
    }

    #[tokio::test]
    async fn test_keeper_rounds_are_bounded() {
        let owner = Principal::new("owner");
        let keeper_id = Principal::new("keeper");
        let mut manager = funded_manager(&owner);
        manager.set_keeper(&owner, Some(keeper_id.clone())).unwrap();

        let keeper = Keeper::new(
            Arc::new(Mutex::new(manager)),
            keeper_id,
            KeeperConfig {
                interval: Duration::from_millis(1),
                max_rounds: Some(3),
                params: params(),
            },
        );
        let stats = keeper.run().await;
        assert_eq!(stats.rounds, 3);
        assert_eq!(stats.failures, 0);
        assert!(!keeper.is_running());
    }

    #[tokio::test]
    async fn test_stranger_rounds_fail() {
        let owner = Principal::new("owner");
        let manager = funded_manager(&owner);
        let keeper = Keeper::new(
            Arc::new(Mutex::new(manager)),
            Principal::new("stranger"),
            KeeperConfig {
                interval: Duration::from_millis(1),
                max_rounds: Some(1),
                params: params(),
            },
        );
        let report = keeper.run_round().await;
        assert!(report.compound.is_failed());
        assert!(report.sweep.is_failed());
        assert_eq!(keeper.stats().await.failures, 2);
    }
}
