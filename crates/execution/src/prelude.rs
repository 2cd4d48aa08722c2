//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use grid_lp_execution::prelude::*;
//! ```

pub use crate::guard::{ReentrancyGuard, ReentrancyLock};
pub use crate::keeper::{
    ActionOutcome, Keeper, KeeperConfig, KeeperStats, RoundReport, run_maintenance,
};
pub use crate::ledger::PositionLedger;
pub use crate::lifecycle::{
    AggregateStats, EventData, LifecycleEvent, LifecycleEventType, LifecycleTracker,
    PositionSummary,
};
pub use crate::manager::{
    CompoundReport, DistributionParams, GridPositionManager, Placement, SweepReport,
};
