//! Lifecycle events emitted by the grid manager.

use grid_lp_domain::config::GridConfig;
use grid_lp_domain::entities::{PositionId, Principal};
use grid_lp_domain::enums::{DistributionKind, GridType};
use serde::{Deserialize, Serialize};

/// Type of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleEventType {
    /// Manager was initialized.
    Initialized,
    /// A new position was minted for a cell.
    PositionMinted,
    /// An existing cell position received more liquidity.
    LiquidityIncreased,
    /// A position was fully decreased and collected.
    PositionDecommissioned,
    /// Fees were collected from a live position.
    FeesCollected,
    /// Capital was distributed by a deposit.
    Deposited,
    /// Fees were reinvested.
    Compounded,
    /// Out-of-band positions were retired and proceeds redeployed.
    Swept,
    /// Assets were paid out to a caller.
    Withdrawn,
    /// An emptied position was burned.
    PositionBurned,
    /// The ledger was reset.
    Closed,
    /// Everything, native included, was paid out.
    EmergencyWithdrawn,
    /// Stray native currency was recorded.
    NativeAbsorbed,
    /// Stray native currency was paid out.
    NativeRecovered,
    /// A configuration value changed.
    ConfigUpdated,
}

/// A lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Event ID.
    pub id: String,
    /// Event type.
    pub event_type: LifecycleEventType,
    /// Position the event is about, if any.
    pub position: Option<PositionId>,
    /// Venue clock when the event was recorded.
    pub venue_time: u64,
    /// Wall-clock timestamp.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Event-specific data.
    pub data: EventData,
}

impl LifecycleEvent {
    pub fn new(event_type: LifecycleEventType, venue_time: u64, data: EventData) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            position: None,
            venue_time,
            timestamp: chrono::Utc::now(),
            data,
        }
    }

    /// Attaches the position the event is about.
    #[must_use]
    pub fn with_position(mut self, position: PositionId) -> Self {
        self.position = Some(position);
        self
    }
}

/// Event-specific data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventData {
    Initialized(InitializedData),
    CellPlaced(CellPlacedData),
    Decommissioned(DecommissionedData),
    Fees(FeesData),
    Distribution(DistributionData),
    Payout(PayoutData),
    Closed(ClosedData),
    ConfigUpdated(ConfigUpdatedData),
    Native(NativeData),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializedData {
    pub owner: Principal,
    pub config: GridConfig,
}

/// Liquidity placed into one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPlacedData {
    pub tick_lower: i32,
    pub tick_upper: i32,
    /// Liquidity added by this placement.
    pub liquidity_delta: u128,
    /// Position liquidity after the placement.
    pub new_liquidity: u128,
    pub amount0: u128,
    pub amount1: u128,
}

/// A position emptied and collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecommissionedData {
    pub liquidity_removed: u128,
    /// Token0 released by the liquidity.
    pub amount0: u128,
    /// Token1 released by the liquidity.
    pub amount1: u128,
    /// Token0 fees collected on top of the released amount.
    pub fees0: u128,
    /// Token1 fees collected on top of the released amount.
    pub fees1: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeesData {
    pub fees0: u128,
    pub fees1: u128,
}

/// Outcome of one distribution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionData {
    pub grid_type: GridType,
    pub distribution: DistributionKind,
    pub reference_tick: i32,
    pub cells_placed: usize,
    pub amount0: u128,
    pub amount1: u128,
    /// Positions retired before the distribution (sweep only).
    pub retired: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutData {
    pub recipient: Principal,
    pub token0: u128,
    pub token1: u128,
    pub native: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedData {
    pub burned: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdatedData {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeData {
    pub amount: u128,
}
