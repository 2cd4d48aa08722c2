//! Lifecycle tracker for grid position history.

use super::{
    CellPlacedData, ClosedData, ConfigUpdatedData, DecommissionedData, DistributionData,
    EventData, FeesData, InitializedData, LifecycleEvent, LifecycleEventType, NativeData,
    PayoutData,
};
use grid_lp_domain::entities::PositionId;
use std::collections::HashMap;
use tracing::{debug, info};

/// Summary of one position's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionSummary {
    pub position: PositionId,
    pub tick_lower: i32,
    pub tick_upper: i32,
    /// When the position was minted.
    pub opened_at: chrono::DateTime<chrono::Utc>,
    /// When the position was burned.
    pub burned_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Current liquidity as last recorded.
    pub liquidity: u128,
    /// Number of placements (mint included).
    pub placements: u32,
    /// Number of times the position was emptied.
    pub decommissions: u32,
    pub total_fees0: u128,
    pub total_fees1: u128,
}

impl PositionSummary {
    pub fn is_open(&self) -> bool {
        self.burned_at.is_none()
    }
}

/// Aggregate statistics across all positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub total_positions: u32,
    pub open_positions: u32,
    pub burned_positions: u32,
    pub total_fees0: u128,
    pub total_fees1: u128,
    pub deposits: u32,
    pub compounds: u32,
    pub sweeps: u32,
}

/// Saved tracker state for rollback.
#[derive(Debug, Clone)]
pub struct TrackerCheckpoint {
    events: usize,
    summaries: HashMap<PositionId, PositionSummary>,
}

/// Records lifecycle events and per-position summaries.
#[derive(Debug, Clone, Default)]
pub struct LifecycleTracker {
    events: Vec<LifecycleEvent>,
    summaries: HashMap<PositionId, PositionSummary>,
}

impl LifecycleTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_initialized(&mut self, venue_time: u64, data: InitializedData) {
        info!(
            owner = %data.owner,
            grid_quantity = data.config.grid_quantity,
            grid_step = data.config.grid_step,
            straddle_policy = ?data.config.straddle_policy,
            "Grid manager initialized"
        );
        self.push(LifecycleEvent::new(
            LifecycleEventType::Initialized,
            venue_time,
            EventData::Initialized(data),
        ));
    }

    /// Records liquidity placed into a cell, minted or increased.
    pub fn record_cell_placed(
        &mut self,
        venue_time: u64,
        position: PositionId,
        minted: bool,
        data: CellPlacedData,
    ) {
        let event_type = if minted {
            LifecycleEventType::PositionMinted
        } else {
            LifecycleEventType::LiquidityIncreased
        };
        let event = LifecycleEvent::new(
            event_type,
            venue_time,
            EventData::CellPlaced(data.clone()),
        )
        .with_position(position);

        let summary = self
            .summaries
            .entry(position)
            .or_insert_with(|| PositionSummary {
                position,
                tick_lower: data.tick_lower,
                tick_upper: data.tick_upper,
                opened_at: event.timestamp,
                burned_at: None,
                liquidity: 0,
                placements: 0,
                decommissions: 0,
                total_fees0: 0,
                total_fees1: 0,
            });
        summary.liquidity = data.new_liquidity;
        summary.placements += 1;

        info!(
            position = %position,
            minted,
            tick_lower = data.tick_lower,
            tick_upper = data.tick_upper,
            liquidity = data.liquidity_delta,
            amount0 = data.amount0,
            amount1 = data.amount1,
            "Cell funded"
        );
        self.push(event);
    }

    pub fn record_decommissioned(
        &mut self,
        venue_time: u64,
        position: PositionId,
        data: DecommissionedData,
    ) {
        if let Some(summary) = self.summaries.get_mut(&position) {
            summary.liquidity = 0;
            summary.decommissions += 1;
            summary.total_fees0 = summary.total_fees0.saturating_add(data.fees0);
            summary.total_fees1 = summary.total_fees1.saturating_add(data.fees1);
        }

        info!(
            position = %position,
            liquidity = data.liquidity_removed,
            amount0 = data.amount0,
            amount1 = data.amount1,
            fees0 = data.fees0,
            fees1 = data.fees1,
            "Position decommissioned"
        );
        self.push(
            LifecycleEvent::new(
                LifecycleEventType::PositionDecommissioned,
                venue_time,
                EventData::Decommissioned(data),
            )
            .with_position(position),
        );
    }

    pub fn record_fees_collected(&mut self, venue_time: u64, position: PositionId, data: FeesData) {
        if let Some(summary) = self.summaries.get_mut(&position) {
            summary.total_fees0 = summary.total_fees0.saturating_add(data.fees0);
            summary.total_fees1 = summary.total_fees1.saturating_add(data.fees1);
        }

        debug!(
            position = %position,
            fees0 = data.fees0,
            fees1 = data.fees1,
            "Fees collected"
        );
        self.push(
            LifecycleEvent::new(
                LifecycleEventType::FeesCollected,
                venue_time,
                EventData::Fees(data),
            )
            .with_position(position),
        );
    }

    /// Records a completed deposit, compound or sweep pass.
    pub fn record_distribution(
        &mut self,
        venue_time: u64,
        event_type: LifecycleEventType,
        data: DistributionData,
    ) {
        info!(
            event = ?event_type,
            grid_type = ?data.grid_type,
            distribution = ?data.distribution,
            reference_tick = data.reference_tick,
            cells_placed = data.cells_placed,
            retired = data.retired,
            amount0 = data.amount0,
            amount1 = data.amount1,
            "Grid distribution recorded"
        );
        self.push(LifecycleEvent::new(
            event_type,
            venue_time,
            EventData::Distribution(data),
        ));
    }

    /// Records a withdraw, emergency withdraw or native recovery.
    pub fn record_payout(
        &mut self,
        venue_time: u64,
        event_type: LifecycleEventType,
        data: PayoutData,
    ) {
        info!(
            event = ?event_type,
            recipient = %data.recipient,
            token0 = data.token0,
            token1 = data.token1,
            native = data.native,
            "Assets paid out"
        );
        self.push(LifecycleEvent::new(
            event_type,
            venue_time,
            EventData::Payout(data),
        ));
    }

    pub fn record_burned(&mut self, venue_time: u64, position: PositionId) {
        let now = chrono::Utc::now();
        if let Some(summary) = self.summaries.get_mut(&position) {
            summary.burned_at = Some(now);
        }

        debug!(position = %position, "Position burned");
        self.push(
            LifecycleEvent::new(
                LifecycleEventType::PositionBurned,
                venue_time,
                EventData::Closed(ClosedData { burned: 1 }),
            )
            .with_position(position),
        );
    }

    pub fn record_closed(&mut self, venue_time: u64, data: ClosedData) {
        info!(burned = data.burned, "Grid ledger closed");
        self.push(LifecycleEvent::new(
            LifecycleEventType::Closed,
            venue_time,
            EventData::Closed(data),
        ));
    }

    pub fn record_native_absorbed(&mut self, venue_time: u64, data: NativeData) {
        info!(amount = data.amount, "Stray native balance recorded");
        self.push(LifecycleEvent::new(
            LifecycleEventType::NativeAbsorbed,
            venue_time,
            EventData::Native(data),
        ));
    }

    pub fn record_config_updated(&mut self, venue_time: u64, data: ConfigUpdatedData) {
        info!(field = %data.field, value = %data.value, "Configuration updated");
        self.push(LifecycleEvent::new(
            LifecycleEventType::ConfigUpdated,
            venue_time,
            EventData::ConfigUpdated(data),
        ));
    }

    fn push(&mut self, event: LifecycleEvent) {
        self.events.push(event);
    }

    pub fn checkpoint(&self) -> TrackerCheckpoint {
        TrackerCheckpoint {
            events: self.events.len(),
            summaries: self.summaries.clone(),
        }
    }

    /// Drops every event recorded after `checkpoint`.
    pub fn rollback(&mut self, checkpoint: TrackerCheckpoint) {
        let dropped = self.events.len().saturating_sub(checkpoint.events);
        self.events.truncate(checkpoint.events);
        self.summaries = checkpoint.summaries;
        debug!(dropped, "Lifecycle events rolled back");
    }

    /// All events in recording order.
    pub fn events(&self) -> &[LifecycleEvent] {
        &self.events
    }

    /// Events about one position.
    pub fn events_for(&self, position: PositionId) -> Vec<&LifecycleEvent> {
        self.events
            .iter()
            .filter(|e| e.position == Some(position))
            .collect()
    }

    pub fn summary(&self, position: PositionId) -> Option<&PositionSummary> {
        self.summaries.get(&position)
    }

    pub fn open_positions(&self) -> Vec<&PositionSummary> {
        self.summaries.values().filter(|s| s.is_open()).collect()
    }

    pub fn aggregate_stats(&self) -> AggregateStats {
        let mut stats = AggregateStats::default();

        for summary in self.summaries.values() {
            stats.total_positions += 1;
            if summary.is_open() {
                stats.open_positions += 1;
            } else {
                stats.burned_positions += 1;
            }
            stats.total_fees0 = stats.total_fees0.saturating_add(summary.total_fees0);
            stats.total_fees1 = stats.total_fees1.saturating_add(summary.total_fees1);
        }

        for event in &self.events {
            match event.event_type {
                LifecycleEventType::Deposited => stats.deposits += 1,
                LifecycleEventType::Compounded => stats.compounds += 1,
                LifecycleEventType::Swept => stats.sweeps += 1,
                _ => {}
            }
        }

        stats
    }
}
