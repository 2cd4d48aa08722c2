//! Tick accumulator used for time-weighted ticks.
//!
//! History older than the retention horizon is pruned on every record. The
//! horizon is the larger of a fixed floor and the widest window queried so far.

use crate::error::VenueError;
use std::cell::Cell;

/// Seconds of history kept regardless of the windows queried.
pub const DEFAULT_ORACLE_RETENTION_SECS: u64 = 3_600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Observation {
    timestamp: u64,
    tick_cumulative: i64,
    /// Tick held from `timestamp` until the next observation.
    tick: i32,
}

/// Records tick changes and answers time-weighted queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOracle {
    observations: Vec<Observation>,
    retention_secs: u64,
    widest_window: Cell<u64>,
}

impl TickOracle {
    /// Starts the history at `timestamp` with `tick`.
    pub fn new(timestamp: u64, tick: i32) -> Self {
        Self {
            observations: vec![Observation {
                timestamp,
                tick_cumulative: 0,
                tick,
            }],
            retention_secs: DEFAULT_ORACLE_RETENTION_SECS,
            widest_window: Cell::new(0),
        }
    }

    /// Sets the retention floor.
    pub fn with_retention(mut self, secs: u64) -> Self {
        self.retention_secs = secs;
        self
    }

    /// Seconds of history currently guaranteed to be kept.
    pub fn retention(&self) -> u64 {
        self.retention_secs.max(self.widest_window.get())
    }

    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }

    /// Records that the tick changed to `tick` at `timestamp`.
    pub fn record(&mut self, timestamp: u64, tick: i32) {
        let last = self.last();
        if timestamp <= last.timestamp {
            if let Some(last) = self.observations.last_mut() {
                last.tick = tick;
            }
            return;
        }
        let tick_cumulative = Self::accumulate(last, timestamp);
        self.observations.push(Observation {
            timestamp,
            tick_cumulative,
            tick,
        });
        self.prune(timestamp);
    }

    /// Mean tick over `[now - window, now]`, rounded toward negative infinity.
    pub fn time_weighted_tick(&self, now: u64, window_secs: u32) -> Result<i32, VenueError> {
        if window_secs == 0 {
            return Ok(self.last().tick);
        }
        let window = u64::from(window_secs);
        if window > self.widest_window.get() {
            self.widest_window.set(window);
        }
        let start = now
            .checked_sub(window)
            .filter(|start| *start >= self.observations[0].timestamp)
            .ok_or(VenueError::ObservationTooOld {
                window: window_secs,
            })?;

        let cumulative_now = self.cumulative_at(now);
        let cumulative_start = self.cumulative_at(start);
        let mean = (cumulative_now - cumulative_start).div_euclid(window as i64);
        Ok(mean as i32)
    }

    /// Drops observations that no query within the retention can reach.
    ///
    /// The newest observation at or before the cutoff is kept as the anchor
    /// for cumulative values inside the horizon.
    fn prune(&mut self, now: u64) {
        let Some(cutoff) = now.checked_sub(self.retention()) else {
            return;
        };
        let anchor = self
            .observations
            .partition_point(|obs| obs.timestamp <= cutoff)
            .saturating_sub(1);
        if anchor > 0 {
            self.observations.drain(..anchor);
        }
    }

    fn cumulative_at(&self, timestamp: u64) -> i64 {
        let index = self
            .observations
            .partition_point(|obs| obs.timestamp <= timestamp)
            .saturating_sub(1);
        Self::accumulate(self.observations[index], timestamp)
    }

    fn accumulate(observation: Observation, timestamp: u64) -> i64 {
        let elapsed = timestamp.saturating_sub(observation.timestamp) as i64;
        observation.tick_cumulative + i64::from(observation.tick) * elapsed
    }

    fn last(&self) -> Observation {
        self.observations[self.observations.len() - 1]
    }
}
