use serde::{Deserialize, Serialize};
use std::fmt;

/// Venue-assigned handle of a minted position. Unique and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionId(pub u64);

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A liquidity placement on one grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPosition {
    pub id: PositionId,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
}

impl GridPosition {
    #[must_use]
    pub fn new(id: PositionId, tick_lower: i32, tick_upper: i32, liquidity: u128) -> Self {
        Self {
            id,
            tick_lower,
            tick_upper,
            liquidity,
        }
    }

    /// Whether the venue would consider this position in range at `tick`.
    pub fn contains_tick(&self, tick: i32) -> bool {
        self.tick_lower <= tick && tick < self.tick_upper
    }

    /// Whether the whole range lies outside `[tick - band, tick + band]`.
    pub fn is_outside_band(&self, tick: i32, band: i32) -> bool {
        let lower_edge = tick.saturating_sub(band);
        let upper_edge = tick.saturating_add(band);
        self.tick_upper <= lower_edge || self.tick_lower >= upper_edge
    }

    pub fn is_active(&self) -> bool {
        self.liquidity > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_tick_is_half_open() {
        let position = GridPosition::new(PositionId(1), 100, 200, 10);
        assert!(position.contains_tick(100));
        assert!(position.contains_tick(199));
        assert!(!position.contains_tick(200));
        assert!(!position.contains_tick(99));
    }

    #[test]
    fn test_outside_band() {
        let position = GridPosition::new(PositionId(1), 100, 200, 10);
        // Band [250, 350]
        assert!(position.is_outside_band(300, 50));
        // Band [150, 250] overlaps
        assert!(!position.is_outside_band(200, 50));
        // Band [-100, 100] touches the lower edge only
        assert!(position.is_outside_band(0, 100));
    }
}
