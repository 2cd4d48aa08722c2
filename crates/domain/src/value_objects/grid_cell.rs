use crate::error::{GridError, Result};
use crate::math::full_math::mul_div;
use serde::{Deserialize, Serialize};

/// Total weight, in basis points, of a distribution.
pub const TOTAL_WEIGHT_BPS: u32 = 10_000;

/// Position of a cell relative to the reference tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellSide {
    /// `tick_upper <= current_tick`: holds token1 only.
    Below,
    /// `tick_lower > current_tick`: holds token0 only.
    Above,
    /// The reference tick falls inside the cell.
    Straddling,
}

impl CellSide {
    pub fn classify(tick_lower: i32, tick_upper: i32, current_tick: i32) -> Self {
        if tick_upper <= current_tick {
            Self::Below
        } else if tick_lower > current_tick {
            Self::Above
        } else {
            Self::Straddling
        }
    }
}

/// Capital assigned to one cell during a single orchestration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub current_tick: i32,
    pub weight_bps: u32,
    pub token0_share: u128,
    pub token1_share: u128,
}

impl GridCell {
    /// Computes the cell's share of `total0`/`total1`, clamped to the side it sits on.
    pub fn allocate(
        tick_lower: i32,
        tick_upper: i32,
        current_tick: i32,
        weight_bps: u32,
        total0: u128,
        total1: u128,
    ) -> Result<Self> {
        let denominator = u128::from(TOTAL_WEIGHT_BPS);
        let weight = u128::from(weight_bps);
        let share = |total: u128| {
            mul_div(total, weight, denominator)
                .ok_or(GridError::InvalidAmount("cell share overflow"))
        };

        let (token0_share, token1_share) = match CellSide::classify(tick_lower, tick_upper, current_tick) {
            CellSide::Above => (share(total0)?, 0),
            CellSide::Below => (0, share(total1)?),
            CellSide::Straddling => (0, 0),
        };

        Ok(Self {
            tick_lower,
            tick_upper,
            current_tick,
            weight_bps,
            token0_share,
            token1_share,
        })
    }

    pub fn side(&self) -> CellSide {
        CellSide::classify(self.tick_lower, self.tick_upper, self.current_tick)
    }

    /// A cell is skipped when it straddles the price or its share rounds to zero.
    pub fn is_fundable(&self) -> bool {
        self.side() != CellSide::Straddling && (self.token0_share > 0 || self.token1_share > 0)
    }
}
