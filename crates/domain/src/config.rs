//! Grid configuration.

use crate::enums::{GridType, StraddlePolicy};
use crate::error::{GridError, Result};
use serde::{Deserialize, Serialize};

/// Accepted range for `grid_quantity`.
pub const GRID_QUANTITY_BOUNDS: (u32, u32) = (1, 1_000);
/// Accepted range for `grid_step`.
pub const GRID_STEP_BOUNDS: (u32, u32) = (1, 10_000);

/// Instance-wide grid parameters, mutable only by the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of grid steps.
    pub grid_quantity: u32,
    /// Multiplier applied to the venue tick spacing.
    pub grid_step: u32,
    /// Token0 fees that must be exceeded before compounding.
    pub token0_min_fees: u128,
    /// Token1 fees that must be exceeded before compounding.
    pub token1_min_fees: u128,
    /// Treatment of the cell containing the reference tick.
    pub straddle_policy: StraddlePolicy,
    /// Validity window attached to every venue call, in seconds.
    pub deadline_secs: u64,
    /// Look-back window for the time-weighted tick, in seconds.
    pub twap_window_secs: u32,
    /// Largest tolerated gap between the instantaneous and time-weighted tick.
    pub max_twap_deviation: i32,
    /// Half-width of the band positions must overlap to survive a sweep.
    /// `None` uses the half-range of a neutral grid.
    pub sweep_band_ticks: Option<i32>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_quantity: 10,
            grid_step: 1,
            token0_min_fees: 0,
            token1_min_fees: 0,
            straddle_policy: StraddlePolicy::SkipStraddling,
            deadline_secs: 300,
            twap_window_secs: 300,
            max_twap_deviation: 100,
            sweep_band_ticks: None,
        }
    }
}

impl GridConfig {
    /// Creates a configuration with the given grid shape and default guards.
    pub fn new(grid_quantity: u32, grid_step: u32) -> Result<Self> {
        let config = Self {
            grid_quantity,
            grid_step,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the fee minimums.
    #[must_use]
    pub fn with_min_fees(mut self, token0_min_fees: u128, token1_min_fees: u128) -> Self {
        self.token0_min_fees = token0_min_fees;
        self.token1_min_fees = token1_min_fees;
        self
    }

    /// Sets the straddle policy.
    #[must_use]
    pub fn with_straddle_policy(mut self, policy: StraddlePolicy) -> Self {
        self.straddle_policy = policy;
        self
    }

    /// Checks every bound.
    pub fn validate(&self) -> Result<()> {
        validate_grid_quantity(self.grid_quantity)?;
        validate_grid_step(self.grid_step)?;
        if self.deadline_secs == 0 {
            return Err(GridError::InvalidConfiguration(
                "deadline window must be positive".into(),
            ));
        }
        if self.twap_window_secs == 0 {
            return Err(GridError::InvalidConfiguration(
                "twap window must be positive".into(),
            ));
        }
        if self.max_twap_deviation < 0 {
            return Err(GridError::InvalidConfiguration(
                "twap deviation must not be negative".into(),
            ));
        }
        if let Some(band) = self.sweep_band_ticks
            && band <= 0
        {
            return Err(GridError::InvalidConfiguration(
                "sweep band must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Ticks covered on each side of the reference by a neutral grid.
    pub fn neutral_half_range(&self, tick_spacing: i32) -> Result<i32> {
        self.range_of_steps(self.grid_quantity / 2, tick_spacing, "neutral half range")
    }

    /// Ticks covered on its one side of the reference by a buy or sell grid.
    pub fn directional_range(&self, tick_spacing: i32) -> Result<i32> {
        self.range_of_steps(self.grid_quantity, tick_spacing, "directional range")
    }

    /// Half-width of the sweep band around the reference tick.
    ///
    /// Without an explicit `sweep_band_ticks` the band is the distance a
    /// `grid_type` grid extends from the reference, so a freshly placed grid
    /// is never swept at an unchanged price.
    pub fn sweep_band(&self, tick_spacing: i32, grid_type: GridType) -> Result<i32> {
        match (self.sweep_band_ticks, grid_type) {
            (Some(band), _) => Ok(band),
            (None, GridType::Neutral) => self.neutral_half_range(tick_spacing),
            (None, GridType::Buy | GridType::Sell) => self.directional_range(tick_spacing),
        }
    }

    fn range_of_steps(&self, steps: u32, tick_spacing: i32, what: &'static str) -> Result<i32> {
        let range = i64::from(steps.max(1))
            .checked_mul(i64::from(tick_spacing))
            .and_then(|v| v.checked_mul(i64::from(self.grid_step)))
            .ok_or(GridError::RangeOverflow(what))?;
        i32::try_from(range).map_err(|_| GridError::RangeOverflow(what))
    }

    /// Short description used in log fields.
    pub fn describe(&self, grid_type: GridType) -> String {
        format!(
            "{:?} q={} step={}",
            grid_type, self.grid_quantity, self.grid_step
        )
    }
}

pub fn validate_grid_quantity(value: u32) -> Result<()> {
    let (min, max) = GRID_QUANTITY_BOUNDS;
    if !(min..=max).contains(&value) {
        return Err(GridError::InvalidConfiguration(format!(
            "grid quantity {value} outside {min}..={max}"
        )));
    }
    Ok(())
}

pub fn validate_grid_step(value: u32) -> Result<()> {
    let (min, max) = GRID_STEP_BOUNDS;
    if !(min..=max).contains(&value) {
        return Err(GridError::InvalidConfiguration(format!(
            "grid step {value} outside {min}..={max}"
        )));
    }
    Ok(())
}
