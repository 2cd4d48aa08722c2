//! Tick grid calculation.
//!
//! Turns a reference tick and the grid parameters into an ordered sequence
//! of boundaries, every one of them a multiple of the effective spacing
//! (`tick_spacing * grid_step`).
//!
//! ```text
//! NEUTRAL: [ref - q/2 * s, ref + q/2 * s]
//! BUY:     [ref - q * s,   ref]
//! SELL:    [ref,           ref + q * s]
//! ```
//!
//! Both bounds are floor-aligned before the sequence is emitted.

use crate::enums::{GridType, StraddlePolicy};
use crate::error::{GridError, Result};
use crate::value_objects::grid_cell::CellSide;
use serde::{Deserialize, Serialize};

/// Lowest tick accepted by the venue.
pub const MIN_TICK: i32 = -887_272;
/// Highest tick accepted by the venue.
pub const MAX_TICK: i32 = 887_272;

/// Aligned boundaries produced by [`calculate_grid_ticks`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickGrid {
    boundaries: Vec<i32>,
    effective_spacing: i32,
}

impl TickGrid {
    pub fn boundaries(&self) -> &[i32] {
        &self.boundaries
    }

    pub fn effective_spacing(&self) -> i32 {
        self.effective_spacing
    }

    pub fn lower(&self) -> i32 {
        self.boundaries[0]
    }

    pub fn upper(&self) -> i32 {
        self.boundaries[self.boundaries.len() - 1]
    }

    /// Cells as `(tick_lower, tick_upper)` pairs, lowest price first.
    ///
    /// With [`StraddlePolicy::SkipStraddling`] the cell containing
    /// `reference_tick` is left out.
    pub fn cells(&self, reference_tick: i32, policy: StraddlePolicy) -> Vec<(i32, i32)> {
        self.boundaries
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .filter(|&(lower, upper)| {
                policy == StraddlePolicy::Keep
                    || CellSide::classify(lower, upper, reference_tick) != CellSide::Straddling
            })
            .collect()
    }
}

/// Floor-aligns `tick` to a multiple of `spacing`, rounding toward negative infinity.
pub fn align_floor(tick: i64, spacing: i64) -> i64 {
    tick - tick.rem_euclid(spacing)
}

/// Computes the aligned grid boundaries around `reference_tick`.
///
/// # Errors
///
/// * [`GridError::InvalidConfiguration`] for a zero quantity, step or spacing.
/// * [`GridError::RangeOverflow`] if the range leaves `[MIN_TICK, MAX_TICK]`.
/// * [`GridError::InvalidRange`] if fewer than two boundaries result.
/// * [`GridError::DegenerateGrid`] if only one cell results.
pub fn calculate_grid_ticks(
    reference_tick: i32,
    grid_type: GridType,
    grid_quantity: u32,
    grid_step: u32,
    tick_spacing: i32,
) -> Result<TickGrid> {
    if grid_quantity == 0 {
        return Err(GridError::InvalidConfiguration(
            "grid quantity must be positive".into(),
        ));
    }
    if grid_step == 0 {
        return Err(GridError::InvalidConfiguration(
            "grid step must be positive".into(),
        ));
    }
    if tick_spacing <= 0 {
        return Err(GridError::InvalidConfiguration(
            "tick spacing must be positive".into(),
        ));
    }

    let spacing = i64::from(tick_spacing)
        .checked_mul(i64::from(grid_step))
        .ok_or(GridError::RangeOverflow("effective spacing"))?;
    let effective_spacing =
        i32::try_from(spacing).map_err(|_| GridError::RangeOverflow("effective spacing"))?;

    let steps = match grid_type {
        GridType::Neutral => grid_quantity / 2,
        GridType::Buy | GridType::Sell => grid_quantity,
    };
    let half_range = i64::from(steps)
        .checked_mul(spacing)
        .ok_or(GridError::RangeOverflow("half range"))?;

    let reference = i64::from(reference_tick);
    let (lower, upper) = match grid_type {
        GridType::Neutral => (reference - half_range, reference + half_range),
        GridType::Buy => (reference - half_range, reference),
        GridType::Sell => (reference, reference + half_range),
    };

    let lower = align_floor(lower, spacing);
    let upper = align_floor(upper, spacing);
    if lower < i64::from(MIN_TICK) || upper > i64::from(MAX_TICK) {
        return Err(GridError::RangeOverflow("grid exceeds venue tick bounds"));
    }

    // Bounds are within the venue range, so the casts below are lossless.
    let boundaries: Vec<i32> = (lower..=upper)
        .step_by(spacing as usize)
        .map(|tick| tick as i32)
        .collect();

    if boundaries.len() < 2 {
        return Err(GridError::InvalidRange {
            boundaries: boundaries.len(),
        });
    }
    let cells = boundaries.len() - 1;
    if cells <= 1 {
        return Err(GridError::DegenerateGrid { cells });
    }

    Ok(TickGrid {
        boundaries,
        effective_spacing,
    })
}
