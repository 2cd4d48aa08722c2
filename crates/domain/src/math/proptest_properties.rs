//! Property-based tests for the grid and distribution calculators.
//!
//! 1. **Grid alignment**: every boundary is a multiple of the effective spacing.
//! 2. **Directional grids**: BUY never exceeds the reference tick, SELL never
//!    drops below its floor-aligned value.
//! 3. **Weight conservation**: totals are exact, except FLAT which may fall
//!    short by at most `cell_count - 1`.
//! 4. **Linear symmetry**: `LINEAR(i) == REVERSE_LINEAR(n - 1 - i)`.

use proptest::prelude::*;

use crate::enums::{DistributionKind, GridType, StraddlePolicy};
use crate::math::distribution::distribution_weights;
use crate::math::tick_grid::{align_floor, calculate_grid_ticks};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn reference_tick_strategy() -> impl Strategy<Value = i32> {
    -400_000i32..=400_000i32
}

fn grid_type_strategy() -> impl Strategy<Value = GridType> {
    prop_oneof![
        Just(GridType::Neutral),
        Just(GridType::Buy),
        Just(GridType::Sell),
    ]
}

fn implemented_kind_strategy() -> impl Strategy<Value = DistributionKind> {
    prop_oneof![
        Just(DistributionKind::Flat),
        Just(DistributionKind::Linear),
        Just(DistributionKind::ReverseLinear),
        Just(DistributionKind::Fibonacci),
    ]
}

// ---------------------------------------------------------------------------
// Grid properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_boundaries_are_aligned(
        reference in reference_tick_strategy(),
        grid_type in grid_type_strategy(),
        quantity in 2u32..=200,
        step in 1u32..=50,
        spacing in prop_oneof![Just(1i32), Just(10), Just(60), Just(200)],
    ) {
        let Ok(grid) = calculate_grid_ticks(reference, grid_type, quantity, step, spacing) else {
            return Ok(());
        };
        let effective = spacing * step as i32;
        prop_assert_eq!(grid.effective_spacing(), effective);
        for pair in grid.boundaries().windows(2) {
            prop_assert_eq!(pair[1] - pair[0], effective);
        }
        for tick in grid.boundaries() {
            prop_assert_eq!(tick.rem_euclid(effective), 0);
        }
    }

    #[test]
    fn prop_directional_grids_stay_on_their_side(
        reference in reference_tick_strategy(),
        quantity in 2u32..=200,
        step in 1u32..=50,
        spacing in prop_oneof![Just(1i32), Just(10), Just(60)],
    ) {
        let effective = i64::from(spacing) * i64::from(step);
        if let Ok(buy) = calculate_grid_ticks(reference, GridType::Buy, quantity, step, spacing) {
            prop_assert!(buy.boundaries().iter().all(|t| *t <= reference));
        }
        if let Ok(sell) = calculate_grid_ticks(reference, GridType::Sell, quantity, step, spacing) {
            let floor = align_floor(i64::from(reference), effective) as i32;
            prop_assert!(sell.boundaries().iter().all(|t| *t >= floor));
            prop_assert_eq!(sell.lower(), floor);
        }
    }

    #[test]
    fn prop_skipping_removes_at_most_one_cell(
        reference in reference_tick_strategy(),
        grid_type in grid_type_strategy(),
        quantity in 2u32..=100,
        spacing in prop_oneof![Just(1i32), Just(10), Just(60)],
    ) {
        let Ok(grid) = calculate_grid_ticks(reference, grid_type, quantity, 1, spacing) else {
            return Ok(());
        };
        let kept = grid.cells(reference, StraddlePolicy::Keep).len();
        let skipped = grid.cells(reference, StraddlePolicy::SkipStraddling).len();
        prop_assert_eq!(kept, grid.boundaries().len() - 1);
        prop_assert!(kept - skipped <= 1);
    }
}

// ---------------------------------------------------------------------------
// Distribution properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_weights_are_conserved(
        cells in 1usize..=1000,
        kind in implemented_kind_strategy(),
    ) {
        let weights = distribution_weights(cells, kind).unwrap_or_default();
        prop_assert_eq!(weights.len(), cells);
        let total: u32 = weights.iter().sum();
        if kind == DistributionKind::Flat {
            prop_assert!(total <= 10_000);
            prop_assert!(10_000 - total <= cells as u32 - 1);
        } else {
            prop_assert_eq!(total, 10_000);
        }
    }

    #[test]
    fn prop_linear_mirrors_reverse_linear(cells in 1usize..=500) {
        let linear = distribution_weights(cells, DistributionKind::Linear).unwrap_or_default();
        let reverse = distribution_weights(cells, DistributionKind::ReverseLinear).unwrap_or_default();
        prop_assert_eq!(linear.len(), cells);
        for i in 0..cells {
            prop_assert_eq!(linear[i], reverse[cells - 1 - i]);
        }
    }

    #[test]
    fn prop_weights_are_deterministic(
        cells in 1usize..=200,
        kind in implemented_kind_strategy(),
    ) {
        prop_assert_eq!(
            distribution_weights(cells, kind),
            distribution_weights(cells, kind)
        );
    }
}
