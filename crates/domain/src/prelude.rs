//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use grid_lp_domain::prelude::*;
//! ```

pub use crate::config::{GRID_QUANTITY_BOUNDS, GRID_STEP_BOUNDS, GridConfig};
pub use crate::entities::{GridPosition, PositionId, Principal};
pub use crate::enums::{Asset, DistributionKind, GridType, StraddlePolicy};
pub use crate::error::GridError;
pub use crate::math::distribution::distribution_weights;
pub use crate::math::tick_grid::{MAX_TICK, MIN_TICK, TickGrid, calculate_grid_ticks};
pub use crate::value_objects::{
    Balances, CellSide, GridCell, MAX_SLIPPAGE_BPS, Payout, Slippage, TOTAL_WEIGHT_BPS,
};
