//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use grid_lp_simulation::prelude::*;
//! ```

pub use crate::backtest::{
    BacktestConfig, BacktestError, BacktestResult, BacktestSnapshot, BacktestSummary,
    GridBacktest,
};
pub use crate::price_path::{
    DeterministicPricePath, GeometricBrownianMotion, PricePathGenerator, prices_to_ticks,
};
pub use crate::volume::{ConstantVolume, LogNormalVolume, VolumeModel};
