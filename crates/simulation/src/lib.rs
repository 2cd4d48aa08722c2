//! Grid backtesting against an in-memory venue.
//!
//! This crate provides:
//! - Price path generators (geometric Brownian motion and fixed paths)
//! - Swap volume models that turn a path into venue fees
//! - [`backtest::GridBacktest`], which replays a path through a grid manager
//!   and its keeper round

/// Prelude module for convenient imports.
pub mod prelude;

/// Grid backtest driver.
pub mod backtest;
/// Price path generators.
pub mod price_path;
/// Swap volume models.
pub mod volume;
