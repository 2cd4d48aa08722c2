//! Domain model for the grid liquidity manager.
//!
//! This crate is free of I/O and provides:
//! - The error taxonomy shared by every layer
//! - Grid configuration and its bounds
//! - Positions, principals and per-pass grid cells
//! - Tick grid and distribution weight calculators
//! - Tick/price and liquidity/amount math

/// Prelude module for convenient imports.
pub mod prelude;

/// Grid configuration.
pub mod config;
/// Entities with identity.
pub mod entities;
/// Shared enums.
pub mod enums;
/// Error types.
pub mod error;
/// Pure calculators.
pub mod math;
/// Value objects.
pub mod value_objects;
