//! Liquidity venue surface consumed by the grid manager.
//!
//! This crate provides:
//! - The [`venue::LiquidityVenue`] trait with its call parameters and results
//! - [`error::VenueError`], convertible into the domain error
//! - [`memory::MemoryVenue`], an in-memory concentrated-liquidity venue

/// Prelude module for convenient imports.
pub mod prelude;

/// Venue errors.
pub mod error;
/// In-memory venue.
pub mod memory;
/// Venue trait and call types.
pub mod venue;
