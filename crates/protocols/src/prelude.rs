//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use grid_lp_protocols::prelude::*;
//! ```

pub use crate::error::VenueError;
pub use crate::memory::{MemoryVenue, TickOracle, VenueOp, VenuePosition};
pub use crate::venue::{
    CollectParams, DecreaseLiquidityParams, IncreaseLiquidityParams, LiquidityResult,
    LiquidityVenue, MintParams, MintResult, PoolState,
};
