//! The consumed venue surface.
//!
//! Provides the operations the manager needs from a concentrated-liquidity
//! venue and its position-custody service:
//! - Read pool state, tick spacing, fee tier and the time-weighted tick
//! - Mint positions, increase/decrease liquidity
//! - Collect owed tokens and burn emptied positions

use crate::error::VenueError;
use grid_lp_domain::entities::{PositionId, Principal};
use grid_lp_domain::enums::Asset;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Instantaneous pool state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    /// Reference price (token1 per token0).
    pub price: Decimal,
    /// Reference tick.
    pub tick: i32,
}

/// Parameters for minting a new position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintParams {
    /// Lower tick bound.
    pub tick_lower: i32,
    /// Upper tick bound.
    pub tick_upper: i32,
    /// Desired token0 amount.
    pub amount0_desired: u128,
    /// Desired token1 amount.
    pub amount1_desired: u128,
    /// Minimum token0 the venue must take.
    pub amount0_min: u128,
    /// Minimum token1 the venue must take.
    pub amount1_min: u128,
    /// Latest venue timestamp at which the call is valid.
    pub deadline: u64,
}

/// Parameters for increasing liquidity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncreaseLiquidityParams {
    /// Position to top up.
    pub position: PositionId,
    /// Desired token0 amount.
    pub amount0_desired: u128,
    /// Desired token1 amount.
    pub amount1_desired: u128,
    /// Minimum token0 the venue must take.
    pub amount0_min: u128,
    /// Minimum token1 the venue must take.
    pub amount1_min: u128,
    /// Latest venue timestamp at which the call is valid.
    pub deadline: u64,
}

/// Parameters for decreasing liquidity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecreaseLiquidityParams {
    /// Position to draw from.
    pub position: PositionId,
    /// Liquidity amount to remove.
    pub liquidity: u128,
    /// Minimum token0 released.
    pub amount0_min: u128,
    /// Minimum token1 released.
    pub amount1_min: u128,
    /// Latest venue timestamp at which the call is valid.
    pub deadline: u64,
}

/// Parameters for collecting owed tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectParams {
    /// Position to collect from.
    pub position: PositionId,
    /// Receiver of the tokens.
    pub recipient: Principal,
    /// Maximum token0 to collect.
    pub amount0_max: u128,
    /// Maximum token1 to collect.
    pub amount1_max: u128,
}

impl CollectParams {
    /// Collects everything owed.
    pub fn all(position: PositionId, recipient: Principal) -> Self {
        Self {
            position,
            recipient,
            amount0_max: u128::MAX,
            amount1_max: u128::MAX,
        }
    }
}

/// Result of a mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintResult {
    pub position: PositionId,
    pub liquidity: u128,
    pub amount0: u128,
    pub amount1: u128,
}

/// Result of a liquidity increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityResult {
    pub liquidity: u128,
    pub amount0: u128,
    pub amount1: u128,
}

/// A concentrated-liquidity venue together with its position custody.
///
/// Calls run inside the caller's unit of work: [`snapshot`](Self::snapshot)
/// captures the venue state and [`restore`](Self::restore) undoes every effect
/// made since, so a failed orchestration leaves no trace on the venue.
pub trait LiquidityVenue {
    /// Captured venue state.
    type Snapshot;

    /// Current reference price and tick.
    fn current_state(&self) -> Result<PoolState, VenueError>;

    /// Minimum distance between usable ticks.
    fn tick_spacing(&self) -> i32;

    /// Fee tier in hundredths of a basis point.
    fn fee_tier(&self) -> u32;

    /// Venue clock, in seconds. Deadlines are expressed against it.
    fn timestamp(&self) -> u64;

    /// Arithmetic mean tick over the last `window_secs` seconds.
    fn time_weighted_tick(&self, window_secs: u32) -> Result<i32, VenueError>;

    /// Lets the custody service pull up to `amount` of `asset` from the manager.
    fn approve(&mut self, asset: Asset, amount: u128) -> Result<(), VenueError>;

    fn mint(&mut self, params: &MintParams) -> Result<MintResult, VenueError>;

    fn increase_liquidity(
        &mut self,
        params: &IncreaseLiquidityParams,
    ) -> Result<LiquidityResult, VenueError>;

    /// Removes liquidity; the released tokens become owed to the position.
    fn decrease_liquidity(
        &mut self,
        params: &DecreaseLiquidityParams,
    ) -> Result<(u128, u128), VenueError>;

    /// Transfers owed tokens (released liquidity and fees) to the recipient.
    fn collect(&mut self, params: &CollectParams) -> Result<(u128, u128), VenueError>;

    /// Destroys an emptied position.
    fn burn(&mut self, position: PositionId) -> Result<(), VenueError>;

    fn snapshot(&self) -> Self::Snapshot;

    fn restore(&mut self, snapshot: Self::Snapshot);
}
