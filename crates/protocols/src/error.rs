//! Errors raised by venue calls.

use crate::memory::VenueOp;
use grid_lp_domain::entities::PositionId;
use grid_lp_domain::enums::Asset;
use grid_lp_domain::error::GridError;
use thiserror::Error;

/// A rejected venue call. The call had no effect on the venue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VenueError {
    #[error("deadline {deadline} expired at {now}")]
    DeadlineExpired { deadline: u64, now: u64 },
    #[error("invalid tick range [{lower}, {upper})")]
    InvalidTicks { lower: i32, upper: i32 },
    #[error("tick {tick} not aligned to spacing {spacing}")]
    UnalignedTick { tick: i32, spacing: i32 },
    #[error("amounts back zero liquidity")]
    ZeroLiquidity,
    #[error("slippage check failed: got ({amount0}, {amount1}), min ({min0}, {min1})")]
    SlippageExceeded {
        amount0: u128,
        amount1: u128,
        min0: u128,
        min1: u128,
    },
    #[error("allowance exhausted for {0:?}")]
    InsufficientAllowance(Asset),
    #[error("unknown position {0}")]
    UnknownPosition(PositionId),
    #[error("requested {requested} liquidity, position holds {available}")]
    InsufficientLiquidity { requested: u128, available: u128 },
    #[error("position {0} still holds liquidity or owed tokens")]
    PositionNotCleared(PositionId),
    #[error("oracle history shorter than {window}s")]
    ObservationTooOld { window: u32 },
    #[error("math error: {0}")]
    Math(&'static str),
    #[error("injected fault on {0:?}")]
    Injected(VenueOp),
}

impl From<VenueError> for GridError {
    fn from(err: VenueError) -> Self {
        GridError::Venue(err.to_string())
    }
}
