//! Error taxonomy shared by every layer of the grid manager.
//!
//! All fallible domain and orchestration operations return [`GridError`].
//! Every variant aborts the whole operation; nothing is retried internally.

use crate::entities::position::PositionId;
use crate::enums::DistributionKind;
use thiserror::Error;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, GridError>;

/// Failure raised by grid computation, ledger bookkeeping or orchestration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    // Configuration
    /// A configuration value is outside its accepted bounds.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// `initialize` was called on an instance that is already active.
    #[error("manager already initialized")]
    AlreadyInitialized,
    /// An operation requiring an active instance was called before `initialize`.
    #[error("manager not initialized")]
    NotInitialized,

    // Preconditions
    /// Amounts do not satisfy the requirements of the requested grid type.
    #[error("invalid amount: {0}")]
    InvalidAmount(&'static str),
    /// Slippage tolerance above the hard cap.
    #[error("slippage {bps}bps exceeds the {max}bps cap")]
    SlippageTooHigh {
        /// Requested tolerance.
        bps: u32,
        /// Hard cap.
        max: u32,
    },
    /// The computed grid has fewer than two boundaries.
    #[error("invalid range: grid yields {boundaries} boundaries")]
    InvalidRange {
        /// Number of boundaries produced.
        boundaries: usize,
    },
    /// The computed grid has a single cell.
    #[error("degenerate grid: {cells} cell(s)")]
    DegenerateGrid {
        /// Number of cells produced.
        cells: usize,
    },
    /// Range arithmetic left the representable tick domain.
    #[error("tick range overflow: {0}")]
    RangeOverflow(&'static str),
    /// A tick is not a multiple of the required spacing.
    #[error("tick {tick} is not aligned to spacing {spacing}")]
    UnalignedTick {
        /// Offending tick.
        tick: i32,
        /// Required spacing.
        spacing: i32,
    },
    /// Lookup of an unknown position id.
    #[error("position {0} not found")]
    PositionNotFound(PositionId),
    /// Lookup by mint-order index past the end of the ledger.
    #[error("no position at index {index} ({len} tracked)")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Positions tracked.
        len: usize,
    },
    /// The requested distribution is reserved but not implemented.
    #[error("distribution {0:?} is not implemented")]
    NotImplemented(DistributionKind),

    // Economic guards
    /// No cell could receive liquidity with the available capital.
    #[error("insufficient balance to place liquidity")]
    InsufficientBalance,
    /// Collected fees do not exceed either configured minimum.
    #[error("insufficient fees: collected ({amount0}, {amount1})")]
    InsufficientFees {
        /// Token0 fees collected in this call.
        amount0: u128,
        /// Token1 fees collected in this call.
        amount1: u128,
    },
    /// Instantaneous tick deviates too far from the time-weighted tick.
    #[error("price deviation too high: tick {current} vs twap {twap} (max {max_deviation})")]
    PriceDeviationTooHigh {
        /// Instantaneous reference tick.
        current: i32,
        /// Time-weighted reference tick.
        twap: i32,
        /// Allowed deviation.
        max_deviation: i32,
    },
    /// There is no stray native balance to recover.
    #[error("nothing to recover")]
    NothingToRecover,

    // Invariants
    /// An exclusive operation requires the active set to be empty.
    #[error("{0} active position(s) remaining")]
    ActivePositionsRemaining(usize),
    /// Ledger bookkeeping broke one of its invariants.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    // Access
    /// Caller is not allowed to invoke this operation.
    #[error("unauthorized caller {0}")]
    Unauthorized(String),
    /// A mutating operation was entered while another one is in flight.
    #[error("reentrancy detected")]
    ReentrancyDetected,
    /// Native currency cannot be sent to the manager.
    #[error("native currency transfers are rejected")]
    NativeTransferRejected,

    /// The venue rejected a call.
    #[error("venue error: {0}")]
    Venue(String),
}

impl GridError {
    /// Returns `true` for economic guards that mean "nothing to do right now".
    ///
    /// Automation uses this to tell an idle round apart from a real failure.
    #[must_use]
    pub fn is_economic_guard(&self) -> bool {
        matches!(
            self,
            Self::InsufficientFees { .. }
                | Self::InsufficientBalance
                | Self::PriceDeviationTooHigh { .. }
        )
    }
}
