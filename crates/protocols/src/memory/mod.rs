//! In-memory concentrated-liquidity venue.
//!
//! Backs tests, the simulator and the CLI. Supports:
//! - Tick movement with an accumulator-based TWAP oracle
//! - Fee accrual to in-range positions
//! - Deadlines, allowances and slippage checks
//! - Fault injection on chosen calls

mod oracle;
mod venue;

pub use oracle::*;
pub use venue::*;
