pub mod balances;
pub mod grid_cell;
pub mod slippage;

pub use balances::{Balances, Payout};
pub use grid_cell::{CellSide, GridCell, TOTAL_WEIGHT_BPS};
pub use slippage::{MAX_SLIPPAGE_BPS, Slippage};
