//! Grid lifecycle tracking.
//!
//! Records every step a manager takes:
//! - Cells funded by mint or increase
//! - Positions decommissioned and fees collected
//! - Deposits, compounds and sweeps
//! - Payouts, burns and configuration changes

mod events;
mod tracker;

pub use events::*;
pub use tracker::*;
