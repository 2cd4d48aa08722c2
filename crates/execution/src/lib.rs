//! Grid orchestration engine.
//!
//! This crate provides:
//! - The position ledger with its active set
//! - A scoped reentrancy guard
//! - Lifecycle events and their tracker
//! - The grid position manager (deposit, withdraw, compound, sweep, close)
//! - An async keeper that drives compound and sweep on a schedule

/// Prelude module for convenient imports.
pub mod prelude;

/// Reentrancy protection.
pub mod guard;
/// Scheduled maintenance.
pub mod keeper;
/// Position ledger.
pub mod ledger;
/// Grid lifecycle tracking.
pub mod lifecycle;
/// Grid position manager.
pub mod manager;
