pub mod position;
pub mod principal;

// Re-export for easier access
pub use position::{GridPosition, PositionId};
pub use principal::Principal;
