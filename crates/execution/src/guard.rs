//! Reentrancy protection for mutating manager operations.

use grid_lp_domain::error::{GridError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag marking a mutating operation in flight.
///
/// Clones share the same flag, so a collaborator holding a clone observes
/// and contends for the manager's lock.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyLock {
    entered: Arc<AtomicBool>,
}

impl ReentrancyLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the lock as entered until the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// [`GridError::ReentrancyDetected`] if the lock is already entered.
    pub fn enter(&self) -> Result<ReentrancyGuard> {
        self.entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| GridError::ReentrancyDetected)?;
        Ok(ReentrancyGuard {
            entered: Arc::clone(&self.entered),
        })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Releases the lock on drop, whichever way the operation exits.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct ReentrancyGuard {
    entered: Arc<AtomicBool>,
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        self.entered.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_entry_rejected() {
        let lock = ReentrancyLock::new();
        let guard = lock.enter().unwrap();
        assert!(lock.is_entered());
        assert_eq!(lock.clone().enter().unwrap_err(), GridError::ReentrancyDetected);
        drop(guard);
        assert!(!lock.is_entered());
        assert!(lock.enter().is_ok());
    }

    #[test]
    fn test_released_on_error_path() {
        fn failing(lock: &ReentrancyLock) -> Result<()> {
            let _guard = lock.enter()?;
            Err(GridError::InsufficientBalance)
        }

        let lock = ReentrancyLock::new();
        assert!(failing(&lock).is_err());
        assert!(!lock.is_entered());
    }
}
