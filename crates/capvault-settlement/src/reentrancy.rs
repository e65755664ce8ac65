//! Scoped reentrancy lock.
//!
//! Entering returns an [`EntryGuard`]; dropping the guard releases the lock.
//! Release therefore happens on normal return, on `?` propagation and on
//! unwinding. A nested `enter` while a guard is alive fails immediately
//! with `ReentrantCall`.

use std::sync::atomic::{AtomicBool, Ordering};

use capvault_types::{Result, VaultError};

#[derive(Debug, Default)]
pub struct ReentrancyLock {
    entered: AtomicBool,
}

impl ReentrancyLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for the lifetime of the returned guard.
    ///
    /// # Errors
    /// `ReentrantCall` if a guard is already alive.
    pub fn enter(&self) -> Result<EntryGuard<'_>> {
        self.entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| VaultError::ReentrantCall)?;
        Ok(EntryGuard { lock: self })
    }

    #[must_use]
    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Proof of holding the [`ReentrancyLock`]. Releases on drop.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct EntryGuard<'a> {
    lock: &'a ReentrancyLock,
}

impl Drop for EntryGuard<'_> {
    fn drop(&mut self) {
        self.lock.entered.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_enter_rejected() {
        let lock = ReentrancyLock::new();
        let _guard = lock.enter().unwrap();
        assert!(lock.is_entered());
        assert_eq!(lock.enter().unwrap_err(), VaultError::ReentrantCall);
    }

    #[test]
    fn released_on_drop() {
        let lock = ReentrancyLock::new();
        {
            let _guard = lock.enter().unwrap();
        }
        assert!(!lock.is_entered());
        assert!(lock.enter().is_ok());
    }

    #[test]
    fn released_on_error_path() {
        fn failing(lock: &ReentrancyLock) -> Result<()> {
            let _guard = lock.enter()?;
            Err(VaultError::ZeroAmount)
        }
        let lock = ReentrancyLock::new();
        assert!(failing(&lock).is_err());
        assert!(!lock.is_entered());
    }

    #[test]
    fn released_on_panic() {
        let lock = ReentrancyLock::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = lock.enter().unwrap();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!lock.is_entered());
    }
}
