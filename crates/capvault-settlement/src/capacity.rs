//! Global capacity ceiling on the aggregate total.
//!
//! Two-phase around any operation whose size is only known afterwards:
//!
//! 1. **pre-check** with the caller's floor, before the exchange call.
//!    Fails fast when even the worst acceptable outcome would breach.
//! 2. **post-check** with the measured amount, before crediting. A
//!    failure here rolls back the whole operation, swap included.
//!
//! Direct deposits know their size up front and use the pre-check alone.

use capvault_types::{Amount, Result, VaultError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityGuard {
    limit: Amount,
}

impl CapacityGuard {
    #[must_use]
    pub fn new(limit: Amount) -> Self {
        Self { limit }
    }

    #[must_use]
    pub fn limit(&self) -> Amount {
        self.limit
    }

    /// Replace the limit; returns the previous one. Any value is accepted,
    /// including one below the current total.
    pub fn set_limit(&mut self, limit: Amount) -> Amount {
        std::mem::replace(&mut self.limit, limit)
    }

    /// Optimistic check with the amount known before the external call.
    pub fn pre_check(&self, total: Amount, floor: Amount) -> Result<()> {
        self.admit(total, floor, "pre")
    }

    /// Conclusive check with the amount actually received.
    pub fn post_check(&self, total: Amount, received: Amount) -> Result<()> {
        self.admit(total, received, "post")
    }

    /// Headroom left under the limit, zero when already over it.
    #[must_use]
    pub fn remaining(&self, total: Amount) -> Amount {
        self.limit.saturating_sub(total)
    }

    fn admit(&self, total: Amount, requested: Amount, phase: &'static str) -> Result<()> {
        match total.checked_add(requested) {
            Some(after) if after <= self.limit => Ok(()),
            _ => {
                tracing::debug!(phase, total, requested, limit = self.limit, "Capacity check failed");
                Err(VaultError::CapacityExceeded {
                    total,
                    requested,
                    limit: self.limit,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const C: Amount = 1_000_000;

    #[test]
    fn fits_exactly_at_limit() {
        let guard = CapacityGuard::new(C);
        assert!(guard.pre_check(C - 100, 100).is_ok());
        assert!(guard.post_check(C - 100, 100).is_ok());
    }

    #[test]
    fn over_limit_rejected() {
        let guard = CapacityGuard::new(C);
        let err = guard.pre_check(C - 100, 200).unwrap_err();
        assert_eq!(
            err,
            VaultError::CapacityExceeded {
                total: C - 100,
                requested: 200,
                limit: C
            }
        );
    }

    #[test]
    fn post_check_catches_what_pre_check_allowed() {
        let guard = CapacityGuard::new(C);
        let total = C - 1_000;
        assert!(guard.pre_check(total, 900).is_ok());
        assert!(guard.post_check(total, 1_001).is_err());
    }

    #[test]
    fn overflow_counts_as_exceeded() {
        let guard = CapacityGuard::new(Amount::MAX);
        assert!(guard.pre_check(Amount::MAX, 1).is_err());
    }

    #[test]
    fn limit_below_total_blocks_positive_deposits() {
        let mut guard = CapacityGuard::new(C);
        assert_eq!(guard.set_limit(500), C);
        assert_eq!(guard.remaining(800), 0);
        assert!(guard.pre_check(800, 1).is_err());
    }

    #[test]
    fn remaining_headroom() {
        let guard = CapacityGuard::new(C);
        assert_eq!(guard.remaining(0), C);
        assert_eq!(guard.remaining(C - 1), 1);
    }
}
