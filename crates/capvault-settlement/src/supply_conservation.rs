//! Supply conservation checker.
//!
//! Invariant audited on demand:
//! ```text
//! Σ balances == total == Σ(deposits) - Σ(withdrawals)
//! total <= held unit
//! ```
//!
//! `held > total` is a surplus (out-of-band transfers in) and is reported,
//! not treated as a violation. `held < total` means tracked balances are no
//! longer fully backed.

use capvault_types::{Amount, Result, VaultError};
use serde::{Deserialize, Serialize};

use crate::ledger::Ledger;

/// Outcome of a successful audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvencyReport {
    pub total: Amount,
    pub held: Amount,
    /// `held - total`; the most the owner may rescue of the unit.
    pub surplus: Amount,
}

/// Cumulative credited and debited amounts since genesis.
#[derive(Debug, Clone, Default)]
pub struct SupplyConservation {
    deposits: Amount,
    withdrawals: Amount,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed credit.
    pub fn record_deposit(&mut self, amount: Amount) {
        self.deposits = self.deposits.saturating_add(amount);
    }

    /// Record a committed debit.
    pub fn record_withdrawal(&mut self, amount: Amount) {
        self.withdrawals = self.withdrawals.saturating_add(amount);
    }

    /// Deposits minus withdrawals, `None` if withdrawals ever exceeded deposits.
    #[must_use]
    pub fn expected_supply(&self) -> Option<Amount> {
        self.deposits.checked_sub(self.withdrawals)
    }

    #[must_use]
    pub fn total_deposits(&self) -> Amount {
        self.deposits
    }

    #[must_use]
    pub fn total_withdrawals(&self) -> Amount {
        self.withdrawals
    }

    /// Audit `ledger` against the cumulative record and the `held` unit.
    ///
    /// # Errors
    /// Returns [`VaultError::SupplyInvariantViolation`] naming the first
    /// mismatch found.
    pub fn verify(&self, ledger: &Ledger, held: Amount) -> Result<SolvencyReport> {
        let total = ledger.total();

        match ledger.sum_of_balances() {
            Some(sum) if sum == total => {}
            sum => {
                return Err(violation(format!(
                    "sum of balances {sum:?} != total {total}"
                )));
            }
        }

        let expected = self.expected_supply();
        if expected != Some(total) {
            return Err(violation(format!(
                "total {total} != deposits {} - withdrawals {}",
                self.deposits, self.withdrawals
            )));
        }

        let surplus = held.checked_sub(total).ok_or_else(|| {
            violation(format!("held unit {held} below total {total}"))
        })?;

        Ok(SolvencyReport {
            total,
            held,
            surplus,
        })
    }
}

fn violation(reason: String) -> VaultError {
    tracing::error!(%reason, "Supply invariant violated");
    VaultError::SupplyInvariantViolation { reason }
}
