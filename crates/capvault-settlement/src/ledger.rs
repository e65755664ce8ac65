//! The authoritative depositor → balance mapping.
//!
//! Maintains, between operations:
//! ```text
//! total == Σ balances
//! ```
//! Every bound is checked before the arithmetic it protects: credits use
//! `checked_add`, debits compare before subtracting. A failed call leaves
//! the ledger untouched.

use std::collections::HashMap;

use capvault_types::{Address, Amount, BalanceEntry, Result, VaultError};

/// Per-depositor balances in the accounting unit plus the running total.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: HashMap<Address, Amount>,
    total: Amount,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increase `depositor`'s balance and the total by `amount`.
    ///
    /// The caller has already bounded `amount` against the capacity limit.
    ///
    /// # Errors
    /// - `ZeroAmount` if `amount == 0`
    /// - `BalanceOverflow` if the balance or total would overflow
    pub fn credit(&mut self, depositor: Address, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }
        let current = self.balance_of(&depositor);
        let balance = current
            .checked_add(amount)
            .ok_or(VaultError::BalanceOverflow {
                current,
                increment: amount,
            })?;
        let total = self
            .total
            .checked_add(amount)
            .ok_or(VaultError::BalanceOverflow {
                current: self.total,
                increment: amount,
            })?;

        self.balances.insert(depositor, balance);
        self.total = total;
        Ok(())
    }

    /// Decrease `depositor`'s balance and the total by `amount`.
    ///
    /// # Errors
    /// - `ZeroAmount` if `amount == 0`
    /// - `InsufficientBalance` if the balance is below `amount`
    pub fn debit(&mut self, depositor: Address, amount: Amount) -> Result<()> {
        self.ensure_covers(&depositor, amount)?;
        if self.total < amount {
            return Err(VaultError::SupplyInvariantViolation {
                reason: format!("total {} below balance being debited {amount}", self.total),
            });
        }

        let entry = self.balances.entry(depositor).or_insert(0);
        *entry -= amount;
        self.total -= amount;
        Ok(())
    }

    /// Read-only form of the debit precondition.
    pub fn ensure_covers(&self, depositor: &Address, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }
        let available = self.balance_of(depositor);
        if available < amount {
            return Err(VaultError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn balance_of(&self, depositor: &Address) -> Amount {
        self.balances.get(depositor).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> Amount {
        self.total
    }

    /// Number of depositors ever credited (zero balances included).
    #[must_use]
    pub fn depositors(&self) -> usize {
        self.balances.len()
    }

    /// Σ balances, or `None` on overflow (which would itself be a violation).
    #[must_use]
    pub fn sum_of_balances(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(0u128, |acc, amount| acc.checked_add(*amount))
    }

    /// All entries, sorted by depositor for stable output.
    #[must_use]
    pub fn entries(&self) -> Vec<BalanceEntry> {
        let mut entries: Vec<BalanceEntry> = self
            .balances
            .iter()
            .map(|(depositor, amount)| BalanceEntry {
                depositor: *depositor,
                amount: *amount,
            })
            .collect();
        entries.sort_by_key(|entry| entry.depositor);
        entries
    }
}
