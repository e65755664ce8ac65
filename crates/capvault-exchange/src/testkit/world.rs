//! Raw chain state shared by every test contract.
//!
//! `World` is plain data so that a checkpoint is a clone and a rollback is
//! an assignment.

use std::collections::HashMap;

use capvault_types::{Address, Amount, Result, VaultError, constants::BPS_DENOMINATOR};

/// Per-token quirks used to exercise the safe-transfer paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenBehavior {
    /// Fee burned on every transfer, in basis points of the amount.
    pub fee_bps: u32,
    /// Reject approvals that change a non-zero allowance to another non-zero value.
    pub strict_approve: bool,
    /// Report failures as `Ok(false)` instead of reverting.
    pub silent_failure: bool,
}

impl TokenBehavior {
    #[must_use]
    pub fn fee_on_transfer(fee_bps: u32) -> Self {
        Self {
            fee_bps,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn strict_approve() -> Self {
        Self {
            strict_approve: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn silent_failure() -> Self {
        Self {
            silent_failure: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct World {
    pub(crate) time: u64,
    native: HashMap<Address, Amount>,
    /// (token, owner) → balance
    balances: HashMap<(Address, Address), Amount>,
    /// (token, owner, spender) → allowance
    allowances: HashMap<(Address, Address, Address), Amount>,
    behaviors: HashMap<Address, TokenBehavior>,
}

impl World {
    pub(crate) fn register_token(&mut self, token: Address, behavior: TokenBehavior) {
        self.behaviors.insert(token, behavior);
    }

    fn behavior(&self, token: &Address) -> TokenBehavior {
        self.behaviors.get(token).copied().unwrap_or_default()
    }

    pub(crate) fn balance(&self, token: &Address, owner: &Address) -> Amount {
        self.balances.get(&(*token, *owner)).copied().unwrap_or(0)
    }

    pub(crate) fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*token, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn mint(&mut self, token: &Address, to: &Address, amount: Amount) -> Result<()> {
        let entry = self.balances.entry((*token, *to)).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| VaultError::external(format!("{token}: mint overflow")))?;
        Ok(())
    }

    /// Transfer fee on `amount`, never more than `amount` itself.
    fn fee(&self, token: &Address, amount: Amount) -> Amount {
        let bps = Amount::from(self.behavior(token).fee_bps).min(BPS_DENOMINATOR);
        let fee = amount.checked_mul(bps).map_or_else(
            || amount / BPS_DENOMINATOR * bps,
            |scaled| scaled / BPS_DENOMINATOR,
        );
        fee.min(amount)
    }

    fn fail(&self, token: &Address, reason: String) -> Result<bool> {
        if self.behavior(token).silent_failure {
            Ok(false)
        } else {
            Err(VaultError::external(format!("{token}: {reason}")))
        }
    }

    /// Move tokens, burning the token's transfer fee. No state changes on failure.
    pub(crate) fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<bool> {
        let have = self.balance(token, from);
        if have < amount {
            return self.fail(token, format!("transfer amount {amount} exceeds balance {have}"));
        }
        let delivered = amount - self.fee(token, amount);
        if self
            .balance(token, to)
            .checked_add(delivered)
            .is_none()
        {
            return self.fail(token, "recipient balance overflow".into());
        }
        *self.balances.entry((*token, *from)).or_insert(0) -= amount;
        *self.balances.entry((*token, *to)).or_insert(0) += delivered;
        Ok(true)
    }

    /// Allowance-spending transfer. An owner moving its own funds needs no allowance.
    pub(crate) fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<bool> {
        let allowed = self.allowance(token, from, spender);
        if spender != from && allowed < amount {
            return self.fail(token, format!("allowance {allowed} below {amount}"));
        }
        if !self.transfer(token, from, to, amount)? {
            return Ok(false);
        }
        if spender != from {
            self.allowances
                .insert((*token, *from, *spender), allowed - amount);
        }
        Ok(true)
    }

    pub(crate) fn approve(
        &mut self,
        token: &Address,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<bool> {
        let current = self.allowance(token, owner, spender);
        if self.behavior(token).strict_approve && current != 0 && amount != 0 {
            return Err(VaultError::external(format!(
                "{token}: approve from non-zero allowance {current}"
            )));
        }
        self.allowances.insert((*token, *owner, *spender), amount);
        Ok(true)
    }

    pub(crate) fn native_balance(&self, owner: &Address) -> Amount {
        self.native.get(owner).copied().unwrap_or(0)
    }

    pub(crate) fn set_native(&mut self, owner: &Address, amount: Amount) {
        self.native.insert(*owner, amount);
    }

    pub(crate) fn transfer_native(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        let have = self.native_balance(from);
        if have < amount {
            return Err(VaultError::external(format!(
                "native transfer {amount} exceeds balance {have} of {from}"
            )));
        }
        let credited = self
            .native_balance(to)
            .checked_add(amount)
            .ok_or_else(|| VaultError::external("native balance overflow"))?;
        self.native.insert(*from, have - amount);
        self.native.insert(*to, credited);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(label: &str) -> Address {
        Address::derive(label)
    }

    #[test]
    fn transfer_moves_balance() {
        let mut w = World::default();
        let (t, a, b) = (addr("t"), addr("a"), addr("b"));
        w.mint(&t, &a, 100).unwrap();
        assert!(w.transfer(&t, &a, &b, 40).unwrap());
        assert_eq!(w.balance(&t, &a), 60);
        assert_eq!(w.balance(&t, &b), 40);
    }

    #[test]
    fn fee_is_burned() {
        let mut w = World::default();
        let (t, a, b) = (addr("t"), addr("a"), addr("b"));
        w.register_token(t, TokenBehavior::fee_on_transfer(100)); // 1%
        w.mint(&t, &a, 1_000).unwrap();
        assert!(w.transfer(&t, &a, &b, 1_000).unwrap());
        assert_eq!(w.balance(&t, &a), 0);
        assert_eq!(w.balance(&t, &b), 990);
    }

    #[test]
    fn fee_on_huge_amounts_does_not_overflow() {
        let mut w = World::default();
        let (t, a, b) = (addr("t"), addr("a"), addr("b"));
        w.register_token(t, TokenBehavior::fee_on_transfer(100));
        w.mint(&t, &a, Amount::MAX).unwrap();
        assert!(w.transfer(&t, &a, &b, Amount::MAX).unwrap());
        assert_eq!(w.balance(&t, &b), Amount::MAX - Amount::MAX / 10_000 * 100);
    }

    #[test]
    fn fee_above_denominator_burns_everything() {
        let mut w = World::default();
        let (t, a, b) = (addr("t"), addr("a"), addr("b"));
        w.register_token(t, TokenBehavior::fee_on_transfer(20_000));
        w.mint(&t, &a, 500).unwrap();
        assert!(w.transfer(&t, &a, &b, 500).unwrap());
        assert_eq!(w.balance(&t, &a), 0);
        assert_eq!(w.balance(&t, &b), 0);
    }

    #[test]
    fn silent_failure_leaves_state() {
        let mut w = World::default();
        let (t, a, b) = (addr("t"), addr("a"), addr("b"));
        w.register_token(t, TokenBehavior::silent_failure());
        w.mint(&t, &a, 10).unwrap();
        assert!(!w.transfer(&t, &a, &b, 11).unwrap());
        assert_eq!(w.balance(&t, &a), 10);
        assert_eq!(w.balance(&t, &b), 0);
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let mut w = World::default();
        let (t, owner, spender, to) = (addr("t"), addr("o"), addr("s"), addr("to"));
        w.mint(&t, &owner, 100).unwrap();
        w.approve(&t, &owner, &spender, 60).unwrap();
        assert!(w.transfer_from(&t, &spender, &owner, &to, 50).unwrap());
        assert_eq!(w.allowance(&t, &owner, &spender), 10);
        assert!(w.transfer_from(&t, &spender, &owner, &to, 11).is_err());
        assert_eq!(w.balance(&t, &to), 50);
    }

    #[test]
    fn strict_approve_rejects_nonzero_to_nonzero() {
        let mut w = World::default();
        let (t, owner, spender) = (addr("t"), addr("o"), addr("s"));
        w.register_token(t, TokenBehavior::strict_approve());
        w.approve(&t, &owner, &spender, 5).unwrap();
        assert!(w.approve(&t, &owner, &spender, 6).is_err());
        w.approve(&t, &owner, &spender, 0).unwrap();
        w.approve(&t, &owner, &spender, 6).unwrap();
        assert_eq!(w.allowance(&t, &owner, &spender), 6);
    }

    #[test]
    fn native_transfer_checks_balance() {
        let mut w = World::default();
        let (a, b) = (addr("a"), addr("b"));
        w.set_native(&a, 5);
        assert!(w.transfer_native(&a, &b, 6).is_err());
        w.transfer_native(&a, &b, 5).unwrap();
        assert_eq!(w.native_balance(&a), 0);
        assert_eq!(w.native_balance(&b), 5);
    }
}
