//! Owner gate and lifecycle flag.
//!
//! Balance-mutating entry points call [`AccessControl::ensure_active`];
//! administrative ones call [`AccessControl::ensure_owner`]. The two are
//! independent: the owner keeps administrative access while paused, and
//! pausing binds everyone, the owner included.

use capvault_types::{Address, Lifecycle, Result, VaultError};

#[derive(Debug, Clone)]
pub struct AccessControl {
    owner: Address,
    lifecycle: Lifecycle,
}

impl AccessControl {
    /// Start `Active` under `owner`.
    pub fn new(owner: Address) -> Result<Self> {
        Ok(Self {
            owner: owner.ensure_non_zero("owner")?,
            lifecycle: Lifecycle::Active,
        })
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    #[must_use]
    pub fn is_owner(&self, caller: &Address) -> bool {
        *caller == self.owner
    }

    pub fn ensure_owner(&self, caller: &Address) -> Result<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(VaultError::NotAuthorized { caller: *caller })
        }
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Guard for balance-mutating entry points.
    pub fn ensure_active(&self) -> Result<()> {
        if self.lifecycle.is_paused() {
            Err(VaultError::Paused)
        } else {
            Ok(())
        }
    }

    /// ACTIVE → PAUSED.
    pub fn pause(&mut self, caller: &Address) -> Result<()> {
        self.ensure_owner(caller)?;
        self.ensure_active()?;
        self.lifecycle = Lifecycle::Paused;
        Ok(())
    }

    /// PAUSED → ACTIVE.
    pub fn unpause(&mut self, caller: &Address) -> Result<()> {
        self.ensure_owner(caller)?;
        if !self.lifecycle.is_paused() {
            return Err(VaultError::NotPaused);
        }
        self.lifecycle = Lifecycle::Active;
        Ok(())
    }

    /// Hand the administrative channel to `new_owner`; returns the old owner.
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<Address> {
        self.ensure_owner(caller)?;
        let new_owner = new_owner.ensure_non_zero("new_owner")?;
        Ok(std::mem::replace(&mut self.owner, new_owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::derive("owner")
    }

    fn mallory() -> Address {
        Address::derive("mallory")
    }

    #[test]
    fn starts_active() {
        let access = AccessControl::new(owner()).unwrap();
        assert_eq!(access.lifecycle(), Lifecycle::Active);
        assert!(access.ensure_active().is_ok());
    }

    #[test]
    fn zero_owner_rejected() {
        assert!(matches!(
            AccessControl::new(Address::ZERO).unwrap_err(),
            VaultError::ZeroAddress { param: "owner" }
        ));
    }

    #[test]
    fn pause_blocks_and_unpause_restores() {
        let mut access = AccessControl::new(owner()).unwrap();
        access.pause(&owner()).unwrap();
        assert_eq!(access.ensure_active().unwrap_err(), VaultError::Paused);
        // Administrative access survives the pause.
        assert!(access.ensure_owner(&owner()).is_ok());
        access.unpause(&owner()).unwrap();
        assert!(access.ensure_active().is_ok());
    }

    #[test]
    fn non_owner_cannot_toggle() {
        let mut access = AccessControl::new(owner()).unwrap();
        assert!(matches!(
            access.pause(&mallory()).unwrap_err(),
            VaultError::NotAuthorized { .. }
        ));
        access.pause(&owner()).unwrap();
        assert!(access.unpause(&mallory()).is_err());
        assert_eq!(access.lifecycle(), Lifecycle::Paused);
    }

    #[test]
    fn redundant_transitions_rejected() {
        let mut access = AccessControl::new(owner()).unwrap();
        assert_eq!(access.unpause(&owner()).unwrap_err(), VaultError::NotPaused);
        access.pause(&owner()).unwrap();
        assert_eq!(access.pause(&owner()).unwrap_err(), VaultError::Paused);
    }

    #[test]
    fn ownership_transfer() {
        let mut access = AccessControl::new(owner()).unwrap();
        let next = Address::derive("next");
        assert!(access.transfer_ownership(&owner(), Address::ZERO).is_err());
        assert_eq!(access.transfer_ownership(&owner(), next).unwrap(), owner());
        assert!(access.is_owner(&next));
        assert!(access.ensure_owner(&owner()).is_err());
    }
}
