//! Balance types for the CapVault ledger.
//!
//! All balances are denominated in base units of the accounting unit and
//! stored as unsigned integers. There is no frozen/available split: a
//! depositor's whole balance is withdrawable at any time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Address;

/// Amount in base units of an asset.
pub type Amount = u128;

/// A single depositor's tracked balance in the accounting unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub depositor: Address,
    pub amount: Amount,
}

impl BalanceEntry {
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

/// The source of value for a swap-mediated deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetIn {
    /// The host's native currency, attached to the call.
    Native,
    /// A fungible asset pulled from the depositor.
    Token(Address),
}

impl fmt::Display for AssetIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "NATIVE"),
            Self::Token(address) => write!(f, "{address}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_entry() {
        let entry = BalanceEntry {
            depositor: Address::derive("alice"),
            amount: 0,
        };
        assert!(entry.is_zero());
    }

    #[test]
    fn asset_in_display() {
        assert_eq!(AssetIn::Native.to_string(), "NATIVE");
        let token = Address::derive("wbtc");
        assert_eq!(AssetIn::Token(token).to_string(), token.to_string());
    }
}
