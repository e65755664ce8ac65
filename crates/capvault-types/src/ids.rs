//! Identifiers used throughout CapVault.
//!
//! Every party and contract (depositor, owner, vault, asset, router,
//! pair registry) is named by a 20-byte [`Address`]. Audit records are
//! named by a UUIDv7 [`EventId`] for time-ordered sorting.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{VaultError, constants::ADDRESS_LEN};

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account / contract address. Serialized as `0x`-prefixed hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// The null address. Rejected wherever an identity is required.
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Deterministic address from a human-readable label.
    ///
    /// The same label always yields the same address, which keeps fixtures
    /// and configuration files stable across runs.
    #[must_use]
    pub fn derive(label: &str) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(crate::constants::ADDRESS_DERIVATION_DOMAIN);
        hasher.update(label.as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&hash[..ADDRESS_LEN]);
        Self(bytes)
    }

    /// Reject the zero address for the named parameter.
    pub fn ensure_non_zero(self, param: &'static str) -> crate::Result<Self> {
        if self.is_zero() {
            return Err(VaultError::ZeroAddress { param });
        }
        Ok(self)
    }

    /// Random address for tests.
    #[cfg(feature = "test-helpers")]
    #[must_use]
    pub fn random() -> Self {
        Self(rand::random())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(digits)
            .map_err(|e| VaultError::Serialization(format!("invalid address {s}: {e}")))?;
        let bytes: [u8; ADDRESS_LEN] = raw.try_into().map_err(|raw: Vec<u8>| {
            VaultError::Serialization(format!(
                "invalid address {s}: expected {ADDRESS_LEN} bytes, got {}",
                raw.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = VaultError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

// ---------------------------------------------------------------------------
// EventId
// ---------------------------------------------------------------------------

/// Unique identifier for an audit record. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_address_is_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::derive("alice").is_zero());
    }

    #[test]
    fn derive_is_deterministic() {
        assert_eq!(Address::derive("vault"), Address::derive("vault"));
        assert_ne!(Address::derive("vault"), Address::derive("router"));
    }

    #[test]
    fn display_parse_roundtrip() {
        let addr = Address::derive("alice");
        let text = addr.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.len(), 2 + ADDRESS_LEN * 2);
        let back: Address = text.parse().unwrap();
        assert_eq!(addr, back);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = "0xdeadbeef".parse::<Address>().unwrap_err();
        assert!(matches!(err, VaultError::Serialization(_)));
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert!("0xzz".parse::<Address>().is_err());
    }

    #[test]
    fn ensure_non_zero_names_param() {
        let err = Address::ZERO.ensure_non_zero("router").unwrap_err();
        assert!(matches!(err, VaultError::ZeroAddress { param: "router" }));
        assert!(Address::derive("x").ensure_non_zero("router").is_ok());
    }

    #[test]
    fn address_serializes_as_hex_string() {
        let addr = Address::derive("bob");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{addr}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }

    #[test]
    fn random_addresses_differ() {
        let a = Address(rand::random());
        let b = Address(rand::random());
        assert_ne!(a, b);
    }

    #[test]
    fn event_id_ordering() {
        let a = EventId::new();
        let b = EventId::new();
        assert!(a < b);
    }
}
