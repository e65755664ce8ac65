//! Vault configuration.
//!
//! A [`VaultConfig`] is the genesis state of the owner-controlled settings:
//! who the owner is, which asset is the accounting unit, which router
//! performs conversions, and the initial capacity limit. After construction
//! these values are only changed through the vault's administrative calls.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, Result, VaultError, constants};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Initial owner of the administrative channel.
    pub owner: Address,
    /// Asset every balance is denominated in.
    pub accounting_unit: Address,
    /// Exchange router; its pair registry is `router.factory()`.
    pub router: Address,
    /// Initial ceiling on the aggregate total, in unit base units.
    pub capacity: Amount,
    /// Number of audit records retained in memory.
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,
}

fn default_event_log_capacity() -> usize {
    constants::DEFAULT_EVENT_LOG_CAPACITY
}

impl VaultConfig {
    #[must_use]
    pub fn new(owner: Address, accounting_unit: Address, router: Address, capacity: Amount) -> Self {
        Self {
            owner,
            accounting_unit,
            router,
            capacity,
            event_log_capacity: constants::DEFAULT_EVENT_LOG_CAPACITY,
        }
    }

    /// Reject zero addresses and an empty event log.
    pub fn validate(&self) -> Result<()> {
        self.owner.ensure_non_zero("owner")?;
        self.accounting_unit.ensure_non_zero("accounting_unit")?;
        self.router.ensure_non_zero("router")?;
        if self.event_log_capacity == 0 {
            return Err(VaultError::Configuration(
                "event_log_capacity must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| VaultError::Configuration(format!("invalid vault config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VaultConfig {
        VaultConfig::new(
            Address::derive("owner"),
            Address::derive("usdc"),
            Address::derive("router"),
            1_000_000,
        )
    }

    #[test]
    fn valid_config_passes() {
        assert!(sample().validate().is_ok());
        assert_eq!(sample().event_log_capacity, constants::DEFAULT_EVENT_LOG_CAPACITY);
    }

    #[test]
    fn zero_router_rejected() {
        let mut cfg = sample();
        cfg.router = Address::ZERO;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, VaultError::ZeroAddress { param: "router" }));
    }

    #[test]
    fn zero_log_capacity_rejected() {
        let mut cfg = sample();
        cfg.event_log_capacity = 0;
        assert!(matches!(
            cfg.validate().unwrap_err(),
            VaultError::Configuration(_)
        ));
    }

    #[test]
    fn json_defaults_event_log_capacity() {
        let cfg = sample();
        let json = format!(
            r#"{{"owner":"{}","accounting_unit":"{}","router":"{}","capacity":1000000}}"#,
            cfg.owner, cfg.accounting_unit, cfg.router
        );
        let parsed = VaultConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn json_with_zero_owner_rejected() {
        let cfg = sample();
        let json = format!(
            r#"{{"owner":"{}","accounting_unit":"{}","router":"{}","capacity":5}}"#,
            Address::ZERO,
            cfg.accounting_unit,
            cfg.router
        );
        assert!(matches!(
            VaultConfig::from_json_str(&json).unwrap_err(),
            VaultError::ZeroAddress { param: "owner" }
        ));
    }

    #[test]
    fn malformed_json_is_configuration_error() {
        let err = VaultConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, VaultError::Configuration(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = VaultConfig::from_json_file("/nonexistent/capvault.json").unwrap_err();
        assert!(matches!(err, VaultError::Io(_)));
    }
}
