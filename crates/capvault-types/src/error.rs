//! Error types for the CapVault ledger.
//!
//! All errors use the `CV_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Input errors
//! - 2xx: Balance / capacity errors
//! - 3xx: Exchange and external-call errors
//! - 4xx: Guard errors (reentrancy, access, lifecycle)
//! - 8xx: Invariant errors
//! - 9xx: General / internal errors
//!
//! Every error aborts the operation that raised it with no side effects.
//! Nothing is retried internally.

use thiserror::Error;

use crate::{Address, Amount};

/// Central error enum for all CapVault operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    // =================================================================
    // Input Errors (1xx)
    // =================================================================
    /// An address parameter that must be non-null is the zero address.
    #[error("CV_ERR_100: Zero address for parameter `{param}`")]
    ZeroAddress { param: &'static str },

    /// A deposit, withdrawal or credit amount is zero.
    #[error("CV_ERR_101: Amount must be greater than zero")]
    ZeroAmount,

    /// The asset has no direct pair with the accounting unit, or is the unit itself.
    #[error("CV_ERR_102: Unsupported asset {asset}: {reason}")]
    UnsupportedAsset { asset: String, reason: String },

    // =================================================================
    // Balance Errors (2xx)
    // =================================================================
    /// Withdrawal exceeds the depositor's tracked balance.
    #[error("CV_ERR_200: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    /// The operation would push the aggregate total above the capacity limit.
    #[error("CV_ERR_201: Capacity exceeded: total {total} + {requested} > limit {limit}")]
    CapacityExceeded {
        total: Amount,
        requested: Amount,
        limit: Amount,
    },

    /// An increment would overflow the balance representation.
    #[error("CV_ERR_202: Balance overflow: {current} + {increment}")]
    BalanceOverflow { current: Amount, increment: Amount },

    /// A rescue of the accounting unit would dip into depositor funds.
    #[error("CV_ERR_203: Insufficient surplus: requested {requested}, surplus {surplus}")]
    InsufficientSurplus { requested: Amount, surplus: Amount },

    // =================================================================
    // Exchange Errors (3xx)
    // =================================================================
    /// The exchange produced less than the caller's floor, or the deadline passed.
    #[error("CV_ERR_300: Slippage: {reason}")]
    Slippage { reason: String },

    /// A token transfer / approval / native transfer failed or misbehaved.
    #[error("CV_ERR_301: External call failed: {reason}")]
    ExternalCallFailed { reason: String },

    /// The host could not resolve an address to a contract of the expected kind.
    #[error("CV_ERR_302: Unknown {kind} contract at {address}")]
    UnknownContract { kind: &'static str, address: Address },

    // =================================================================
    // Guard Errors (4xx)
    // =================================================================
    /// A guarded entry point was invoked while one was already executing.
    #[error("CV_ERR_400: Reentrant call rejected")]
    ReentrantCall,

    /// An owner-only call from someone else.
    #[error("CV_ERR_401: Caller {caller} is not authorized")]
    NotAuthorized { caller: Address },

    /// A mutating call while the vault is paused.
    #[error("CV_ERR_402: Vault is paused")]
    Paused,

    /// Unpause requested while the vault is active.
    #[error("CV_ERR_403: Vault is not paused")]
    NotPaused,

    // =================================================================
    // Invariant Errors (8xx)
    // =================================================================
    /// Ledger total, sum of balances and held unit disagree.
    #[error("CV_ERR_800: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // General (9xx)
    // =================================================================
    /// Serialization / deserialization error.
    #[error("CV_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, zero addresses, etc.).
    #[error("CV_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (reading configuration).
    #[error("CV_ERR_903: I/O error: {0}")]
    Io(String),
}

impl VaultError {
    /// Shorthand for an external-call failure.
    pub fn external(reason: impl Into<String>) -> Self {
        Self::ExternalCallFailed {
            reason: reason.into(),
        }
    }

    /// Shorthand for a slippage failure.
    pub fn slippage(reason: impl Into<String>) -> Self {
        Self::Slippage {
            reason: reason.into(),
        }
    }

    /// Shorthand for an unsupported-asset failure.
    pub fn unsupported(asset: impl ToString, reason: impl Into<String>) -> Self {
        Self::UnsupportedAsset {
            asset: asset.to_string(),
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, VaultError>;

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
