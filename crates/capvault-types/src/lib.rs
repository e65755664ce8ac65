//! # capvault-types
//!
//! Shared types, errors, and configuration for the **CapVault** ledger.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`EventId`]
//! - **Balance model**: [`Amount`], [`BalanceEntry`], [`AssetIn`]
//! - **Lifecycle**: [`Lifecycle`]
//! - **Audit trail**: [`VaultEvent`], [`EventRecord`], [`EventKind`]
//! - **Configuration**: [`VaultConfig`]
//! - **Errors**: [`VaultError`] with `CV_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod balance;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod lifecycle;

// Re-export all primary types at crate root:
//   use capvault_types::{Address, Amount, VaultError, ...};

pub use balance::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use lifecycle::*;

// Constants are accessed via `capvault_types::constants::FOO`
// (not re-exported to avoid name collisions).
