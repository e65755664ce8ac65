//! # capvault-settlement
//!
//! **Settlement Plane**: the ledger and every guard composed around it.
//!
//! ## Architecture
//!
//! A deposit or withdrawal enters the [`Vault`] and:
//! 1. Takes the [`ReentrancyLock`] (scoped, released on every exit path)
//! 2. Opens a host checkpoint (the atomic unit of work)
//! 3. Passes the lifecycle gate of [`AccessControl`]
//! 4. Runs the [`CapacityGuard`] pre-check (exact amount, or the swap floor)
//! 5. Performs its external calls (pull, swap, push)
//! 6. Runs the capacity post-check and mutates the [`Ledger`] exactly once
//! 7. Commits and publishes one event to the [`EventLog`], or rolls back
//!
//! Administrative calls take the same frame but gate on ownership instead
//! of the lifecycle, so the owner can still act while paused.
//!
//! [`SupplyConservation`] audits `Σ balances == total ≤ held unit` on demand.

pub mod access;
pub mod capacity;
pub mod event_log;
pub mod ledger;
pub mod reentrancy;
pub mod supply_conservation;
pub mod vault;

pub use access::AccessControl;
pub use capacity::CapacityGuard;
pub use event_log::EventLog;
pub use ledger::Ledger;
pub use reentrancy::{EntryGuard, ReentrancyLock};
pub use supply_conservation::{SolvencyReport, SupplyConservation};
pub use vault::{Vault, VaultSettings};
