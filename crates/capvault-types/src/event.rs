//! Audit events for the CapVault ledger.
//!
//! Every committed deposit, withdrawal and administrative change produces
//! exactly one [`VaultEvent`], wrapped in an [`EventRecord`] when it is
//! published. Rolled-back operations publish nothing.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, AssetIn, EventId};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEvent {
    /// Accounting unit deposited directly.
    Deposited { depositor: Address, amount: Amount },
    /// An asset (or native currency) swapped into the unit and credited.
    SwapDeposited {
        depositor: Address,
        asset_in: AssetIn,
        amount_in: Amount,
        /// Measured unit delta; the credited amount.
        received: Amount,
    },
    Withdrawn { depositor: Address, amount: Amount },
    CapacityUpdated { old: Amount, new: Amount },
    RouterUpdated { old: Address, new: Address },
    AccountingUnitUpdated { old: Address, new: Address },
    OwnershipTransferred { old: Address, new: Address },
    Paused { by: Address },
    Unpaused { by: Address },
    /// Owner swept an asset out of the vault. `asset` is `Native` for native currency.
    AssetRescued {
        asset: AssetIn,
        to: Address,
        amount: Amount,
    },
}

impl VaultEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Deposited { .. } => EventKind::Deposited,
            Self::SwapDeposited { .. } => EventKind::SwapDeposited,
            Self::Withdrawn { .. } => EventKind::Withdrawn,
            Self::CapacityUpdated { .. } => EventKind::CapacityUpdated,
            Self::RouterUpdated { .. } => EventKind::RouterUpdated,
            Self::AccountingUnitUpdated { .. } => EventKind::AccountingUnitUpdated,
            Self::OwnershipTransferred { .. } => EventKind::OwnershipTransferred,
            Self::Paused { .. } => EventKind::Paused,
            Self::Unpaused { .. } => EventKind::Unpaused,
            Self::AssetRescued { .. } => EventKind::AssetRescued,
        }
    }

    /// Whether this event changed a depositor balance.
    #[must_use]
    pub fn is_balance_change(&self) -> bool {
        matches!(
            self,
            Self::Deposited { .. } | Self::SwapDeposited { .. } | Self::Withdrawn { .. }
        )
    }
}

/// Discriminant of a [`VaultEvent`], for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Deposited,
    SwapDeposited,
    Withdrawn,
    CapacityUpdated,
    RouterUpdated,
    AccountingUnitUpdated,
    OwnershipTransferred,
    Paused,
    Unpaused,
    AssetRescued,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposited => write!(f, "DEPOSITED"),
            Self::SwapDeposited => write!(f, "SWAP_DEPOSITED"),
            Self::Withdrawn => write!(f, "WITHDRAWN"),
            Self::CapacityUpdated => write!(f, "CAPACITY_UPDATED"),
            Self::RouterUpdated => write!(f, "ROUTER_UPDATED"),
            Self::AccountingUnitUpdated => write!(f, "ACCOUNTING_UNIT_UPDATED"),
            Self::OwnershipTransferred => write!(f, "OWNERSHIP_TRANSFERRED"),
            Self::Paused => write!(f, "PAUSED"),
            Self::Unpaused => write!(f, "UNPAUSED"),
            Self::AssetRescued => write!(f, "ASSET_RESCUED"),
        }
    }
}

/// A published event with its position in the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    /// Monotonic, gap-free across the vault's lifetime.
    pub sequence: u64,
    pub emitted_at: DateTime<Utc>,
    pub event: VaultEvent,
}

impl EventRecord {
    #[must_use]
    pub fn new(sequence: u64, event: VaultEvent) -> Self {
        Self {
            id: EventId::new(),
            sequence,
            emitted_at: Utc::now(),
            event,
        }
    }
}
