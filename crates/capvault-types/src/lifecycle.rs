//! Vault lifecycle flag.
//!
//! Two states only: **ACTIVE ⇄ PAUSED**. Both transitions are owner-only.
//! While paused every balance-mutating entry point is rejected; reads and
//! administrative calls stay available.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Deposits, swaps and withdrawals are accepted.
    #[default]
    Active,
    /// Balance-mutating entry points are rejected.
    Paused,
}

impl Lifecycle {
    #[must_use]
    pub fn is_paused(self) -> bool {
        matches!(self, Self::Paused)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Paused => write!(f, "PAUSED"),
        }
    }
}
