//! # capvault-exchange
//!
//! **Boundary Plane**: everything between the vault and the outside world.
//!
//! ## Architecture
//!
//! 1. **Host traits** ([`host`]): fungible assets, pair registry, router,
//!    and the host environment with its atomic checkpoints
//! 2. **Safe transfers** ([`transfer`]): post-state-verified token calls
//! 3. **PairValidator**: direct-pair check against the router's registry
//! 4. **ExchangeAdapter**: exact-input swaps credited by measured delta
//!
//! ## Swap Flow
//!
//! ```text
//! PairValidator.ensure_swappable() → force_approve(0, amount_in)
//!     → router.swap_exact_*() → received = Δ unit.balance_of(vault)
//! ```
//!
//! The in-memory host used by tests lives in [`testkit`] behind the
//! `test-helpers` feature.

pub mod adapter;
pub mod host;
pub mod pair_validator;
pub mod transfer;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testkit;

pub use adapter::{ExchangeAdapter, SwapOutcome, SwapRequest};
pub use host::{Checkpoint, CheckpointGuard, ExchangeRouter, FungibleAsset, Host, PairRegistry};
pub use pair_validator::PairValidator;
