//! Boundary traits for everything the vault does not own.
//!
//! The vault reaches the outside world only through these traits:
//!
//! - [`FungibleAsset`]: the accounting unit and every depositable asset
//! - [`PairRegistry`]: answers "is there a direct pair between A and B?"
//! - [`ExchangeRouter`]: exact-input single-hop swaps
//! - [`Host`]: the execution environment: clock, native currency,
//!   address → contract resolution and atomic checkpoints
//!
//! All calls take the acting address explicitly (`caller`, `owner`,
//! `spender`) instead of relying on an ambient sender.

use std::sync::Arc;

use capvault_types::{Address, Amount, Result};

/// A fungible asset contract.
///
/// Mutating calls return `Ok(false)` for a non-reverting failure and `Err`
/// for a reverting one. Callers must not trust either a `true` return or a
/// silent success; see [`crate::transfer`].
pub trait FungibleAsset: Send + Sync {
    fn address(&self) -> Address;

    fn balance_of(&self, owner: &Address) -> Amount;

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    /// Move `amount` from `caller` to `to`.
    fn transfer(&self, caller: &Address, to: &Address, amount: Amount) -> Result<bool>;

    /// Move `amount` from `from` to `to`, spending `spender`'s allowance.
    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<bool>;

    /// Set `spender`'s allowance over `owner`'s funds to exactly `amount`.
    fn approve(&self, owner: &Address, spender: &Address, amount: Amount) -> Result<bool>;
}

/// Registry of direct trading pairs.
pub trait PairRegistry: Send + Sync {
    /// The pair handle for `(a, b)` in either order, or `None`.
    fn get_pair(&self, a: &Address, b: &Address) -> Option<Address>;
}

/// Exact-input swap router.
///
/// Returned vectors hold the per-hop amounts the router *claims* to have
/// moved. They are advisory: the vault measures what it actually received.
pub trait ExchangeRouter: Send + Sync {
    fn address(&self) -> Address;

    /// Address of the pair registry this router trades against.
    fn factory(&self) -> Address;

    /// Wrapped-native asset used as the first hop for native input.
    fn wrapped_native(&self) -> Address;

    /// Swap exactly `amount_in` of `path[0]` (pulled from `caller` via
    /// allowance) for at least `amount_out_min` of `path[last]`, paid to `to`.
    ///
    /// Fails with `Slippage` if the output is below the floor or
    /// `deadline` has passed.
    fn swap_exact_tokens_for_tokens(
        &self,
        caller: &Address,
        amount_in: Amount,
        amount_out_min: Amount,
        path: &[Address],
        to: &Address,
        deadline: u64,
    ) -> Result<Vec<Amount>>;

    /// As [`Self::swap_exact_tokens_for_tokens`] with `value` native currency
    /// taken from `caller` as input. `path[0]` must be [`Self::wrapped_native`].
    fn swap_exact_native_for_tokens(
        &self,
        caller: &Address,
        value: Amount,
        amount_out_min: Amount,
        path: &[Address],
        to: &Address,
        deadline: u64,
    ) -> Result<Vec<Amount>>;
}

/// Opaque handle returned by [`Host::checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checkpoint(pub u64);

/// An open [`Host`] checkpoint that rolls back when dropped uncommitted.
///
/// Dropping covers `?` propagation and unwinding out of a panicking
/// collaborator, so the host never keeps effects of an operation that did
/// not finish.
#[must_use = "the checkpoint is rolled back as soon as the guard is dropped"]
pub struct CheckpointGuard<'h, H: Host + ?Sized> {
    host: &'h H,
    checkpoint: Option<Checkpoint>,
}

impl<'h, H: Host + ?Sized> CheckpointGuard<'h, H> {
    pub fn open(host: &'h H) -> Self {
        Self {
            checkpoint: Some(host.checkpoint()),
            host,
        }
    }

    /// Keep every effect made since [`Self::open`].
    pub fn commit(mut self) {
        if let Some(checkpoint) = self.checkpoint.take() {
            self.host.commit(checkpoint);
        }
    }

    /// Undo every effect made since [`Self::open`].
    pub fn rollback(mut self) {
        if let Some(checkpoint) = self.checkpoint.take() {
            self.host.rollback(checkpoint);
        }
    }
}

impl<H: Host + ?Sized> Drop for CheckpointGuard<'_, H> {
    fn drop(&mut self) {
        if let Some(checkpoint) = self.checkpoint.take() {
            if std::thread::panicking() {
                tracing::warn!(checkpoint = checkpoint.0, "Rolling back after panic");
            }
            self.host.rollback(checkpoint);
        }
    }
}

/// The execution environment the vault runs inside.
///
/// The host owns the atomic unit of work: every effect made through the
/// host or its contracts after [`Host::checkpoint`] is either kept by
/// [`Host::commit`] or undone by [`Host::rollback`]. A host without
/// transactional storage must implement `rollback` as a compensating action
/// (refund, reverse swap); the vault relies on it either way.
pub trait Host: Send + Sync {
    /// Current time in seconds. Swaps with a deadline before it are
    /// rejected before the router is called.
    fn timestamp(&self) -> u64;

    fn checkpoint(&self) -> Checkpoint;

    fn commit(&self, checkpoint: Checkpoint);

    fn rollback(&self, checkpoint: Checkpoint);

    fn token(&self, address: &Address) -> Result<Arc<dyn FungibleAsset>>;

    fn router(&self, address: &Address) -> Result<Arc<dyn ExchangeRouter>>;

    fn pair_registry(&self, address: &Address) -> Result<Arc<dyn PairRegistry>>;

    fn native_balance(&self, owner: &Address) -> Amount;

    fn transfer_native(&self, from: &Address, to: &Address, amount: Amount) -> Result<()>;
}
