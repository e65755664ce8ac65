//! The vault: every entry point, composed from the guards.
//!
//! Each mutating call runs the same frame:
//!
//! ```text
//! ReentrancyLock.enter() → Host.checkpoint()
//!     → [lifecycle gate] → argument checks → pair / capacity pre-checks
//!     → external calls (pull, swap, push)
//!     → state lock: capacity post-check + Ledger credit/debit
//!     → Host.commit() + EventLog.publish()      on success
//!     → Host.rollback()                          on any error or unwind
//! ```
//!
//! The ledger write is the last fallible step, so a rollback never has to
//! undo vault state; it only has to undo what the host did. The state lock
//! is never held across an external call.

use std::sync::Arc;

use capvault_exchange::transfer::{pull, safe_transfer, safe_transfer_from};
use capvault_exchange::{CheckpointGuard, ExchangeAdapter, Host, PairValidator, SwapRequest};
use capvault_types::{
    Address, Amount, AssetIn, BalanceEntry, EventRecord, Lifecycle, Result, VaultConfig,
    VaultError, VaultEvent, constants,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::access::AccessControl;
use crate::capacity::CapacityGuard;
use crate::event_log::EventLog;
use crate::ledger::Ledger;
use crate::reentrancy::ReentrancyLock;
use crate::supply_conservation::{SolvencyReport, SupplyConservation};

/// Owner-controlled configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSettings {
    pub accounting_unit: Address,
    pub router: Address,
    pub capacity: CapacityGuard,
}

struct VaultState {
    ledger: Ledger,
    settings: VaultSettings,
    access: AccessControl,
    supply: SupplyConservation,
}

/// Settings and total observed at the start of a balance-mutating call.
struct Frame {
    settings: VaultSettings,
    total: Amount,
}

/// Custodial ledger in a single accounting unit.
///
/// The API takes `&self`: external calls may re-enter the vault, and the
/// [`ReentrancyLock`] is what turns those into `ReentrantCall` errors.
/// Concurrent callers are not queued; a second call while one is in flight
/// fails the same way.
pub struct Vault<H: Host> {
    host: Arc<H>,
    address: Address,
    state: Mutex<VaultState>,
    lock: ReentrancyLock,
    events: Mutex<EventLog>,
}

impl<H: Host> Vault<H> {
    /// Create a vault at `address` holding its funds on `host`.
    ///
    /// # Errors
    /// - `ZeroAddress` / `Configuration` from [`VaultConfig::validate`]
    /// - `UnknownContract` if the unit, router or its registry do not resolve
    pub fn new(host: Arc<H>, address: Address, config: &VaultConfig) -> Result<Self> {
        config.validate()?;
        let address = address.ensure_non_zero("vault")?;
        host.token(&config.accounting_unit)?;
        PairValidator::for_router(host.as_ref(), &config.router, config.accounting_unit)?;

        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            vault = %address,
            owner = %config.owner,
            unit = %config.accounting_unit,
            router = %config.router,
            capacity = config.capacity,
            "Vault created"
        );

        Ok(Self {
            host,
            address,
            state: Mutex::new(VaultState {
                ledger: Ledger::new(),
                settings: VaultSettings {
                    accounting_unit: config.accounting_unit,
                    router: config.router,
                    capacity: CapacityGuard::new(config.capacity),
                },
                access: AccessControl::new(config.owner)?,
                supply: SupplyConservation::new(),
            }),
            lock: ReentrancyLock::new(),
            events: Mutex::new(EventLog::new(config.event_log_capacity)),
        })
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    // -----------------------------------------------------------------------
    // Balance-mutating entry points
    // -----------------------------------------------------------------------

    /// Deposit `amount` of the accounting unit, pulled from `caller` via allowance.
    ///
    /// # Errors
    /// `ReentrantCall`, `Paused`, `ZeroAmount`, `CapacityExceeded`, or
    /// `ExternalCallFailed` if the vault did not receive exactly `amount`.
    pub fn deposit(&self, caller: Address, amount: Amount) -> Result<()> {
        self.guarded("deposit", || {
            let frame = self.frame()?;
            if amount == 0 {
                return Err(VaultError::ZeroAmount);
            }
            frame.settings.capacity.pre_check(frame.total, amount)?;

            let unit = self.host.token(&frame.settings.accounting_unit)?;
            safe_transfer_from(unit.as_ref(), &self.address, &caller, &self.address, amount)?;
            self.commit_credit(caller, amount)?;

            tracing::info!(depositor = %caller, amount, "Deposit");
            Ok((
                (),
                VaultEvent::Deposited {
                    depositor: caller,
                    amount,
                },
            ))
        })
    }

    /// Pull `amount_in` of `asset` from `caller`, swap it into the unit and
    /// credit the measured result. Returns the credited amount.
    ///
    /// # Errors
    /// As [`Self::deposit`], plus `ZeroAddress`, `UnsupportedAsset` (no
    /// direct pair, or `asset` is the unit) and `Slippage`.
    pub fn swap_deposit(
        &self,
        caller: Address,
        asset: Address,
        amount_in: Amount,
        minimum_out: Amount,
        deadline: u64,
    ) -> Result<Amount> {
        self.guarded("swap_deposit", || {
            let frame = self.frame()?;
            let asset = asset.ensure_non_zero("asset")?;
            if amount_in == 0 {
                return Err(VaultError::ZeroAmount);
            }
            self.validator(&frame.settings)?.ensure_swappable(&asset)?;
            frame.settings.capacity.pre_check(frame.total, minimum_out)?;

            let token = self.host.token(&asset)?;
            let pulled = pull(token.as_ref(), &self.address, &caller, &self.address, amount_in)?;
            let input = AssetIn::Token(asset);
            let received = self.settle_swap(&frame, caller, input, pulled, minimum_out, deadline)?;

            Ok((
                received,
                VaultEvent::SwapDeposited {
                    depositor: caller,
                    asset_in: input,
                    amount_in: pulled,
                    received,
                },
            ))
        })
    }

    /// Take `value` native currency from `caller`, swap it into the unit
    /// through the router's wrapped-native pair and credit the result.
    ///
    /// # Errors
    /// As [`Self::swap_deposit`].
    pub fn swap_deposit_native(
        &self,
        caller: Address,
        value: Amount,
        minimum_out: Amount,
        deadline: u64,
    ) -> Result<Amount> {
        self.guarded("swap_deposit_native", || {
            let frame = self.frame()?;
            if value == 0 {
                return Err(VaultError::ZeroAmount);
            }
            let router = self.host.router(&frame.settings.router)?;
            self.validator(&frame.settings)?
                .ensure_swappable(&router.wrapped_native())?;
            frame.settings.capacity.pre_check(frame.total, minimum_out)?;

            self.host.transfer_native(&caller, &self.address, value)?;
            let received =
                self.settle_swap(&frame, caller, AssetIn::Native, value, minimum_out, deadline)?;

            Ok((
                received,
                VaultEvent::SwapDeposited {
                    depositor: caller,
                    asset_in: AssetIn::Native,
                    amount_in: value,
                    received,
                },
            ))
        })
    }

    /// Send `amount` of the unit back to `caller` and debit their balance.
    ///
    /// # Errors
    /// `ReentrantCall`, `Paused`, `ZeroAmount`, `InsufficientBalance`, or
    /// `ExternalCallFailed` if the transfer out did not debit exactly `amount`.
    pub fn withdraw(&self, caller: Address, amount: Amount) -> Result<()> {
        self.guarded("withdraw", || {
            let frame = self.frame()?;
            self.state.lock().ledger.ensure_covers(&caller, amount)?;

            let unit = self.host.token(&frame.settings.accounting_unit)?;
            safe_transfer(unit.as_ref(), &self.address, &caller, amount)?;
            {
                let mut state = self.state.lock();
                state.ledger.debit(caller, amount)?;
                state.supply.record_withdrawal(amount);
            }

            tracing::info!(depositor = %caller, amount, "Withdrawal");
            Ok((
                (),
                VaultEvent::Withdrawn {
                    depositor: caller,
                    amount,
                },
            ))
        })
    }

    // -----------------------------------------------------------------------
    // Administrative entry points (owner-only, available while paused)
    // -----------------------------------------------------------------------

    /// Replace the capacity limit. Values below the current total are accepted.
    pub fn set_capacity(&self, caller: Address, capacity: Amount) -> Result<()> {
        self.guarded("set_capacity", || {
            let mut state = self.state.lock();
            state.access.ensure_owner(&caller)?;
            let old = state.settings.capacity.set_limit(capacity);
            if capacity < state.ledger.total() {
                tracing::warn!(capacity, total = state.ledger.total(), "Capacity set below total");
            }
            tracing::info!(old, new = capacity, "Capacity updated");
            Ok(((), VaultEvent::CapacityUpdated { old, new: capacity }))
        })
    }

    /// Point the vault at another router. Past settlements are unaffected.
    pub fn set_router(&self, caller: Address, router: Address) -> Result<()> {
        self.guarded("set_router", || {
            let settings = self.owner_settings(&caller)?;
            let router = router.ensure_non_zero("router")?;
            PairValidator::for_router(self.host.as_ref(), &router, settings.accounting_unit)?;

            let old = std::mem::replace(&mut self.state.lock().settings.router, router);
            tracing::info!(%old, new = %router, "Router updated");
            Ok(((), VaultEvent::RouterUpdated { old, new: router }))
        })
    }

    /// Switch the accounting unit. Existing balances are not converted.
    pub fn set_accounting_unit(&self, caller: Address, unit: Address) -> Result<()> {
        self.guarded("set_accounting_unit", || {
            self.owner_settings(&caller)?;
            let unit = unit.ensure_non_zero("accounting_unit")?;
            self.host.token(&unit)?;

            let mut state = self.state.lock();
            let total = state.ledger.total();
            let old = std::mem::replace(&mut state.settings.accounting_unit, unit);
            if total > 0 && old != unit {
                tracing::warn!(%old, new = %unit, total, "Accounting unit changed with balances outstanding");
            }
            tracing::info!(%old, new = %unit, "Accounting unit updated");
            Ok(((), VaultEvent::AccountingUnitUpdated { old, new: unit }))
        })
    }

    pub fn pause(&self, caller: Address) -> Result<()> {
        self.guarded("pause", || {
            self.state.lock().access.pause(&caller)?;
            tracing::info!(by = %caller, "Vault paused");
            Ok(((), VaultEvent::Paused { by: caller }))
        })
    }

    pub fn unpause(&self, caller: Address) -> Result<()> {
        self.guarded("unpause", || {
            self.state.lock().access.unpause(&caller)?;
            tracing::info!(by = %caller, "Vault unpaused");
            Ok(((), VaultEvent::Unpaused { by: caller }))
        })
    }

    pub fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<()> {
        self.guarded("transfer_ownership", || {
            let old = self.state.lock().access.transfer_ownership(&caller, new_owner)?;
            tracing::info!(%old, new = %new_owner, "Ownership transferred");
            Ok((
                (),
                VaultEvent::OwnershipTransferred {
                    old,
                    new: new_owner,
                },
            ))
        })
    }

    /// Sweep `amount` of `asset` held by the vault to `to`.
    ///
    /// For the accounting unit only the surplus above the total is
    /// reachable; tracked balances stay fully backed.
    ///
    /// # Errors
    /// `NotAuthorized`, `ZeroAddress`, `ZeroAmount`, `InsufficientSurplus`,
    /// `ExternalCallFailed`.
    pub fn rescue_asset(
        &self,
        caller: Address,
        asset: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        self.guarded("rescue_asset", || {
            let settings = self.owner_settings(&caller)?;
            let asset = asset.ensure_non_zero("asset")?;
            let to = to.ensure_non_zero("to")?;
            if amount == 0 {
                return Err(VaultError::ZeroAmount);
            }

            let token = self.host.token(&asset)?;
            if asset == settings.accounting_unit {
                let held = token.balance_of(&self.address);
                let surplus = held.saturating_sub(self.total_deposits());
                if amount > surplus {
                    return Err(VaultError::InsufficientSurplus {
                        requested: amount,
                        surplus,
                    });
                }
            }
            safe_transfer(token.as_ref(), &self.address, &to, amount)?;

            tracing::info!(asset = %asset, to = %to, amount, "Asset rescued");
            Ok((
                (),
                VaultEvent::AssetRescued {
                    asset: AssetIn::Token(asset),
                    to,
                    amount,
                },
            ))
        })
    }

    /// Sweep `amount` of native currency held by the vault to `to`.
    pub fn rescue_native(&self, caller: Address, to: Address, amount: Amount) -> Result<()> {
        self.guarded("rescue_native", || {
            self.owner_settings(&caller)?;
            let to = to.ensure_non_zero("to")?;
            if amount == 0 {
                return Err(VaultError::ZeroAmount);
            }
            self.host.transfer_native(&self.address, &to, amount)?;

            tracing::info!(to = %to, amount, "Native currency rescued");
            Ok((
                (),
                VaultEvent::AssetRescued {
                    asset: AssetIn::Native,
                    to,
                    amount,
                },
            ))
        })
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn balance_of(&self, depositor: &Address) -> Amount {
        self.state.lock().ledger.balance_of(depositor)
    }

    #[must_use]
    pub fn total_deposits(&self) -> Amount {
        self.state.lock().ledger.total()
    }

    #[must_use]
    pub fn capacity(&self) -> Amount {
        self.state.lock().settings.capacity.limit()
    }

    #[must_use]
    pub fn remaining_capacity(&self) -> Amount {
        let state = self.state.lock();
        state.settings.capacity.remaining(state.ledger.total())
    }

    /// Whether `asset` can be swap-deposited under the current settings.
    #[must_use]
    pub fn is_pair_supported(&self, asset: &Address) -> bool {
        let settings = self.settings();
        self.validator(&settings)
            .is_ok_and(|validator| validator.ensure_swappable(asset).is_ok())
    }

    /// Whether native currency can be swap-deposited under the current settings.
    #[must_use]
    pub fn is_native_supported(&self) -> bool {
        self.host
            .router(&self.settings().router)
            .is_ok_and(|router| self.is_pair_supported(&router.wrapped_native()))
    }

    #[must_use]
    pub fn accounting_unit(&self) -> Address {
        self.state.lock().settings.accounting_unit
    }

    #[must_use]
    pub fn router(&self) -> Address {
        self.state.lock().settings.router
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.state.lock().access.owner()
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lock().access.lifecycle()
    }

    #[must_use]
    pub fn settings(&self) -> VaultSettings {
        self.state.lock().settings
    }

    /// Every depositor ever credited, sorted by address.
    #[must_use]
    pub fn entries(&self) -> Vec<BalanceEntry> {
        self.state.lock().ledger.entries()
    }

    /// Retained audit records, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<EventRecord> {
        self.events.lock().records()
    }

    #[must_use]
    pub fn events_since(&self, sequence: u64) -> Vec<EventRecord> {
        self.events.lock().since(sequence)
    }

    /// Audit Σ balances == total == deposits − withdrawals ≤ held unit.
    ///
    /// # Errors
    /// `SupplyInvariantViolation` on mismatch, `UnknownContract` if the unit
    /// no longer resolves.
    pub fn verify_solvency(&self) -> Result<SolvencyReport> {
        let unit = self.host.token(&self.accounting_unit())?;
        let held = unit.balance_of(&self.address);
        let state = self.state.lock();
        state.supply.verify(&state.ledger, held)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Run `body` as one atomic, non-reentrant operation. On success the
    /// host checkpoint is committed and the event published; on failure
    /// the checkpoint is rolled back and nothing is published.
    ///
    /// If a collaborator panics, unwinding drops the checkpoint guard
    /// (rollback) before the entry guard (unlock).
    fn guarded<T>(
        &self,
        op: &'static str,
        body: impl FnOnce() -> Result<(T, VaultEvent)>,
    ) -> Result<T> {
        let _entry = self.lock.enter().inspect_err(|_| {
            tracing::warn!(op, "Reentrant call rejected");
        })?;
        let checkpoint = CheckpointGuard::open(self.host.as_ref());

        match body() {
            Ok((value, event)) => {
                checkpoint.commit();
                let sequence = self.events.lock().publish(event);
                tracing::debug!(op, sequence, "Committed");
                Ok(value)
            }
            Err(err) => {
                checkpoint.rollback();
                tracing::warn!(op, error = %err, "Rolled back");
                Err(err)
            }
        }
    }

    /// Lifecycle gate plus a snapshot of what the operation plans against.
    fn frame(&self) -> Result<Frame> {
        let state = self.state.lock();
        state.access.ensure_active()?;
        Ok(Frame {
            settings: state.settings,
            total: state.ledger.total(),
        })
    }

    fn owner_settings(&self, caller: &Address) -> Result<VaultSettings> {
        let state = self.state.lock();
        state.access.ensure_owner(caller)?;
        Ok(state.settings)
    }

    fn validator(&self, settings: &VaultSettings) -> Result<PairValidator> {
        PairValidator::for_router(self.host.as_ref(), &settings.router, settings.accounting_unit)
    }

    fn settle_swap(
        &self,
        frame: &Frame,
        caller: Address,
        input: AssetIn,
        amount_in: Amount,
        minimum_out: Amount,
        deadline: u64,
    ) -> Result<Amount> {
        let adapter = ExchangeAdapter::new(
            self.host.as_ref(),
            &frame.settings.router,
            &frame.settings.accounting_unit,
            self.address,
        )?;
        let outcome = adapter.swap(&SwapRequest {
            input,
            amount_in,
            minimum_out,
            deadline,
        })?;
        self.commit_credit(caller, outcome.received)?;

        tracing::info!(
            depositor = %caller,
            input = %input,
            amount_in,
            received = outcome.received,
            "Swap deposit"
        );
        Ok(outcome.received)
    }

    /// Capacity post-check and credit, under one state lock.
    fn commit_credit(&self, depositor: Address, amount: Amount) -> Result<()> {
        let mut state = self.state.lock();
        let total = state.ledger.total();
        state.settings.capacity.post_check(total, amount)?;
        state.ledger.credit(depositor, amount)?;
        state.supply.record_deposit(amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use capvault_exchange::{ExchangeRouter, FungibleAsset};
    use capvault_exchange::testkit::{Quote, TestChain, TestRouter};

    use super::*;

    fn owner() -> Address {
        Address::derive("owner")
    }

    fn setup() -> (Arc<TestChain>, Vault<TestChain>, Address, Arc<TestRouter>) {
        let chain = Arc::new(TestChain::new());
        let unit = chain.deploy_token("usdc");
        let router = chain.deploy_router("dex");
        let config = VaultConfig::new(owner(), unit.address(), router.address(), 1_000_000);
        let vault = Vault::new(Arc::clone(&chain), Address::derive("vault"), &config).unwrap();
        (chain, vault, unit.address(), router)
    }

    #[test]
    fn new_rejects_unresolvable_router() {
        let chain = Arc::new(TestChain::new());
        let unit = chain.deploy_token("usdc");
        let config = VaultConfig::new(owner(), unit.address(), Address::derive("ghost"), 1);
        assert!(matches!(
            Vault::new(chain, Address::derive("vault"), &config).err(),
            Some(VaultError::UnknownContract { kind: "router", .. })
        ));
    }

    #[test]
    fn new_rejects_zero_vault_address() {
        let chain = Arc::new(TestChain::new());
        let unit = chain.deploy_token("usdc");
        let router = chain.deploy_router("dex");
        let config = VaultConfig::new(owner(), unit.address(), router.address(), 1);
        assert!(matches!(
            Vault::new(chain, Address::ZERO, &config).err(),
            Some(VaultError::ZeroAddress { param: "vault" })
        ));
    }

    #[test]
    fn reads_reflect_config() {
        let (_chain, vault, unit, _router) = setup();
        assert_eq!(vault.accounting_unit(), unit);
        assert_eq!(vault.owner(), owner());
        assert_eq!(vault.capacity(), 1_000_000);
        assert_eq!(vault.remaining_capacity(), 1_000_000);
        assert_eq!(vault.lifecycle(), Lifecycle::Active);
        assert!(vault.events().is_empty());
    }

    #[test]
    fn failed_operation_closes_checkpoint() {
        let (chain, vault, _unit, _router) = setup();
        assert!(vault.deposit(Address::derive("alice"), 0).is_err());
        assert_eq!(chain.open_checkpoints(), 0);
        vault.set_capacity(owner(), 5).unwrap();
        assert_eq!(chain.open_checkpoints(), 0);
    }

    #[test]
    fn settings_serde_roundtrip() {
        let (_chain, vault, unit, router) = setup();
        let json = serde_json::to_string(&vault.settings()).unwrap();
        let back: VaultSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vault.settings());
        assert_eq!(back.accounting_unit, unit);
        assert_eq!(back.router, router.address());
    }

    #[test]
    fn pair_support_follows_registry() {
        let (chain, vault, unit, router) = setup();
        let wbtc = chain.deploy_token("wbtc");
        assert!(!vault.is_pair_supported(&wbtc.address()));
        assert!(!vault.is_native_supported());

        router.list_pair(&wbtc.address(), &unit, Quote::fixed(70_000, 1));
        assert!(vault.is_pair_supported(&wbtc.address()));
        // The unit itself never goes through the swap path.
        assert!(!vault.is_pair_supported(&unit));
    }
}
