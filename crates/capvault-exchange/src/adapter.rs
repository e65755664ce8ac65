//! Exchange adapter: single-hop exact-input swaps into the accounting unit.
//!
//! The amount credited for a swap is always the holder's measured
//! accounting-unit delta:
//!
//! ```text
//! received = unit.balance_of(holder)_after − unit.balance_of(holder)_before
//! ```
//!
//! The router's return value is kept only for diagnostics. This stays
//! correct for fee-on-transfer units and for routers that misreport.

use std::sync::Arc;

use capvault_types::{Address, Amount, AssetIn, Result, VaultError};

use crate::host::{ExchangeRouter, FungibleAsset, Host};
use crate::transfer::force_approve;

/// Parameters of one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapRequest {
    pub input: AssetIn,
    /// Token amount (already held by the holder) or native value to convert.
    pub amount_in: Amount,
    /// Slippage floor on the output.
    pub minimum_out: Amount,
    /// Latest acceptable host timestamp. Checked before any approval and
    /// again by the router.
    pub deadline: u64,
}

/// Result of one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOutcome {
    /// Measured accounting-unit delta on the holder.
    pub received: Amount,
    /// What the router claimed to have paid out; advisory.
    pub reported: Option<Amount>,
}

/// Swaps on behalf of `holder` (the vault) through one router.
pub struct ExchangeAdapter<'h, H: Host + ?Sized> {
    host: &'h H,
    router: Arc<dyn ExchangeRouter>,
    unit: Arc<dyn FungibleAsset>,
    holder: Address,
}

impl<'h, H: Host + ?Sized> ExchangeAdapter<'h, H> {
    pub fn new(host: &'h H, router: &Address, unit: &Address, holder: Address) -> Result<Self> {
        Ok(Self {
            host,
            router: host.router(router)?,
            unit: host.token(unit)?,
            holder,
        })
    }

    #[must_use]
    pub fn router(&self) -> &Arc<dyn ExchangeRouter> {
        &self.router
    }

    /// Single-hop route from `input` into the unit.
    #[must_use]
    pub fn path(&self, input: AssetIn) -> [Address; 2] {
        let from = match input {
            AssetIn::Token(asset) => asset,
            AssetIn::Native => self.router.wrapped_native(),
        };
        [from, self.unit.address()]
    }

    /// Execute the swap and measure what actually arrived.
    ///
    /// # Errors
    /// - `Slippage` if the deadline is before [`Host::timestamp`], from the
    ///   router (floor or deadline), or when the measured delta is below the floor
    /// - `ExternalCallFailed` if approval fails or unit holdings shrank
    pub fn swap(&self, request: &SwapRequest) -> Result<SwapOutcome> {
        let now = self.host.timestamp();
        if now > request.deadline {
            return Err(VaultError::slippage(format!(
                "EXPIRED: deadline {} before now {now}",
                request.deadline
            )));
        }

        let router_addr = self.router.address();
        let path = self.path(request.input);
        let before = self.unit.balance_of(&self.holder);

        let reported = match request.input {
            AssetIn::Token(asset) => {
                let token = self.host.token(&asset)?;
                force_approve(token.as_ref(), &self.holder, &router_addr, request.amount_in)?;
                self.router.swap_exact_tokens_for_tokens(
                    &self.holder,
                    request.amount_in,
                    request.minimum_out,
                    &path,
                    &self.holder,
                    request.deadline,
                )?
            }
            AssetIn::Native => self.router.swap_exact_native_for_tokens(
                &self.holder,
                request.amount_in,
                request.minimum_out,
                &path,
                &self.holder,
                request.deadline,
            )?,
        };

        let after = self.unit.balance_of(&self.holder);
        let received = after.checked_sub(before).ok_or_else(|| {
            VaultError::external(format!(
                "unit holdings fell across swap: {before} -> {after}"
            ))
        })?;
        let reported = reported.last().copied();

        if reported != Some(received) {
            tracing::debug!(
                router = %router_addr,
                ?reported,
                received,
                "Router report differs from measured delta"
            );
        }
        if received < request.minimum_out {
            return Err(VaultError::slippage(format!(
                "measured output {received} below floor {}",
                request.minimum_out
            )));
        }

        tracing::debug!(
            input = %request.input,
            amount_in = request.amount_in,
            received,
            "Swap settled"
        );
        Ok(SwapOutcome { received, reported })
    }
}
