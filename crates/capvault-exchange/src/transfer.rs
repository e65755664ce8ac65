//! Safe wrappers over [`FungibleAsset`] calls.
//!
//! A boolean return is never trusted on its own: `Ok(false)` is a failure,
//! and success is confirmed by reading balances (or the allowance) after
//! the call. This tolerates tokens that return nothing meaningful, tokens
//! that fail silently, and tokens that skim a fee on transfer.

use capvault_types::{Address, Amount, Result, VaultError};

use crate::host::FungibleAsset;

fn require_true(ok: bool, what: &str, asset: &dyn FungibleAsset) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(VaultError::external(format!(
            "{what} on {} returned false",
            asset.address()
        )))
    }
}

/// Send exactly `amount` from `caller` to `to`.
///
/// # Errors
/// `ExternalCallFailed` if the call fails, returns false, or `caller`'s
/// balance did not drop by exactly `amount`.
pub fn safe_transfer(
    asset: &dyn FungibleAsset,
    caller: &Address,
    to: &Address,
    amount: Amount,
) -> Result<()> {
    let before = asset.balance_of(caller);
    require_true(asset.transfer(caller, to, amount)?, "transfer", asset)?;
    let after = asset.balance_of(caller);
    if before.checked_sub(after) != Some(amount) {
        return Err(VaultError::external(format!(
            "transfer on {} debited {} instead of {amount}",
            asset.address(),
            before.saturating_sub(after)
        )));
    }
    Ok(())
}

/// Pull `amount` from `from` into `to` and return what `to` actually gained.
///
/// # Errors
/// `ExternalCallFailed` if the call fails, returns false, or nothing arrived.
pub fn pull(
    asset: &dyn FungibleAsset,
    spender: &Address,
    from: &Address,
    to: &Address,
    amount: Amount,
) -> Result<Amount> {
    let before = asset.balance_of(to);
    require_true(
        asset.transfer_from(spender, from, to, amount)?,
        "transfer_from",
        asset,
    )?;
    let received = asset.balance_of(to).saturating_sub(before);
    if received == 0 {
        return Err(VaultError::external(format!(
            "transfer_from on {} delivered nothing",
            asset.address()
        )));
    }
    Ok(received)
}

/// Pull exactly `amount` from `from` into `to`.
///
/// # Errors
/// As [`pull`], plus `ExternalCallFailed` if `to` gained anything other than
/// `amount` (e.g. a fee-on-transfer accounting unit).
pub fn safe_transfer_from(
    asset: &dyn FungibleAsset,
    spender: &Address,
    from: &Address,
    to: &Address,
    amount: Amount,
) -> Result<()> {
    let received = pull(asset, spender, from, to, amount)?;
    if received != amount {
        return Err(VaultError::external(format!(
            "transfer_from on {} delivered {received} instead of {amount}",
            asset.address()
        )));
    }
    Ok(())
}

/// Set `spender`'s allowance to exactly `amount`, resetting to zero first.
///
/// The reset step accommodates assets that refuse to change one non-zero
/// allowance into another.
pub fn force_approve(
    asset: &dyn FungibleAsset,
    owner: &Address,
    spender: &Address,
    amount: Amount,
) -> Result<()> {
    require_true(asset.approve(owner, spender, 0)?, "approve(0)", asset)?;
    if amount > 0 {
        require_true(asset.approve(owner, spender, amount)?, "approve", asset)?;
    }
    let allowance = asset.allowance(owner, spender);
    if allowance != amount {
        return Err(VaultError::external(format!(
            "approve on {} left allowance {allowance} instead of {amount}",
            asset.address()
        )));
    }
    Ok(())
}
