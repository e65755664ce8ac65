use std::collections::HashMap;

use capvault_types::{Address, Amount, Result, VaultError, constants::DIRECT_ROUTE_LEN};
use parking_lot::{Mutex, RwLock};

use super::SharedWorld;
use crate::host::{ExchangeRouter, PairRegistry};

// ---------------------------------------------------------------------------
// Pair registry
// ---------------------------------------------------------------------------

/// Registry of direct pairs. Pairs are unordered.
pub struct TestPairRegistry {
    address: Address,
    pairs: RwLock<HashMap<(Address, Address), Address>>,
}

fn pair_key(a: &Address, b: &Address) -> (Address, Address) {
    if a <= b { (*a, *b) } else { (*b, *a) }
}

impl TestPairRegistry {
    pub(crate) fn new(address: Address) -> Self {
        Self {
            address,
            pairs: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Create (or return the existing) pair between `a` and `b`.
    pub fn create_pair(&self, a: &Address, b: &Address) -> Address {
        let key = pair_key(a, b);
        *self
            .pairs
            .write()
            .entry(key)
            .or_insert_with(|| Address::derive(&format!("pair:{}:{}", key.0, key.1)))
    }
}

impl PairRegistry for TestPairRegistry {
    fn get_pair(&self, a: &Address, b: &Address) -> Option<Address> {
        self.pairs.read().get(&pair_key(a, b)).copied()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Fixed conversion rate: `out = in * numerator / denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub numerator: Amount,
    pub denominator: Amount,
}

impl Quote {
    #[must_use]
    pub fn fixed(numerator: Amount, denominator: Amount) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    #[must_use]
    pub fn one_to_one() -> Self {
        Self::fixed(1, 1)
    }

    fn apply(self, amount_in: Amount) -> Result<Amount> {
        if self.denominator == 0 {
            return Err(VaultError::external("quote with zero denominator"));
        }
        amount_in
            .checked_mul(self.numerator)
            .map(|scaled| scaled / self.denominator)
            .ok_or_else(|| VaultError::external("quote overflow"))
    }
}

/// Fixed-rate router paying out of its own inventory of output tokens.
///
/// Enforces the deadline and the output floor like a real router. Can be
/// told to misreport its output so tests can check that the vault credits
/// the measured delta instead.
pub struct TestRouter {
    address: Address,
    registry: std::sync::Arc<TestPairRegistry>,
    wrapped_native: Address,
    world: SharedWorld,
    quotes: RwLock<HashMap<(Address, Address), Quote>>,
    reported_output: Mutex<Option<Amount>>,
}

impl TestRouter {
    pub(crate) fn new(
        address: Address,
        registry: std::sync::Arc<TestPairRegistry>,
        wrapped_native: Address,
        world: SharedWorld,
    ) -> Self {
        Self {
            address,
            registry,
            wrapped_native,
            world,
            quotes: RwLock::new(HashMap::new()),
            reported_output: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &TestPairRegistry {
        &self.registry
    }

    /// Register a direct pair and the rate at which `asset` converts into `unit`.
    pub fn list_pair(&self, asset: &Address, unit: &Address, quote: Quote) -> Address {
        self.set_quote(asset, unit, quote);
        self.registry.create_pair(asset, unit)
    }

    pub fn set_quote(&self, asset: &Address, unit: &Address, quote: Quote) {
        self.quotes.write().insert((*asset, *unit), quote);
    }

    /// Report `amount` as the output of every swap instead of the real one.
    pub fn misreport_output(&self, amount: Option<Amount>) {
        *self.reported_output.lock() = amount;
    }

    fn route(&self, path: &[Address]) -> Result<(Address, Address, Quote)> {
        let [from, to] = path else {
            return Err(VaultError::external(format!(
                "router supports {DIRECT_ROUTE_LEN}-hop paths only, got {}",
                path.len()
            )));
        };
        if self.registry.get_pair(from, to).is_none() {
            return Err(VaultError::external(format!("no pair {from}/{to}")));
        }
        let quote = self
            .quotes
            .read()
            .get(&(*from, *to))
            .copied()
            .ok_or_else(|| VaultError::external(format!("no quote {from}/{to}")))?;
        Ok((*from, *to, quote))
    }

    fn check_terms(now: u64, deadline: u64, out: Amount, amount_out_min: Amount) -> Result<()> {
        if now > deadline {
            return Err(VaultError::slippage(format!(
                "EXPIRED: deadline {deadline} before now {now}"
            )));
        }
        if out < amount_out_min {
            return Err(VaultError::slippage(format!(
                "INSUFFICIENT_OUTPUT_AMOUNT: {out} < {amount_out_min}"
            )));
        }
        Ok(())
    }

    fn report(&self, amount_in: Amount, out: Amount) -> Vec<Amount> {
        vec![amount_in, self.reported_output.lock().unwrap_or(out)]
    }
}

impl ExchangeRouter for TestRouter {
    fn address(&self) -> Address {
        self.address
    }

    fn factory(&self) -> Address {
        self.registry.address()
    }

    fn wrapped_native(&self) -> Address {
        self.wrapped_native
    }

    fn swap_exact_tokens_for_tokens(
        &self,
        caller: &Address,
        amount_in: Amount,
        amount_out_min: Amount,
        path: &[Address],
        to: &Address,
        deadline: u64,
    ) -> Result<Vec<Amount>> {
        let (asset_in, asset_out, quote) = self.route(path)?;
        let out = quote.apply(amount_in)?;
        {
            let mut world = self.world.lock();
            Self::check_terms(world.time, deadline, out, amount_out_min)?;
            if !world.transfer_from(&asset_in, &self.address, caller, &self.address, amount_in)? {
                return Err(VaultError::external("TRANSFER_FROM_FAILED"));
            }
            if !world.transfer(&asset_out, &self.address, to, out)? {
                return Err(VaultError::external("router inventory exhausted"));
            }
        }
        Ok(self.report(amount_in, out))
    }

    fn swap_exact_native_for_tokens(
        &self,
        caller: &Address,
        value: Amount,
        amount_out_min: Amount,
        path: &[Address],
        to: &Address,
        deadline: u64,
    ) -> Result<Vec<Amount>> {
        let (asset_in, asset_out, quote) = self.route(path)?;
        if asset_in != self.wrapped_native {
            return Err(VaultError::external("INVALID_PATH: must start with wrapped native"));
        }
        let out = quote.apply(value)?;
        {
            let mut world = self.world.lock();
            Self::check_terms(world.time, deadline, out, amount_out_min)?;
            world.transfer_native(caller, &self.address, value)?;
            if !world.transfer(&asset_out, &self.address, to, out)? {
                return Err(VaultError::external("router inventory exhausted"));
            }
        }
        Ok(self.report(value, out))
    }
}
