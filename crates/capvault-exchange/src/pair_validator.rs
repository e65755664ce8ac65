//! Direct-pair validation against the router's registry.

use std::sync::Arc;

use capvault_types::{Address, Result, VaultError};

use crate::host::{Host, PairRegistry};

/// Answers whether an asset can be swapped straight into the accounting unit.
pub struct PairValidator {
    registry: Arc<dyn PairRegistry>,
    unit: Address,
}

impl PairValidator {
    #[must_use]
    pub fn new(registry: Arc<dyn PairRegistry>, unit: Address) -> Self {
        Self { registry, unit }
    }

    /// Resolve the registry behind `router` through the host.
    pub fn for_router<H: Host + ?Sized>(host: &H, router: &Address, unit: Address) -> Result<Self> {
        let router = host.router(router)?;
        let registry = host.pair_registry(&router.factory())?;
        Ok(Self::new(registry, unit))
    }

    /// True iff the registry holds a non-null pair between `asset` and the unit.
    #[must_use]
    pub fn has_direct_pair(&self, asset: &Address) -> bool {
        self.registry
            .get_pair(asset, &self.unit)
            .is_some_and(|pair| !pair.is_zero())
    }

    /// Reject the unit itself and assets without a direct pair.
    pub fn ensure_swappable(&self, asset: &Address) -> Result<()> {
        if *asset == self.unit {
            return Err(VaultError::unsupported(
                asset,
                "accounting unit must use the direct deposit path",
            ));
        }
        if !self.has_direct_pair(asset) {
            tracing::debug!(asset = %asset, unit = %self.unit, "No direct pair");
            return Err(VaultError::unsupported(
                asset,
                format!("no direct pair with {}", self.unit),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ExchangeRouter, FungibleAsset};
    use crate::testkit::{Quote, TestChain};

    #[test]
    fn listed_asset_has_pair() {
        let chain = TestChain::new();
        let unit = chain.deploy_token("usdc");
        let wbtc = chain.deploy_token("wbtc");
        let router = chain.deploy_router("dex");
        router.list_pair(&wbtc.address(), &unit.address(), Quote::fixed(70_000, 1));

        let validator = PairValidator::for_router(&chain, &router.address(), unit.address()).unwrap();
        assert!(validator.has_direct_pair(&wbtc.address()));
        assert!(validator.ensure_swappable(&wbtc.address()).is_ok());
    }

    #[test]
    fn unlisted_asset_is_unsupported() {
        let chain = TestChain::new();
        let unit = chain.deploy_token("usdc");
        let doge = chain.deploy_token("doge");
        let router = chain.deploy_router("dex");

        let validator = PairValidator::for_router(&chain, &router.address(), unit.address()).unwrap();
        assert!(!validator.has_direct_pair(&doge.address()));
        let err = validator.ensure_swappable(&doge.address()).unwrap_err();
        assert!(matches!(err, VaultError::UnsupportedAsset { .. }));
    }

    #[test]
    fn unit_itself_is_unsupported() {
        let chain = TestChain::new();
        let unit = chain.deploy_token("usdc");
        let router = chain.deploy_router("dex");
        // Even a (degenerate) self-pair does not make the unit swappable.
        router.registry().create_pair(&unit.address(), &unit.address());

        let validator = PairValidator::for_router(&chain, &router.address(), unit.address()).unwrap();
        let err = validator.ensure_swappable(&unit.address()).unwrap_err();
        assert!(err.to_string().contains("direct deposit"));
    }

    #[test]
    fn unknown_router_fails() {
        let chain = TestChain::new();
        let err = PairValidator::for_router(&chain, &Address::derive("ghost"), Address::derive("u"))
            .err()
            .unwrap();
        assert!(matches!(err, VaultError::UnknownContract { kind: "router", .. }));
    }
}
