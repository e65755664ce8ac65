//! In-memory host for tests (feature `test-helpers`).
//!
//! [`TestChain`] implements [`Host`] over a single shared [`World`]:
//! tokens, the router and native balances all mutate the same state, and a
//! checkpoint is a full snapshot of it. Rolling back therefore undoes every
//! effect of a failed vault operation, including swaps the router already
//! executed.

mod router;
mod token;
mod world;

use std::{collections::HashMap, sync::Arc};

use capvault_types::{Address, Amount, Result, VaultError};
use parking_lot::{Mutex, RwLock};

pub use router::{Quote, TestPairRegistry, TestRouter};
pub use token::{TestToken, TransferHook};
pub use world::TokenBehavior;

use crate::host::{Checkpoint, ExchangeRouter, FungibleAsset, Host, PairRegistry};
use world::World;

pub(crate) type SharedWorld = Arc<Mutex<World>>;

pub struct TestChain {
    world: SharedWorld,
    snapshots: Mutex<Vec<World>>,
    tokens: RwLock<HashMap<Address, Arc<TestToken>>>,
    routers: RwLock<HashMap<Address, Arc<TestRouter>>>,
    registries: RwLock<HashMap<Address, Arc<TestPairRegistry>>>,
}

impl TestChain {
    #[must_use]
    pub fn new() -> Self {
        Self {
            world: Arc::new(Mutex::new(World::default())),
            snapshots: Mutex::new(Vec::new()),
            tokens: RwLock::new(HashMap::new()),
            routers: RwLock::new(HashMap::new()),
            registries: RwLock::new(HashMap::new()),
        }
    }

    pub fn deploy_token(&self, label: &str) -> Arc<TestToken> {
        self.deploy_token_with(label, TokenBehavior::default())
    }

    pub fn deploy_token_with(&self, label: &str, behavior: TokenBehavior) -> Arc<TestToken> {
        let address = Address::derive(&format!("token:{label}"));
        self.world.lock().register_token(address, behavior);
        let token = Arc::new(TestToken::new(address, Arc::clone(&self.world)));
        self.tokens.write().insert(address, Arc::clone(&token));
        token
    }

    /// Deploy a router with its own pair registry and wrapped-native token.
    pub fn deploy_router(&self, label: &str) -> Arc<TestRouter> {
        let registry = Arc::new(TestPairRegistry::new(Address::derive(&format!(
            "registry:{label}"
        ))));
        self.registries
            .write()
            .insert(registry.address(), Arc::clone(&registry));
        let wrapped = self.deploy_token(&format!("{label}:wrapped-native"));
        let router = Arc::new(TestRouter::new(
            Address::derive(&format!("router:{label}")),
            registry,
            wrapped.address(),
            Arc::clone(&self.world),
        ));
        self.routers
            .write()
            .insert(router.address(), Arc::clone(&router));
        router
    }

    pub fn mint(&self, token: &Address, to: &Address, amount: Amount) {
        self.world
            .lock()
            .mint(token, to, amount)
            .expect("test fixture minted past u128::MAX");
    }

    pub fn set_native_balance(&self, owner: &Address, amount: Amount) {
        self.world.lock().set_native(owner, amount);
    }

    #[must_use]
    pub fn token_balance(&self, token: &Address, owner: &Address) -> Amount {
        self.world.lock().balance(token, owner)
    }

    #[must_use]
    pub fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount {
        self.world.lock().allowance(token, owner, spender)
    }

    pub fn set_timestamp(&self, time: u64) {
        self.world.lock().time = time;
    }

    /// Number of open (uncommitted, un-rolled-back) checkpoints.
    #[must_use]
    pub fn open_checkpoints(&self) -> usize {
        self.snapshots.lock().len()
    }
}

impl Default for TestChain {
    fn default() -> Self {
        Self::new()
    }
}

fn checkpoint_index(checkpoint: Checkpoint) -> usize {
    usize::try_from(checkpoint.0).unwrap_or(usize::MAX)
}

impl Host for TestChain {
    fn timestamp(&self) -> u64 {
        self.world.lock().time
    }

    fn checkpoint(&self) -> Checkpoint {
        let mut snapshots = self.snapshots.lock();
        snapshots.push(self.world.lock().clone());
        Checkpoint((snapshots.len() - 1) as u64)
    }

    fn commit(&self, checkpoint: Checkpoint) {
        self.snapshots.lock().truncate(checkpoint_index(checkpoint));
    }

    fn rollback(&self, checkpoint: Checkpoint) {
        let index = checkpoint_index(checkpoint);
        let mut snapshots = self.snapshots.lock();
        if let Some(snapshot) = snapshots.get(index).cloned() {
            *self.world.lock() = snapshot;
        }
        snapshots.truncate(index);
    }

    fn token(&self, address: &Address) -> Result<Arc<dyn FungibleAsset>> {
        self.tokens
            .read()
            .get(address)
            .map(|token| Arc::clone(token) as Arc<dyn FungibleAsset>)
            .ok_or(VaultError::UnknownContract {
                kind: "token",
                address: *address,
            })
    }

    fn router(&self, address: &Address) -> Result<Arc<dyn ExchangeRouter>> {
        self.routers
            .read()
            .get(address)
            .map(|router| Arc::clone(router) as Arc<dyn ExchangeRouter>)
            .ok_or(VaultError::UnknownContract {
                kind: "router",
                address: *address,
            })
    }

    fn pair_registry(&self, address: &Address) -> Result<Arc<dyn PairRegistry>> {
        self.registries
            .read()
            .get(address)
            .map(|registry| Arc::clone(registry) as Arc<dyn PairRegistry>)
            .ok_or(VaultError::UnknownContract {
                kind: "pair registry",
                address: *address,
            })
    }

    fn native_balance(&self, owner: &Address) -> Amount {
        self.world.lock().native_balance(owner)
    }

    fn transfer_native(&self, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        self.world.lock().transfer_native(from, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CheckpointGuard;

    #[test]
    fn rollback_restores_balances() {
        let chain = TestChain::new();
        let token = chain.deploy_token("usdc");
        let (a, b) = (Address::derive("a"), Address::derive("b"));
        chain.mint(&token.address(), &a, 100);

        let cp = chain.checkpoint();
        token.transfer(&a, &b, 60).unwrap();
        assert_eq!(chain.token_balance(&token.address(), &b), 60);
        chain.rollback(cp);

        assert_eq!(chain.token_balance(&token.address(), &a), 100);
        assert_eq!(chain.token_balance(&token.address(), &b), 0);
        assert_eq!(chain.open_checkpoints(), 0);
    }

    #[test]
    fn commit_keeps_changes() {
        let chain = TestChain::new();
        let (a, b) = (Address::derive("a"), Address::derive("b"));
        chain.set_native_balance(&a, 10);
        let cp = chain.checkpoint();
        chain.transfer_native(&a, &b, 4).unwrap();
        chain.commit(cp);
        assert_eq!(chain.native_balance(&b), 4);
        assert_eq!(chain.open_checkpoints(), 0);
    }

    #[test]
    fn nested_rollback_only_undoes_inner() {
        let chain = TestChain::new();
        let token = chain.deploy_token("usdc");
        let (a, b) = (Address::derive("a"), Address::derive("b"));
        chain.mint(&token.address(), &a, 100);

        let outer = chain.checkpoint();
        token.transfer(&a, &b, 10).unwrap();
        let inner = chain.checkpoint();
        token.transfer(&a, &b, 20).unwrap();
        chain.rollback(inner);
        chain.commit(outer);

        assert_eq!(chain.token_balance(&token.address(), &b), 10);
    }

    #[test]
    fn guard_commits_or_rolls_back() {
        let chain = TestChain::new();
        let token = chain.deploy_token("usdc");
        let (a, b) = (Address::derive("a"), Address::derive("b"));
        chain.mint(&token.address(), &a, 100);

        let kept = CheckpointGuard::open(&chain);
        token.transfer(&a, &b, 10).unwrap();
        kept.commit();

        let undone = CheckpointGuard::open(&chain);
        token.transfer(&a, &b, 20).unwrap();
        undone.rollback();

        assert_eq!(chain.token_balance(&token.address(), &b), 10);
        assert_eq!(chain.open_checkpoints(), 0);
    }

    #[test]
    fn guard_rolls_back_on_drop_and_unwind() {
        let chain = TestChain::new();
        let token = chain.deploy_token("usdc");
        let (a, b) = (Address::derive("a"), Address::derive("b"));
        chain.mint(&token.address(), &a, 100);

        {
            let _guard = CheckpointGuard::open(&chain);
            token.transfer(&a, &b, 30).unwrap();
        }
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = CheckpointGuard::open(&chain);
            token.transfer(&a, &b, 40).unwrap();
            panic!("collaborator panicked");
        }));

        assert!(result.is_err());
        assert_eq!(chain.token_balance(&token.address(), &a), 100);
        assert_eq!(chain.open_checkpoints(), 0);
    }

    #[test]
    fn unknown_contracts_are_reported() {
        let chain = TestChain::new();
        let nowhere = Address::derive("nowhere");
        assert!(matches!(
            chain.token(&nowhere).err(),
            Some(VaultError::UnknownContract { kind: "token", .. })
        ));
        assert!(chain.router(&nowhere).is_err());
        assert!(chain.pair_registry(&nowhere).is_err());
    }

    #[test]
    fn router_registry_is_resolvable() {
        let chain = TestChain::new();
        let router = chain.deploy_router("dex");
        let resolved = chain.router(&router.address()).unwrap();
        assert!(chain.pair_registry(&resolved.factory()).is_ok());
        assert!(chain.token(&resolved.wrapped_native()).is_ok());
    }
}
