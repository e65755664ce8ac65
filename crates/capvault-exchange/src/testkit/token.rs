use std::sync::Arc;

use capvault_types::{Address, Amount, Result};
use parking_lot::Mutex;

use super::SharedWorld;
use crate::host::FungibleAsset;

/// Callback fired after every successful `transfer` / `transfer_from`,
/// with no locks held. Lets a test play a malicious token that calls back
/// into the vault mid-operation.
pub type TransferHook = Arc<dyn Fn() + Send + Sync>;

/// Handle to a token living in a [`super::TestChain`].
pub struct TestToken {
    address: Address,
    world: SharedWorld,
    hook: Mutex<Option<TransferHook>>,
}

impl TestToken {
    pub(crate) fn new(address: Address, world: SharedWorld) -> Self {
        Self {
            address,
            world,
            hook: Mutex::new(None),
        }
    }

    pub fn set_transfer_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.hook.lock() = Some(Arc::new(hook));
    }

    pub fn clear_transfer_hook(&self) {
        *self.hook.lock() = None;
    }

    fn fire_hook(&self) {
        let hook = self.hook.lock().clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}

impl FungibleAsset for TestToken {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, owner: &Address) -> Amount {
        self.world.lock().balance(&self.address, owner)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.world.lock().allowance(&self.address, owner, spender)
    }

    fn transfer(&self, caller: &Address, to: &Address, amount: Amount) -> Result<bool> {
        let moved = self.world.lock().transfer(&self.address, caller, to, amount)?;
        if moved {
            self.fire_hook();
        }
        Ok(moved)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<bool> {
        let moved = self
            .world
            .lock()
            .transfer_from(&self.address, spender, from, to, amount)?;
        if moved {
            self.fire_hook();
        }
        Ok(moved)
    }

    fn approve(&self, owner: &Address, spender: &Address, amount: Amount) -> Result<bool> {
        self.world.lock().approve(&self.address, owner, spender, amount)
    }
}
