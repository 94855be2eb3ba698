//! Engine utilities

#[allow(missing_docs)]
#[cfg(any(test, feature = "test-helpers"))]
/// Testing utilities
pub mod test_helpers {
    use crate::account::Account;
    use crate::call::CallParams;
    use crate::consts::GLOBAL_PERMISSIONS_ADDRESS;
    use crate::context::TestBlockchain;
    use crate::error::CallError;
    use crate::event::CollectingEventSink;
    use crate::interpreter::{Evm, Options};
    use crate::permission::AccountPermissions;
    use crate::storage::{MemoryStorage, Reader, Writer};
    use crate::types::{Address, Word256};

    use anyhow::anyhow;
    use rand::prelude::StdRng;
    use rand::{Rng, SeedableRng};

    use std::sync::Arc;

    pub struct TestOutcome {
        pub result: Result<Vec<u8>, CallError>,
        pub gas_used: u64,
        pub events: CollectingEventSink,
    }

    impl TestOutcome {
        pub fn output(&self) -> anyhow::Result<&[u8]> {
            self.result
                .as_deref()
                .map_err(|e| anyhow!("execution failed: {}", e))
        }

        pub fn error(&self) -> anyhow::Result<&CallError> {
            self.result
                .as_ref()
                .err()
                .ok_or_else(|| anyhow!("execution succeeded"))
        }
    }

    pub struct TestBuilder {
        rng: StdRng,
        evm: Arc<Evm>,
        storage: MemoryStorage,
        blockchain: TestBlockchain,
        gas_limit: u64,
        caller: Address,
    }

    impl TestBuilder {
        /// Fresh state holding the chain default permissions and a funded caller.
        pub fn new(seed: u64) -> Self {
            let mut rng = StdRng::seed_from_u64(seed);
            let caller: Address = rng.gen();

            let mut storage = MemoryStorage::new();
            let global = Account {
                permissions: AccountPermissions::defaults(),
                ..Account::new(GLOBAL_PERMISSIONS_ADDRESS)
            };
            let funded = Account {
                balance: 1_000_000,
                ..Account::new(caller)
            };

            for account in [global, funded] {
                storage
                    .update_account(account)
                    .expect("memory storage accepts accounts");
            }

            Self {
                rng,
                evm: Evm::new(Options::default()),
                storage,
                blockchain: TestBlockchain::default(),
                gas_limit: 100_000,
                caller,
            }
        }

        pub fn options(&mut self, options: Options) -> &mut Self {
            self.evm = Evm::new(options);
            self
        }

        pub fn gas_limit(&mut self, limit: u64) -> &mut Self {
            self.gas_limit = limit;
            self
        }

        pub fn blockchain(&mut self, blockchain: TestBlockchain) -> &mut Self {
            self.blockchain = blockchain;
            self
        }

        pub fn evm(&self) -> Arc<Evm> {
            self.evm.clone()
        }

        pub const fn caller(&self) -> Address {
            self.caller
        }

        pub fn storage(&self) -> &MemoryStorage {
            &self.storage
        }

        pub fn storage_mut(&mut self) -> &mut MemoryStorage {
            &mut self.storage
        }

        pub fn account(&self, address: &Address) -> Option<Account> {
            self.storage
                .get_account(address)
                .expect("memory storage reads never fail")
        }

        pub fn storage_at(&self, address: &Address, key: &Word256) -> Vec<u8> {
            self.storage
                .get_storage(address, key)
                .expect("memory storage reads never fail")
        }

        pub fn random_address(&mut self) -> Address {
            self.rng.gen()
        }

        pub fn setup_account(&mut self, balance: u64) -> Address {
            let address = self.random_address();

            self.storage
                .update_account(Account {
                    balance,
                    ..Account::new(address)
                })
                .expect("memory storage accepts accounts");

            address
        }

        pub fn setup_contract(&mut self, code: Vec<u8>, balance: u64) -> Address {
            let address = self.random_address();

            self.storage
                .update_account(Account {
                    balance,
                    ..Account::with_evm_code(address, code)
                })
                .expect("memory storage accepts accounts");

            address
        }

        pub fn set_permissions(
            &mut self,
            address: &Address,
            permissions: AccountPermissions,
        ) -> anyhow::Result<()> {
            let mut account = self
                .account(address)
                .ok_or_else(|| anyhow!("no account at {}", address))?;

            account.permissions = permissions;
            self.storage.update_account(account)?;

            Ok(())
        }

        /// Call the code stored at `callee` from the funded caller.
        pub fn call(&mut self, callee: &Address, input: Vec<u8>, value: u64) -> TestOutcome {
            let code = self.account(callee).map(|a| a.evm_code).unwrap_or_default();

            self.execute(CallParams::new(self.caller, *callee, input, value), &code)
        }

        /// Run `code` on behalf of a fresh account, as a transaction would.
        pub fn run(&mut self, code: &[u8]) -> TestOutcome {
            let callee = self.setup_account(0);

            self.execute(CallParams::new(self.caller, callee, vec![], 0), code)
        }

        pub fn execute(&mut self, params: CallParams, code: &[u8]) -> TestOutcome {
            let mut events = CollectingEventSink::new();
            let mut gas = self.gas_limit;

            let result = self
                .evm
                .execute(&mut self.storage, &self.blockchain, &mut events, &params, code, &mut gas);

            TestOutcome {
                result,
                gas_used: self.gas_limit.saturating_sub(gas),
                events,
            }
        }
    }
}
