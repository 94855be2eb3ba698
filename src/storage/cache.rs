use crate::account::Account;
use crate::error::{ErrorCode, Exception};
use crate::storage::{Iterable, Reader, ReaderWriter, Writer};
use crate::types::{Address, Word256};

use itertools::Itertools;
use tracing::trace;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Write buffer over a backend.
///
/// Nothing reaches the backend before [`Cache::sync`]; reads fall through for anything not
/// pending. A read-only cache fails every write with `IllegalWrite`. Writes touching a native
/// contract fail with `ReservedAddress` as they are made.
///
/// An account removed and then written again in the same cache is removed from the backend
/// before the new writes are applied.
pub struct Cache<'a> {
    backend: &'a mut dyn ReaderWriter,
    accounts: BTreeMap<Address, Account>,
    removed: BTreeSet<Address>,
    storage: BTreeMap<Address, BTreeMap<Word256, Vec<u8>>>,
    read_only: bool,
}

impl<'a> Cache<'a> {
    /// Writable cache over `backend`.
    pub fn new(backend: &'a mut dyn ReaderWriter) -> Self {
        Self {
            backend,
            accounts: BTreeMap::new(),
            removed: BTreeSet::new(),
            storage: BTreeMap::new(),
            read_only: false,
        }
    }

    /// Read-only cache over `backend`.
    pub fn new_read_only(backend: &'a mut dyn ReaderWriter) -> Self {
        let mut cache = Self::new(backend);
        cache.read_only = true;
        cache
    }

    /// Make every further write fail.
    pub fn set_read_only(&mut self) {
        self.read_only = true;
    }

    /// `true` if writes are rejected.
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// `true` if no write is pending.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.removed.is_empty() && self.storage.is_empty()
    }

    fn ensure_writable(&self, address: &Address) -> Result<(), Exception> {
        if self.read_only {
            return Err(Exception::with_context(
                ErrorCode::IllegalWrite,
                format_args!("write to {} from a read-only frame", address),
            ));
        }

        Ok(())
    }

    fn ensure_not_native(&self, address: &Address) -> Result<(), Exception> {
        match self.get_account(address)? {
            Some(account) if account.is_native() => Err(reserved(address)),
            _ => Ok(()),
        }
    }

    /// Apply every pending write to the backend in address then key order and clear the
    /// buffer. A read-only cache has nothing to apply.
    pub fn sync(&mut self) -> Result<(), Exception> {
        if self.read_only {
            return Ok(());
        }

        let addresses: Vec<Address> = self
            .accounts
            .keys()
            .merge(self.removed.iter())
            .merge(self.storage.keys())
            .dedup()
            .copied()
            .collect();

        trace!(accounts = addresses.len(), "syncing cache");

        for address in addresses {
            if self.removed.remove(&address) {
                self.backend.remove_account(&address)?;
            }

            for (key, value) in self.storage.remove(&address).into_iter().flatten() {
                self.backend.set_storage(&address, key, value)?;
            }

            if let Some(account) = self.accounts.remove(&address) {
                self.backend.update_account(account)?;
            }
        }

        Ok(())
    }
}

fn reserved(address: &Address) -> Exception {
    Exception::with_context(
        ErrorCode::ReservedAddress,
        format_args!("{} belongs to a native contract", address),
    )
}

impl fmt::Debug for Cache<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("accounts", &self.accounts)
            .field("removed", &self.removed)
            .field("storage", &self.storage)
            .field("read_only", &self.read_only)
            .finish()
    }
}

impl Reader for Cache<'_> {
    fn get_account(&self, address: &Address) -> Result<Option<Account>, Exception> {
        match self.accounts.get(address) {
            Some(account) => Ok(Some(account.clone())),
            None if self.removed.contains(address) => Ok(None),
            None => self.backend.get_account(address),
        }
    }

    fn get_storage(&self, address: &Address, key: &Word256) -> Result<Vec<u8>, Exception> {
        match self.storage.get(address).and_then(|slots| slots.get(key)) {
            Some(value) => Ok(value.clone()),
            None if self.removed.contains(address) => Ok(Word256::zeroed().to_vec()),
            None => self.backend.get_storage(address, key),
        }
    }
}

impl Writer for Cache<'_> {
    fn update_account(&mut self, account: Account) -> Result<(), Exception> {
        self.ensure_writable(&account.address)?;

        if account.is_native() {
            return Err(reserved(&account.address));
        }

        self.ensure_not_native(&account.address)?;
        self.accounts.insert(account.address, account);

        Ok(())
    }

    fn remove_account(&mut self, address: &Address) -> Result<(), Exception> {
        self.ensure_writable(address)?;
        self.ensure_not_native(address)?;
        self.accounts.remove(address);
        self.storage.remove(address);
        self.removed.insert(*address);

        Ok(())
    }

    fn set_storage(
        &mut self,
        address: &Address,
        key: Word256,
        value: Vec<u8>,
    ) -> Result<(), Exception> {
        self.ensure_writable(address)?;
        self.ensure_not_native(address)?;
        self.storage.entry(*address).or_default().insert(key, value);

        Ok(())
    }
}

/// Iterates the pending updates only.
impl Iterable for Cache<'_> {
    fn iterate_accounts(
        &self,
        consumer: &mut dyn FnMut(&Account) -> bool,
    ) -> Result<bool, Exception> {
        Ok(self.accounts.values().any(|account| consumer(account)))
    }

    fn iterate_storage(
        &self,
        address: &Address,
        consumer: &mut dyn FnMut(&Word256, &[u8]) -> bool,
    ) -> Result<bool, Exception> {
        Ok(self
            .storage
            .get(address)
            .into_iter()
            .flatten()
            .any(|(key, value)| consumer(key, value)))
    }
}
