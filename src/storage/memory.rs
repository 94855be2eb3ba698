use crate::account::Account;
use crate::error::Exception;
use crate::storage::{Iterable, Reader, Writer};
use crate::types::{Address, Word256};

use std::collections::BTreeMap;
use std::fmt::Write;

/// In-memory state backend.
///
/// Ordered maps keep iteration and `dump` deterministic.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryStorage {
    accounts: BTreeMap<Address, Account>,
    storage: BTreeMap<Address, BTreeMap<Word256, Vec<u8>>>,
}

impl MemoryStorage {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts.
    pub fn accounts_len(&self) -> usize {
        self.accounts.len()
    }

    /// Human readable listing of every account and storage entry.
    pub fn dump(&self) -> String {
        let mut out = String::new();

        for (address, account) in self.accounts.iter() {
            let _ = writeln!(
                out,
                "{} balance={} code={}B native={}",
                address,
                account.balance,
                account.code().len(),
                account.native_name.as_deref().unwrap_or("-")
            );

            for (key, value) in self.storage.get(address).into_iter().flatten() {
                let _ = write!(out, "  {:x} =>", key);
                value.iter().for_each(|b| {
                    let _ = write!(out, " {:02x}", b);
                });
                out.push('\n');
            }
        }

        out
    }
}

impl Reader for MemoryStorage {
    fn get_account(&self, address: &Address) -> Result<Option<Account>, Exception> {
        Ok(self.accounts.get(address).cloned())
    }

    fn get_storage(&self, address: &Address, key: &Word256) -> Result<Vec<u8>, Exception> {
        Ok(self
            .storage
            .get(address)
            .and_then(|slots| slots.get(key))
            .cloned()
            .unwrap_or_else(|| Word256::zeroed().to_vec()))
    }
}

impl Writer for MemoryStorage {
    fn update_account(&mut self, account: Account) -> Result<(), Exception> {
        self.accounts.insert(account.address, account);
        Ok(())
    }

    fn remove_account(&mut self, address: &Address) -> Result<(), Exception> {
        self.accounts.remove(address);
        self.storage.remove(address);
        Ok(())
    }

    fn set_storage(
        &mut self,
        address: &Address,
        key: Word256,
        value: Vec<u8>,
    ) -> Result<(), Exception> {
        self.storage.entry(*address).or_default().insert(key, value);
        Ok(())
    }
}

impl Iterable for MemoryStorage {
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

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn missing_storage_reads_as_zero_word() {
        let storage = MemoryStorage::new();
        let value = storage
            .get_storage(&Address::new([1; 20]), &Word256::from_u64(9))
            .expect("infallible");

        assert_eq!(value, vec![0u8; 32]);
    }

    #[test]
    fn written_bytes_read_back_exactly() {
        let mut storage = MemoryStorage::new();
        let address = Address::new([1; 20]);

        storage
            .set_storage(&address, Word256::from_u64(1), vec![1, 2, 3])
            .expect("infallible");
        storage
            .set_storage(&address, Word256::from_u64(2), vec![0; 32])
            .expect("infallible");

        assert_eq!(
            storage.get_storage(&address, &Word256::from_u64(1)).expect("infallible"),
            vec![1, 2, 3]
        );

        let mut keys = vec![];
        storage
            .iterate_storage(&address, &mut |key, _| {
                keys.push(*key);
                false
            })
            .expect("infallible");
        assert_eq!(keys, vec![Word256::from_u64(1), Word256::from_u64(2)]);
    }

    #[test]
    fn removing_an_account_drops_its_storage() {
        let mut storage = MemoryStorage::new();
        let address = Address::new([1; 20]);

        storage.update_account(Account::new(address)).expect("infallible");
        storage
            .set_storage(&address, Word256::from_u64(1), vec![1])
            .expect("infallible");
        storage.remove_account(&address).expect("infallible");

        assert_eq!(storage.get_account(&address).expect("infallible"), None);
        assert_eq!(
            storage.get_storage(&address, &Word256::from_u64(1)).expect("infallible"),
            vec![0; 32]
        );
    }

    #[test]
    fn iteration_stops_early() {
        let mut storage = MemoryStorage::new();

        for i in 1..=3 {
            storage.update_account(Account::new(Address::new([i; 20]))).expect("infallible");
        }

        let mut seen = 0;
        let stopped = storage
            .iterate_accounts(&mut |_| {
                seen += 1;
                seen == 2
            })
            .expect("infallible");

        assert!(stopped);
        assert_eq!(seen, 2);
        assert!(storage.dump().lines().count() >= 3);
    }
}
