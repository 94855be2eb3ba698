//! State access traits and their implementations.

use crate::account::Account;
use crate::error::Exception;
use crate::types::{Address, Word256};

mod cache;
mod memory;
mod natives;

pub use cache::Cache;
pub use memory::MemoryStorage;
pub use natives::NativesState;

/// Read access to accounts and storage.
pub trait Reader {
    /// The account at `address`, if it exists.
    fn get_account(&self, address: &Address) -> Result<Option<Account>, Exception>;

    /// Value stored under `key` of `address`. A key never written reads as a zero word.
    fn get_storage(&self, address: &Address, key: &Word256) -> Result<Vec<u8>, Exception>;
}

/// Write access to accounts and storage.
pub trait Writer {
    /// Insert or replace `account`.
    fn update_account(&mut self, account: Account) -> Result<(), Exception>;

    /// Delete the account at `address` along with its storage.
    fn remove_account(&mut self, address: &Address) -> Result<(), Exception>;

    /// Store `value` under `key` of `address`.
    fn set_storage(
        &mut self,
        address: &Address,
        key: Word256,
        value: Vec<u8>,
    ) -> Result<(), Exception>;
}

/// Full state access, as required by frames and caches.
pub trait ReaderWriter: Reader + Writer {}

impl<T> ReaderWriter for T where T: Reader + Writer + ?Sized {}

/// Iteration over stored accounts and storage, for snapshots and diagnostics.
pub trait Iterable {
    /// Feed each account to `consumer` in address order until it returns `true`.
    ///
    /// Returns `true` if iteration stopped early.
    fn iterate_accounts(
        &self,
        consumer: &mut dyn FnMut(&Account) -> bool,
    ) -> Result<bool, Exception>;

    /// Feed each storage entry of `address` to `consumer` in key order until it returns `true`.
    ///
    /// Returns `true` if iteration stopped early.
    fn iterate_storage(
        &self,
        address: &Address,
        consumer: &mut dyn FnMut(&Word256, &[u8]) -> bool,
    ) -> Result<bool, Exception>;
}
