use super::internal::Machine;

use crate::account::Account;
use crate::consts::MAXIMUM_ALLOWED_BLOCK_LOOKBACK;
use crate::error::{ErrorCode, Exception};
use crate::gas::{GAS_GET_ACCOUNT, GAS_STORAGE_UPDATE};
use crate::storage::{Reader, Writer};
use crate::types::{Address, Word256, U256};

impl Machine<'_, '_> {
    /// Look up `address`, charging for the lookup.
    fn account(&mut self, address: &Address) -> Option<Account> {
        if self.use_gas(GAS_GET_ACCOUNT) {
            return None;
        }

        let account = self.st.call_frame.get_account(address);
        self.maybe.value(account)
    }

    pub(crate) fn balance(&mut self, address: Address) -> U256 {
        if self.use_gas(GAS_GET_ACCOUNT) {
            return U256::zero();
        }

        match self.st.call_frame.get_account(&address) {
            Ok(Some(account)) => U256::from(account.balance),
            Ok(None) => {
                self.maybe
                    .push_error(Exception::with_context(ErrorCode::NonExistentAccount, address));
                U256::zero()
            }
            Err(e) => {
                self.maybe.push_error(e);
                U256::zero()
            }
        }
    }

    pub(crate) fn ext_code_size(&mut self, address: Address) -> U256 {
        self.account(&address)
            .map_or_else(U256::zero, |account| U256::from(account.evm_code.len()))
    }

    pub(crate) fn ext_code_hash(&mut self, address: Address) -> U256 {
        self.account(&address)
            .map_or_else(U256::zero, |account| U256::from(&account.code_hash()))
    }

    /// `EXTCODECOPY`. Native contracts have no code to copy.
    pub(crate) fn ext_code_copy(
        &mut self,
        address: Address,
        memory_offset: U256,
        code_offset: u64,
        length: u64,
    ) {
        let account = match self.account(&address) {
            Some(account) => account,
            None => {
                if !self.maybe.has_error() {
                    self.maybe
                        .push_error(Exception::with_context(ErrorCode::UnknownAddress, address));
                }
                return;
            }
        };

        if account.is_native() {
            self.maybe.push_error(Exception::with_context(
                ErrorCode::NativeContractCodeCopy,
                format_args!("{} is a native contract", address),
            ));
            return;
        }

        self.copy_to_memory(
            memory_offset,
            &account.evm_code,
            code_offset,
            length,
            ErrorCode::CodeOutOfBounds,
        );
    }

    /// `BLOCKHASH`. Only the `MAXIMUM_ALLOWED_BLOCK_LOOKBACK` blocks below the last one are
    /// visible.
    pub(crate) fn block_hash(&mut self, height: u64) -> U256 {
        let blockchain = self.st.blockchain;
        let last = blockchain.last_block_height();

        let visible = if height >= last {
            Err(Exception::with_context(
                ErrorCode::InvalidBlockNumber,
                format_args!("block {} is not below the last block {}", height, last),
            ))
        } else if last.saturating_sub(height) > MAXIMUM_ALLOWED_BLOCK_LOOKBACK {
            Err(Exception::with_context(
                ErrorCode::BlockNumberOutOfRange,
                format_args!(
                    "block {} is more than {} blocks behind {}",
                    height, MAXIMUM_ALLOWED_BLOCK_LOOKBACK, last
                ),
            ))
        } else {
            blockchain.block_hash(height)
        };

        self.maybe
            .value(visible.map(|hash| U256::from(&hash)))
    }

    pub(crate) fn sload(&mut self, key: Word256) -> U256 {
        let callee = self.params.callee;
        let value = self.st.call_frame.get_storage(&callee, &key);
        let value = self.maybe.value(value);

        U256::from(&Word256::left_pad(&value))
    }

    pub(crate) fn sstore(&mut self, key: Word256, value: Word256) {
        if self.use_gas(GAS_STORAGE_UPDATE) {
            return;
        }

        let callee = self.params.callee;
        let stored = self.st.call_frame.set_storage(&callee, key, value.to_vec());
        self.maybe.push(stored);
    }
}
