//! Accounts as seen by the engine.

use crate::crypto;
use crate::error::{ErrorCode, Exception};
use crate::permission::AccountPermissions;
use crate::types::{Address, Word256};

/// An account. Holds at most one kind of code, and never code when it is a native contract.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Account {
    /// Identifier of the account.
    pub address: Address,
    /// Native token balance.
    pub balance: u64,
    /// EVM bytecode run by the interpreter.
    pub evm_code: Vec<u8>,
    /// Code of a foreign VM.
    pub wasm_code: Vec<u8>,
    /// Hash of the installed code, if any.
    pub code_hash: Option<Word256>,
    /// Permission bits and roles.
    pub permissions: AccountPermissions,
    /// Name of the native contract living at this address.
    pub native_name: Option<String>,
}

impl Account {
    /// Empty account at `address`.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Default::default()
        }
    }

    /// Account at `address` running `code` on the interpreter.
    pub fn with_evm_code(address: Address, code: Vec<u8>) -> Self {
        let mut account = Self::new(address);
        account.code_hash = Some(crypto::keccak256(&code));
        account.evm_code = code;
        account
    }

    /// Installed code of either kind.
    pub fn code(&self) -> &[u8] {
        if self.evm_code.is_empty() {
            self.wasm_code.as_slice()
        } else {
            self.evm_code.as_slice()
        }
    }

    /// Hash of the installed code, computed if not stored.
    pub fn code_hash(&self) -> Word256 {
        self.code_hash.unwrap_or_else(|| crypto::keccak256(self.code()))
    }

    /// `true` for a native contract.
    pub const fn is_native(&self) -> bool {
        self.native_name.is_some()
    }

    /// Install interpreter code. Fails if the account already carries foreign or native code.
    pub fn init_evm_code(&mut self, code: Vec<u8>) -> Result<(), Exception> {
        if !self.wasm_code.is_empty() || self.is_native() {
            return Err(Exception::with_context(
                ErrorCode::InvalidContractCode,
                format_args!("account {} already holds foreign or native code", self.address),
            ));
        }

        self.code_hash = Some(crypto::keccak256(&code));
        self.evm_code = code;

        Ok(())
    }

    /// Install foreign VM code. Fails if the account already carries interpreter or native code.
    pub fn init_wasm_code(&mut self, code: Vec<u8>) -> Result<(), Exception> {
        if !self.evm_code.is_empty() || self.is_native() {
            return Err(Exception::with_context(
                ErrorCode::InvalidContractCode,
                format_args!("account {} already holds interpreter or native code", self.address),
            ));
        }

        self.code_hash = Some(crypto::keccak256(&code));
        self.wasm_code = code;

        Ok(())
    }

    /// Credit `amount`.
    pub fn add_to_balance(&mut self, amount: u64) -> Result<(), Exception> {
        self.balance = self.balance.checked_add(amount).ok_or_else(|| {
            Exception::with_context(
                ErrorCode::IntegerOverflow,
                format_args!("adding {} to the balance of {}", amount, self.address),
            )
        })?;

        Ok(())
    }

    /// Debit `amount`.
    pub fn subtract_from_balance(&mut self, amount: u64) -> Result<(), Exception> {
        self.balance = self.balance.checked_sub(amount).ok_or_else(|| {
            Exception::with_context(
                ErrorCode::InsufficientBalance,
                format_args!(
                    "account {} has balance {} but {} is required",
                    self.address, self.balance, amount
                ),
            )
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_kinds_are_exclusive() {
        let mut account = Account::new(Address::new([1; 20]));
        account.init_wasm_code(vec![0, 0x61, 0x73, 0x6d]).expect("empty account accepts code");

        let err = account.init_evm_code(vec![0x00]).expect_err("already holds wasm");
        assert_eq!(err.code(), ErrorCode::InvalidContractCode);
        assert_eq!(account.code(), &[0, 0x61, 0x73, 0x6d]);

        let mut native = Account::new(Address::new([2; 20]));
        native.native_name = Some("sha256".into());
        assert!(native.init_evm_code(vec![0x00]).is_err());
    }

    #[test]
    fn code_hash_falls_back_to_hashing() {
        let account = Account::with_evm_code(Address::zeroed(), vec![0x60, 0x00]);
        assert_eq!(account.code_hash(), crypto::keccak256(&[0x60, 0x00]));

        let empty = Account::new(Address::zeroed());
        assert_eq!(empty.code_hash(), crypto::keccak256(&[]));
    }

    #[test]
    fn balance_arithmetic_is_checked() {
        let mut account = Account::new(Address::zeroed());

        account.add_to_balance(10).expect("no overflow");
        assert_eq!(
            account.subtract_from_balance(11).map_err(|e| e.code()),
            Err(ErrorCode::InsufficientBalance)
        );
        assert_eq!(account.balance, 10);

        account.balance = u64::MAX;
        assert_eq!(
            account.add_to_balance(1).map_err(|e| e.code()),
            Err(ErrorCode::IntegerOverflow)
        );
    }
}
