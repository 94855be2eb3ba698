//! Gas schedule and metering

use crate::error::{ErrorCode, Exception};

/// Charged for every instruction before it executes.
pub const GAS_BASE_OP: u64 = 0;

/// Charged for each data stack push or pop.
pub const GAS_STACK_OP: u64 = 1;

/// Charged by `SHA3`.
pub const GAS_SHA3: u64 = 1;

/// Charged for every account lookup.
pub const GAS_GET_ACCOUNT: u64 = 1;

/// Charged by `SSTORE`.
pub const GAS_STORAGE_UPDATE: u64 = 1;

/// Charged when an instruction implicitly creates an account.
pub const GAS_CREATE_ACCOUNT: u64 = 1;

/// Fixed part of a precompile's cost.
pub const GAS_PRECOMPILE_BASE: u64 = 1;

/// Cost of a precompile per 32-byte word of input.
pub const GAS_PRECOMPILE_WORD: u64 = 1;

/// Charged by the bn256 point addition precompile.
pub const GAS_BN256_ADD: u64 = 1;

/// Charged by the bn256 scalar multiplication precompile.
pub const GAS_BN256_SCALAR_MUL: u64 = 1;

/// Charged by the bn256 pairing check, whatever the number of pairs.
pub const GAS_BN256_PAIRING: u64 = 1;

/// Deduct `amount` from `gas`, failing with `InsufficientGas` and leaving `gas` untouched when
/// it cannot cover the amount.
pub fn use_gas(gas: &mut u64, amount: u64) -> Result<(), Exception> {
    *gas = gas
        .checked_sub(amount)
        .ok_or_else(|| Exception::from(ErrorCode::InsufficientGas))?;

    Ok(())
}

/// Number of 32-byte words needed to hold `bytes` bytes.
pub const fn words_in(bytes: u64) -> u64 {
    bytes.div_ceil(32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn use_gas_deducts_or_fails() {
        let mut gas = 10;

        use_gas(&mut gas, 4).expect("enough gas");
        assert_eq!(gas, 6);

        use_gas(&mut gas, 6).expect("exactly enough gas");
        assert_eq!(gas, 0);

        let err = use_gas(&mut gas, 1).expect_err("no gas left");
        assert_eq!(err.code(), ErrorCode::InsufficientGas);
        assert_eq!(gas, 0);
    }

    #[test_case(0 => 0)]
    #[test_case(1 => 1)]
    #[test_case(32 => 1)]
    #[test_case(33 => 2)]
    #[test_case(64 => 2)]
    fn words(bytes: u64) -> u64 {
        words_in(bytes)
    }
}
