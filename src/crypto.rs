//! Hashing and contract address derivation.

use crate::consts::CREATE2_PREFIX;
use crate::types::{Address, Word256};

use sha3::{Digest, Keccak256};

/// Legacy Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> Word256 {
    Word256::new(Keccak256::digest(data).into())
}

/// Address of a contract created with `CREATE`.
///
/// `keccak256(caller ++ nonce)[12..]`, where the nonce is supplied by the VM.
pub fn new_contract_address(caller: &Address, nonce: &[u8]) -> Address {
    let mut hasher = Keccak256::new();

    hasher.update(caller.as_ref());
    hasher.update(nonce);

    Address::left_pad(&hasher.finalize())
}

/// Address of a contract created with `CREATE2`.
///
/// `keccak256(0xff ++ caller ++ salt ++ keccak256(init_code))[12..]`
pub fn new_contract_address2(caller: &Address, salt: &Word256, init_code: &[u8]) -> Address {
    let mut hasher = Keccak256::new();

    hasher.update([CREATE2_PREFIX]);
    hasher.update(caller.as_ref());
    hasher.update(salt.as_ref());
    hasher.update(keccak256(init_code).as_ref());

    Address::left_pad(&hasher.finalize())
}
