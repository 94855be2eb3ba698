//! VM parameters

use crate::types::Address;

/* DATA STACK */

/// Initial capacity reserved for the data stack.
pub const DEFAULT_DATA_STACK_INITIAL_CAPACITY: usize = 1024;

/// Maximum number of words held by the data stack.
pub const DEFAULT_DATA_STACK_MAX_DEPTH: usize = 1024;

/* MEMORY */

/// Initial capacity of the linear memory, in bytes.
pub const DEFAULT_MEMORY_INITIAL_CAPACITY: u64 = 0x400;

/// Maximum capacity of the linear memory, in bytes (16 MiB).
pub const DEFAULT_MEMORY_MAX_CAPACITY: u64 = 0x100_0000;

/* CALL STACK */

/// Maximum depth of nested calls. Zero disables the limit.
pub const DEFAULT_CALL_STACK_MAX_DEPTH: u64 = 128;

/* BLOCKCHAIN */

/// Number of blocks behind the last block whose hash is visible to `BLOCKHASH`.
pub const MAXIMUM_ALLOWED_BLOCK_LOOKBACK: u64 = 256;

/// Account holding the chain-wide default permissions.
pub const GLOBAL_PERMISSIONS_ADDRESS: Address = Address::zeroed();

/* ABI */

/// Selector of `Error(string)`, the conventional revert reason encoding.
pub const REVERT_REASON_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Prefix byte of the `CREATE2` address preimage.
pub const CREATE2_PREFIX: u8 = 0xff;
