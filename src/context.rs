//! Chain environment and the state handed to every callable.

use crate::call::CallFrame;
use crate::error::Exception;
use crate::event::EventSink;
use crate::types::{Word256, U256};

use tai64::Tai64;

/// Read access to the chain the engine runs on.
pub trait Blockchain {
    /// Height of the last committed block.
    fn last_block_height(&self) -> u64;

    /// Time of the last committed block.
    fn last_block_time(&self) -> Tai64;

    /// Hash of the committed block at `height`.
    fn block_hash(&self, height: u64) -> Result<Word256, Exception>;

    /// Identifier of the chain.
    fn chain_id(&self) -> &str;
}

/// Chain identifier as seen by `CHAINID`.
///
/// Decimal identifiers are read as numbers. Anything else is read as big-endian bytes, keeping
/// the low 32 bytes.
pub fn chain_id_word(chain_id: &str) -> U256 {
    if !chain_id.is_empty() && chain_id.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(id) = U256::from_dec_str(chain_id) {
            return id;
        }
    }

    let bytes = chain_id.as_bytes();
    let low = &bytes[bytes.len().saturating_sub(32)..];

    U256::from_big_endian(low)
}

/// Everything a call executes against.
pub struct State<'a> {
    /// State of the current frame.
    pub call_frame: CallFrame<'a>,
    /// Chain environment.
    pub blockchain: &'a dyn Blockchain,
    /// Receiver of call and log events.
    pub event_sink: &'a mut dyn EventSink,
}

impl<'a> State<'a> {
    /// Bundle the parts of a state.
    pub fn new(
        call_frame: CallFrame<'a>,
        blockchain: &'a dyn Blockchain,
        event_sink: &'a mut dyn EventSink,
    ) -> Self {
        Self {
            call_frame,
            blockchain,
            event_sink,
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
mod test_helpers {
    use super::*;

    use crate::consts::MAXIMUM_ALLOWED_BLOCK_LOOKBACK;
    use crate::crypto;
    use crate::error::ErrorCode;

    use std::collections::BTreeMap;

    /// In-memory chain with a fixed tip. Unknown block hashes are derived from the height.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct TestBlockchain {
        height: u64,
        time: Tai64,
        chain_id: String,
        hashes: BTreeMap<u64, Word256>,
    }

    impl Default for TestBlockchain {
        fn default() -> Self {
            Self::new(0, Tai64::UNIX_EPOCH)
        }
    }

    impl TestBlockchain {
        /// Chain at `height`, last committed at `time`.
        pub fn new(height: u64, time: Tai64) -> Self {
            Self {
                height,
                time,
                chain_id: "1".to_owned(),
                hashes: BTreeMap::new(),
            }
        }

        /// Replace the chain identifier.
        pub fn with_chain_id(mut self, chain_id: &str) -> Self {
            self.chain_id = chain_id.to_owned();
            self
        }

        /// Pin the hash of the block at `height`.
        pub fn with_block_hash(mut self, height: u64, hash: Word256) -> Self {
            self.hashes.insert(height, hash);
            self
        }

        /// Advance the tip by one block.
        pub fn commit_block(&mut self, time: Tai64) {
            self.height = self.height.saturating_add(1);
            self.time = time;
        }
    }

    impl Blockchain for TestBlockchain {
        fn last_block_height(&self) -> u64 {
            self.height
        }

        fn last_block_time(&self) -> Tai64 {
            self.time
        }

        fn block_hash(&self, height: u64) -> Result<Word256, Exception> {
            if height > self.height {
                return Err(ErrorCode::InvalidBlockNumber.into());
            }

            if self.height.saturating_sub(height) > MAXIMUM_ALLOWED_BLOCK_LOOKBACK {
                return Err(ErrorCode::BlockNumberOutOfRange.into());
            }

            Ok(self
                .hashes
                .get(&height)
                .copied()
                .unwrap_or_else(|| crypto::keccak256(&height.to_be_bytes())))
        }

        fn chain_id(&self) -> &str {
            self.chain_id.as_str()
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use test_helpers::TestBlockchain;
