use super::memory::{DynamicMemory, Memory};
use super::stack::Stack;
use super::{Code, Evm};

use crate::call::CallParams;
use crate::context::State;
use crate::error::{ErrorCode, Exception, Maybe};
use crate::gas;
use crate::types::{Address, Word256, U256};

/// Registers of one running contract.
///
/// Failures are recorded in `maybe` and observed by the loop before the next instruction,
/// so stack and memory helpers hand back zero values instead of errors.
pub(crate) struct Machine<'r, 's> {
    pub(crate) evm: &'r Evm,
    pub(crate) code: &'r Code,
    pub(crate) params: &'r CallParams,
    pub(crate) st: &'r mut State<'s>,
    pub(crate) gas: &'r mut u64,
    pub(crate) stack: Stack,
    pub(crate) memory: DynamicMemory,
    pub(crate) maybe: Maybe,
    pub(crate) return_data: Vec<u8>,
    pub(crate) pc: u64,
}

impl<'r, 's> Machine<'r, 's> {
    pub(crate) fn new(
        evm: &'r Evm,
        code: &'r Code,
        st: &'r mut State<'s>,
        params: &'r CallParams,
        gas: &'r mut u64,
    ) -> Self {
        let options = evm.options();

        Self {
            evm,
            code,
            params,
            st,
            gas,
            stack: Stack::new(options.data_stack_initial_capacity, options.data_stack_max_depth),
            memory: DynamicMemory::new(
                options.memory_initial_capacity,
                options.memory_max_capacity,
            ),
            maybe: Maybe::default(),
            return_data: Vec::new(),
            pc: 0,
        }
    }

    /// Charge `amount`. Returns `true` if the gas ran out.
    pub(crate) fn use_gas(&mut self, amount: u64) -> bool {
        self.maybe.push(gas::use_gas(self.gas, amount))
    }

    pub(crate) fn pop(&mut self) -> U256 {
        let word = self.stack.pop(self.gas);
        self.maybe.value(word)
    }

    pub(crate) fn pop_u64(&mut self) -> u64 {
        let word = self.pop();

        if word > U256::from(u64::MAX) {
            self.maybe.push_error(Exception::with_context(
                ErrorCode::IntegerOverflow,
                format_args!("{:#x} does not fit 64 bits", word),
            ));
            return 0;
        }

        word.low_u64()
    }

    /// Pop a word, saturating at `u64::MAX`.
    pub(crate) fn pop_u64_saturating(&mut self) -> u64 {
        let word = self.pop();

        if word > U256::from(u64::MAX) {
            u64::MAX
        } else {
            word.low_u64()
        }
    }

    pub(crate) fn pop_address(&mut self) -> Address {
        Address::from_u256(self.pop())
    }

    pub(crate) fn pop_word(&mut self) -> Word256 {
        Word256::from(self.pop())
    }

    pub(crate) fn push(&mut self, word: U256) {
        let pushed = self.stack.push(self.gas, word);
        self.maybe.push(pushed);
    }

    pub(crate) fn push_u64(&mut self, value: u64) {
        self.push(U256::from(value));
    }

    pub(crate) fn push_bool(&mut self, value: bool) {
        self.push(if value { U256::one() } else { U256::zero() });
    }

    pub(crate) fn push_address(&mut self, address: &Address) {
        self.push(address.to_u256());
    }

    /// Push `bytes` as a big-endian word, keeping the low 32 bytes.
    pub(crate) fn push_bytes(&mut self, bytes: &[u8]) {
        self.push(U256::from(&Word256::left_pad(bytes)));
    }

    pub(crate) fn read_memory(&mut self, offset: U256, length: U256) -> Vec<u8> {
        let data = self.memory.read(offset, length);
        self.maybe.value(data)
    }

    pub(crate) fn write_memory(&mut self, offset: U256, data: &[u8]) {
        let written = self.memory.write(offset, data);
        self.maybe.push(written);
    }

    /// Copy `length` bytes of `data` from `data_offset` into memory at `memory_offset`,
    /// zero padding past the end of `data`.
    ///
    /// An offset past the end of `data` fails with `out_of_bounds`.
    pub(crate) fn copy_to_memory(
        &mut self,
        memory_offset: U256,
        data: &[u8],
        data_offset: u64,
        length: u64,
        out_of_bounds: ErrorCode,
    ) {
        let (start, end) = match self.memory.ensure(memory_offset, U256::from(length)) {
            Ok(range) => range,
            Err(e) => {
                self.maybe.push_error(e);
                return;
            }
        };

        let bytes = self.subslice(data, data_offset, end.saturating_sub(start), out_of_bounds);
        self.write_memory(memory_offset, &bytes);
    }

    /// Padded `length` bytes of `data` from `offset`, failing with `out_of_bounds` past the
    /// end.
    pub(crate) fn subslice(
        &mut self,
        data: &[u8],
        offset: u64,
        length: usize,
        out_of_bounds: ErrorCode,
    ) -> Vec<u8> {
        match usize::try_from(offset).ok().filter(|o| *o <= data.len()) {
            Some(start) => {
                let available = &data[start..];
                let mut bytes = available[..available.len().min(length)].to_vec();
                bytes.resize(length, 0);
                bytes
            }
            None => {
                self.maybe.push_error(Exception::with_context(
                    out_of_bounds,
                    format_args!("offset {} past {} bytes", offset, data.len()),
                ));
                Vec::new()
            }
        }
    }
}
