use super::super::alu;
use super::super::internal::Machine;
use super::super::{Code, Evm, Memory};

use crate::call::CallParams;
use crate::context::{self, State};
use crate::crypto;
use crate::error::{ErrorCode, Exception};
use crate::gas::{GAS_BASE_OP, GAS_SHA3};
use crate::types::U256;

use evm_asm::{InvalidOpcode, Opcode};
use tracing::trace;

impl Evm {
    /// Interpret `code` as `params.callee` until it halts.
    pub(crate) fn run(
        &self,
        code: &Code,
        st: &mut State<'_>,
        params: &CallParams,
        gas: &mut u64,
    ) -> Result<Vec<u8>, Exception> {
        if code.is_empty() {
            return Ok(Vec::new());
        }

        Machine::new(self, code, st, params, gas).execute()
    }
}

impl Machine<'_, '_> {
    fn execute(&mut self) -> Result<Vec<u8>, Exception> {
        loop {
            if let Some(e) = self.maybe.take() {
                return Err(e);
            }

            let op = self.code.opcode(self.pc).map_err(|InvalidOpcode(byte)| {
                Exception::with_context(
                    ErrorCode::ExecutionAborted,
                    format_args!("invalid opcode 0x{:02x} at {}", byte, self.pc),
                )
            })?;

            if self.use_gas(GAS_BASE_OP) {
                continue;
            }

            if self.evm.options().debug_opcodes {
                trace!(
                    pc = self.pc,
                    %op,
                    stack = self.stack.len(),
                    memory = self.memory.capacity(),
                    gas = *self.gas,
                    "step"
                );
            }

            if let Some(output) = self.instruction(op)? {
                return self.maybe.take().map_or(Ok(output), Err);
            }
        }
    }

    /// Execute `op` at `pc` and advance. Returns the output of a halting instruction.
    fn instruction(&mut self, op: Opcode) -> Result<Option<Vec<u8>>, Exception> {
        let pc = self.pc;
        self.pc = pc.saturating_add(1);

        match op {
            Opcode::STOP => return Ok(Some(Vec::new())),

            Opcode::ADD => self.binary(alu::add),
            Opcode::MUL => self.binary(alu::mul),
            Opcode::SUB => self.binary(alu::sub),
            Opcode::DIV => self.binary(alu::div),
            Opcode::SDIV => self.binary(alu::sdiv),
            Opcode::MOD => self.binary(alu::rem),
            Opcode::SMOD => self.binary(alu::smod),
            Opcode::EXP => self.binary(alu::exp),
            Opcode::SIGNEXTEND => self.binary(alu::signextend),
            Opcode::BYTE => self.binary(alu::byte),
            Opcode::SHL => self.binary(alu::shl),
            Opcode::SHR => self.binary(alu::shr),
            Opcode::SAR => self.binary(alu::sar),
            Opcode::AND => self.binary(|a, b| a & b),
            Opcode::OR => self.binary(|a, b| a | b),
            Opcode::XOR => self.binary(|a, b| a ^ b),

            Opcode::ADDMOD => {
                let (a, b, m) = (self.pop(), self.pop(), self.pop());
                self.push(alu::addmod(a, b, m));
            }

            Opcode::MULMOD => {
                let (a, b, m) = (self.pop(), self.pop(), self.pop());
                self.push(alu::mulmod(a, b, m));
            }

            Opcode::LT => self.compare(|a, b| a < b),
            Opcode::GT => self.compare(|a, b| a > b),
            Opcode::SLT => self.compare(alu::slt),
            Opcode::SGT => self.compare(alu::sgt),
            Opcode::EQ => self.compare(|a, b| a == b),

            Opcode::ISZERO => {
                let x = self.pop();
                self.push_bool(x.is_zero());
            }

            Opcode::NOT => {
                let x = self.pop();
                self.push(!x);
            }

            Opcode::SHA3 => {
                let (offset, size) = (self.pop(), self.pop());
                let data = self.read_memory(offset, size);

                if !self.use_gas(GAS_SHA3) {
                    self.push_bytes(crypto::keccak256(&data).as_ref());
                }
            }

            Opcode::ADDRESS => {
                let callee = self.params.callee;
                self.push_address(&callee);
            }

            Opcode::BALANCE => {
                let address = self.pop_address();
                let balance = self.balance(address);
                self.push(balance);
            }

            Opcode::ORIGIN => {
                let origin = self.params.origin;
                self.push_address(&origin);
            }

            Opcode::CALLER => {
                let caller = self.params.caller;
                self.push_address(&caller);
            }

            Opcode::CALLVALUE => self.push_u64(self.params.value),

            Opcode::CALLDATALOAD => {
                let offset = self.pop_u64();
                let params = self.params;
                let word = self.subslice(&params.input, offset, 32, ErrorCode::InputOutOfBounds);
                self.push_bytes(&word);
            }

            Opcode::CALLDATASIZE => self.push_u64(self.params.input.len() as u64),

            Opcode::CALLDATACOPY => {
                let (memory_offset, offset, length) = (self.pop(), self.pop_u64(), self.pop_u64());
                let params = self.params;
                self.copy_to_memory(
                    memory_offset,
                    &params.input,
                    offset,
                    length,
                    ErrorCode::InputOutOfBounds,
                );
            }

            Opcode::CODESIZE => self.push_u64(self.code.len() as u64),

            Opcode::CODECOPY => {
                let (memory_offset, offset, length) = (self.pop(), self.pop_u64(), self.pop_u64());
                let code = self.code;
                self.copy_to_memory(
                    memory_offset,
                    code.as_bytes(),
                    offset,
                    length,
                    ErrorCode::CodeOutOfBounds,
                );
            }

            Opcode::GASPRICE => self.push(U256::zero()),

            Opcode::EXTCODESIZE => {
                let address = self.pop_address();
                let size = self.ext_code_size(address);
                self.push(size);
            }

            Opcode::EXTCODECOPY => {
                let address = self.pop_address();
                let (memory_offset, offset, length) = (self.pop(), self.pop_u64(), self.pop_u64());
                self.ext_code_copy(address, memory_offset, offset, length);
            }

            Opcode::RETURNDATASIZE => self.push_u64(self.return_data.len() as u64),

            Opcode::RETURNDATACOPY => {
                let (memory_offset, offset, length) = (self.pop(), self.pop_u64(), self.pop_u64());
                let available = self.return_data.len() as u64;

                match offset.checked_add(length) {
                    Some(end) if end <= available => {
                        let data = std::mem::take(&mut self.return_data);
                        self.copy_to_memory(
                            memory_offset,
                            &data,
                            offset,
                            length,
                            ErrorCode::ReturnDataOutOfBounds,
                        );
                        self.return_data = data;
                    }
                    _ => {
                        self.maybe.push_error(Exception::with_context(
                            ErrorCode::ReturnDataOutOfBounds,
                            format_args!("{} bytes from {} of {} bytes", length, offset, available),
                        ));
                    }
                }
            }

            Opcode::EXTCODEHASH => {
                let address = self.pop_address();
                let hash = self.ext_code_hash(address);
                self.push(hash);
            }

            Opcode::BLOCKHASH => {
                let height = self.pop_u64();
                let hash = self.block_hash(height);
                self.push(hash);
            }

            Opcode::COINBASE => self.push(U256::zero()),

            Opcode::TIMESTAMP => {
                let time = self.st.blockchain.last_block_time().to_unix();
                self.push_u64(u64::try_from(time).unwrap_or_default());
            }

            Opcode::NUMBER => self.push_u64(self.st.blockchain.last_block_height()),

            Opcode::DIFFICULTY => self.push(U256::one()),

            Opcode::GASLIMIT => self.push_u64(*self.gas),

            Opcode::CHAINID => {
                let id = context::chain_id_word(self.st.blockchain.chain_id());
                self.push(id);
            }

            Opcode::POP => {
                self.pop();
            }

            Opcode::MLOAD => {
                let offset = self.pop();
                let word = self.read_memory(offset, U256::from(32));
                self.push_bytes(&word);
            }

            Opcode::MSTORE => {
                let (offset, value) = (self.pop(), self.pop_word());
                self.write_memory(offset, value.as_ref());
            }

            Opcode::MSTORE8 => {
                let (offset, value) = (self.pop(), self.pop());
                self.write_memory(offset, &[value.byte(0)]);
            }

            Opcode::SLOAD => {
                let key = self.pop_word();
                let value = self.sload(key);
                self.push(value);
            }

            Opcode::SSTORE => {
                let (key, value) = (self.pop_word(), self.pop_word());
                self.sstore(key, value);
            }

            Opcode::JUMP => {
                let to = self.pop_u64();
                self.jump(to);
            }

            Opcode::JUMPI => {
                let (to, condition) = (self.pop_u64(), self.pop());

                if !condition.is_zero() {
                    self.jump(to);
                }
            }

            Opcode::PC => self.push_u64(pc),

            Opcode::MSIZE => self.push_u64(self.memory.capacity()),

            Opcode::GAS => self.push_u64(*self.gas),

            Opcode::JUMPDEST => (),

            Opcode::RETURN => {
                let (offset, size) = (self.pop(), self.pop());
                return Ok(Some(self.read_memory(offset, size)));
            }

            Opcode::REVERT => {
                let (offset, size) = (self.pop(), self.pop());
                let output = self.read_memory(offset, size);

                return Err(self.maybe.take().unwrap_or_else(|| Exception::revert(output)));
            }

            Opcode::INVALID => {
                return Err(Exception::with_context(
                    ErrorCode::ExecutionAborted,
                    format_args!("INVALID at {}", pc),
                ));
            }

            Opcode::SELFDESTRUCT => {
                let receiver = self.pop_address();

                if self.maybe.has_error() {
                    return Ok(None);
                }

                self.self_destruct(receiver)?;
                return Ok(Some(Vec::new()));
            }

            Opcode::CREATE | Opcode::CREATE2 => self.create(op),

            Opcode::CALL | Opcode::CALLCODE | Opcode::DELEGATECALL | Opcode::STATICCALL => {
                self.call(op)
            }

            op if op.is_push() => {
                let size = op.push_size();
                let code = self.code;
                let immediate =
                    self.subslice(code.as_bytes(), self.pc, size, ErrorCode::CodeOutOfBounds);

                self.push_bytes(&immediate);
                self.pc = self.pc.saturating_add(size as u64);
            }

            op => {
                if let Some(n) = op.dup_depth() {
                    let duplicated = self.stack.dup(self.gas, n);
                    self.maybe.push(duplicated);
                } else if let Some(n) = op.swap_depth() {
                    let swapped = self.stack.swap(n);
                    self.maybe.push(swapped);
                } else if op.log_topics().is_some() {
                    self.log(op);
                } else {
                    return Err(Exception::with_context(
                        ErrorCode::ExecutionAborted,
                        format_args!("unsupported opcode {} at {}", op, pc),
                    ));
                }
            }
        }

        Ok(None)
    }

    fn binary(&mut self, f: impl FnOnce(U256, U256) -> U256) {
        let (a, b) = (self.pop(), self.pop());
        self.push(f(a, b));
    }

    fn compare(&mut self, f: impl FnOnce(U256, U256) -> bool) {
        let (a, b) = (self.pop(), self.pop());
        self.push_bool(f(a, b));
    }
}
