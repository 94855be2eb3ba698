use super::Evm;

use crate::call::CallParams;
use crate::context::State;
use crate::dispatch::Call;
use crate::engine;
use crate::error::Exception;

use evm_asm::{InvalidOpcode, Opcode};

use std::fmt;
use std::sync::Arc;

/// Bytecode with its jump destinations resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    bytes: Vec<u8>,
    jump_dests: Vec<bool>,
}

impl Code {
    /// Analyse `bytes`. A `JUMPDEST` byte inside push data is not a jump destination.
    pub fn new(bytes: Vec<u8>) -> Self {
        let mut jump_dests = vec![false; bytes.len()];
        let mut pc = 0;

        while pc < bytes.len() {
            match Opcode::try_from(bytes[pc]) {
                Ok(Opcode::JUMPDEST) => jump_dests[pc] = true,
                Ok(op) => pc = pc.saturating_add(op.push_size()),
                Err(_) => (),
            }

            pc = pc.saturating_add(1);
        }

        Self { bytes, jump_dests }
    }

    /// Raw bytecode.
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// Length of the bytecode.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` for empty bytecode.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Opcode at `pc`. Past the end of the code everything reads as `STOP`.
    pub fn opcode(&self, pc: u64) -> Result<Opcode, InvalidOpcode> {
        usize::try_from(pc)
            .ok()
            .and_then(|pc| self.bytes.get(pc))
            .map_or(Ok(Opcode::STOP), |b| Opcode::try_from(*b))
    }

    /// `true` if `pc` holds a `JUMPDEST` outside push data.
    pub fn is_jump_dest(&self, pc: u64) -> bool {
        usize::try_from(pc)
            .ok()
            .and_then(|pc| self.jump_dests.get(pc))
            .copied()
            .unwrap_or(false)
    }
}

/// Bytecode bound to the VM that runs it.
#[derive(Clone)]
pub struct Contract {
    evm: Arc<Evm>,
    code: Code,
}

impl Contract {
    /// `code` run by `evm`.
    pub fn new(evm: Arc<Evm>, code: Vec<u8>) -> Self {
        Self {
            evm,
            code: Code::new(code),
        }
    }

    /// Analysed bytecode.
    pub const fn code(&self) -> &Code {
        &self.code
    }
}

impl Call for Contract {
    fn call(
        &self,
        st: &mut State<'_>,
        params: &CallParams,
        gas: &mut u64,
    ) -> Result<Vec<u8>, Exception> {
        engine::call(st, params, gas, |st, params, gas| self.evm.run(&self.code, st, params, gas))
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract").field("code_len", &self.code.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use evm_asm::bytecode;

    #[test]
    fn jump_dests_skip_push_data() {
        let code = Code::new(bytecode![
            Opcode::PUSH2,
            Opcode::JUMPDEST,
            Opcode::JUMPDEST,
            Opcode::JUMPDEST,
        ]);

        assert!(!code.is_jump_dest(1));
        assert!(!code.is_jump_dest(2));
        assert!(code.is_jump_dest(3));
        assert!(!code.is_jump_dest(4));
        assert!(!code.is_jump_dest(u64::MAX));
    }

    #[test]
    fn truncated_push_is_harmless() {
        let code = Code::new(bytecode![Opcode::PUSH32, 0x5b]);

        assert!(!code.is_jump_dest(1));
        assert_eq!(code.len(), 2);
    }

    #[test]
    fn decoding() {
        let code = Code::new(vec![0x01, 0x0c]);

        assert_eq!(code.opcode(0), Ok(Opcode::ADD));
        assert_eq!(code.opcode(1), Err(InvalidOpcode(0x0c)));
        assert_eq!(code.opcode(2), Ok(Opcode::STOP));
        assert_eq!(code.opcode(u64::MAX), Ok(Opcode::STOP));
    }
}
