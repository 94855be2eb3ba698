use core::fmt;

/// The byte does not map to any assigned opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvalidOpcode(pub u8);

impl fmt::Display for InvalidOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid opcode 0x{:02x}", self.0)
    }
}

impl std::error::Error for InvalidOpcode {}

impl_opcodes! {
    "Halts execution."
    0x00 STOP
    "Addition operation."
    0x01 ADD
    "Multiplication operation."
    0x02 MUL
    "Subtraction operation."
    0x03 SUB
    "Integer division operation."
    0x04 DIV
    "Signed integer division operation (truncated)."
    0x05 SDIV
    "Modulo remainder operation."
    0x06 MOD
    "Signed modulo remainder operation."
    0x07 SMOD
    "Modulo addition operation."
    0x08 ADDMOD
    "Modulo multiplication operation."
    0x09 MULMOD
    "Exponential operation."
    0x0a EXP
    "Extend length of two's complement signed integer."
    0x0b SIGNEXTEND
    "Less-than comparison."
    0x10 LT
    "Greater-than comparison."
    0x11 GT
    "Signed less-than comparison."
    0x12 SLT
    "Signed greater-than comparison."
    0x13 SGT
    "Equality comparison."
    0x14 EQ
    "Simple not operator."
    0x15 ISZERO
    "Bitwise AND operation."
    0x16 AND
    "Bitwise OR operation."
    0x17 OR
    "Bitwise XOR operation."
    0x18 XOR
    "Bitwise NOT operation."
    0x19 NOT
    "Retrieve single byte from word."
    0x1a BYTE
    "Left shift operation."
    0x1b SHL
    "Logical right shift operation."
    0x1c SHR
    "Arithmetic (signed) right shift operation."
    0x1d SAR
    "Compute Keccak-256 hash."
    0x20 SHA3
    "Get address of currently executing account."
    0x30 ADDRESS
    "Get balance of the given account."
    0x31 BALANCE
    "Get execution origination address."
    0x32 ORIGIN
    "Get caller address."
    0x33 CALLER
    "Get deposited value by the instruction/transaction responsible for this execution."
    0x34 CALLVALUE
    "Get input data of current environment."
    0x35 CALLDATALOAD
    "Get size of input data in current environment."
    0x36 CALLDATASIZE
    "Copy input data in current environment to memory."
    0x37 CALLDATACOPY
    "Get size of code running in current environment."
    0x38 CODESIZE
    "Copy code running in current environment to memory."
    0x39 CODECOPY
    "Get price of gas in current environment."
    0x3a GASPRICE
    "Get size of an account's code."
    0x3b EXTCODESIZE
    "Copy an account's code to memory."
    0x3c EXTCODECOPY
    "Get size of output data from the previous call."
    0x3d RETURNDATASIZE
    "Copy output data from the previous call to memory."
    0x3e RETURNDATACOPY
    "Get hash of an account's code."
    0x3f EXTCODEHASH
    "Get the hash of one of the 256 most recent blocks."
    0x40 BLOCKHASH
    "Get the block's beneficiary address."
    0x41 COINBASE
    "Get the block's timestamp."
    0x42 TIMESTAMP
    "Get the block's number."
    0x43 NUMBER
    "Get the block's difficulty."
    0x44 DIFFICULTY
    "Get the block's gas limit."
    0x45 GASLIMIT
    "Get the chain ID."
    0x46 CHAINID
    "Remove item from stack."
    0x50 POP
    "Load word from memory."
    0x51 MLOAD
    "Save word to memory."
    0x52 MSTORE
    "Save byte to memory."
    0x53 MSTORE8
    "Load word from storage."
    0x54 SLOAD
    "Save word to storage."
    0x55 SSTORE
    "Alter the program counter."
    0x56 JUMP
    "Conditionally alter the program counter."
    0x57 JUMPI
    "Get the value of the program counter prior to the increment."
    0x58 PC
    "Get the size of active memory in bytes."
    0x59 MSIZE
    "Get the amount of available gas."
    0x5a GAS
    "Mark a valid destination for jumps."
    0x5b JUMPDEST
    "Place 1 byte item on stack."
    0x60 PUSH1
    "Place 2 byte item on stack."
    0x61 PUSH2
    "Place 3 byte item on stack."
    0x62 PUSH3
    "Place 4 byte item on stack."
    0x63 PUSH4
    "Place 5 byte item on stack."
    0x64 PUSH5
    "Place 6 byte item on stack."
    0x65 PUSH6
    "Place 7 byte item on stack."
    0x66 PUSH7
    "Place 8 byte item on stack."
    0x67 PUSH8
    "Place 9 byte item on stack."
    0x68 PUSH9
    "Place 10 byte item on stack."
    0x69 PUSH10
    "Place 11 byte item on stack."
    0x6a PUSH11
    "Place 12 byte item on stack."
    0x6b PUSH12
    "Place 13 byte item on stack."
    0x6c PUSH13
    "Place 14 byte item on stack."
    0x6d PUSH14
    "Place 15 byte item on stack."
    0x6e PUSH15
    "Place 16 byte item on stack."
    0x6f PUSH16
    "Place 17 byte item on stack."
    0x70 PUSH17
    "Place 18 byte item on stack."
    0x71 PUSH18
    "Place 19 byte item on stack."
    0x72 PUSH19
    "Place 20 byte item on stack."
    0x73 PUSH20
    "Place 21 byte item on stack."
    0x74 PUSH21
    "Place 22 byte item on stack."
    0x75 PUSH22
    "Place 23 byte item on stack."
    0x76 PUSH23
    "Place 24 byte item on stack."
    0x77 PUSH24
    "Place 25 byte item on stack."
    0x78 PUSH25
    "Place 26 byte item on stack."
    0x79 PUSH26
    "Place 27 byte item on stack."
    0x7a PUSH27
    "Place 28 byte item on stack."
    0x7b PUSH28
    "Place 29 byte item on stack."
    0x7c PUSH29
    "Place 30 byte item on stack."
    0x7d PUSH30
    "Place 31 byte item on stack."
    0x7e PUSH31
    "Place 32 byte item on stack."
    0x7f PUSH32
    "Duplicate 1st stack item."
    0x80 DUP1
    "Duplicate 2nd stack item."
    0x81 DUP2
    "Duplicate 3rd stack item."
    0x82 DUP3
    "Duplicate 4th stack item."
    0x83 DUP4
    "Duplicate 5th stack item."
    0x84 DUP5
    "Duplicate 6th stack item."
    0x85 DUP6
    "Duplicate 7th stack item."
    0x86 DUP7
    "Duplicate 8th stack item."
    0x87 DUP8
    "Duplicate 9th stack item."
    0x88 DUP9
    "Duplicate 10th stack item."
    0x89 DUP10
    "Duplicate 11th stack item."
    0x8a DUP11
    "Duplicate 12th stack item."
    0x8b DUP12
    "Duplicate 13th stack item."
    0x8c DUP13
    "Duplicate 14th stack item."
    0x8d DUP14
    "Duplicate 15th stack item."
    0x8e DUP15
    "Duplicate 16th stack item."
    0x8f DUP16
    "Exchange 1st and 2nd stack items."
    0x90 SWAP1
    "Exchange 1st and 3rd stack items."
    0x91 SWAP2
    "Exchange 1st and 4th stack items."
    0x92 SWAP3
    "Exchange 1st and 5th stack items."
    0x93 SWAP4
    "Exchange 1st and 6th stack items."
    0x94 SWAP5
    "Exchange 1st and 7th stack items."
    0x95 SWAP6
    "Exchange 1st and 8th stack items."
    0x96 SWAP7
    "Exchange 1st and 9th stack items."
    0x97 SWAP8
    "Exchange 1st and 10th stack items."
    0x98 SWAP9
    "Exchange 1st and 11th stack items."
    0x99 SWAP10
    "Exchange 1st and 12th stack items."
    0x9a SWAP11
    "Exchange 1st and 13th stack items."
    0x9b SWAP12
    "Exchange 1st and 14th stack items."
    0x9c SWAP13
    "Exchange 1st and 15th stack items."
    0x9d SWAP14
    "Exchange 1st and 16th stack items."
    0x9e SWAP15
    "Exchange 1st and 17th stack items."
    0x9f SWAP16
    "Append log record with 0 topics."
    0xa0 LOG0
    "Append log record with 1 topics."
    0xa1 LOG1
    "Append log record with 2 topics."
    0xa2 LOG2
    "Append log record with 3 topics."
    0xa3 LOG3
    "Append log record with 4 topics."
    0xa4 LOG4
    "Create a new account with associated code."
    0xf0 CREATE
    "Message-call into an account."
    0xf1 CALL
    "Message-call into this account with an alternative account's code."
    0xf2 CALLCODE
    "Halt execution returning output data."
    0xf3 RETURN
    "Message-call into this account with an alternative account's code, keeping the current \
     sender and value."
    0xf4 DELEGATECALL
    "Create a new account with associated code at a predictable address."
    0xf5 CREATE2
    "Static message-call into an account."
    0xfa STATICCALL
    "Halt execution reverting state changes but returning data."
    0xfd REVERT
    "Designated invalid instruction."
    0xfe INVALID
    "Halt execution and register account for later deletion."
    0xff SELFDESTRUCT
}

impl Opcode {
    /// Number of immediate bytes following a `PUSHn` opcode, zero for every other opcode.
    pub const fn push_size(self) -> usize {
        let b = self as u8;

        if b >= Opcode::PUSH1 as u8 && b <= Opcode::PUSH32 as u8 {
            (b - Opcode::PUSH1 as u8) as usize + 1
        } else {
            0
        }
    }

    /// `true` for `PUSH1` to `PUSH32`.
    pub const fn is_push(self) -> bool {
        self.push_size() > 0
    }

    /// Stack position read by a `DUPn` opcode.
    pub const fn dup_depth(self) -> Option<usize> {
        let b = self as u8;

        if b >= Opcode::DUP1 as u8 && b <= Opcode::DUP16 as u8 {
            Some((b - Opcode::DUP1 as u8) as usize + 1)
        } else {
            None
        }
    }

    /// Stack position exchanged with the top by a `SWAPn` opcode.
    pub const fn swap_depth(self) -> Option<usize> {
        let b = self as u8;

        if b >= Opcode::SWAP1 as u8 && b <= Opcode::SWAP16 as u8 {
            Some((b - Opcode::SWAP1 as u8) as usize + 1)
        } else {
            None
        }
    }

    /// Number of topics emitted by a `LOGn` opcode.
    pub const fn log_topics(self) -> Option<usize> {
        let b = self as u8;

        if b >= Opcode::LOG0 as u8 && b <= Opcode::LOG4 as u8 {
            Some((b - Opcode::LOG0 as u8) as usize)
        } else {
            None
        }
    }

    /// The `PUSHn` opcode for an immediate of `n` bytes.
    pub fn push(n: usize) -> Option<Self> {
        match n {
            1..=32 => Opcode::try_from(Opcode::PUSH1 as u8 + (n - 1) as u8).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}
