//! # The `impl_opcodes!` macro
//!
//! The opcode table below is the single source of truth for the `Opcode` type. Each row holds
//! a short docstring, the opcode byte and the uppercase mnemonic:
//!
//! ```rust,ignore
//! impl_opcodes! {
//!     "Halts execution."
//!     0x00 STOP
//!     "Addition operation."
//!     0x01 ADD
//!     // ...
//! }
//! ```
//!
//! From the table the macro derives the `#[repr(u8)]` enum, a `TryFrom<u8>` implementation
//! producing `Err(InvalidOpcode)` for unassigned bytes, and the mnemonic lookup used by the
//! `Display` implementation.

/// This macro is intentionally private. See the module-level documentation.
macro_rules! impl_opcodes {
    ($($doc:literal $ix:literal $Op:ident)*) => {
        /// A single opcode byte of EVM bytecode.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, strum::EnumIter)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(u8)]
        #[allow(missing_docs)]
        pub enum Opcode {
            $(
                #[doc = $doc]
                $Op = $ix,
            )*
        }

        impl TryFrom<u8> for Opcode {
            type Error = InvalidOpcode;

            fn try_from(u: u8) -> Result<Self, Self::Error> {
                match u {
                    $(
                        $ix => Ok(Opcode::$Op),
                    )*
                    _ => Err(InvalidOpcode(u)),
                }
            }
        }

        impl Opcode {
            /// The assembler mnemonic of this opcode.
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $(
                        Opcode::$Op => stringify!($Op),
                    )*
                }
            }
        }
    };
}
