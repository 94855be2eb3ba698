//! EVM opcode representation and bytecode assembly helpers.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

#[macro_use]
mod macros;

mod bytecode;
mod opcode;

pub use bytecode::{push_bytes, push_u64, Splice};
pub use opcode::{InvalidOpcode, Opcode};
