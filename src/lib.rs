//! Deterministic EVM interpreter over a layered, permissioned account state.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]
#![deny(unused_crate_dependencies)]
#![deny(
    clippy::arithmetic_side_effects,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::string_slice
)]
#![allow(clippy::try_err)]

// The crate dev-depends on itself to enable `test-helpers` for unit tests.
#[cfg(test)]
use evm_engine as _;

pub mod abi;
pub mod account;
pub mod call;
pub mod consts;
pub mod context;
pub mod crypto;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod event;
pub mod gas;
pub mod interpreter;
pub mod native;
pub mod permission;
pub mod storage;
pub mod types;
pub mod util;

pub use evm_asm;

/// Items needed to set up and drive the interpreter.
pub mod prelude {
    pub use evm_asm::{bytecode, push_bytes, push_u64, Opcode};

    pub use crate::account::Account;
    pub use crate::call::{CallFrame, CallParams, CallType};
    pub use crate::context::{Blockchain, State};
    pub use crate::dispatch::{
        connect, Call, Callable, Dispatcher, Dispatchers, ExternalDispatcher,
    };
    pub use crate::error::{CallError, ErrorCode, Exception, Maybe, NestedCallError};
    pub use crate::event::{
        CallEvent, CollectingEventSink, Event, EventSink, LogEvent, NoopEventSink,
    };
    pub use crate::interpreter::{Code, Contract, Evm, Options};
    pub use crate::native::{
        precompiles, Context, Function, Native, NativeContract, NativeFn, Natives,
    };
    pub use crate::permission::{AccountPermissions, BasePermissions, PermFlag};
    pub use crate::storage::{Cache, Iterable, MemoryStorage, Reader, ReaderWriter, Writer};
    pub use crate::types::{Address, Word256, U256};

    #[cfg(any(test, feature = "test-helpers"))]
    pub use crate::context::TestBlockchain;

    #[cfg(any(test, feature = "test-helpers"))]
    pub use crate::util::test_helpers::{TestBuilder, TestOutcome};
}
