//! The bytecode interpreter and its entry point.

use crate::account::Account;
use crate::call::{CallFrame, CallParams};
use crate::consts::*;
use crate::context::{Blockchain, State};
use crate::crypto;
use crate::dispatch::{Callable, Dispatcher, Dispatchers, ExternalDispatcher};
use crate::engine;
use crate::error::CallError;
use crate::event::{EventSink, NestedErrorCollector};
use crate::native::{self, Natives};
use crate::storage::{NativesState, ReaderWriter};
use crate::types::{Address, Word256};

use tracing::debug_span;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

mod alu;
mod blockchain;
mod contract;
mod executors;
mod flow;
mod internal;
mod log;
mod memory;
mod stack;

pub use contract::{Code, Contract};
pub use memory::{DynamicMemory, Memory};
pub use stack::Stack;


/// Interpreter configuration.
#[derive(Debug, Clone)]
pub struct Options {
    /// Zeroed bytes the linear memory starts with.
    pub memory_initial_capacity: u64,
    /// Largest size the linear memory may grow to.
    pub memory_max_capacity: u64,
    /// Words reserved for the data stack up front.
    pub data_stack_initial_capacity: usize,
    /// Largest number of words on the data stack.
    pub data_stack_max_depth: usize,
    /// Deepest allowed call nesting. Zero means unlimited.
    pub call_stack_max_depth: u64,
    /// Native contracts visible to the interpreter.
    pub natives: Arc<Natives>,
    /// Bytes mixed into `CREATE` addresses.
    pub nonce: Vec<u8>,
    /// Trace every executed instruction.
    pub debug_opcodes: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            memory_initial_capacity: DEFAULT_MEMORY_INITIAL_CAPACITY,
            memory_max_capacity: DEFAULT_MEMORY_MAX_CAPACITY,
            data_stack_initial_capacity: DEFAULT_DATA_STACK_INITIAL_CAPACITY,
            data_stack_max_depth: DEFAULT_DATA_STACK_MAX_DEPTH,
            call_stack_max_depth: DEFAULT_CALL_STACK_MAX_DEPTH,
            natives: Arc::new(native::precompiles()),
            nonce: Vec::new(),
            debug_opcodes: false,
        }
    }
}

impl Options {
    /// Set the number of zeroed memory bytes a call starts with.
    pub fn with_memory_initial_capacity(mut self, capacity: u64) -> Self {
        self.memory_initial_capacity = capacity;
        self
    }

    /// Set the largest memory a call may grow.
    pub fn with_memory_max_capacity(mut self, capacity: u64) -> Self {
        self.memory_max_capacity = capacity;
        self
    }

    /// Set the number of stack slots reserved up front.
    pub fn with_data_stack_initial_capacity(mut self, capacity: usize) -> Self {
        self.data_stack_initial_capacity = capacity;
        self
    }

    /// Set the maximum data stack depth.
    pub fn with_data_stack_max_depth(mut self, depth: usize) -> Self {
        self.data_stack_max_depth = depth;
        self
    }

    /// Set the maximum call depth; 0 leaves it unbounded.
    pub fn with_call_stack_max_depth(mut self, depth: u64) -> Self {
        self.call_stack_max_depth = depth;
        self
    }

    /// Replace the native contract registry.
    pub fn with_natives(mut self, natives: Arc<Natives>) -> Self {
        self.natives = natives;
        self
    }

    /// Set the nonce mixed into CREATE addresses.
    pub fn with_nonce(mut self, nonce: Vec<u8>) -> Self {
        self.nonce = nonce;
        self
    }

    /// Trace every executed opcode.
    pub fn with_debug_opcodes(mut self, debug_opcodes: bool) -> Self {
        self.debug_opcodes = debug_opcodes;
        self
    }
}

/// EVM instance. Shared between threads behind an [`Arc`]; every top-level call runs against
/// its own state.
#[derive(Debug)]
pub struct Evm {
    options: Options,
    sequence: AtomicU64,
    externals: RwLock<Dispatchers>,
    this: Weak<Evm>,
}

impl Evm {
    /// Shared interpreter configured by `options`.
    pub fn new(options: Options) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            options,
            sequence: AtomicU64::new(0),
            externals: RwLock::new(Dispatchers::default()),
            this: this.clone(),
        })
    }

    /// Configuration the interpreter runs with.
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Contracts created so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Interpreted contract running `code` on this instance.
    pub fn contract(&self, code: Vec<u8>) -> Option<Contract> {
        self.this.upgrade().map(|evm| Contract::new(evm, code))
    }

    /// Address of the next `CREATE` by `creator`. Advances the sequence.
    pub(crate) fn next_contract_address(&self, creator: &Address) -> Address {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst).wrapping_add(1);

        let mut nonce = Word256::right_pad(&self.options.nonce).to_vec();
        nonce.extend_from_slice(&sequence.to_be_bytes());

        crypto::new_contract_address(creator, &nonce)
    }

    /// Run `code` as `params.callee` against `st`.
    ///
    /// Natives appear as accounts for the duration of the call. State is synced once, on
    /// success. On failure `st` is left untouched and the error carries the failures of the
    /// nested calls, deepest first.
    pub fn execute(
        &self,
        st: &mut dyn ReaderWriter,
        blockchain: &dyn Blockchain,
        event_sink: &mut dyn EventSink,
        params: &CallParams,
        code: &[u8],
        gas: &mut u64,
    ) -> Result<Vec<u8>, CallError> {
        let span = debug_span!(
            "execute",
            call_type = %params.call_type,
            caller = %params.caller,
            callee = %params.callee,
            gas = *gas
        );
        let _enter = span.enter();

        let code = Code::new(code.to_vec());
        let mut backend = NativesState::new(&self.options.natives, st);
        let mut collector = NestedErrorCollector::new(event_sink);

        let result = {
            let call_frame = CallFrame::new(&mut backend)
                .with_max_call_stack_depth(self.options.call_stack_max_depth);
            let mut state = State::new(call_frame, blockchain, &mut collector);

            engine::call(&mut state, params, gas, |st, params, gas| {
                self.run(&code, st, params, gas)
            })
            .and_then(|output| state.call_frame.sync().map(|_| output))
        };

        result.map_err(|e| CallError::new(e, collector.into_nested_errors()))
    }
}

impl Dispatcher for Evm {
    /// Only plain accounts and interpreter code run here.
    fn dispatch(&self, account: &Account) -> Option<Callable> {
        if account.is_native() || !account.wasm_code.is_empty() {
            return None;
        }

        self.contract(account.evm_code.clone()).map(Callable::Bytecode)
    }
}

impl ExternalDispatcher for Evm {
    fn set_externals(&self, externals: Dispatchers) {
        *self.externals.write().unwrap_or_else(PoisonError::into_inner) = externals;
    }
}

/// Resolution order for sub-calls: connected VMs, then natives, then this interpreter.
pub(crate) struct Resolver<'e>(pub(crate) &'e Evm);

impl Dispatcher for Resolver<'_> {
    fn dispatch(&self, account: &Account) -> Option<Callable> {
        let evm = self.0;
        let external = evm
            .externals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .dispatch(account);

        external
            .or_else(|| evm.options.natives.dispatch(account))
            .or_else(|| evm.dispatch(account))
    }
}
