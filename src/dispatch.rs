//! Resolution of accounts to the code that runs them.

use crate::account::Account;
use crate::call::CallParams;
use crate::context::State;
use crate::error::Exception;
use crate::interpreter::Contract;
use crate::native::Native;

use std::fmt;
use std::sync::{Arc, Weak};

/// Anything that can be invoked with call parameters and a gas budget.
pub trait Call {
    /// Run against `st`, charging `gas`.
    fn call(
        &self,
        st: &mut State<'_>,
        params: &CallParams,
        gas: &mut u64,
    ) -> Result<Vec<u8>, Exception>;
}

/// Code resolved for an account.
pub enum Callable {
    /// Interpreter bytecode.
    Bytecode(Contract),
    /// Native function or contract.
    Native(Native),
    /// Code run by another VM.
    Foreign(Box<dyn Call>),
}

impl Call for Callable {
    fn call(
        &self,
        st: &mut State<'_>,
        params: &CallParams,
        gas: &mut u64,
    ) -> Result<Vec<u8>, Exception> {
        match self {
            Self::Bytecode(contract) => contract.call(st, params, gas),
            Self::Native(native) => native.call(st, params, gas),
            Self::Foreign(callable) => callable.call(st, params, gas),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytecode(contract) => f.debug_tuple("Bytecode").field(contract).finish(),
            Self::Native(native) => f.debug_tuple("Native").field(native).finish(),
            Self::Foreign(_) => f.write_str("Foreign"),
        }
    }
}

/// Resolve an account to a callable, or `None` if this dispatcher can't run it.
pub trait Dispatcher {
    /// Callable for `account`.
    fn dispatch(&self, account: &Account) -> Option<Callable>;
}

/// A dispatcher that also resolves calls through the dispatchers of other VMs.
pub trait ExternalDispatcher: Dispatcher + Send + Sync {
    /// Replace the dispatchers consulted for accounts this one can't run.
    fn set_externals(&self, externals: Dispatchers);
}

/// Ordered set of dispatchers. The first one resolving an account wins.
///
/// Holds weak references so connected VMs can drop each other.
#[derive(Default, Clone)]
pub struct Dispatchers {
    dispatchers: Vec<Weak<dyn ExternalDispatcher>>,
}

impl Dispatchers {
    /// Set consulting `dispatchers` in order.
    pub fn new(dispatchers: Vec<Weak<dyn ExternalDispatcher>>) -> Self {
        Self { dispatchers }
    }

    /// Number of dispatchers, live or dropped.
    pub fn len(&self) -> usize {
        self.dispatchers.len()
    }

    /// `true` if there are no dispatchers.
    pub fn is_empty(&self) -> bool {
        self.dispatchers.is_empty()
    }
}

impl fmt::Debug for Dispatchers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatchers")
            .field("len", &self.dispatchers.len())
            .finish()
    }
}

impl Dispatcher for Dispatchers {
    fn dispatch(&self, account: &Account) -> Option<Callable> {
        self.dispatchers
            .iter()
            .filter_map(Weak::upgrade)
            .find_map(|d| d.dispatch(account))
    }
}

/// Make every VM in `vms` consult all the others, in order, for accounts it can't run.
pub fn connect(vms: &[Arc<dyn ExternalDispatcher>]) {
    for (i, vm) in vms.iter().enumerate() {
        let externals = vms
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, other)| Arc::downgrade(other))
            .collect();

        vm.set_externals(Dispatchers::new(externals));
    }
}
