//! Contracts implemented by the host instead of bytecode.

use crate::account::Account;
use crate::call::CallParams;
use crate::context::State;
use crate::crypto;
use crate::dispatch::{Call, Callable, Dispatcher};
use crate::engine;
use crate::error::{ErrorCode, Exception};
use crate::permission::{self, PermFlag};
use crate::types::Address;

use tracing::trace;

use std::collections::BTreeMap;
use std::fmt;

mod bn256;
mod contract;
mod precompiles;

pub use contract::NativeContract;
pub use precompiles::precompiles;

/// Body of a native function.
pub type NativeFn = fn(Context<'_, '_>) -> Result<Vec<u8>, Exception>;

/// What a native function runs against.
pub struct Context<'s, 'a> {
    /// State of the calling frame.
    pub state: &'s mut State<'a>,
    /// Parameters of the call.
    pub params: &'s CallParams,
    /// Remaining gas.
    pub gas: &'s mut u64,
}

impl Context<'_, '_> {
    /// Call input.
    pub fn input(&self) -> &[u8] {
        self.params.input.as_slice()
    }
}

/// A native function living at a fixed address.
#[derive(Clone)]
pub struct Function {
    name: String,
    comment: String,
    address: Address,
    perm_flag: PermFlag,
    f: NativeFn,
}

impl Function {
    /// Function `f` named `name` at `address`. Callers need `perm_flag`; an empty flag lets
    /// anyone call it.
    pub fn new(
        name: &str,
        comment: &str,
        address: Address,
        perm_flag: PermFlag,
        f: NativeFn,
    ) -> Self {
        Self {
            name: name.to_owned(),
            comment: comment.to_owned(),
            address,
            perm_flag,
            f,
        }
    }

    /// Member of a [`NativeContract`], named by its ABI signature such as
    /// `balanceOf(address)`. It takes the address of the contract it joins.
    pub fn member(signature: &str, comment: &str, perm_flag: PermFlag, f: NativeFn) -> Self {
        Self::new(signature, comment, Address::zeroed(), perm_flag, f)
    }

    /// Registered name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// What the function does.
    pub fn comment(&self) -> &str {
        self.comment.as_str()
    }

    /// Address the function lives at.
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// Permission required from callers.
    pub const fn perm_flag(&self) -> PermFlag {
        self.perm_flag
    }

    /// ABI selector of the name read as a function signature.
    pub fn selector(&self) -> [u8; 4] {
        let hash = crypto::keccak256(self.name.as_bytes());
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&hash[..4]);

        selector
    }

    fn execute(
        &self,
        st: &mut State<'_>,
        params: &CallParams,
        gas: &mut u64,
    ) -> Result<Vec<u8>, Exception> {
        if !self.perm_flag.is_empty() {
            permission::ensure_permission(&st.call_frame, &params.caller, self.perm_flag)?;
        }

        trace!(
            name = %self.name,
            caller = %params.caller,
            input_len = params.input.len(),
            "running native function"
        );

        (self.f)(Context {
            state: st,
            params,
            gas,
        })
    }
}

impl Call for Function {
    fn call(
        &self,
        st: &mut State<'_>,
        params: &CallParams,
        gas: &mut u64,
    ) -> Result<Vec<u8>, Exception> {
        engine::call(st, params, gas, |st, params, gas| self.execute(st, params, gas))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("perm_flag", &self.perm_flag)
            .finish()
    }
}

/// Something registered in [`Natives`].
#[derive(Debug, Clone)]
pub enum Native {
    /// A function at its own address.
    Function(Function),
    /// Functions sharing an address, picked by selector.
    Contract(NativeContract),
}

impl Native {
    /// Registered name.
    pub fn name(&self) -> &str {
        match self {
            Self::Function(function) => function.name(),
            Self::Contract(contract) => contract.name(),
        }
    }

    /// What it does.
    pub fn comment(&self) -> &str {
        match self {
            Self::Function(function) => function.comment(),
            Self::Contract(contract) => contract.comment(),
        }
    }

    /// Address it lives at.
    pub const fn address(&self) -> &Address {
        match self {
            Self::Function(function) => function.address(),
            Self::Contract(contract) => contract.address(),
        }
    }
}

impl From<Function> for Native {
    fn from(function: Function) -> Self {
        Self::Function(function)
    }
}

impl From<NativeContract> for Native {
    fn from(contract: NativeContract) -> Self {
        Self::Contract(contract)
    }
}

impl Call for Native {
    fn call(
        &self,
        st: &mut State<'_>,
        params: &CallParams,
        gas: &mut u64,
    ) -> Result<Vec<u8>, Exception> {
        match self {
            Self::Function(function) => function.call(st, params, gas),
            Self::Contract(contract) => contract.call(st, params, gas),
        }
    }
}

/// Registry of native functions and contracts, by address and by name.
#[derive(Debug, Default, Clone)]
pub struct Natives {
    by_address: BTreeMap<Address, Native>,
    by_name: BTreeMap<String, Address>,
}

impl Natives {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, builder style.
    pub fn function(
        mut self,
        name: &str,
        comment: &str,
        address: Address,
        perm_flag: PermFlag,
        f: NativeFn,
    ) -> Result<Self, Exception> {
        self.register(Function::new(name, comment, address, perm_flag, f))?;
        Ok(self)
    }

    /// Register a contract of `functions` at the address derived from `name`, builder style.
    pub fn contract(
        mut self,
        name: &str,
        comment: &str,
        functions: Vec<Function>,
    ) -> Result<Self, Exception> {
        self.register(NativeContract::new(name, comment, functions)?)?;
        Ok(self)
    }

    /// Add `native`. Names and addresses must be unused.
    pub fn register<N>(&mut self, native: N) -> Result<(), Exception>
    where
        N: Into<Native>,
    {
        let native = native.into();

        if self.by_name.contains_key(native.name()) {
            return Err(Exception::with_context(
                ErrorCode::DuplicateAddress,
                format_args!("native named {} already registered", native.name()),
            ));
        }

        if self.is_registered(native.address()) {
            return Err(Exception::with_context(
                ErrorCode::DuplicateAddress,
                format_args!("native already registered at {}", native.address()),
            ));
        }

        self.insert(native);
        Ok(())
    }

    pub(crate) fn insert<N>(&mut self, native: N)
    where
        N: Into<Native>,
    {
        let native = native.into();

        self.by_name.insert(native.name().to_owned(), *native.address());
        self.by_address.insert(*native.address(), native);
    }

    /// Registry holding everything registered in `natives`.
    pub fn merge<'n, I>(natives: I) -> Result<Self, Exception>
    where
        I: IntoIterator<Item = &'n Natives>,
    {
        natives
            .into_iter()
            .flat_map(Natives::iter)
            .try_fold(Self::new(), |mut merged, native| {
                merged.register(native.clone())?;
                Ok(merged)
            })
    }

    /// Native at `address`.
    pub fn get_by_address(&self, address: &Address) -> Option<&Native> {
        self.by_address.get(address)
    }

    /// Native named `name`.
    pub fn get_by_name(&self, name: &str) -> Option<&Native> {
        self.by_name.get(name).and_then(|address| self.by_address.get(address))
    }

    /// Function registered on its own under `name`.
    pub fn get_function(&self, name: &str) -> Option<&Function> {
        match self.get_by_name(name)? {
            Native::Function(function) => Some(function),
            Native::Contract(_) => None,
        }
    }

    /// Contract registered under `name`.
    pub fn get_contract(&self, name: &str) -> Option<&NativeContract> {
        match self.get_by_name(name)? {
            Native::Contract(contract) => Some(contract),
            Native::Function(_) => None,
        }
    }

    /// `true` if something lives at `address`.
    pub fn is_registered(&self, address: &Address) -> bool {
        self.by_address.contains_key(address)
    }

    /// Registered natives in address order.
    pub fn iter(&self) -> impl Iterator<Item = &Native> {
        self.by_address.values()
    }

    /// Number of registered natives.
    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}

impl Dispatcher for Natives {
    fn dispatch(&self, account: &Account) -> Option<Callable> {
        self.get_by_address(&account.address).cloned().map(Callable::Native)
    }
}
