use super::Function;

use crate::call::CallParams;
use crate::context::State;
use crate::crypto;
use crate::dispatch::Call;
use crate::engine;
use crate::error::{ErrorCode, Exception};
use crate::types::Address;

use tracing::trace;

use std::collections::BTreeMap;

const SELECTOR_LEN: usize = 4;

/// Native functions behind a single address, picked by the ABI selector heading the input.
///
/// The contract lives at `keccak256(name)[12..]`. Each member is named by its signature
/// and checks its own permission flag.
#[derive(Debug, Clone)]
pub struct NativeContract {
    name: String,
    comment: String,
    address: Address,
    functions: BTreeMap<[u8; SELECTOR_LEN], Function>,
}

impl NativeContract {
    /// Contract `name` exposing `functions`. Two members with the same selector fail with
    /// `NativeFunction`.
    pub fn new(name: &str, comment: &str, functions: Vec<Function>) -> Result<Self, Exception> {
        let address = Self::address_of(name);
        let mut by_selector = BTreeMap::new();

        for mut function in functions {
            function.address = address;

            let selector = function.selector();
            if let Some(previous) = by_selector.insert(selector, function) {
                return Err(Exception::with_context(
                    ErrorCode::NativeFunction,
                    format_args!(
                        "{} of native contract {} clashes on selector {:#010x}",
                        previous.name(),
                        name,
                        u32::from_be_bytes(selector)
                    ),
                ));
            }
        }

        Ok(Self {
            name: name.to_owned(),
            comment: comment.to_owned(),
            address,
            functions: by_selector,
        })
    }

    /// Address of the contract named `name`.
    pub fn address_of(name: &str) -> Address {
        Address::left_pad(crypto::keccak256(name.as_bytes()).as_ref())
    }

    /// Registered name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// What the contract does.
    pub fn comment(&self) -> &str {
        self.comment.as_str()
    }

    /// Address the contract lives at.
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// Member with the signature `signature`.
    pub fn function(&self, signature: &str) -> Option<&Function> {
        self.functions.values().find(|f| f.name() == signature)
    }

    /// Members in selector order.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }

    fn execute(
        &self,
        st: &mut State<'_>,
        params: &CallParams,
        gas: &mut u64,
    ) -> Result<Vec<u8>, Exception> {
        if params.input.len() < SELECTOR_LEN {
            return Err(Exception::with_context(
                ErrorCode::NativeFunction,
                format_args!(
                    "native contract {} needs a {} byte selector, got {} bytes",
                    self.name,
                    SELECTOR_LEN,
                    params.input.len()
                ),
            ));
        }

        let (head, args) = params.input.split_at(SELECTOR_LEN);
        let mut selector = [0u8; SELECTOR_LEN];
        selector.copy_from_slice(head);

        let function = self.functions.get(&selector).ok_or_else(|| {
            Exception::with_context(
                ErrorCode::NativeFunction,
                format_args!(
                    "native contract {} has no function with selector {:#010x}",
                    self.name,
                    u32::from_be_bytes(selector)
                ),
            )
        })?;

        trace!(contract = %self.name, function = %function.name(), "dispatching native call");

        let params = CallParams {
            input: args.to_vec(),
            ..params.clone()
        };

        function.execute(st, &params, gas)
    }
}

impl Call for NativeContract {
    fn call(
        &self,
        st: &mut State<'_>,
        params: &CallParams,
        gas: &mut u64,
    ) -> Result<Vec<u8>, Exception> {
        engine::call(st, params, gas, |st, params, gas| self.execute(st, params, gas))
    }
}
