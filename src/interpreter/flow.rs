use super::internal::Machine;
use super::{Code, Resolver};

use crate::account::Account;
use crate::call::{CallParams, CallType};
use crate::context::State;
use crate::crypto;
use crate::engine;
use crate::error::{ErrorCode, Exception};
use crate::gas::{self, GAS_CREATE_ACCOUNT, GAS_GET_ACCOUNT};
use crate::permission::{self, PermFlag};
use crate::storage::{Reader, Writer};
use crate::types::{Address, U256};

use evm_asm::Opcode;
use tracing::debug;

/// Outcome of a `CREATE` attempt that got as far as running init code.
enum Created {
    Deployed(Address),
    Failed(Vec<u8>),
}

impl Machine<'_, '_> {
    /// Move to `to` if it is a valid jump destination.
    pub(crate) fn jump(&mut self, to: u64) {
        if self.code.is_jump_dest(to) {
            self.pc = to;
        } else {
            self.maybe.push_error(Exception::with_context(
                ErrorCode::InvalidJumpDest,
                format_args!("{} is not a JUMPDEST", to),
            ));
        }
    }

    /// `CALL`, `CALLCODE`, `DELEGATECALL` and `STATICCALL`.
    ///
    /// The sub-call's failure only shows up as a zero flag.
    pub(crate) fn call(&mut self, op: Opcode) {
        self.return_data.clear();

        let gas_limit = self.pop_u64_saturating();
        let target = self.pop_address();

        let (call_type, value) = match op {
            Opcode::CALLCODE => (CallType::Code, self.pop_u64()),
            Opcode::DELEGATECALL => (CallType::Delegate, self.params.value),
            Opcode::STATICCALL => (CallType::Static, 0),
            _ => (CallType::Call, self.pop_u64()),
        };

        let (in_offset, in_size) = (self.pop(), self.pop());
        let (out_offset, out_size) = (self.pop(), self.pop_u64());
        let input = self.read_memory(in_offset, in_size);

        if self.maybe.has_error() {
            return;
        }

        let target = CallParams {
            call_type,
            origin: self.params.origin,
            caller: self.params.callee,
            callee: target,
            input,
            value,
        };

        let resolver = Resolver(self.evm);
        let result = engine::call_from_site(
            self.st,
            &resolver,
            self.params,
            &target,
            gas_limit,
            self.gas,
        );

        let output = match result {
            Ok(output) => {
                self.push_bool(true);
                self.write_output(out_offset, out_size, &output);
                output
            }
            Err(e) => {
                debug!(
                    depth = self.st.call_frame.call_stack_depth(),
                    callee = %target.callee,
                    error = %e,
                    "sub-call failed"
                );

                self.push_bool(false);

                if e.is_revert() {
                    self.write_output(out_offset, out_size, e.output());
                }

                e.output().to_vec()
            }
        };

        self.return_data = output;
    }

    /// Write `output` at `offset` as exactly `size` bytes, truncated or zero padded.
    fn write_output(&mut self, offset: U256, size: u64, output: &[u8]) {
        self.copy_to_memory(offset, output, 0, size, ErrorCode::ReturnDataOutOfBounds);
    }

    /// `CREATE` and `CREATE2`.
    ///
    /// The creating frame fails if it may not create the account. A failure of the init code
    /// only shows up as a zero address.
    pub(crate) fn create(&mut self, op: Opcode) {
        self.return_data.clear();

        let value = self.pop_u64();
        let (offset, size) = (self.pop(), self.pop());
        let salt = (op == Opcode::CREATE2).then(|| self.pop_word());
        let init_code = self.read_memory(offset, size);

        if self.use_gas(GAS_CREATE_ACCOUNT) || self.maybe.has_error() {
            return;
        }

        let creator = self.params.callee;
        let (call_type, address) = match salt {
            Some(salt) => (
                CallType::Create2,
                crypto::new_contract_address2(&creator, &salt, &init_code),
            ),
            None => (CallType::Create, self.evm.next_contract_address(&creator)),
        };

        match self.deploy(call_type, address, value, init_code) {
            Ok(Created::Deployed(address)) => self.push_address(&address),
            Ok(Created::Failed(output)) => {
                self.push(U256::zero());
                self.return_data = output;
            }
            Err(e) => {
                self.maybe.push_error(e);
            }
        }
    }

    fn deploy(
        &mut self,
        call_type: CallType,
        address: Address,
        value: u64,
        init_code: Vec<u8>,
    ) -> Result<Created, Exception> {
        let creator = self.params.callee;

        if self.st.call_frame.is_read_only() {
            return Err(Exception::with_context(
                ErrorCode::IllegalWrite,
                format_args!("{} from a read-only frame", call_type),
            ));
        }

        permission::ensure_permission(&self.st.call_frame, &creator, PermFlag::CREATE_CONTRACT)?;

        if self.evm.options().natives.is_registered(&address) {
            return Err(Exception::with_context(
                ErrorCode::ReservedAddress,
                format_args!("cannot create a contract at native address {}", address),
            ));
        }

        let evm = self.evm;
        let mut frame = self.st.call_frame.new_frame()?;
        frame.create_account(None, &address)?;

        let mut child = State::new(frame, self.st.blockchain, &mut *self.st.event_sink);
        let params = CallParams {
            call_type,
            origin: self.params.origin,
            caller: creator,
            callee: address,
            input: Vec::new(),
            value,
        };
        let code = Code::new(init_code);

        debug!(%call_type, %creator, %address, "running init code");

        let run = |st: &mut State<'_>, params: &CallParams, gas: &mut u64| {
            evm.run(&code, st, params, gas)
        };

        match engine::call(&mut child, &params, self.gas, run) {
            Ok(output) => {
                let mut account = child
                    .call_frame
                    .get_account(&address)?
                    .ok_or_else(|| Exception::with_context(ErrorCode::UnknownAddress, address))?;

                account.init_evm_code(output)?;
                child.call_frame.update_account(account)?;
                child.call_frame.sync()?;

                Ok(Created::Deployed(address))
            }
            Err(e) => Ok(Created::Failed(e.output().to_vec())),
        }
    }

    /// `SELFDESTRUCT`: hand the whole balance to `receiver` and remove the running account.
    pub(crate) fn self_destruct(&mut self, receiver: Address) -> Result<(), Exception> {
        let callee = self.params.callee;
        let frame = &mut self.st.call_frame;

        gas::use_gas(self.gas, GAS_GET_ACCOUNT)?;

        let mut receiving = match frame.get_account(&receiver)? {
            Some(account) => account,
            None => {
                gas::use_gas(self.gas, GAS_CREATE_ACCOUNT)?;
                frame.create_account(Some(&callee), &receiver)?;
                Account::new(receiver)
            }
        };

        let balance = frame
            .get_account(&callee)?
            .map(|account| account.balance)
            .ok_or_else(|| Exception::with_context(ErrorCode::UnknownAddress, callee))?;

        if receiver != callee {
            receiving.add_to_balance(balance)?;
            frame.update_account(receiving)?;
        }

        frame.remove_account(&callee)?;

        debug!(%callee, %receiver, balance, "self destructed");

        Ok(())
    }
}
