//! Call protocol shared by every kind of callable.

use crate::call::{CallParams, CallType};
use crate::context::State;
use crate::dispatch::{Call, Dispatcher};
use crate::error::{ErrorCode, Exception};
use crate::event::{CallEvent, EventSink, LogFreeEventSink};
use crate::gas::{self, GAS_CREATE_ACCOUNT, GAS_GET_ACCOUNT};
use crate::permission::{self, PermFlag};
use crate::storage::{Reader, Writer};
use crate::types::Address;

use tracing::debug;

/// Move `amount` from `from` to `to`. Both accounts must exist.
pub fn transfer<S>(st: &mut S, from: &Address, to: &Address, amount: u64) -> Result<(), Exception>
where
    S: Reader + Writer + ?Sized,
{
    if amount == 0 {
        return Ok(());
    }

    let unknown = |address: &Address| {
        Exception::with_context(
            ErrorCode::UnknownAddress,
            format_args!(
                "cannot transfer {} between {} and {}: {} does not exist",
                amount,
                from,
                to,
                address,
            ),
        )
    };

    let mut sender = st.get_account(from)?.ok_or_else(|| unknown(from))?;
    sender.subtract_from_balance(amount)?;
    st.update_account(sender)?;

    let mut receiver = st.get_account(to)?.ok_or_else(|| unknown(to))?;
    receiver.add_to_balance(amount)?;
    st.update_account(receiver)
}

/// Run `execute` under the call protocol.
///
/// Value moves first for the transferring call types, and the code is skipped when it can't.
/// A call event reporting the outcome is emitted whatever it is. The first error wins.
pub fn call<F>(
    st: &mut State<'_>,
    params: &CallParams,
    gas: &mut u64,
    execute: F,
) -> Result<Vec<u8>, Exception>
where
    F: FnOnce(&mut State<'_>, &CallParams, &mut u64) -> Result<Vec<u8>, Exception>,
{
    let transferred = if params.call_type.transfers_value() {
        transfer(&mut st.call_frame, &params.caller, &params.callee, params.value)
    } else {
        Ok(())
    };

    let result = transferred.and_then(|()| execute(st, params, gas));

    let event = match &result {
        Ok(output) => call_event(st, params, *gas, output.clone(), None),
        Err(e) => call_event(st, params, *gas, e.output().to_vec(), Some(e.clone())),
    };

    let published = st.event_sink.call(event);

    match (result, published) {
        (Err(e), _) => Err(e),
        (Ok(_), Err(e)) => Err(Exception::with_context(ErrorCode::EventPublish, e)),
        (Ok(output), Ok(())) => Ok(output),
    }
}

fn call_event(
    st: &State<'_>,
    params: &CallParams,
    gas: u64,
    return_data: Vec<u8>,
    exception: Option<Exception>,
) -> CallEvent {
    CallEvent {
        call_type: params.call_type,
        origin: params.origin,
        caller: params.caller,
        callee: params.callee,
        input: params.input.clone(),
        value: params.value,
        gas,
        stack_depth: st.call_frame.call_stack_depth(),
        return_data,
        exception,
    }
}

/// Gas a frame holding `available` may hand to a sub-call asking for `requested`.
///
/// A sixty-fourth of the available gas always stays with the caller.
pub const fn forwarded_gas(requested: u64, available: u64) -> u64 {
    let cap = available.saturating_sub(available / 64);

    if requested < cap {
        requested
    } else {
        cap
    }
}

/// Call `target` from the frame described by `site`.
///
/// `target` carries the call type, the account addressed, the input and the value. The caller
/// and callee actually used follow the call type: `CALLCODE` and `DELEGATECALL` run the
/// target's code as `site.callee`, and `DELEGATECALL` also keeps the caller and value of
/// `site`. The sub-call's effects are kept only if it succeeds; the gas it didn't use returns
/// to `gas`.
pub fn call_from_site(
    st: &mut State<'_>,
    dispatcher: &dyn Dispatcher,
    site: &CallParams,
    target: &CallParams,
    requested_gas: u64,
    gas: &mut u64,
) -> Result<Vec<u8>, Exception> {
    permission::ensure_permission(&st.call_frame, &site.callee, PermFlag::CALL)?;
    gas::use_gas(gas, GAS_GET_ACCOUNT)?;

    let account = st.call_frame.get_account(&target.callee)?;

    if account.is_none() {
        if target.call_type != CallType::Call {
            return Err(Exception::with_context(
                ErrorCode::UnknownAddress,
                format_args!("cannot {} to missing account {}", target.call_type, target.callee),
            ));
        }

        if target.value == 0 {
            debug!(callee = %target.callee, "zero value call to missing account");
            return Ok(Vec::new());
        }
    }

    let call_frame = st.call_frame.new_frame()?;
    let mut child_gas = forwarded_gas(requested_gas, *gas);
    *gas = gas.saturating_sub(child_gas);

    let mut log_free;
    let event_sink: &mut dyn EventSink = if target.call_type == CallType::Static {
        log_free = LogFreeEventSink::new(&mut *st.event_sink);
        &mut log_free
    } else {
        &mut *st.event_sink
    };

    let mut child = State::new(call_frame, st.blockchain, event_sink);

    let result = run_at_site(
        &mut child,
        dispatcher,
        site,
        target,
        account.is_some(),
        &mut child_gas,
    )
    .and_then(|output| child.call_frame.sync().map(|()| output));

    *gas = gas.saturating_add(child_gas);

    result
}

fn run_at_site(
    child: &mut State<'_>,
    dispatcher: &dyn Dispatcher,
    site: &CallParams,
    target: &CallParams,
    exists: bool,
    gas: &mut u64,
) -> Result<Vec<u8>, Exception> {
    if !exists {
        gas::use_gas(gas, GAS_CREATE_ACCOUNT)?;
        child.call_frame.create_account(Some(&site.callee), &target.callee)?;
    }

    let account = child.call_frame.get_account(&target.callee)?.ok_or_else(|| {
        Exception::with_context(
            ErrorCode::UnknownAddress,
            format_args!("account {} vanished", target.callee),
        )
    })?;

    let mut params = CallParams {
        call_type: target.call_type,
        origin: site.origin,
        caller: site.callee,
        callee: target.callee,
        input: target.input.clone(),
        value: target.value,
    };

    match target.call_type {
        CallType::Static => {
            child.call_frame.read_only();
            params.value = 0;
        }
        CallType::Code => params.callee = site.callee,
        CallType::Delegate => {
            params.caller = site.caller;
            params.callee = site.callee;
            params.value = site.value;
        }
        _ => {}
    }

    let callable = dispatcher.dispatch(&account).ok_or_else(|| {
        Exception::with_context(
            ErrorCode::NotCallable,
            format_args!("no dispatcher can run {}", account.address),
        )
    })?;

    debug!(
        call_type = %params.call_type,
        caller = %params.caller,
        callee = %params.callee,
        depth = child.call_frame.call_stack_depth(),
        gas = *gas,
        "dispatching call"
    );

    callable.call(child, &params, gas)
}
