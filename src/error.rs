//! Error codes, exceptions and the first-error-wins sink used by the interpreter.

use crate::abi;
use crate::permission::PermFlag;
use crate::types::Address;

use thiserror::Error;

use std::fmt;

/// Classified failure of an engine operation.
///
/// The numeric values are stable and may be reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum ErrorCode {
    /// Unclassified failure.
    #[error("generic error")]
    Generic = 1,
    /// The account is required to exist.
    #[error("unknown address")]
    UnknownAddress = 2,
    /// The account balance can't cover a transfer.
    #[error("insufficient balance")]
    InsufficientBalance = 3,
    /// Jump target is not a `JUMPDEST` outside push data.
    #[error("invalid jump dest")]
    InvalidJumpDest = 4,
    /// The gas counter can't cover a charge.
    #[error("insufficient gas")]
    InsufficientGas = 5,
    /// Memory access beyond the maximum capacity.
    #[error("memory out of bounds")]
    MemoryOutOfBounds = 6,
    /// Code access beyond the code length.
    #[error("code out of bounds")]
    CodeOutOfBounds = 7,
    /// Input access beyond the input length.
    #[error("input out of bounds")]
    InputOutOfBounds = 8,
    /// Return data access beyond the return data length.
    #[error("return data out of bounds")]
    ReturnDataOutOfBounds = 9,
    /// Nested calls exceeded the maximum depth.
    #[error("call stack overflow")]
    CallStackOverflow = 10,
    /// Push beyond the data stack maximum depth.
    #[error("data stack overflow")]
    DataStackOverflow = 12,
    /// Pop, dup or swap on too few stack items.
    #[error("data stack underflow")]
    DataStackUnderflow = 13,
    /// Native contracts have no code to copy.
    #[error("tried to copy native contract code")]
    NativeContractCodeCopy = 15,
    /// `INVALID` or an unassigned opcode.
    #[error("execution aborted")]
    ExecutionAborted = 16,
    /// `REVERT`, carrying the returned data.
    #[error("execution reverted")]
    ExecutionReverted = 17,
    /// The acting account lacks a permission.
    #[error("permission denied")]
    PermissionDenied = 18,
    /// A native function failed.
    #[error("native function error")]
    NativeFunction = 19,
    /// The event sink rejected an event.
    #[error("event publish error")]
    EventPublish = 20,
    /// An account already exists at the address.
    #[error("duplicate address")]
    DuplicateAddress = 24,
    /// The address belongs to a native contract.
    #[error("address is reserved for SNative or internal use")]
    ReservedAddress = 29,
    /// Mutation attempted from a read-only frame.
    #[error("callee attempted to illegally modify state")]
    IllegalWrite = 30,
    /// A value did not fit its target width.
    #[error("integer overflow")]
    IntegerOverflow = 31,
    /// `BLOCKHASH` of the current or a future block.
    #[error("invalid block number")]
    InvalidBlockNumber = 36,
    /// `BLOCKHASH` beyond the lookback window.
    #[error("block number out of range")]
    BlockNumberOutOfRange = 37,
    /// The account can't hold the code being installed.
    #[error("contract being created with unexpected code")]
    InvalidContractCode = 40,
    /// The account does not exist.
    #[error("account does not exist")]
    NonExistentAccount = 41,
    /// No dispatcher can run the account.
    #[error("account is not callable")]
    NotCallable = 42,
}

impl ErrorCode {
    /// Stable numeric value of the code.
    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}

/// A coded failure with a human readable message.
///
/// Reverts additionally keep the bytes returned by the reverting frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Exception {
    code: ErrorCode,
    message: String,
    output: Vec<u8>,
}

impl Exception {
    /// Exception with a custom message.
    pub fn new<M>(code: ErrorCode, message: M) -> Self
    where
        M: Into<String>,
    {
        Self {
            code,
            message: message.into(),
            output: Vec::new(),
        }
    }

    /// Exception prefixing `message` with the description of `code`.
    pub fn with_context<M>(code: ErrorCode, message: M) -> Self
    where
        M: fmt::Display,
    {
        Self::new(code, format!("{}: {}", code, message))
    }

    /// `REVERT` outcome. The reason is ABI decoded from `output` when possible.
    pub fn revert(output: Vec<u8>) -> Self {
        let message = match abi::unpack_revert_reason(&output) {
            Some(reason) => format!("{} with reason '{}'", ErrorCode::ExecutionReverted, reason),
            None => ErrorCode::ExecutionReverted.to_string(),
        };

        Self {
            code: ErrorCode::ExecutionReverted,
            message,
            output,
        }
    }

    /// `address` lacks `perm`.
    pub fn permission_denied(address: &Address, perm: PermFlag) -> Self {
        Self::with_context(
            ErrorCode::PermissionDenied,
            format_args!("account {} does not have permission {:?}", address, perm),
        )
    }

    /// Classification of the failure.
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human readable description.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Bytes returned along with a revert. Empty for every other code.
    pub fn output(&self) -> &[u8] {
        self.output.as_slice()
    }

    /// Decoded `Error(string)` reason of a revert.
    pub fn revert_reason(&self) -> Option<String> {
        (self.code == ErrorCode::ExecutionReverted)
            .then(|| abi::unpack_revert_reason(&self.output))
            .flatten()
    }

    /// `true` if this is a revert.
    pub fn is_revert(&self) -> bool {
        self.code == ErrorCode::ExecutionReverted
    }
}

impl From<ErrorCode> for Exception {
    fn from(code: ErrorCode) -> Self {
        Self::new(code, code.to_string())
    }
}

/// Failure of a call nested below the top-level call, with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "error in nested call at depth {stack_depth}: {caller} (caller) -> {callee} (callee): \
     {error}"
)]
pub struct NestedCallError {
    /// Failure reported by the nested call.
    pub error: Exception,
    /// Account making the call.
    pub caller: Address,
    /// Account being called.
    pub callee: Address,
    /// Depth of the failing frame; the top-level frame is zero.
    pub stack_depth: u64,
}

/// Error of a top-level execution together with every nested call failure, deepest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallError {
    exception: Exception,
    nested_errors: Vec<NestedCallError>,
}

impl CallError {
    /// Aggregate `exception` with the nested failures observed during the call.
    pub fn new(exception: Exception, nested_errors: Vec<NestedCallError>) -> Self {
        Self {
            exception,
            nested_errors,
        }
    }

    /// The error that determined the outcome.
    pub const fn exception(&self) -> &Exception {
        &self.exception
    }

    /// Classification of the outcome.
    pub const fn code(&self) -> ErrorCode {
        self.exception.code()
    }

    /// Nested failures in the order they completed.
    pub fn nested_errors(&self) -> &[NestedCallError] {
        self.nested_errors.as_slice()
    }

    /// Bytes returned by a reverting top-level frame.
    pub fn output(&self) -> &[u8] {
        self.exception.output()
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.exception)?;

        if !self.nested_errors.is_empty() {
            write!(f, "\nnested call errors:")?;
            self.nested_errors.iter().try_for_each(|e| write!(f, "\n{}", e))?;
        }

        Ok(())
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.exception)
    }
}

impl From<Exception> for CallError {
    fn from(exception: Exception) -> Self {
        Self::new(exception, Vec::new())
    }
}

/// Records the first error of a multi-step operation.
///
/// Later errors are dropped but still reported as failures, so bookkeeping can finish before
/// the next check point observes the error.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Maybe {
    error: Option<Exception>,
}

impl Maybe {
    /// Record `error` unless an earlier error is already held. Always returns `true`.
    pub fn push_error<E>(&mut self, error: E) -> bool
    where
        E: Into<Exception>,
    {
        if self.error.is_none() {
            self.error.replace(error.into());
        }

        true
    }

    /// Record the error of `result`, if any. Returns `true` when `result` is an error.
    pub fn push<E>(&mut self, result: Result<(), E>) -> bool
    where
        E: Into<Exception>,
    {
        match result {
            Ok(()) => false,
            Err(e) => self.push_error(e),
        }
    }

    /// Value of `result`, or its default after recording the error.
    pub fn value<T, E>(&mut self, result: Result<T, E>) -> T
    where
        T: Default,
        E: Into<Exception>,
    {
        result.unwrap_or_else(|e| {
            self.push_error(e);
            T::default()
        })
    }

    /// The first recorded error.
    pub const fn error(&self) -> Option<&Exception> {
        self.error.as_ref()
    }

    /// `true` once an error is recorded.
    pub const fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Remove and return the recorded error.
    pub fn take(&mut self) -> Option<Exception> {
        self.error.take()
    }

    /// `value` if no error is recorded, else the first error.
    pub fn into_result<T>(self, value: T) -> Result<T, Exception> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(value),
        }
    }
}
