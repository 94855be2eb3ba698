//! Call parameters and the frames nested calls execute in.

use crate::account::Account;
use crate::error::{ErrorCode, Exception};
use crate::permission::{self, PermFlag};
use crate::storage::{Cache, Reader, ReaderWriter, Writer};
use crate::types::{Address, Word256};

use tracing::trace;

/// How a call relates to the frame that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CallType {
    /// Run the callee's code in the callee's context.
    #[strum(serialize = "CALL")]
    Call,
    /// Run init code for a new account.
    #[strum(serialize = "CREATE")]
    Create,
    /// Run init code for a new account at a salted address.
    #[strum(serialize = "CREATE2")]
    Create2,
    /// Run the target's code in the caller's context.
    #[strum(serialize = "CALLCODE")]
    Code,
    /// Like [`CallType::Code`], also keeping the caller and value of the current frame.
    #[strum(serialize = "DELEGATECALL")]
    Delegate,
    /// Read-only call.
    #[strum(serialize = "STATICCALL")]
    Static,
}

impl CallType {
    /// `true` for the call types moving value from caller to callee.
    pub const fn transfers_value(self) -> bool {
        matches!(self, Self::Call | Self::Code | Self::Create | Self::Create2)
    }
}

/// Parameters of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallParams {
    /// Kind of call.
    pub call_type: CallType,
    /// Account that signed the transaction.
    pub origin: Address,
    /// Immediate caller.
    pub caller: Address,
    /// Account whose context runs the code.
    pub callee: Address,
    /// Call data.
    pub input: Vec<u8>,
    /// Value transferred from caller to callee.
    pub value: u64,
}

impl CallParams {
    /// A `CALL` from `caller`, which is also the origin.
    pub fn new(caller: Address, callee: Address, input: Vec<u8>, value: u64) -> Self {
        Self {
            call_type: CallType::Call,
            origin: caller,
            caller,
            callee,
            input,
            value,
        }
    }

    /// Replace the call type.
    pub fn with_call_type(mut self, call_type: CallType) -> Self {
        self.call_type = call_type;
        self
    }

    /// Replace the origin.
    pub fn with_origin(mut self, origin: Address) -> Self {
        self.origin = origin;
        self
    }
}

/// State view of one level of the call stack.
///
/// Writes are buffered until [`CallFrame::sync`] and nested frames buffer on top of their
/// parent, so a failed call is discarded by dropping its frame.
#[derive(Debug)]
pub struct CallFrame<'a> {
    cache: Cache<'a>,
    call_stack_depth: u64,
    max_call_stack_depth: u64,
}

impl<'a> CallFrame<'a> {
    /// Top-level frame over `backend` with unlimited nesting.
    pub fn new(backend: &'a mut dyn ReaderWriter) -> Self {
        Self {
            cache: Cache::new(backend),
            call_stack_depth: 0,
            max_call_stack_depth: 0,
        }
    }

    /// Limit nesting to `max` frames below this one. Zero disables the limit.
    pub fn with_max_call_stack_depth(mut self, max: u64) -> Self {
        self.max_call_stack_depth = max;
        self
    }

    /// Child frame buffering on top of this one. Children of read-only frames are read-only.
    pub fn new_frame(&mut self) -> Result<CallFrame<'_>, Exception> {
        let max = self.max_call_stack_depth;

        if max > 0 && self.call_stack_depth >= max {
            return Err(Exception::with_context(
                ErrorCode::CallStackOverflow,
                format_args!("maximum call stack depth of {} reached", max),
            ));
        }

        let depth = self.call_stack_depth.saturating_add(1);
        let read_only = self.is_read_only();

        trace!(depth, read_only, "opening call frame");

        let cache = if read_only {
            Cache::new_read_only(self)
        } else {
            Cache::new(self)
        };

        Ok(CallFrame {
            cache,
            call_stack_depth: depth,
            max_call_stack_depth: max,
        })
    }

    /// Reject every further write. There is no way back.
    pub fn read_only(&mut self) {
        self.cache.set_read_only();
    }

    /// `true` if writes are rejected.
    pub const fn is_read_only(&self) -> bool {
        self.cache.is_read_only()
    }

    /// Number of frames above this one.
    pub const fn call_stack_depth(&self) -> u64 {
        self.call_stack_depth
    }

    /// Push buffered writes down to the parent.
    pub fn sync(&mut self) -> Result<(), Exception> {
        self.cache.sync()
    }

    /// Create an empty account at `address`.
    ///
    /// The `creator`, when given, needs [`PermFlag::CREATE_ACCOUNT`].
    pub fn create_account(
        &mut self,
        creator: Option<&Address>,
        address: &Address,
    ) -> Result<(), Exception> {
        if let Some(creator) = creator {
            permission::ensure_permission(self, creator, PermFlag::CREATE_ACCOUNT)?;
        }

        if self.get_account(address)?.is_some() {
            return Err(Exception::with_context(
                ErrorCode::DuplicateAddress,
                format_args!("account {} already exists", address),
            ));
        }

        self.update_account(Account::new(*address))
    }
}

impl Reader for CallFrame<'_> {
    fn get_account(&self, address: &Address) -> Result<Option<Account>, Exception> {
        self.cache.get_account(address)
    }

    fn get_storage(&self, address: &Address, key: &Word256) -> Result<Vec<u8>, Exception> {
        self.cache.get_storage(address, key)
    }
}

impl Writer for CallFrame<'_> {
    fn update_account(&mut self, account: Account) -> Result<(), Exception> {
        self.cache.update_account(account)
    }

    fn remove_account(&mut self, address: &Address) -> Result<(), Exception> {
        self.cache.remove_account(address)
    }

    fn set_storage(
        &mut self,
        address: &Address,
        key: Word256,
        value: Vec<u8>,
    ) -> Result<(), Exception> {
        self.cache.set_storage(address, key, value)
    }
}
