//! Events produced by execution and the sinks receiving them.

use crate::call::CallType;
use crate::error::{ErrorCode, Exception, NestedCallError};
use crate::types::{Address, Word256};

use tracing::debug;

/// A completed call, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallEvent {
    /// Kind of call.
    pub call_type: CallType,
    /// Outermost caller.
    pub origin: Address,
    /// Immediate caller.
    pub caller: Address,
    /// Account whose context ran.
    pub callee: Address,
    /// Call input.
    pub input: Vec<u8>,
    /// Value transferred.
    pub value: u64,
    /// Gas left when the call completed.
    pub gas: u64,
    /// Depth of the frame that ran; the top-level frame is zero.
    pub stack_depth: u64,
    /// Output, or the revert data of a reverted call.
    pub return_data: Vec<u8>,
    /// Failure of the call, if any.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub exception: Option<Exception>,
}

/// Output of a `LOGn` instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogEvent {
    /// Account emitting the log.
    pub address: Address,
    /// Topics in instruction order.
    pub topics: Vec<Word256>,
    /// Log payload.
    pub data: Vec<u8>,
}

/// Any event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// See [`CallEvent`].
    Call(CallEvent),
    /// See [`LogEvent`].
    Log(LogEvent),
}

/// Receiver of execution events.
pub trait EventSink {
    /// A call completed.
    fn call(&mut self, event: CallEvent) -> Result<(), Exception>;

    /// A log was emitted.
    fn log(&mut self, event: LogEvent) -> Result<(), Exception>;
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn call(&mut self, _event: CallEvent) -> Result<(), Exception> {
        Ok(())
    }

    fn log(&mut self, _event: LogEvent) -> Result<(), Exception> {
        Ok(())
    }
}

/// Sink of read-only frames: forwards calls and rejects logs with `IllegalWrite`.
pub struct LogFreeEventSink<'a> {
    inner: &'a mut dyn EventSink,
}

impl<'a> LogFreeEventSink<'a> {
    /// Wrap `inner`.
    pub fn new(inner: &'a mut dyn EventSink) -> Self {
        Self { inner }
    }
}

impl EventSink for LogFreeEventSink<'_> {
    fn call(&mut self, event: CallEvent) -> Result<(), Exception> {
        self.inner.call(event)
    }

    fn log(&mut self, event: LogEvent) -> Result<(), Exception> {
        Err(Exception::with_context(
            ErrorCode::IllegalWrite,
            format_args!("log emitted by {} from a read-only frame", event.address),
        ))
    }
}

/// Stores every event in order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectingEventSink {
    events: Vec<Event>,
}

impl CollectingEventSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event received so far.
    pub fn events(&self) -> &[Event] {
        self.events.as_slice()
    }

    /// Call events in completion order.
    pub fn calls(&self) -> impl Iterator<Item = &CallEvent> {
        self.events.iter().filter_map(|e| match e {
            Event::Call(call) => Some(call),
            _ => None,
        })
    }

    /// Log events in emission order.
    pub fn logs(&self) -> impl Iterator<Item = &LogEvent> {
        self.events.iter().filter_map(|e| match e {
            Event::Log(log) => Some(log),
            _ => None,
        })
    }
}

impl EventSink for CollectingEventSink {
    fn call(&mut self, event: CallEvent) -> Result<(), Exception> {
        self.events.push(Event::Call(event));
        Ok(())
    }

    fn log(&mut self, event: LogEvent) -> Result<(), Exception> {
        self.events.push(Event::Log(event));
        Ok(())
    }
}

/// Records the failures of nested calls while forwarding every event.
///
/// Calls complete innermost first, so the failures accumulate deepest first.
pub(crate) struct NestedErrorCollector<'a> {
    inner: &'a mut dyn EventSink,
    nested: Vec<NestedCallError>,
}

impl<'a> NestedErrorCollector<'a> {
    pub(crate) fn new(inner: &'a mut dyn EventSink) -> Self {
        Self {
            inner,
            nested: Vec::new(),
        }
    }

    pub(crate) fn into_nested_errors(self) -> Vec<NestedCallError> {
        self.nested
    }
}

impl EventSink for NestedErrorCollector<'_> {
    fn call(&mut self, event: CallEvent) -> Result<(), Exception> {
        if let Some(error) = event.exception.as_ref().filter(|_| event.stack_depth > 0) {
            debug!(
                depth = event.stack_depth,
                caller = %event.caller,
                callee = %event.callee,
                %error,
                "nested call failed"
            );

            self.nested.push(NestedCallError {
                error: error.clone(),
                caller: event.caller,
                callee: event.callee,
                stack_depth: event.stack_depth,
            });
        }

        self.inner.call(event)
    }

    fn log(&mut self, event: LogEvent) -> Result<(), Exception> {
        self.inner.log(event)
    }
}
