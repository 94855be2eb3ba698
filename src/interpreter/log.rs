use super::internal::Machine;

use crate::error::{ErrorCode, Exception};
use crate::event::LogEvent;

use evm_asm::Opcode;
use tracing::trace;

impl Machine<'_, '_> {
    /// `LOG0` to `LOG4`.
    pub(crate) fn log(&mut self, op: Opcode) {
        let (offset, size) = (self.pop(), self.pop());
        let topics = (0..op.log_topics().unwrap_or(0)).map(|_| self.pop_word()).collect::<Vec<_>>();
        let data = self.read_memory(offset, size);

        if self.maybe.has_error() {
            return;
        }

        let event = LogEvent {
            address: self.params.callee,
            topics,
            data,
        };

        trace!(address = %event.address, topics = event.topics.len(), "log");

        let published = self
            .st
            .event_sink
            .log(event)
            .map_err(|e| match e.code() {
                ErrorCode::IllegalWrite => e,
                _ => Exception::with_context(ErrorCode::EventPublish, e),
            });

        self.maybe.push(published);
    }
}
