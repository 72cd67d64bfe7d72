//! Log events flowing from the worker pool to the aggregator

use crate::parallel::WorkTicket;

/// What kind of output an event carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    StandardOutput,
    StandardError,
    EchoedInput,
}

impl EventKind {
    pub fn is_error(self) -> bool {
        matches!(self, EventKind::StandardError)
    }
}

/// One reportable piece of output
///
/// Every event holds a [`WorkTicket`] for its whole lifetime. The aggregator
/// drops it only after the event has been written (or discarded), which is
/// what keeps the dispatcher from returning with output still in flight.
#[derive(Debug)]
pub struct LogEvent {
    pub kind: EventKind,
    /// Command that produced the output, empty for echoed input
    pub source_command: Vec<String>,
    pub text: Vec<u8>,
    ticket: WorkTicket,
}

impl LogEvent {
    pub fn new(kind: EventKind, source_command: Vec<String>, text: Vec<u8>, ticket: WorkTicket) -> Self {
        Self {
            kind,
            source_command,
            text,
            ticket,
        }
    }

    /// Mark the event as fully handled, releasing its unit of outstanding work
    pub fn complete(self) {
        drop(self.ticket);
    }
}
