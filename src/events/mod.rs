//! # Listener Events
//!
//! Lifecycle notifications emitted by a
//! [`JobQueueListener`](crate::listener::JobQueueListener). Events are
//! delivered over a broadcast channel; emission happens synchronously inside
//! the dispatch task, so per-request event order matches status order.

pub mod publisher;

pub use publisher::EventPublisher;

use crate::jobs::{JobStatus, ProcessingRequest};
use crate::messaging::Message;

/// Lifecycle event emitted by a listener
#[derive(Debug, Clone)]
pub enum ListenerEvent {
    /// A request was processed successfully
    ProcessingCompleted {
        request: ProcessingRequest,
        result_body: Option<String>,
    },
    /// Processing of a request failed
    ProcessingFailed {
        request: ProcessingRequest,
        error: String,
    },
    /// Processing of a request exceeded the job timeout
    ProcessingTimedOut {
        request: ProcessingRequest,
        error: String,
    },
    /// A request was redirected to another queue as a new message
    RequestRedirected {
        from_queue: String,
        to_queue: String,
        new_message: Message,
    },
    /// A status report was generated
    StatusReported { status: JobStatus },
}
