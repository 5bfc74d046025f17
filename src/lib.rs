//! # dispatchq
//!
//! Queue-agnostic job dispatch: typed handlers, lifecycle status reporting,
//! and outcome-based redirects over pluggable message queues.
//!
//! ## Overview
//!
//! A [`JobQueueListener`] owns a set of named queues, each bound to exactly
//! one [`JobHandler`]. Jobs deposited on a queue are materialized into
//! processing requests, routed to the handler that owns the queue, and run
//! under a timeout/cancellation contract. Every lifecycle transition is
//! recorded as an immutable [`JobStatus`](jobs::JobStatus) and broadcast to
//! registered status sinks and event subscribers; a per-queue
//! [`RedirectStrategy`](jobs::RedirectStrategy) can re-route a job to
//! another queue based on its outcome.
//!
//! The transport underneath each queue is abstract: any backend that can
//! store messages and notify on removal plugs in through the
//! [`MessageQueue`](messaging::MessageQueue) traits. An in-memory backend is
//! bundled for tests and single-process deployments.
//!
//! ## Module Organization
//!
//! - [`listener`] - The top-level orchestrator and its dispatch routine
//! - [`jobs`] - Requests, handlers, statuses, redirect strategies, locators
//! - [`messaging`] - Transport traits, the per-queue adapter, the in-memory backend
//! - [`registry`] - Handler registry combining direct handlers and locators
//! - [`formatters`] - Payload formatting (JSON bundled)
//! - [`events`] - Lifecycle event broadcasting
//! - [`status`] - Status sink trait and bundled sinks
//! - [`config`] - Listener configuration
//! - [`error`] - Structured error handling
//!
//! ## Guarantees
//!
//! Per-request status transitions are strictly ordered; nothing is ordered
//! across requests. Exactly one queue exists per queue id for the lifetime
//! of a listener. Job execution is at-least-once at best - delivery
//! semantics belong to the transport.

pub mod config;
pub mod error;
pub mod events;
pub mod formatters;
pub mod jobs;
pub mod listener;
pub mod logging;
pub mod messaging;
pub mod registry;
pub mod status;

pub use config::ListenerConfig;
pub use error::{DispatchError, Result};
pub use events::{EventPublisher, ListenerEvent};
pub use formatters::{JsonPayloadFormatter, PayloadFormatter};
pub use jobs::{
    HandlerConfiguration, HandlerLocator, JobHandler, JobRequest, JobStatus, ProcessingError,
    ProcessingRequest, RedirectStrategy, StatusKind,
};
pub use listener::JobQueueListener;
pub use messaging::{
    InMemoryMessageQueue, InMemoryMessageQueueFactory, JobQueue, JobQueueFactory,
    JsonRequestSerializer, Message, MessageFactory, MessageQueue, MessageQueueFactory,
    QueueCreationOptions, ReceivedJob, RequestSerializer, StandardJobQueueFactory,
    UuidMessageFactory,
};
pub use registry::HandlerRegistry;
pub use status::{MemoryStatusSink, StatusSink, TracingStatusSink};
