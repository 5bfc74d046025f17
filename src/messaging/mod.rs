//! # Messaging
//!
//! Transport abstractions and the per-queue job adapter. The transport side
//! (message queues, message factories) is consumed through traits so any
//! backend can sit underneath; an in-memory backend is bundled for tests,
//! demos, and single-process deployments.

pub mod job_queue;
pub mod memory;
pub mod message;
pub mod queue;
pub mod serializer;

pub use job_queue::{JobQueue, JobQueueFactory, ReceivedJob, StandardJobQueueFactory};
pub use memory::{InMemoryMessageQueue, InMemoryMessageQueueFactory};
pub use message::{Message, MessageFactory, UuidMessageFactory};
pub use queue::{MessageQueue, MessageQueueFactory, QueueCreationOptions};
pub use serializer::{JsonRequestSerializer, RequestSerializer};
