//! # Job Queue Adapter
//!
//! ## Architecture
//!
//! A [`JobQueue`] wraps one transport queue and owns the translation between
//! transport messages and typed job requests:
//!
//! ```text
//! send_job -> PayloadFormatter -> JobRequest -> RequestSerializer -> Message -> transport
//! transport received -> RequestSerializer -> ProcessingRequest -> job_received
//! ```
//!
//! On construction the adapter creates (or opens) the underlying transport
//! queue and spawns a forwarding task that converts every `received`
//! transport notification into a [`ReceivedJob`] on the adapter's own
//! `job_received` channel. A body that cannot be deserialized is forwarded
//! as [`ReceivedJob::Malformed`] so the dispatch layer can record the
//! failure against the message's identity.

use crate::error::Result;
use crate::formatters::{JsonPayloadFormatter, PayloadFormatter};
use crate::jobs::{HandlerConfiguration, JobRequest, ProcessingRequest};
use crate::messaging::memory::InMemoryMessageQueueFactory;
use crate::messaging::message::{Message, MessageFactory, UuidMessageFactory};
use crate::messaging::queue::{MessageQueue, MessageQueueFactory, QueueCreationOptions};
use crate::messaging::serializer::{JsonRequestSerializer, RequestSerializer};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

const JOB_CHANNEL_CAPACITY: usize = 256;

/// A job materialized from a received transport message
#[derive(Debug, Clone)]
pub enum ReceivedJob {
    /// The message body decoded into a processing request
    Decoded(ProcessingRequest),
    /// The message body could not be decoded; carries the message identity
    /// so the failure can still be reported against the job
    Malformed {
        job_id: String,
        name: String,
        queue_id: String,
        queue_name: String,
        error: String,
    },
}

/// Wrapper around one transport queue handling payload formatting, request
/// serialization, and creation of processing requests
pub struct JobQueue {
    queue: Arc<dyn MessageQueue>,
    message_factory: Arc<dyn MessageFactory>,
    formatter: Arc<dyn PayloadFormatter>,
    serializer: Arc<dyn RequestSerializer>,
    configuration: HandlerConfiguration,
    job_received_tx: broadcast::Sender<ReceivedJob>,
}

impl JobQueue {
    /// Create the adapter and its underlying transport queue
    pub fn new(
        queue_factory: &dyn MessageQueueFactory,
        message_factory: Arc<dyn MessageFactory>,
        formatter: Arc<dyn PayloadFormatter>,
        serializer: Arc<dyn RequestSerializer>,
        configuration: HandlerConfiguration,
        queue_prefix: Option<&str>,
    ) -> Result<Self> {
        let options = QueueCreationOptions::from_configuration(&configuration, queue_prefix);
        let queue = queue_factory.create(&options)?;
        let (job_received_tx, _) = broadcast::channel(JOB_CHANNEL_CAPACITY);

        let adapter = Self {
            queue,
            message_factory,
            formatter,
            serializer,
            configuration,
            job_received_tx,
        };
        adapter.spawn_forwarder();
        Ok(adapter)
    }

    fn spawn_forwarder(&self) {
        let mut received = self.queue.received();
        let serializer = Arc::clone(&self.serializer);
        let tx = self.job_received_tx.clone();
        let queue_id = self.configuration.queue_id.clone();
        let queue_name = self.configuration.queue_name.clone();

        tokio::spawn(async move {
            loop {
                match received.recv().await {
                    Ok(message) => {
                        let job = decode_received(&*serializer, &queue_id, &queue_name, message);
                        let _ = tx.send(job);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(
                            queue_id = %queue_id,
                            skipped,
                            "job notifications lagged behind the transport"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Unique identifier for the queue (the logical, unprefixed id)
    pub fn queue_id(&self) -> &str {
        &self.configuration.queue_id
    }

    /// Human-readable name for the queue
    pub fn queue_name(&self) -> &str {
        &self.configuration.queue_name
    }

    /// Configuration the queue was created from
    pub fn configuration(&self) -> &HandlerConfiguration {
        &self.configuration
    }

    /// Begin asynchronous receipt on the transport queue
    pub fn start_listening(&self) {
        self.queue.begin_receive();
    }

    /// Stop listening on the transport queue
    pub fn close(&self) {
        self.queue.end_receive();
    }

    /// Subscribe to jobs materialized from received messages
    pub fn job_received(&self) -> broadcast::Receiver<ReceivedJob> {
        self.job_received_tx.subscribe()
    }

    /// Send a new job to this queue, returning the transport message
    pub async fn send_job(
        &self,
        job_type: &str,
        payload: Option<&Value>,
        label: &str,
    ) -> Result<Message> {
        let request = JobRequest::new(job_type, self.formatter.write(payload)?);
        self.send_request(&request, label).await
    }

    /// Send an already-built job request, bypassing payload formatting
    ///
    /// Used by redirects to re-send a job byte-for-byte to another queue.
    pub async fn send_request(&self, request: &JobRequest, label: &str) -> Result<Message> {
        let body = self.serializer.serialize(request)?;
        let message = self
            .message_factory
            .create(body, self.serializer.encoding(), label);
        self.queue.send(message).await
    }

    /// Materialize a processing request for a specific message without
    /// removing it from the queue
    pub async fn processing_request(&self, message_id: &str) -> Result<ProcessingRequest> {
        let message = self.queue.get_message(message_id).await?;
        let job_request = self.serializer.deserialize(&message.body)?;
        Ok(self.build_request(job_request, &message))
    }

    fn build_request(&self, job_request: JobRequest, message: &Message) -> ProcessingRequest {
        ProcessingRequest {
            job_id: message.id.clone(),
            name: message.label.clone(),
            queue_id: self.configuration.queue_id.clone(),
            queue_name: self.configuration.queue_name.clone(),
            job_request,
        }
    }

    /// Remove a message (specific or next in line), triggering job receipt
    pub async fn receive_message(&self, message_id: Option<&str>) -> Result<()> {
        self.queue.receive(message_id).await
    }

    /// All messages currently on the queue
    pub async fn get_messages(&self) -> Result<Vec<Message>> {
        self.queue.get_messages().await
    }

    /// A specific message, without removing it
    pub async fn get_message(&self, message_id: &str) -> Result<Message> {
        self.queue.get_message(message_id).await
    }

    /// Delete every message on the queue
    pub async fn purge(&self) -> Result<()> {
        self.queue.purge().await
    }

    /// Remove a message without processing it
    pub async fn delete_message(&self, message_id: &str) -> Result<()> {
        self.queue.delete_message(message_id).await
    }
}

fn decode_received(
    serializer: &dyn RequestSerializer,
    queue_id: &str,
    queue_name: &str,
    message: Message,
) -> ReceivedJob {
    match serializer.deserialize(&message.body) {
        Ok(job_request) => ReceivedJob::Decoded(ProcessingRequest {
            job_id: message.id,
            name: message.label,
            queue_id: queue_id.to_string(),
            queue_name: queue_name.to_string(),
            job_request,
        }),
        Err(error) => ReceivedJob::Malformed {
            job_id: message.id,
            name: message.label,
            queue_id: queue_id.to_string(),
            queue_name: queue_name.to_string(),
            error: error.to_string(),
        },
    }
}

/// Creates job-queue adapters for handler configurations
pub trait JobQueueFactory: Send + Sync {
    /// Create the adapter (and its transport queue) for a configuration
    fn create(
        &self,
        configuration: &HandlerConfiguration,
        queue_prefix: Option<&str>,
    ) -> Result<JobQueue>;
}

/// Adapter factory composing a transport with formatting and serialization
pub struct StandardJobQueueFactory {
    queue_factory: Arc<dyn MessageQueueFactory>,
    message_factory: Arc<dyn MessageFactory>,
    formatter: Arc<dyn PayloadFormatter>,
    serializer: Arc<dyn RequestSerializer>,
}

impl StandardJobQueueFactory {
    /// Compose a factory from its collaborators
    pub fn new(
        queue_factory: Arc<dyn MessageQueueFactory>,
        message_factory: Arc<dyn MessageFactory>,
        formatter: Arc<dyn PayloadFormatter>,
        serializer: Arc<dyn RequestSerializer>,
    ) -> Self {
        Self {
            queue_factory,
            message_factory,
            formatter,
            serializer,
        }
    }

    /// In-memory transport with JSON formatting and uuid message ids
    pub fn in_memory() -> Self {
        Self::in_memory_on(Arc::new(InMemoryMessageQueueFactory::new()))
    }

    /// In-memory transport on a shared queue factory, so callers can keep a
    /// handle to the underlying queues
    pub fn in_memory_on(transport: Arc<InMemoryMessageQueueFactory>) -> Self {
        Self::new(
            transport,
            Arc::new(UuidMessageFactory::new()),
            Arc::new(JsonPayloadFormatter::new()),
            Arc::new(JsonRequestSerializer::new()),
        )
    }
}

impl JobQueueFactory for StandardJobQueueFactory {
    fn create(
        &self,
        configuration: &HandlerConfiguration,
        queue_prefix: Option<&str>,
    ) -> Result<JobQueue> {
        JobQueue::new(
            self.queue_factory.as_ref(),
            Arc::clone(&self.message_factory),
            Arc::clone(&self.formatter),
            Arc::clone(&self.serializer),
            configuration.clone(),
            queue_prefix,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapter(queue_id: &str) -> (Arc<InMemoryMessageQueueFactory>, JobQueue) {
        let transport = Arc::new(InMemoryMessageQueueFactory::new());
        let factory = StandardJobQueueFactory::in_memory_on(Arc::clone(&transport));
        let queue = factory
            .create(&HandlerConfiguration::new(queue_id, "Test Queue"), None)
            .unwrap();
        (transport, queue)
    }

    #[tokio::test]
    async fn test_send_job_serializes_the_envelope() {
        let (_transport, queue) = adapter("work");
        let payload = json!({"answer": 42});

        let message = queue
            .send_job("Compute", Some(&payload), "compute answer")
            .await
            .unwrap();

        let stored = queue.get_message(&message.id).await.unwrap();
        let request = JsonRequestSerializer::new()
            .deserialize(&stored.body)
            .unwrap();
        assert_eq!(request.job_type, "Compute");
        assert_eq!(request.payload.as_deref(), Some("{\"answer\":42}"));
    }

    #[tokio::test]
    async fn test_processing_request_binds_message_identity() {
        let (_transport, queue) = adapter("work");

        let message = queue
            .send_job("Compute", None, "compute answer")
            .await
            .unwrap();
        let request = queue.processing_request(&message.id).await.unwrap();

        assert_eq!(request.job_id, message.id);
        assert_eq!(request.name, "compute answer");
        assert_eq!(request.queue_id, "work");
        assert_eq!(request.queue_name, "Test Queue");
        assert_eq!(request.job_request.job_type, "Compute");
    }

    #[tokio::test]
    async fn test_receive_forwards_decoded_jobs() {
        let (_transport, queue) = adapter("work");
        let mut jobs = queue.job_received();

        let message = queue.send_job("Compute", None, "labelled").await.unwrap();
        queue.receive_message(Some(&message.id)).await.unwrap();

        match jobs.recv().await.unwrap() {
            ReceivedJob::Decoded(request) => {
                assert_eq!(request.job_id, message.id);
                assert_eq!(request.job_request.job_type, "Compute");
            }
            other => panic!("expected a decoded job, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_forwarded_with_identity() {
        let (transport, queue) = adapter("work");
        let mut jobs = queue.job_received();

        let raw = transport.queue("work").unwrap();
        let sent = raw
            .send(Message {
                id: String::new(),
                label: "broken".to_string(),
                body: b"not a request".to_vec(),
            })
            .await
            .unwrap();
        queue.receive_message(None).await.unwrap();

        match jobs.recv().await.unwrap() {
            ReceivedJob::Malformed {
                job_id,
                name,
                queue_id,
                error,
                ..
            } => {
                assert_eq!(job_id, sent.id);
                assert_eq!(name, "broken");
                assert_eq!(queue_id, "work");
                assert!(error.contains("deserialization"));
            }
            other => panic!("expected a malformed job, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_queue_prefix_namespaces_the_transport() {
        let transport = Arc::new(InMemoryMessageQueueFactory::new());
        let factory = StandardJobQueueFactory::in_memory_on(Arc::clone(&transport));

        let queue = factory
            .create(
                &HandlerConfiguration::new("work", "Work"),
                Some("staging."),
            )
            .unwrap();

        assert!(transport.exists("staging.work"));
        assert!(!transport.exists("work"));
        // routing still sees the logical id
        assert_eq!(queue.queue_id(), "work");
    }
}
