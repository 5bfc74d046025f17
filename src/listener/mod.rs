//! # Job Queue Listener
//!
//! ## Architecture
//!
//! The [`JobQueueListener`] is the top-level orchestrator: it owns one
//! [`JobQueue`] adapter per handler configuration, the handler registry,
//! the per-queue redirect strategies, and the status sinks. Registering a
//! handler creates the adapter for its queue (exactly one per queue id for
//! the lifetime of the listener) and wires the adapter's job-received
//! channel into the dispatch routine.
//!
//! ```text
//! add_handler ──> JobQueue (one per queue id) ──> job_received
//!                                                     │
//!                        dispatch task (per job) <────┘
//!                        Received → Processing → {Complete|Failed|TimedOut|…}
//!                                │                      │
//!                           status sinks          redirect pipeline
//! ```
//!
//! Dispatch runs one tokio task per received job; nothing serializes
//! dispatch across queues or across jobs on the same queue, so per-request
//! status ordering is the only ordering guarantee.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dispatchq::{
//!     HandlerConfiguration, JobHandler, JobQueueListener, ListenerConfig,
//!     ProcessingError, ProcessingRequest, StandardJobQueueFactory,
//! };
//! use async_trait::async_trait;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! struct PrintHandler {
//!     configuration: HandlerConfiguration,
//! }
//!
//! #[async_trait]
//! impl JobHandler for PrintHandler {
//!     fn configuration(&self) -> &HandlerConfiguration {
//!         &self.configuration
//!     }
//!
//!     fn can_process(&self, _request: &ProcessingRequest) -> bool {
//!         true
//!     }
//!
//!     async fn process(
//!         &self,
//!         request: &ProcessingRequest,
//!         _cancellation: CancellationToken,
//!     ) -> Result<Option<String>, ProcessingError> {
//!         println!("processing {request}");
//!         Ok(None)
//!     }
//! }
//!
//! # async fn example() -> dispatchq::Result<()> {
//! let listener = JobQueueListener::with_config(
//!     StandardJobQueueFactory::in_memory(),
//!     ListenerConfig { job_timeout_ms: 30_000, queue_prefix: None },
//! );
//! listener.add_handler(Arc::new(PrintHandler {
//!     configuration: HandlerConfiguration::new("printing", "Print Jobs"),
//! }))?;
//! listener.listen();
//!
//! listener
//!     .send_job("printing", "Print", None, "hello")
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod dispatch;

use crate::config::ListenerConfig;
use crate::error::{DispatchError, Result};
use crate::events::{EventPublisher, ListenerEvent};
use crate::jobs::{HandlerLocator, JobHandler, RedirectStrategy};
use crate::messaging::{JobQueue, JobQueueFactory, Message, ReceivedJob};
use crate::registry::HandlerRegistry;
use crate::status::StatusSink;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

pub(crate) struct ListenerInner {
    pub(crate) config: ListenerConfig,
    factory: Box<dyn JobQueueFactory>,
    pub(crate) queues: DashMap<String, Arc<JobQueue>>,
    pub(crate) registry: HandlerRegistry,
    pub(crate) redirects: DashMap<String, RedirectStrategy>,
    pub(crate) status_sinks: RwLock<Vec<Arc<dyn StatusSink>>>,
    pub(crate) events: EventPublisher,
    listening: AtomicBool,
    pub(crate) cancel_processing: AtomicBool,
}

impl ListenerInner {
    pub(crate) fn queue(&self, queue_id: &str) -> Result<Arc<JobQueue>> {
        self.queues
            .get(queue_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| DispatchError::queue_not_available(queue_id))
    }
}

/// Process for handling incoming job requests and directing them to the
/// appropriate handler
///
/// Registration (`add_handler`, `add_handler_locator`, `add_redirect_strategy`,
/// `add_status_sink`) is expected to happen before steady-state dispatch
/// begins. Registration spawns background tasks, so a listener must be used
/// within a tokio runtime.
pub struct JobQueueListener {
    inner: Arc<ListenerInner>,
}

impl JobQueueListener {
    /// Create a listener with default configuration
    pub fn new(factory: impl JobQueueFactory + 'static) -> Self {
        Self::with_config(factory, ListenerConfig::default())
    }

    /// Create a listener with the given configuration
    pub fn with_config(factory: impl JobQueueFactory + 'static, config: ListenerConfig) -> Self {
        Self {
            inner: Arc::new(ListenerInner {
                config,
                factory: Box::new(factory),
                queues: DashMap::new(),
                registry: HandlerRegistry::new(),
                redirects: DashMap::new(),
                status_sinks: RwLock::new(Vec::new()),
                events: EventPublisher::default(),
                listening: AtomicBool::new(false),
                cancel_processing: AtomicBool::new(false),
            }),
        }
    }

    /// Whether the listener is listening for jobs
    pub fn listening(&self) -> bool {
        self.inner.listening.load(Ordering::SeqCst)
    }

    /// Register a handler for processing new jobs
    ///
    /// Creates the queue for the handler's configuration unless one already
    /// exists; re-registering an owned queue id is a logged no-op.
    pub fn add_handler(&self, handler: Arc<dyn JobHandler>) -> Result<()> {
        self.register_handler(handler, true)
    }

    /// Register a locator for loading handlers
    ///
    /// The locator is queried on every lookup; handlers it currently yields
    /// get their queues created eagerly.
    pub fn add_handler_locator(&self, locator: Arc<dyn HandlerLocator>) -> Result<()> {
        self.inner.registry.add_locator(Arc::clone(&locator));
        for handler in locator.handlers() {
            self.register_handler(handler, false)?;
        }
        Ok(())
    }

    fn register_handler(&self, handler: Arc<dyn JobHandler>, direct: bool) -> Result<()> {
        let configuration = handler.configuration().clone();

        if self.inner.queues.contains_key(&configuration.queue_id) {
            warn!(
                queue = %configuration,
                "a handler for this queue is already loaded; remove it before loading a new one"
            );
            return Ok(());
        }

        info!(queue = %configuration, "loading handler");

        for strategy in handler.redirect_strategies() {
            self.add_redirect_strategy(&configuration.queue_id, strategy)?;
        }

        let queue = Arc::new(self.inner.factory.create(
            &configuration,
            self.inner.config.queue_prefix.as_deref(),
        )?);
        self.spawn_consumer(&queue);
        self.inner
            .queues
            .insert(configuration.queue_id.clone(), queue);

        if direct {
            self.inner.registry.add_handler(handler);
        }
        Ok(())
    }

    /// Wire an adapter's job-received channel into the dispatch routine,
    /// one spawned task per received job
    fn spawn_consumer(&self, queue: &Arc<JobQueue>) {
        let mut jobs = queue.job_received();
        let inner = Arc::clone(&self.inner);
        let queue_id = queue.queue_id().to_string();

        tokio::spawn(async move {
            loop {
                match jobs.recv().await {
                    Ok(job) => {
                        let inner = Arc::clone(&inner);
                        tokio::spawn(async move {
                            // event-driven dispatch resolves outcomes to
                            // statuses and events, never errors
                            let _ = inner.dispatch(job, true).await;
                        });
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(queue_id = %queue_id, skipped, "job dispatch lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Initiate queue listening on all owned queues; a second call while
    /// listening is a no-op
    pub fn listen(&self) {
        if self.inner.listening.swap(true, Ordering::SeqCst) {
            return;
        }
        for entry in self.inner.queues.iter() {
            entry.value().start_listening();
        }
    }

    /// Halt queue listening on all owned queues
    ///
    /// With `cancel_processing` set, subsequent dispatch attempts
    /// short-circuit to a canceled status without invoking the handler.
    /// Work already in flight is only interrupted by the job timeout.
    pub fn stop(&self, cancel_processing: bool) {
        self.inner
            .cancel_processing
            .store(cancel_processing, Ordering::SeqCst);
        for entry in self.inner.queues.iter() {
            entry.value().close();
        }
        self.inner.listening.store(false, Ordering::SeqCst);
    }

    /// Add a sink for recording job status transitions
    pub fn add_status_sink(&self, sink: Arc<dyn StatusSink>) {
        self.inner.status_sinks.write().push(sink);
    }

    /// Add or replace the redirect strategy for a queue
    pub fn add_redirect_strategy(
        &self,
        queue_id: &str,
        strategy: RedirectStrategy,
    ) -> Result<()> {
        if queue_id.trim().is_empty() {
            return Err(DispatchError::configuration(
                "a redirect strategy requires a queue id",
            ));
        }
        if self
            .inner
            .redirects
            .insert(queue_id.to_string(), strategy)
            .is_some()
        {
            info!(queue_id = %queue_id, "replaced redirect strategy");
        }
        Ok(())
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<ListenerEvent> {
        self.inner.events.subscribe()
    }

    /// Send a new job to the specified queue
    pub async fn send_job(
        &self,
        queue_id: &str,
        job_type: &str,
        payload: Option<&Value>,
        label: &str,
    ) -> Result<Message> {
        self.inner
            .queue(queue_id)?
            .send_job(job_type, payload, label)
            .await
    }

    /// Get a specific message from a queue without removing it
    pub async fn get_message(&self, queue_id: &str, message_id: &str) -> Result<Message> {
        self.inner.queue(queue_id)?.get_message(message_id).await
    }

    /// Get all messages from a queue without removing them
    pub async fn get_messages(&self, queue_id: &str) -> Result<Vec<Message>> {
        self.inner.queue(queue_id)?.get_messages().await
    }

    /// Receive a message (specific or next in line) from a queue,
    /// triggering dispatch through the notification pipeline
    pub async fn receive_message(
        &self,
        queue_id: &str,
        message_id: Option<&str>,
    ) -> Result<()> {
        self.inner.queue(queue_id)?.receive_message(message_id).await
    }

    /// Execute a job from the specified queue
    ///
    /// Equivalent to [`receive_message`](Self::receive_message): the job is
    /// removed and dispatched through the notification pipeline.
    pub async fn execute_job(&self, queue_id: &str, message_id: Option<&str>) -> Result<()> {
        self.receive_message(queue_id, message_id).await
    }

    /// Execute a specific job inline and return its outcome to the caller
    ///
    /// The message is read without being removed. Statuses are written and
    /// redirects evaluated as usual, but processing failures are returned as
    /// errors instead of being published as failure events.
    pub async fn execute_job_direct(&self, queue_id: &str, message_id: &str) -> Result<()> {
        let request = self
            .inner
            .queue(queue_id)?
            .processing_request(message_id)
            .await?;
        self.inner
            .dispatch(ReceivedJob::Decoded(request), false)
            .await
    }

    /// Delete all messages from the specified queue
    pub async fn purge_queue(&self, queue_id: &str) -> Result<()> {
        self.inner.queue(queue_id)?.purge().await
    }

    /// Delete a specific message from the specified queue
    pub async fn delete_message(&self, queue_id: &str, message_id: &str) -> Result<()> {
        self.inner.queue(queue_id)?.delete_message(message_id).await
    }
}

impl Drop for ListenerInner {
    fn drop(&mut self) {
        for entry in self.queues.iter() {
            entry.value().close();
        }
    }
}
