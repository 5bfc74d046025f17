//! Shared fixtures for listener integration tests: a configurable recording
//! handler, a mutable locator, counting transport fakes, and event helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use dispatchq::{
    HandlerConfiguration, HandlerLocator, InMemoryMessageQueueFactory, JobHandler,
    JsonPayloadFormatter, JsonRequestSerializer, JobQueueListener, ListenerConfig, ListenerEvent,
    MemoryStatusSink, Message, MessageQueue, MessageQueueFactory, ProcessingError,
    ProcessingRequest, QueueCreationOptions, RedirectStrategy, StandardJobQueueFactory,
    UuidMessageFactory,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// What a [`RecordingHandler`] does with each request
#[derive(Clone)]
pub enum Behavior {
    Succeed(Option<String>),
    Fail(String),
    Hang(Duration),
}

/// Handler recording every request it processes
pub struct RecordingHandler {
    configuration: HandlerConfiguration,
    accepts: bool,
    behavior: Behavior,
    strategies: Vec<RedirectStrategy>,
    processed: Mutex<Vec<ProcessingRequest>>,
}

impl RecordingHandler {
    pub fn new(queue_id: &str) -> Self {
        Self {
            configuration: HandlerConfiguration::new(queue_id, format!("{queue_id} queue")),
            accepts: true,
            behavior: Behavior::Succeed(None),
            strategies: Vec::new(),
            processed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_result(mut self, body: &str) -> Self {
        self.behavior = Behavior::Succeed(Some(body.to_string()));
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.behavior = Behavior::Fail(message.to_string());
        self
    }

    pub fn hanging(mut self, duration: Duration) -> Self {
        self.behavior = Behavior::Hang(duration);
        self
    }

    pub fn rejecting(mut self) -> Self {
        self.accepts = false;
        self
    }

    pub fn with_strategy(mut self, strategy: RedirectStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn processed(&self) -> Vec<ProcessingRequest> {
        self.processed.lock().clone()
    }

    pub fn processed_count(&self) -> usize {
        self.processed.lock().len()
    }
}

#[async_trait]
impl JobHandler for RecordingHandler {
    fn configuration(&self) -> &HandlerConfiguration {
        &self.configuration
    }

    fn can_process(&self, _request: &ProcessingRequest) -> bool {
        self.accepts
    }

    async fn process(
        &self,
        request: &ProcessingRequest,
        cancellation: CancellationToken,
    ) -> Result<Option<String>, ProcessingError> {
        self.processed.lock().push(request.clone());
        match self.behavior.clone() {
            Behavior::Succeed(body) => Ok(body),
            Behavior::Fail(message) => Err(ProcessingError::failed(message)),
            Behavior::Hang(duration) => {
                tokio::select! {
                    _ = tokio::time::sleep(duration) => Ok(None),
                    _ = cancellation.cancelled() => {
                        Err(ProcessingError::canceled("handler observed cancellation"))
                    }
                }
            }
        }
    }

    fn redirect_strategies(&self) -> Vec<RedirectStrategy> {
        self.strategies.clone()
    }
}

/// Locator whose handler set can change at runtime
#[derive(Default)]
pub struct MutableLocator {
    handlers: Mutex<Vec<Arc<dyn JobHandler>>>,
}

impl MutableLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, handler: Arc<dyn JobHandler>) {
        self.handlers.lock().push(handler);
    }

    pub fn clear(&self) {
        self.handlers.lock().clear();
    }
}

impl HandlerLocator for MutableLocator {
    fn handler_by_queue_id(&self, queue_id: &str) -> Option<Arc<dyn JobHandler>> {
        self.handlers
            .lock()
            .iter()
            .find(|h| h.configuration().queue_id == queue_id)
            .cloned()
    }

    fn handlers(&self) -> Vec<Arc<dyn JobHandler>> {
        self.handlers.lock().clone()
    }
}

/// Transport queue wrapper counting `begin_receive` calls
pub struct CountingQueue {
    inner: Arc<dyn MessageQueue>,
    begin_receive_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl MessageQueue for CountingQueue {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn send(&self, message: Message) -> dispatchq::Result<Message> {
        self.inner.send(message).await
    }

    fn begin_receive(&self) {
        self.begin_receive_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.begin_receive();
    }

    async fn receive(&self, message_id: Option<&str>) -> dispatchq::Result<()> {
        self.inner.receive(message_id).await
    }

    fn end_receive(&self) {
        self.inner.end_receive();
    }

    async fn get_messages(&self) -> dispatchq::Result<Vec<Message>> {
        self.inner.get_messages().await
    }

    async fn get_message(&self, message_id: &str) -> dispatchq::Result<Message> {
        self.inner.get_message(message_id).await
    }

    async fn purge(&self) -> dispatchq::Result<()> {
        self.inner.purge().await
    }

    async fn delete_message(&self, message_id: &str) -> dispatchq::Result<()> {
        self.inner.delete_message(message_id).await
    }

    fn received(&self) -> broadcast::Receiver<Message> {
        self.inner.received()
    }
}

/// Factory wrapping the in-memory transport with counting queues
pub struct CountingQueueFactory {
    inner: InMemoryMessageQueueFactory,
    pub begin_receive_calls: Arc<AtomicUsize>,
}

impl CountingQueueFactory {
    pub fn new() -> Self {
        Self {
            inner: InMemoryMessageQueueFactory::new(),
            begin_receive_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MessageQueueFactory for CountingQueueFactory {
    fn create(&self, options: &QueueCreationOptions) -> dispatchq::Result<Arc<dyn MessageQueue>> {
        let inner = self.inner.create(options)?;
        Ok(Arc::new(CountingQueue {
            inner,
            begin_receive_calls: Arc::clone(&self.begin_receive_calls),
        }))
    }

    fn exists(&self, queue_id: &str) -> bool {
        self.inner.exists(queue_id)
    }
}

/// Status sink that always fails, for isolation tests
pub struct FailingStatusSink;

#[async_trait]
impl dispatchq::StatusSink for FailingStatusSink {
    async fn write_status(&self, _status: &dispatchq::JobStatus) -> dispatchq::Result<()> {
        Err(dispatchq::DispatchError::configuration(
            "this sink always fails",
        ))
    }
}

/// Listener wired to a shared in-memory transport and a memory status sink
pub struct TestRig {
    pub transport: Arc<InMemoryMessageQueueFactory>,
    pub listener: JobQueueListener,
    pub sink: Arc<MemoryStatusSink>,
}

pub fn rig(job_timeout_ms: u64) -> TestRig {
    let transport = Arc::new(InMemoryMessageQueueFactory::new());
    let listener = JobQueueListener::with_config(
        StandardJobQueueFactory::in_memory_on(Arc::clone(&transport)),
        ListenerConfig {
            job_timeout_ms,
            queue_prefix: None,
        },
    );
    let sink = Arc::new(MemoryStatusSink::new());
    listener.add_status_sink(sink.clone());
    TestRig {
        transport,
        listener,
        sink,
    }
}

/// Listener on a counting transport, for begin-receive assertions
pub fn counting_rig() -> (Arc<AtomicUsize>, JobQueueListener) {
    let factory = CountingQueueFactory::new();
    let calls = Arc::clone(&factory.begin_receive_calls);
    let listener = JobQueueListener::new(StandardJobQueueFactory::new(
        Arc::new(factory),
        Arc::new(UuidMessageFactory::new()),
        Arc::new(JsonPayloadFormatter::new()),
        Arc::new(JsonRequestSerializer::new()),
    ));
    (calls, listener)
}

/// Wait up to two seconds for an event matching the predicate, skipping
/// everything else
pub async fn wait_for(
    events: &mut broadcast::Receiver<ListenerEvent>,
    predicate: impl Fn(&ListenerEvent) -> bool,
) -> ListenerEvent {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Drain every event already published
pub fn drain(events: &mut broadcast::Receiver<ListenerEvent>) -> Vec<ListenerEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}
