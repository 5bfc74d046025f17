//! # In-Memory Transport
//!
//! In-process message queue backend for tests, demos, and single-process
//! deployments. Messages live in a FIFO store; `begin_receive` spawns a
//! drain task that pops messages onto the `received` notification channel,
//! honoring the queue's throttle interval as a minimum delivery spacing.
//!
//! The factory keeps one queue per id, so repeated `create` calls open the
//! same store. It can be flipped into an unavailable mode to exercise the
//! service-not-available path.

use crate::error::{DispatchError, Result};
use crate::messaging::message::Message;
use crate::messaging::queue::{MessageQueue, MessageQueueFactory, QueueCreationOptions};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Notify};
use tracing::debug;
use uuid::Uuid;

const RECEIVED_CHANNEL_CAPACITY: usize = 256;

struct QueueInner {
    options: QueueCreationOptions,
    store: Mutex<VecDeque<Message>>,
    received_tx: broadcast::Sender<Message>,
    listening: AtomicBool,
    notify: Notify,
}

impl QueueInner {
    fn deliver(&self, message: Message) {
        // send() errs only when no adapter is subscribed yet; the message
        // has already been removed from the store either way
        let _ = self.received_tx.send(message);
    }
}

/// In-process FIFO message queue
#[derive(Clone)]
pub struct InMemoryMessageQueue {
    inner: Arc<QueueInner>,
}

impl InMemoryMessageQueue {
    /// Create a queue with the given options
    pub fn new(options: QueueCreationOptions) -> Self {
        let (received_tx, _) = broadcast::channel(RECEIVED_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(QueueInner {
                options,
                store: Mutex::new(VecDeque::new()),
                received_tx,
                listening: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Number of messages currently stored
    pub fn len(&self) -> usize {
        self.inner.store.lock().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.inner.store.lock().is_empty()
    }

    /// Whether the drain task is active
    pub fn is_listening(&self) -> bool {
        self.inner.listening.load(Ordering::SeqCst)
    }

    fn take(&self, message_id: Option<&str>) -> Result<Message> {
        let mut store = self.inner.store.lock();
        match message_id {
            Some(id) => store
                .iter()
                .position(|m| m.id == id)
                .and_then(|index| store.remove(index))
                .ok_or_else(|| DispatchError::message_not_found(id)),
            None => store.pop_front().ok_or_else(|| {
                DispatchError::message_not_found(format!(
                    "no messages on queue {}",
                    self.inner.options.queue_id
                ))
            }),
        }
    }
}

#[async_trait]
impl MessageQueue for InMemoryMessageQueue {
    fn id(&self) -> &str {
        &self.inner.options.queue_id
    }

    fn name(&self) -> &str {
        &self.inner.options.queue_name
    }

    async fn send(&self, mut message: Message) -> Result<Message> {
        if message.id.is_empty() {
            message.id = Uuid::new_v4().to_string();
        }
        self.inner.store.lock().push_back(message.clone());
        self.inner.notify.notify_one();
        Ok(message)
    }

    fn begin_receive(&self) {
        if self.inner.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            debug!(queue_id = %inner.options.queue_id, "in-memory drain task started");
            loop {
                if !inner.listening.load(Ordering::SeqCst) {
                    break;
                }
                let next = inner.store.lock().pop_front();
                match next {
                    Some(message) => {
                        inner.deliver(message);
                        if let Some(interval) = inner.options.throttle_interval {
                            tokio::time::sleep(interval).await;
                        } else {
                            // yield so a flood of messages cannot starve
                            // the dispatch tasks consuming them
                            tokio::task::yield_now().await;
                        }
                    }
                    None => inner.notify.notified().await,
                }
            }
            debug!(queue_id = %inner.options.queue_id, "in-memory drain task stopped");
        });
    }

    async fn receive(&self, message_id: Option<&str>) -> Result<()> {
        let message = self.take(message_id)?;
        self.inner.deliver(message);
        Ok(())
    }

    fn end_receive(&self) {
        self.inner.listening.store(false, Ordering::SeqCst);
        self.inner.notify.notify_one();
    }

    async fn get_messages(&self) -> Result<Vec<Message>> {
        Ok(self.inner.store.lock().iter().cloned().collect())
    }

    async fn get_message(&self, message_id: &str) -> Result<Message> {
        self.inner
            .store
            .lock()
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
            .ok_or_else(|| DispatchError::message_not_found(message_id))
    }

    async fn purge(&self) -> Result<()> {
        self.inner.store.lock().clear();
        Ok(())
    }

    async fn delete_message(&self, message_id: &str) -> Result<()> {
        self.take(Some(message_id)).map(|_| ())
    }

    fn received(&self) -> broadcast::Receiver<Message> {
        self.inner.received_tx.subscribe()
    }
}

/// Factory keeping one in-memory queue per id
pub struct InMemoryMessageQueueFactory {
    queues: DashMap<String, InMemoryMessageQueue>,
    available: AtomicBool,
}

impl Default for InMemoryMessageQueueFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMessageQueueFactory {
    /// Create a new factory
    pub fn new() -> Self {
        Self {
            queues: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the queue service going down or coming back
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of queues created so far
    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    /// Direct handle to a queue, if it has been created
    pub fn queue(&self, queue_id: &str) -> Option<InMemoryMessageQueue> {
        self.queues.get(queue_id).map(|q| q.value().clone())
    }
}

impl MessageQueueFactory for InMemoryMessageQueueFactory {
    fn create(&self, options: &QueueCreationOptions) -> Result<Arc<dyn MessageQueue>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(DispatchError::service_not_available(
                "in-memory queue service is marked unavailable",
            ));
        }

        let queue = self
            .queues
            .entry(options.queue_id.clone())
            .or_insert_with(|| InMemoryMessageQueue::new(options.clone()))
            .clone();
        Ok(Arc::new(queue))
    }

    fn exists(&self, queue_id: &str) -> bool {
        self.queues.contains_key(queue_id)
    }
}
