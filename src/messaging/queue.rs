//! Transport queue abstractions.
//!
//! A [`MessageQueue`] is the durable channel underneath one job queue
//! adapter. Delivery guarantees (at-least-once, ordering across consumers)
//! belong to the transport; the dispatch layer only assumes that removing a
//! message produces exactly one `received` notification.

use crate::error::Result;
use crate::jobs::HandlerConfiguration;
use crate::messaging::message::Message;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Options for creating a transport queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueCreationOptions {
    /// Unique id for the queue
    pub queue_id: String,
    /// Human-readable name for the queue
    pub queue_name: String,
    /// Minimum interval between delivered messages
    pub throttle_interval: Option<Duration>,
}

impl QueueCreationOptions {
    /// Derive creation options from a handler configuration
    ///
    /// An optional prefix namespaces the physical queue id; routing inside
    /// the dispatch layer always uses the configuration's unprefixed id.
    pub fn from_configuration(
        configuration: &HandlerConfiguration,
        queue_prefix: Option<&str>,
    ) -> Self {
        let queue_id = match queue_prefix {
            Some(prefix) => format!("{prefix}{}", configuration.queue_id),
            None => configuration.queue_id.clone(),
        };
        Self {
            queue_id,
            queue_name: configuration.queue_name.clone(),
            throttle_interval: configuration.throttle_interval,
        }
    }
}

/// A named transport channel that stores and delivers messages
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Unique identifier for the queue
    fn id(&self) -> &str;

    /// Human-readable name for the queue
    fn name(&self) -> &str;

    /// Push a message onto the queue, returning it with its assigned id
    async fn send(&self, message: Message) -> Result<Message>;

    /// Start delivering queued messages through the `received` notification
    fn begin_receive(&self);

    /// Remove a message (specific or next in line), delivering it through
    /// the `received` notification
    async fn receive(&self, message_id: Option<&str>) -> Result<()>;

    /// Stop delivering messages
    fn end_receive(&self);

    /// All messages currently on the queue, without removing them
    async fn get_messages(&self) -> Result<Vec<Message>>;

    /// A specific message, without removing it
    async fn get_message(&self, message_id: &str) -> Result<Message>;

    /// Delete every message on the queue
    async fn purge(&self) -> Result<()>;

    /// Remove a message without delivering it
    async fn delete_message(&self, message_id: &str) -> Result<()>;

    /// Subscribe to message-received notifications
    fn received(&self) -> broadcast::Receiver<Message>;
}

/// Creates transport queues
pub trait MessageQueueFactory: Send + Sync {
    /// Create or open the queue described by the options
    ///
    /// Fails with a service-not-available error when the backing queue
    /// service cannot be reached.
    fn create(&self, options: &QueueCreationOptions) -> Result<Arc<dyn MessageQueue>>;

    /// Whether a queue with the given id already exists
    fn exists(&self, queue_id: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_configuration() {
        let configuration = HandlerConfiguration::new("orders", "Orders")
            .with_throttle_interval(Duration::from_millis(100));

        let options = QueueCreationOptions::from_configuration(&configuration, None);
        assert_eq!(options.queue_id, "orders");
        assert_eq!(options.queue_name, "Orders");
        assert_eq!(options.throttle_interval, Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_prefix_applies_to_physical_id() {
        let configuration = HandlerConfiguration::new("orders", "Orders");
        let options = QueueCreationOptions::from_configuration(&configuration, Some("staging."));
        assert_eq!(options.queue_id, "staging.orders");
    }
}
