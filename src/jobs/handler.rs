//! # Job Handlers
//!
//! The [`JobHandler`] trait is the polymorphic unit of work: it declares the
//! queue it wants to own, whether it can take a given request, how to process
//! it, and any redirect policies triggered by its own outcome.
//!
//! Handlers are registered with a listener either directly or through a
//! [`HandlerLocator`](crate::jobs::HandlerLocator); the listener creates one
//! queue per handler configuration and routes received jobs through the
//! registry.

use crate::jobs::redirect::RedirectStrategy;
use crate::jobs::request::ProcessingRequest;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Identity of the queue a handler wants to own
///
/// Immutable once a queue has been created from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfiguration {
    /// Unique id for the queue
    pub queue_id: String,
    /// Human-readable name for the queue
    pub queue_name: String,
    /// Minimum interval between received jobs, when the transport throttles
    pub throttle_interval: Option<Duration>,
}

impl HandlerConfiguration {
    /// Create a configuration without throttling
    pub fn new(queue_id: impl Into<String>, queue_name: impl Into<String>) -> Self {
        Self {
            queue_id: queue_id.into(),
            queue_name: queue_name.into(),
            throttle_interval: None,
        }
    }

    /// Set the minimum poll interval for the queue
    pub fn with_throttle_interval(mut self, interval: Duration) -> Self {
        self.throttle_interval = Some(interval);
        self
    }
}

impl fmt::Display for HandlerConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.queue_name, self.queue_id)
    }
}

/// Error produced by a handler's `process` call
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The handler observed the cancellation signal and gave up; surfaced
    /// as a timed-out status rather than a failure
    #[error("processing canceled: {0}")]
    Canceled(String),

    /// The handler failed with a message
    #[error("{0}")]
    Failed(String),

    /// The handler failed with an underlying error
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProcessingError {
    /// Create a failure with a message
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Create a cancellation outcome with a message
    pub fn canceled(message: impl Into<String>) -> Self {
        Self::Canceled(message.into())
    }
}

/// Polymorphic unit of work processing queue messages
///
/// A handler's `process` call runs under the listener's job timeout: the
/// provided [`CancellationToken`] fires when the timeout expires, and the
/// in-flight future is dropped at its next suspension point. Handlers that
/// spawn work or hold resources across long sections should observe the
/// token cooperatively.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Configuration used to create the queue this handler owns
    fn configuration(&self) -> &HandlerConfiguration;

    /// Whether this handler can process the job described by the request
    fn can_process(&self, request: &ProcessingRequest) -> bool;

    /// Process the job, returning an optional serialized result body
    async fn process(
        &self,
        request: &ProcessingRequest,
        cancellation: CancellationToken,
    ) -> Result<Option<String>, ProcessingError>;

    /// Redirect policies for this handler's queue
    ///
    /// Each returned strategy is bound to the handler's own queue id when
    /// the handler is registered.
    fn redirect_strategies(&self) -> Vec<RedirectStrategy> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_display() {
        let configuration = HandlerConfiguration::new("orders", "Order Processing");
        assert_eq!(configuration.to_string(), "Order Processing (orders)");
    }

    #[test]
    fn test_configuration_throttle() {
        let configuration = HandlerConfiguration::new("orders", "Orders")
            .with_throttle_interval(Duration::from_millis(250));
        assert_eq!(
            configuration.throttle_interval,
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_processing_error_display() {
        assert_eq!(ProcessingError::failed("boom").to_string(), "boom");
        assert_eq!(
            ProcessingError::canceled("gave up").to_string(),
            "processing canceled: gave up"
        );
    }
}
