//! # Dispatch Error Types
//!
//! Crate-wide error handling using `thiserror` for structured error types
//! instead of `Box<dyn Error>` patterns. Processing outcomes (skipped, failed,
//! timed out) are not errors on the event-driven path; they only surface as
//! [`DispatchError::Processing`] when a job is executed directly and the
//! caller asked for the outcome.

use crate::jobs::ProcessingError;
use thiserror::Error;

/// Errors surfaced by queue, serialization, and listener operations
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No queue with the given id is owned by the listener
    #[error("queue not available: {queue_id}")]
    QueueNotAvailable { queue_id: String },

    /// The underlying queue service could not be reached
    #[error("queue service not available: {message}")]
    ServiceNotAvailable { message: String },

    /// A specific message could not be found on a queue
    #[error("message not found: {message_id}")]
    MessageNotFound { message_id: String },

    /// A transport-level queue operation failed
    #[error("queue operation failed: {queue_id}: {operation}: {message}")]
    QueueOperation {
        queue_id: String,
        operation: String,
        message: String,
    },

    /// Invalid listener or handler configuration
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A job request could not be serialized into a message body
    #[error("request serialization error: {message}")]
    Serialization { message: String },

    /// A message body could not be deserialized into a job request
    #[error("request deserialization error: {message}")]
    Deserialization { message: String },

    /// A payload could not be formatted or parsed
    #[error("payload format error: {message}")]
    PayloadFormat { message: String },

    /// A directly-executed job failed; carries the handler's outcome
    #[error("processing failed: {0}")]
    Processing(#[from] ProcessingError),
}

impl DispatchError {
    /// Create a queue not available error
    pub fn queue_not_available(queue_id: impl Into<String>) -> Self {
        Self::QueueNotAvailable {
            queue_id: queue_id.into(),
        }
    }

    /// Create a service not available error
    pub fn service_not_available(message: impl Into<String>) -> Self {
        Self::ServiceNotAvailable {
            message: message.into(),
        }
    }

    /// Create a message not found error
    pub fn message_not_found(message_id: impl Into<String>) -> Self {
        Self::MessageNotFound {
            message_id: message_id.into(),
        }
    }

    /// Create a queue operation error
    pub fn queue_operation(
        queue_id: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::QueueOperation {
            queue_id: queue_id.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a request serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a request deserialization error
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization {
            message: message.into(),
        }
    }

    /// Create a payload format error
    pub fn payload_format(message: impl Into<String>) -> Self {
        Self::PayloadFormat {
            message: message.into(),
        }
    }
}

/// Conversion from serde_json::Error, classified by direction
impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_eof() || err.is_data() {
            DispatchError::deserialization(err.to_string())
        } else {
            DispatchError::serialization(err.to_string())
        }
    }
}

/// Result type alias for dispatch operations
pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let queue_err = DispatchError::queue_not_available("orders");
        assert!(matches!(queue_err, DispatchError::QueueNotAvailable { .. }));

        let op_err = DispatchError::queue_operation("orders", "send", "store closed");
        assert!(matches!(op_err, DispatchError::QueueOperation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = DispatchError::queue_not_available("orders");
        assert_eq!(err.to_string(), "queue not available: orders");

        let op_err = DispatchError::queue_operation("orders", "send", "store closed");
        let display = op_err.to_string();
        assert!(display.contains("orders"));
        assert!(display.contains("send"));
        assert!(display.contains("store closed"));
    }

    #[test]
    fn test_serde_json_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: DispatchError = json_err.into();
        assert!(matches!(err, DispatchError::Deserialization { .. }));
    }
}
