//! Transport message envelope and factory.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content of a transport message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for the message
    pub id: String,
    /// Human-readable name for the message
    pub label: String,
    /// Serialized job request body
    pub body: Vec<u8>,
}

/// Builds [`Message`] instances for use in a transport queue
pub trait MessageFactory: Send + Sync {
    /// Create a message from a serialized body
    ///
    /// `encoding` names the text encoding of the body, as reported by the
    /// request serializer; backends that tag messages with an encoding use
    /// it, others ignore it.
    fn create(&self, body: Vec<u8>, encoding: &str, label: &str) -> Message;
}

/// Message factory assigning v4 uuid identifiers
#[derive(Debug, Clone, Default)]
pub struct UuidMessageFactory;

impl UuidMessageFactory {
    /// Create a new uuid message factory
    pub fn new() -> Self {
        Self
    }
}

impl MessageFactory for UuidMessageFactory {
    fn create(&self, body: Vec<u8>, _encoding: &str, label: &str) -> Message {
        Message {
            id: Uuid::new_v4().to_string(),
            label: label.to_string(),
            body,
        }
    }
}
