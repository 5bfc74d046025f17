//! # Payload Formatters
//!
//! A payload formatter turns in-memory payload values into the serialized
//! text carried inside a [`JobRequest`](crate::jobs::JobRequest), and back.
//! Formatters are null-safe in both directions: an absent payload stays
//! absent through a round trip.

pub mod json;

pub use json::JsonPayloadFormatter;

use crate::error::Result;
use serde_json::Value;

/// Reads and writes payload data to and from its serialized text form
pub trait PayloadFormatter: Send + Sync {
    /// Serialize a payload value; `None` stays `None`
    fn write(&self, payload: Option<&Value>) -> Result<Option<String>>;

    /// Parse serialized payload text; `None` or blank input yields `None`
    fn read(&self, payload: Option<&str>) -> Result<Option<Value>>;
}
