//! Request serialization to and from transport message bodies.

use crate::error::{DispatchError, Result};
use crate::jobs::JobRequest;

/// Converts a [`JobRequest`] to and from message body bytes
pub trait RequestSerializer: Send + Sync {
    /// Serialize the request into a message body
    fn serialize(&self, request: &JobRequest) -> Result<Vec<u8>>;

    /// Deserialize a message body into a request
    fn deserialize(&self, body: &[u8]) -> Result<JobRequest>;

    /// Text encoding used for serialized bodies
    fn encoding(&self) -> &'static str;
}

/// UTF-8 JSON envelope serializer for job requests
#[derive(Debug, Clone, Default)]
pub struct JsonRequestSerializer;

impl JsonRequestSerializer {
    /// Create a new JSON request serializer
    pub fn new() -> Self {
        Self
    }
}

impl RequestSerializer for JsonRequestSerializer {
    fn serialize(&self, request: &JobRequest) -> Result<Vec<u8>> {
        serde_json::to_vec(request).map_err(|e| DispatchError::serialization(e.to_string()))
    }

    fn deserialize(&self, body: &[u8]) -> Result<JobRequest> {
        serde_json::from_slice(body).map_err(|e| DispatchError::deserialization(e.to_string()))
    }

    fn encoding(&self) -> &'static str {
        "utf-8"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let serializer = JsonRequestSerializer::new();
        let request = JobRequest::new("Resize", Some("{\"width\":800}".to_string()));

        let body = serializer.serialize(&request).unwrap();
        let back = serializer.deserialize(&body).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_round_trip_without_payload() {
        let serializer = JsonRequestSerializer::new();
        let request = JobRequest::new("Ping", None);

        let body = serializer.serialize(&request).unwrap();
        let back = serializer.deserialize(&body).unwrap();
        assert!(back.payload.is_none());
    }

    #[test]
    fn test_malformed_body_is_an_error() {
        let serializer = JsonRequestSerializer::new();
        let result = serializer.deserialize(b"definitely not json");
        assert!(matches!(
            result,
            Err(DispatchError::Deserialization { .. })
        ));
    }

    #[test]
    fn test_encoding() {
        assert_eq!(JsonRequestSerializer::new().encoding(), "utf-8");
    }
}
