//! JSON payload formatting via `serde_json`.

use crate::error::{DispatchError, Result};
use crate::formatters::PayloadFormatter;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Formats payloads as JSON text
///
/// String payloads pass through unchanged so pre-serialized text is not
/// double-encoded.
#[derive(Debug, Clone, Default)]
pub struct JsonPayloadFormatter;

impl JsonPayloadFormatter {
    /// Create a new JSON payload formatter
    pub fn new() -> Self {
        Self
    }

    /// Serialize a typed payload
    pub fn write_typed<T: Serialize>(&self, payload: &T) -> Result<String> {
        serde_json::to_string(payload)
            .map_err(|e| DispatchError::payload_format(e.to_string()))
    }

    /// Parse a typed payload; absent or blank input yields `None`
    pub fn read_typed<T: DeserializeOwned>(&self, payload: Option<&str>) -> Result<Option<T>> {
        match payload {
            None => Ok(None),
            Some(text) if text.trim().is_empty() => Ok(None),
            Some(text) => serde_json::from_str(text)
                .map(Some)
                .map_err(|e| DispatchError::payload_format(e.to_string())),
        }
    }
}

impl PayloadFormatter for JsonPayloadFormatter {
    fn write(&self, payload: Option<&Value>) -> Result<Option<String>> {
        match payload {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.clone())),
            Some(value) => serde_json::to_string(value)
                .map(Some)
                .map_err(|e| DispatchError::payload_format(e.to_string())),
        }
    }

    fn read(&self, payload: Option<&str>) -> Result<Option<Value>> {
        self.read_typed(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct ReportPayload {
        name: String,
        pages: u32,
    }

    #[test]
    fn test_write_none_is_none() {
        let formatter = JsonPayloadFormatter::new();
        assert_eq!(formatter.write(None).unwrap(), None);
        assert_eq!(formatter.write(Some(&Value::Null)).unwrap(), None);
    }

    #[test]
    fn test_read_none_and_blank_are_none() {
        let formatter = JsonPayloadFormatter::new();
        assert_eq!(formatter.read(None).unwrap(), None);
        assert_eq!(formatter.read(Some("")).unwrap(), None);
        assert_eq!(formatter.read(Some("   ")).unwrap(), None);
    }

    #[test]
    fn test_string_passthrough() {
        let formatter = JsonPayloadFormatter::new();
        let already_encoded = json!("{\"name\":\"weekly\"}");
        assert_eq!(
            formatter.write(Some(&already_encoded)).unwrap().as_deref(),
            Some("{\"name\":\"weekly\"}")
        );
    }

    #[test]
    fn test_typed_round_trip() {
        let formatter = JsonPayloadFormatter::new();
        let payload = ReportPayload {
            name: "weekly".to_string(),
            pages: 12,
        };

        let text = formatter.write_typed(&payload).unwrap();
        let back: ReportPayload = formatter.read_typed(Some(&text)).unwrap().unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        let formatter = JsonPayloadFormatter::new();
        assert!(formatter.read(Some("{not json")).is_err());
    }

    proptest! {
        #[test]
        fn round_trip_preserves_values(text in ".*", number in any::<i64>(), flag in any::<bool>()) {
            let formatter = JsonPayloadFormatter::new();
            let value = json!({ "text": text, "number": number, "flag": flag });

            let written = formatter.write(Some(&value)).unwrap().unwrap();
            let back = formatter.read(Some(&written)).unwrap().unwrap();
            prop_assert_eq!(back, value);
        }
    }
}
