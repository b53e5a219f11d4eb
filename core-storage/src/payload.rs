//! Data accepted by write-style operations.

use bytes::Bytes;
use serde::Serialize;

use crate::error::{Result, StorageError};

/// Binary object with an optional MIME type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    data: Bytes,
    content_type: Option<String>,
}

impl Blob {
    pub fn new(data: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            data: data.into(),
            content_type,
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

/// Content handed to `write`, `append` and file writers.
///
/// Only text, byte buffers and blobs are storable as-is. A structured value
/// is rejected with [`StorageError::UnsupportedType`]; serialize it with
/// [`Storage::write_json`](crate::Storage::write_json) instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Bytes(Bytes),
    Blob(Blob),
    Structured(serde_json::Value),
}

impl Payload {
    /// Serializes `value` into a text payload.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_string(value)
            .map(Payload::Text)
            .map_err(|e| StorageError::UnsupportedType(format!("value is not serializable: {e}")))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Blob(_) => "blob",
            Self::Structured(_) => "structured",
        }
    }

    /// Raw bytes to store.
    pub fn into_bytes(self) -> Result<Bytes> {
        match self {
            Self::Text(text) => Ok(Bytes::from(text)),
            Self::Bytes(bytes) => Ok(bytes),
            Self::Blob(blob) => Ok(blob.into_bytes()),
            Self::Structured(_) => Err(StorageError::UnsupportedType(
                "structured values must be serialized before writing".to_string(),
            )),
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(bytes))
    }
}

impl From<Blob> for Payload {
    fn from(blob: Blob) -> Self {
        Self::Blob(blob)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_storable_kinds() {
        assert_eq!(Payload::from("hi").into_bytes().unwrap(), Bytes::from("hi"));
        assert_eq!(Payload::from(vec![1u8, 2]).into_bytes().unwrap().as_ref(), &[1, 2]);
        let blob = Blob::new(vec![9u8], Some("application/octet-stream".into()));
        assert_eq!(Payload::from(blob).into_bytes().unwrap().as_ref(), &[9]);
    }

    #[test]
    fn test_structured_is_rejected() {
        let payload = Payload::from(json!({"a": 1}));
        assert_eq!(payload.kind(), "structured");
        assert!(matches!(
            payload.into_bytes(),
            Err(StorageError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_json_payload_is_text() {
        let payload = Payload::json(&json!({"a": [1, 2]})).unwrap();
        assert_eq!(payload, Payload::Text("{\"a\":[1,2]}".to_string()));
    }
}
