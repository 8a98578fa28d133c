//! Application session fields carried in the token footer.
//!
//! The core never interprets these. They are an opaque JSON object whose
//! integrity is protected by the footer HMAC.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ProtocolError, Result};

/// Arbitrary JSON object owned by the embedding application.
///
/// # Invariants
///
/// - Always a JSON object, never an array or scalar. Decoding anything else
///   fails with [`ProtocolError::InvalidFields`].
/// - [`Self::to_json_bytes`] is deterministic for a given value, and finite
///   floats parse back to the same `f64`. The footer still MACs the bytes it
///   carried rather than a re-serialization (see [`crate::Footer`]).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionFields(Map<String, Value>);

impl SessionFields {
    /// Empty object (`{}`).
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parse a JSON object from raw bytes.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| ProtocolError::InvalidFields(e.to_string()))?;
        Self::try_from(value)
    }

    /// Serialize to the JSON bytes that go on the wire and into the HMAC.
    pub fn to_json_bytes(&self) -> Vec<u8> {
        let Ok(bytes) = serde_json::to_vec(&self.0) else {
            unreachable!("a map with string keys always serializes");
        };
        bytes
    }

    /// Look up a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a top-level field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Remove a top-level field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// True if the object has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for SessionFields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for SessionFields {
    type Error = ProtocolError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ProtocolError::InvalidFields(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

impl From<SessionFields> for Value {
    fn from(fields: SessionFields) -> Self {
        Self::Object(fields.0)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
