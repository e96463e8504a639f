//! # Error Types: Field-Keyed Validation Messages
//!
//! Validation failures are structured values keyed by field name, with
//! `_schema` reserved for problems with the payload as a whole. Each key
//! carries a list of human-readable messages so independent problems on
//! the same field all surface.
//!
//! ## Design
//!
//! - Messages are ordered by field name (`BTreeMap`) so rendered error
//!   maps are deterministic.
//! - A failed load may still carry partially valid data; callers under
//!   partial-failure policies keep it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Key under which whole-payload errors are recorded.
pub const SCHEMA_KEY: &str = "_schema";

/// Standard message texts shared by the dispatcher and the delegates.
pub mod messages {
    /// A required field (including the discriminator) was absent or empty.
    pub const MISSING_REQUIRED: &str = "Missing data for required field.";
    /// The input had the wrong shape (not a mapping, not a collection).
    pub const INVALID_INPUT_TYPE: &str = "Invalid input type.";
    /// A field not declared by the schema was present under the `raise` policy.
    pub const UNKNOWN_FIELD: &str = "Unknown field.";
}

/// Field name to list of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorMessages(BTreeMap<String, Vec<String>>);

impl ErrorMessages {
    /// An empty message set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A single message recorded against `field`.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut messages = Self::new();
        messages.add(field, message);
        messages
    }

    /// A single whole-payload message recorded under [`SCHEMA_KEY`].
    pub fn schema(message: impl Into<String>) -> Self {
        Self::single(SCHEMA_KEY, message)
    }

    /// Append a message to `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Merge `other` into `self`, appending messages field by field.
    pub fn merge(&mut self, other: ErrorMessages) {
        for (field, msgs) in other.0 {
            self.0.entry(field).or_default().extend(msgs);
        }
    }

    /// Messages recorded against `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Returns true if any message was recorded against `field`.
    pub fn contains_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Field names with at least one message, in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate `(field, messages)` pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of fields with messages.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no messages were recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as a JSON object of string arrays.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|(field, msgs)| {
                let list = msgs.iter().cloned().map(Value::String).collect();
                (field.clone(), Value::Array(list))
            })
            .collect();
        Value::Object(map)
    }
}

impl fmt::Display for ErrorMessages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, msgs)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {}", msgs.join(" "))?;
        }
        Ok(())
    }
}

/// A failed load of a single mapping.
///
/// Returned by [`crate::Schema::deserialize`]. The dispatcher converts it
/// into an [`crate::ErrorStore`] entry and falls back to `valid_data`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("validation failed: {messages}")]
pub struct ValidationError {
    /// Field-keyed messages.
    pub messages: ErrorMessages,
    /// The subset of the input that passed validation, when known.
    pub valid_data: Option<Map<String, Value>>,
}

impl ValidationError {
    /// Wrap a message set with no surviving data.
    pub fn new(messages: ErrorMessages) -> Self {
        Self {
            messages,
            valid_data: None,
        }
    }

    /// A single message against `field`.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorMessages::single(field, message))
    }

    /// A single whole-payload message.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(ErrorMessages::schema(message))
    }

    /// Attach the partially valid data that survived the failure.
    pub fn with_valid_data(mut self, valid_data: Map<String, Value>) -> Self {
        self.valid_data = Some(valid_data);
        self
    }
}
