//! # Error Store
//!
//! Caller-owned aggregator for batch loads. Every element of a many-load
//! records its own errors under its input index, so all independent
//! failures surface rather than just the first.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::ErrorMessages;

/// Errors collected during one load call, keyed by element index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorStore {
    unindexed: ErrorMessages,
    indexed: BTreeMap<usize, ErrorMessages>,
}

impl ErrorStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `messages` against `index` (or the top level when `None`).
    ///
    /// Messages for the same index and field accumulate.
    pub fn store_error(&mut self, messages: ErrorMessages, index: Option<usize>) {
        match index {
            Some(idx) => self.indexed.entry(idx).or_default().merge(messages),
            None => self.unindexed.merge(messages),
        }
    }

    /// Record a single whole-payload message.
    pub fn store_schema_error(&mut self, message: impl Into<String>, index: Option<usize>) {
        self.store_error(ErrorMessages::schema(message), index);
    }

    /// Messages recorded at `index`, if any.
    pub fn get(&self, index: Option<usize>) -> Option<&ErrorMessages> {
        match index {
            Some(idx) => self.indexed.get(&idx),
            None if self.unindexed.is_empty() => None,
            None => Some(&self.unindexed),
        }
    }

    /// Indices with at least one recorded error, ascending.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.indexed.keys().copied()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.unindexed.is_empty() && self.indexed.values().all(ErrorMessages::is_empty)
    }

    /// Total number of `(index, field)` entries with messages.
    pub fn len(&self) -> usize {
        self.unindexed.len() + self.indexed.values().map(ErrorMessages::len).sum::<usize>()
    }

    /// Render as JSON: indexed entries under their decimal index, then
    /// unindexed fields.
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (idx, messages) in &self.indexed {
            map.insert(idx.to_string(), messages.to_value());
        }
        if let Value::Object(fields) = self.unindexed.to_value() {
            map.extend(fields);
        }
        Value::Object(map)
    }
}

impl Serialize for ErrorStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.indexed.len() + self.unindexed.len()))?;
        for (idx, messages) in &self.indexed {
            map.serialize_entry(&idx.to_string(), messages)?;
        }
        for (field, messages) in self.unindexed.iter() {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}
