//! # Dispatch Configuration
//!
//! Set once on the builder and frozen into the dispatcher. Deserializable
//! so the same settings can come from a registry manifest file.

use oneof_core::UnknownPolicy;
use serde::{Deserialize, Serialize};

/// Default name of the discriminator field.
pub const DEFAULT_TYPE_FIELD: &str = "type";

/// Discriminator and load-policy settings for a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Field carrying the discriminator in serialized payloads.
    pub type_field: String,
    /// Strip the discriminator from the payload before the delegate sees it.
    pub type_field_remove: bool,
    /// Unknown-field policy used when a load call does not set one.
    pub unknown: UnknownPolicy,
    /// Record many-load errors under the element index.
    pub index_errors: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            type_field: DEFAULT_TYPE_FIELD.to_string(),
            type_field_remove: true,
            unknown: UnknownPolicy::Raise,
            index_errors: true,
        }
    }
}
