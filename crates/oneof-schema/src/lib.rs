//! # oneof-schema: Polymorphic Schema Dispatch
//!
//! A [`OneOfSchema`] stands in for a family of variant schemas. It keeps a
//! registry of `discriminator -> schema` entries and routes each value to
//! the right one.
//!
//! ## Serialize (`dispatch`)
//!
//! [`OneOfSchema::serialize`] classifies a value with its
//! [`TypeResolver`], serializes it with the registered delegate, and writes
//! the discriminator into the result under the configured type field
//! (`"type"` by default). Unclassifiable values yield a `{"_schema": ...}`
//! payload instead of failing.
//!
//! ## Deserialize (`load`)
//!
//! [`OneOfSchema::deserialize`] reads the discriminator out of each input
//! mapping, strips it (unless `type_field_remove` is off), and hands the
//! remainder to the selected delegate. Failures never abort a batch: they
//! are recorded per element index in an [`ErrorStore`].
//!
//! ## Delegates (`delegate`)
//!
//! - [`JsonSchemaDelegate`]: validates JSON objects against a JSON Schema
//!   document.
//! - [`TypedSchema`]: loads a serde type, optionally shape-checked first.
//!
//! ## Manifests (`manifest`)
//!
//! [`RegistryManifest`] builds a JSON-level dispatcher from a YAML or JSON
//! file listing schema documents per discriminator.
//!
//! ## Crate Policy
//!
//! - Depends only on `oneof-core` internally.
//! - Loading is a trust boundary: bad input is reported as structured,
//!   field-keyed messages, never as a panic.

pub mod collection;
pub mod config;
pub mod delegate;
pub mod dispatch;
pub mod load;
pub mod manifest;
pub mod registry;
pub mod resolve;

pub use config::{DispatchConfig, DEFAULT_TYPE_FIELD};
pub use delegate::{DelegateError, JsonSchemaDelegate, LocalRetriever, TypedSchema};
pub use dispatch::{OneOfSchema, OneOfSchemaBuilder};
pub use load::{Deserialized, LoadError, Loaded};
pub use manifest::{ManifestError, RegistryManifest};
pub use registry::{default_schema_name, schema_name_of, SchemaDescriptor, TypeRegistry};
pub use resolve::{FnResolver, KnownVariants, TypeNameResolver, TypeResolver};

pub use oneof_core::{
    DispatchContext, ErrorMessages, ErrorStore, LoadOptions, Partial, Schema, TypeName,
    UnknownPolicy, ValidationError, VariantOf,
};
