//! # oneof-core: Foundational Types for Schema Dispatch
//!
//! This crate defines the contract between the polymorphic dispatcher in
//! `oneof-schema` and the per-variant schemas it delegates to. It depends
//! on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One capability trait.** [`Schema`] is the only seam. A ready-made
//!    schema instance, a freshly constructed schema, and the dispatcher
//!    itself all implement it, so dispatchers nest.
//!
//! 2. **Explicit ambient state.** [`DispatchContext`] is passed into every
//!    call instead of living as shared mutable state on a schema.
//!
//! 3. **Errors are data.** [`ValidationError`] carries field-keyed message
//!    lists plus whatever partially valid data survived. [`ErrorStore`]
//!    aggregates them per element index for batch loads.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `oneof-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod context;
pub mod error;
pub mod options;
pub mod schema;
pub mod store;

// Re-export primary types for ergonomic imports.
pub use context::DispatchContext;
pub use error::{messages, ErrorMessages, ValidationError, SCHEMA_KEY};
pub use options::{LoadOptions, Partial, UnknownPolicy};
pub use schema::{short_type_name, Schema, TypeName, VariantOf};
pub use store::ErrorStore;
