//! # oneof-cli: Command-Line Front End
//!
//! Provides the `oneof` binary, which builds a dispatcher from a registry
//! manifest and runs documents through it.
//!
//! ## Subcommands
//!
//! - `oneof load`: load a JSON or YAML document and print the result or
//!   the structured error map.
//! - `oneof types`: list the discriminators a manifest registers.
//!
//! ```bash
//! oneof load --registry registry.yaml record.json
//! oneof load --registry registry.yaml batch.yaml --many --unknown exclude
//! oneof types --registry registry.yaml
//! ```
//!
//! ## Exit Codes
//!
//! Handlers return `0` on success and `1` when the input failed
//! validation. Operational errors (unreadable files, broken manifests)
//! surface as `Err` and the binary exits with `2`.

pub mod load;
pub mod types;

use std::path::Path;

use anyhow::{Context, Result};
use oneof_schema::{OneOfSchema, RegistryManifest};
use serde_json::Value;

/// Load a manifest and build its dispatcher.
pub fn build_dispatcher(manifest: &Path) -> Result<OneOfSchema<Value>> {
    let manifest = RegistryManifest::load(manifest)
        .with_context(|| format!("failed to load registry manifest {}", manifest.display()))?;
    manifest.build().context("failed to build dispatcher from manifest")
}
