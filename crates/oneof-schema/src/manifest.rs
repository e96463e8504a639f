//! # Registry Manifests
//!
//! A manifest configures a JSON-level dispatcher from files: dispatch
//! settings plus a `discriminator -> schema file` table.
//!
//! ```yaml
//! type_field: type
//! type_field_remove: true
//! unknown: raise
//! types:
//!   foo: foo.schema.json
//!   bar: schemas/bar.schema.yaml
//! ```
//!
//! Schema paths are resolved relative to the manifest. Manifests and
//! schema documents may be YAML (`.yaml`/`.yml`) or JSON (anything else).
//! Every listed document is also made available to every other one for
//! `$ref` resolution, under its file name and its `$id`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::DispatchConfig;
use crate::delegate::{DelegateError, JsonSchemaDelegate, LocalRetriever};
use crate::dispatch::OneOfSchema;

/// Error loading a manifest or building its dispatcher.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// A file could not be read.
    #[error("cannot read '{path}': {source}")]
    Io {
        /// File that failed to read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A file could not be parsed.
    #[error("cannot parse '{path}': {reason}")]
    Parse {
        /// File that failed to parse.
        path: String,
        /// Parser message.
        reason: String,
    },

    /// A schema document could not be compiled.
    #[error("schema for type '{discriminator}' is invalid: {source}")]
    Delegate {
        /// Discriminator the schema is registered under.
        discriminator: String,
        /// Build failure.
        #[source]
        source: DelegateError,
    },
}

/// Parsed manifest file.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryManifest {
    /// Dispatch settings.
    #[serde(flatten)]
    pub config: DispatchConfig,
    /// Discriminator to schema path, as written in the file.
    #[serde(default)]
    pub types: BTreeMap<String, PathBuf>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl RegistryManifest {
    /// Read and parse a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let mut manifest: RegistryManifest = read_document(path)?;
        manifest.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        tracing::debug!(
            path = %path.display(),
            types = manifest.types.len(),
            "loaded registry manifest"
        );
        Ok(manifest)
    }

    /// Directory schema paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolved path of every schema document, by discriminator.
    pub fn schema_paths(&self) -> impl Iterator<Item = (&str, PathBuf)> + '_ {
        self.types
            .iter()
            .map(|(name, rel)| (name.as_str(), self.base_dir.join(rel)))
    }

    /// Load every schema document and build the dispatcher.
    pub fn build(&self) -> Result<OneOfSchema<Value>, ManifestError> {
        let mut documents: Vec<(&str, Value)> = Vec::with_capacity(self.types.len());
        let mut resources: HashMap<String, Value> = HashMap::new();

        for (discriminator, path) in self.schema_paths() {
            let document: Value = read_document(&path)?;
            if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
                resources.insert(filename.to_string(), document.clone());
            }
            if let Some(id) = document.get("$id").and_then(Value::as_str) {
                resources.insert(id.to_string(), document.clone());
            }
            documents.push((discriminator, document));
        }

        let retriever = LocalRetriever::new(resources);
        let mut builder = OneOfSchema::<Value>::builder().config(self.config.clone());
        for (discriminator, document) in documents {
            let delegate = JsonSchemaDelegate::with_retriever(discriminator, document, retriever.clone())
                .map_err(|source| ManifestError::Delegate {
                    discriminator: discriminator.to_string(),
                    source,
                })?;
            builder = builder.register_instance(discriminator, delegate);
        }

        let schema = builder.build();
        tracing::info!(
            types = schema.registry().len(),
            type_field = %schema.config().type_field,
            "built dispatcher from manifest"
        );
        Ok(schema)
    }
}

/// Read a YAML or JSON file, choosing the parser by extension.
pub fn read_document<D: DeserializeOwned>(path: &Path) -> Result<D, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parsed = match ext {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
        _ => serde_json::from_str(&content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|reason| ManifestError::Parse {
        path: path.display().to_string(),
        reason,
    })
}
