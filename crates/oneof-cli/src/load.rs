//! # Load Subcommand
//!
//! Runs a JSON or YAML document through a manifest's dispatcher. A single
//! mapping is loaded by default; `--many` treats the document as an array
//! of mappings and reports errors per element index.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use oneof_core::{DispatchContext, LoadOptions, UnknownPolicy};
use oneof_schema::manifest::read_document;
use serde_json::Value;

/// Arguments for the `oneof load` subcommand.
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Registry manifest (YAML or JSON).
    #[arg(long, value_name = "MANIFEST")]
    pub registry: PathBuf,

    /// Document to load.
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// Treat the document as an array of tagged mappings.
    #[arg(long)]
    pub many: bool,

    /// Do not require fields marked required.
    #[arg(long)]
    pub partial: bool,

    /// Unknown-field policy: raise, exclude or include. Defaults to the
    /// manifest's setting.
    #[arg(long, value_name = "POLICY")]
    pub unknown: Option<UnknownPolicy>,
}

impl LoadArgs {
    fn options(&self) -> LoadOptions {
        let mut options = LoadOptions::new().partial(self.partial);
        if let Some(policy) = self.unknown {
            options = options.unknown(policy);
        }
        options
    }
}

/// Result of loading a document.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Every mapping loaded; holds the loaded JSON.
    Loaded(Value),
    /// At least one error was recorded; holds the error map.
    Failed(Value),
}

/// Execute the load subcommand.
///
/// Returns exit code: 0 on success, 1 on validation failure.
pub fn run_load(args: &LoadArgs) -> Result<u8> {
    match load_document(args)? {
        LoadOutcome::Loaded(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(0)
        }
        LoadOutcome::Failed(errors) => {
            println!("{}", serde_json::to_string_pretty(&errors)?);
            Ok(1)
        }
    }
}

/// Load the document named by `args` without printing anything.
pub fn load_document(args: &LoadArgs) -> Result<LoadOutcome> {
    let schema = crate::build_dispatcher(&args.registry)?;
    let data: Value = read_document(&args.document)
        .with_context(|| format!("failed to read document {}", args.document.display()))?;

    let options = args.options();
    let ctx = DispatchContext::new();
    tracing::info!(
        document = %args.document.display(),
        many = args.many,
        "loading document"
    );

    let outcome = if args.many {
        match schema.load_many(&data, &options, &ctx) {
            Ok(values) => LoadOutcome::Loaded(Value::Array(values)),
            Err(err) => LoadOutcome::Failed(err.errors.to_value()),
        }
    } else {
        match schema.load(&data, &options, &ctx) {
            Ok(value) => LoadOutcome::Loaded(value),
            Err(err) => LoadOutcome::Failed(err.errors.to_value()),
        }
    };

    if let LoadOutcome::Failed(errors) = &outcome {
        tracing::warn!(errors = %errors, "document failed validation");
    }
    Ok(outcome)
}
