//! # Types Subcommand
//!
//! Lists the discriminators registered by a manifest, one per line.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

/// Arguments for the `oneof types` subcommand.
#[derive(Args, Debug)]
pub struct TypesArgs {
    /// Registry manifest (YAML or JSON).
    #[arg(long, value_name = "MANIFEST")]
    pub registry: PathBuf,
}

/// Execute the types subcommand.
pub fn run_types(args: &TypesArgs) -> Result<u8> {
    for name in list_types(args)? {
        println!("{name}");
    }
    Ok(0)
}

/// Registered discriminators, sorted.
pub fn list_types(args: &TypesArgs) -> Result<Vec<String>> {
    let schema = crate::build_dispatcher(&args.registry)?;
    Ok(schema
        .registry()
        .discriminators()
        .into_iter()
        .map(str::to_string)
        .collect())
}
