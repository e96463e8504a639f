//! # CLI Command Tests
//!
//! Drives the subcommand handlers against manifest fixtures written to a
//! temporary directory.

use std::path::{Path, PathBuf};

use oneof_cli::load::{load_document, run_load, LoadArgs, LoadOutcome};
use oneof_cli::types::{list_types, TypesArgs};
use oneof_core::UnknownPolicy;
use serde_json::json;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Manifest with a `foo` (string value) and a `bar` (integer value) type.
fn fixture() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "foo.schema.json",
        r#"{"type": "object", "properties": {"value": {"type": "string"}}, "required": ["value"]}"#,
    );
    write(
        dir.path(),
        "bar.schema.yaml",
        "type: object\nproperties:\n  value:\n    type: integer\nrequired: [value]\n",
    );
    let manifest = write(
        dir.path(),
        "registry.yaml",
        "types:\n  foo: foo.schema.json\n  bar: bar.schema.yaml\n",
    );
    (dir, manifest)
}

fn load_args(registry: PathBuf, document: PathBuf) -> LoadArgs {
    LoadArgs {
        registry,
        document,
        many: false,
        partial: false,
        unknown: None,
    }
}

#[test]
fn types_lists_sorted_discriminators() {
    let (_dir, manifest) = fixture();
    let names = list_types(&TypesArgs { registry: manifest }).unwrap();
    assert_eq!(names, vec!["bar", "foo"]);
}

#[test]
fn load_single_document() {
    let (dir, manifest) = fixture();
    let doc = write(dir.path(), "doc.json", r#"{"type": "foo", "value": "hello"}"#);
    let outcome = load_document(&load_args(manifest, doc)).unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded(json!({"value": "hello"})));
}

#[test]
fn load_many_yaml_document_with_errors() {
    let (dir, manifest) = fixture();
    let doc = write(
        dir.path(),
        "batch.yaml",
        "- type: foo\n  value: hello\n- type: bar\n  value: 1\n- type: nope\n",
    );
    let mut args = load_args(manifest, doc);
    args.many = true;

    let outcome = load_document(&args).unwrap();
    assert_eq!(
        outcome,
        LoadOutcome::Failed(json!({"2": {"type": ["Unsupported value: nope"]}}))
    );
    assert_eq!(run_load(&args).unwrap(), 1);
}

#[test]
fn unknown_policy_flag_overrides_manifest() {
    let (dir, manifest) = fixture();
    let doc = write(dir.path(), "doc.json", r#"{"type": "bar", "value": 1, "extra": true}"#);

    let mut args = load_args(manifest, doc);
    let outcome = load_document(&args).unwrap();
    assert_eq!(outcome, LoadOutcome::Failed(json!({"extra": ["Unknown field."]})));

    args.unknown = Some(UnknownPolicy::Exclude);
    let outcome = load_document(&args).unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded(json!({"value": 1})));
    assert_eq!(run_load(&args).unwrap(), 0);
}

#[test]
fn partial_flag_relaxes_required() {
    let (dir, manifest) = fixture();
    let doc = write(dir.path(), "doc.json", r#"{"type": "foo"}"#);

    let mut args = load_args(manifest, doc);
    assert!(matches!(load_document(&args).unwrap(), LoadOutcome::Failed(_)));

    args.partial = true;
    assert_eq!(load_document(&args).unwrap(), LoadOutcome::Loaded(json!({})));
}

#[test]
fn missing_document_is_operational_error() {
    let (dir, manifest) = fixture();
    let args = load_args(manifest, dir.path().join("absent.json"));
    assert!(load_document(&args).is_err());
}

#[test]
fn missing_manifest_is_operational_error() {
    let dir = tempfile::tempdir().unwrap();
    let args = TypesArgs {
        registry: dir.path().join("registry.yaml"),
    };
    assert!(list_types(&args).is_err());
}
