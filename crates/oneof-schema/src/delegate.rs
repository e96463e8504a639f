//! # Delegate Schemas
//!
//! Concrete per-variant schemas the dispatcher can route to.
//!
//! - [`JsonSchemaDelegate`] validates a JSON object against a JSON Schema
//!   document (Draft 2020-12) and yields the cleaned object.
//! - [`TypedSchema`] turns a serde type into a delegate, optionally
//!   validating the payload with a [`JsonSchemaDelegate`] first so errors
//!   come back keyed by field.
//!
//! ## Field Keying
//!
//! Violations reported by the validator are keyed by the first segment of
//! their instance path (`/value/0` is recorded under `value`). Violations
//! at the document root are recorded under `_schema`.
//!
//! ## Required and Unknown Fields
//!
//! Top-level `required` and `properties` are enforced here rather than by
//! the compiled validator, so that partial loads can relax `required` and
//! the unknown-field policy can be applied per call. Everything else in the
//! document is the validator's business.
//!
//! ## Schema Resolution
//!
//! Cross-document `$ref`s are resolved by a [`LocalRetriever`] from
//! documents already loaded in memory; no network requests are made.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use jsonschema::{Retrieve, Uri, Validator};
use oneof_core::messages::{INVALID_INPUT_TYPE, MISSING_REQUIRED, UNKNOWN_FIELD};
use oneof_core::{
    DispatchContext, ErrorMessages, LoadOptions, Schema, UnknownPolicy, ValidationError,
    VariantOf, SCHEMA_KEY,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Error building a delegate from a schema document.
#[derive(Error, Debug)]
pub enum DelegateError {
    /// The document is not a JSON object.
    #[error("schema '{schema_name}' must be a JSON object")]
    NotAnObject {
        /// Schema name or path.
        schema_name: String,
    },

    /// The compiled validator could not be built.
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuild {
        /// Schema name or path.
        schema_name: String,
        /// Reason reported by the validator.
        reason: String,
    },
}

/// Resolves `$ref` URIs against documents held in memory.
///
/// Documents are indexed by every key they were registered under (file
/// name, `$id`, ...). A URI is looked up directly, then by its last path
/// segment.
#[derive(Debug, Clone, Default)]
pub struct LocalRetriever {
    documents: Arc<HashMap<String, Value>>,
}

impl LocalRetriever {
    /// Build from `key -> document` pairs.
    pub fn new(documents: HashMap<String, Value>) -> Self {
        Self {
            documents: Arc::new(documents),
        }
    }

    /// Number of indexed keys.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if no documents are indexed.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn lookup(&self, uri: &str) -> Option<&Value> {
        if let Some(doc) = self.documents.get(uri) {
            return Some(doc);
        }
        let filename = uri.rsplit('/').next().unwrap_or(uri);
        self.documents.get(filename)
    }
}

impl Retrieve for LocalRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        self.lookup(uri_str)
            .cloned()
            .ok_or_else(|| format!("schema '{uri_str}' is not loaded").into())
    }
}

/// A delegate that validates objects against a JSON Schema document.
pub struct JsonSchemaDelegate {
    name: String,
    document: Value,
    properties: Option<BTreeSet<String>>,
    required: Vec<String>,
    validator: Validator,
}

impl JsonSchemaDelegate {
    /// Compile `document` with no cross-document references.
    pub fn new(name: impl Into<String>, document: Value) -> Result<Self, DelegateError> {
        Self::with_retriever(name, document, LocalRetriever::default())
    }

    /// Compile `document`, resolving `$ref`s through `retriever`.
    pub fn with_retriever(
        name: impl Into<String>,
        document: Value,
        retriever: LocalRetriever,
    ) -> Result<Self, DelegateError> {
        let name = name.into();
        let Value::Object(top) = &document else {
            return Err(DelegateError::NotAnObject { schema_name: name });
        };

        let properties = top
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect());
        let required: Vec<String> = top
            .get("required")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();

        // `required` is checked by hand so partial loads can relax it.
        let mut compiled = top.clone();
        compiled.remove("required");

        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        opts.with_retriever(retriever);
        let validator = opts.build(&Value::Object(compiled)).map_err(|e| {
            DelegateError::ValidatorBuild {
                schema_name: name.clone(),
                reason: e.to_string(),
            }
        })?;

        tracing::debug!(schema = %name, required = required.len(), "compiled delegate schema");

        Ok(Self {
            name,
            document,
            properties,
            required,
            validator,
        })
    }

    /// Name the delegate was built under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The original schema document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Declared top-level fields, if the document declares `properties`.
    pub fn properties(&self) -> Option<&BTreeSet<String>> {
        self.properties.as_ref()
    }

    /// Declared top-level required fields.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    fn is_declared(&self, field: &str) -> bool {
        self.properties
            .as_ref()
            .map_or(true, |props| props.contains(field))
    }

    /// Validate one object, returning the cleaned object.
    ///
    /// On failure the returned error's `valid_data` holds the fields that
    /// carried no error.
    pub fn validate_object(
        &self,
        input: &Map<String, Value>,
        options: &LoadOptions,
    ) -> Result<Map<String, Value>, ValidationError> {
        let policy = options.unknown_or(UnknownPolicy::Raise);
        let mut errors = ErrorMessages::new();
        let mut data = Map::new();

        for (field, value) in input {
            if self.is_declared(field) || policy == UnknownPolicy::Include {
                data.insert(field.clone(), value.clone());
            } else if policy == UnknownPolicy::Raise {
                errors.add(field.clone(), UNKNOWN_FIELD);
            }
        }

        for field in &self.required {
            if !data.contains_key(field) && !options.partial.allows_missing(field) {
                errors.add(field.clone(), MISSING_REQUIRED);
            }
        }

        let instance = Value::Object(data.clone());
        for violation in self.validator.iter_errors(&instance) {
            let path = violation.instance_path.to_string();
            let field = first_segment(&path).unwrap_or_else(|| SCHEMA_KEY.to_string());
            errors.add(field, violation.to_string());
        }

        if errors.is_empty() {
            return Ok(data);
        }

        let valid: Map<String, Value> = data
            .into_iter()
            .filter(|(field, _)| !errors.contains_field(field))
            .collect();
        Err(ValidationError::new(errors).with_valid_data(valid))
    }
}

impl Schema<Value> for JsonSchemaDelegate {
    fn serialize(&self, value: &Value, _ctx: &DispatchContext) -> Value {
        value.clone()
    }

    fn deserialize(
        &self,
        data: &Value,
        options: &LoadOptions,
        _ctx: &DispatchContext,
    ) -> Result<Value, ValidationError> {
        let Value::Object(map) = data else {
            return Err(ValidationError::schema(INVALID_INPUT_TYPE));
        };
        self.validate_object(map, options).map(Value::Object)
    }
}

impl fmt::Debug for JsonSchemaDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaDelegate")
            .field("name", &self.name)
            .field("properties", &self.properties)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// First segment of a JSON Pointer, unescaped. `None` for the root.
fn first_segment(pointer: &str) -> Option<String> {
    let rest = pointer.strip_prefix('/')?;
    let segment = rest.split('/').next().unwrap_or(rest);
    Some(segment.replace("~1", "/").replace("~0", "~"))
}

/// A delegate for the serde type `V`, a variant of the dispatcher's `T`.
pub struct TypedSchema<V> {
    shape: Option<JsonSchemaDelegate>,
    _variant: PhantomData<fn() -> V>,
}

impl<V> TypedSchema<V> {
    /// Load with serde alone.
    pub fn new() -> Self {
        Self {
            shape: None,
            _variant: PhantomData,
        }
    }

    /// Validate the payload against `shape` before handing it to serde.
    pub fn with_json_schema(shape: JsonSchemaDelegate) -> Self {
        Self {
            shape: Some(shape),
            _variant: PhantomData,
        }
    }

    /// The validating shape, if any.
    pub fn shape(&self) -> Option<&JsonSchemaDelegate> {
        self.shape.as_ref()
    }
}

impl<V> Default for TypedSchema<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for TypedSchema<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedSchema")
            .field("variant", &std::any::type_name::<V>())
            .field("shape", &self.shape)
            .finish()
    }
}

impl<T, V> Schema<T> for TypedSchema<V>
where
    V: VariantOf<T> + Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &T, _ctx: &DispatchContext) -> Value {
        let Some(variant) = V::from_parent(value) else {
            tracing::warn!(
                variant = std::any::type_name::<V>(),
                "value does not hold the variant this schema serializes"
            );
            return Value::Null;
        };
        match serde_json::to_value(variant) {
            Ok(value) => value,
            Err(e) => {
                let mut map = Map::new();
                map.insert(SCHEMA_KEY.to_string(), Value::String(e.to_string()));
                Value::Object(map)
            }
        }
    }

    fn deserialize(
        &self,
        data: &Value,
        options: &LoadOptions,
        _ctx: &DispatchContext,
    ) -> Result<T, ValidationError> {
        let Value::Object(map) = data else {
            return Err(ValidationError::schema(INVALID_INPUT_TYPE));
        };
        let map = match &self.shape {
            Some(shape) => shape.validate_object(map, options)?,
            None => map.clone(),
        };
        match serde_json::from_value::<V>(Value::Object(map.clone())) {
            Ok(variant) => Ok(variant.into_parent()),
            Err(e) => Err(ValidationError::schema(e.to_string()).with_valid_data(map)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oneof_core::Partial;
    use serde::Deserialize;
    use serde_json::json;

    fn foo_document() -> Value {
        json!({
            "type": "object",
            "properties": {
                "value": {"type": "string"},
                "note": {"type": "string", "maxLength": 3}
            },
            "required": ["value"]
        })
    }

    fn foo_delegate() -> JsonSchemaDelegate {
        JsonSchemaDelegate::new("foo", foo_document()).unwrap()
    }

    #[test]
    fn test_accepts_valid_object() {
        let out = foo_delegate()
            .deserialize(&json!({"value": "x"}), &LoadOptions::new(), &DispatchContext::new())
            .unwrap();
        assert_eq!(out, json!({"value": "x"}));
    }

    #[test]
    fn test_declared_fields_extracted() {
        let d = foo_delegate();
        assert_eq!(d.required(), ["value"]);
        let props: Vec<&str> = d.properties().unwrap().iter().map(String::as_str).collect();
        assert_eq!(props, vec!["note", "value"]);
        assert!(!d.document()["required"].is_null());
    }

    #[test]
    fn test_required_field_missing() {
        let err = foo_delegate()
            .deserialize(&json!({}), &LoadOptions::new(), &DispatchContext::new())
            .unwrap_err();
        assert_eq!(err.messages.get("value").unwrap(), [MISSING_REQUIRED]);
    }

    #[test]
    fn test_partial_relaxes_required() {
        let d = foo_delegate();
        let ctx = DispatchContext::new();
        assert!(d.deserialize(&json!({}), &LoadOptions::new().partial(true), &ctx).is_ok());
        let only_value = LoadOptions::new().partial(Partial::fields(["value"]));
        assert!(d.deserialize(&json!({}), &only_value, &ctx).is_ok());
        let other = LoadOptions::new().partial(Partial::fields(["note"]));
        assert!(d.deserialize(&json!({}), &other, &ctx).is_err());
    }

    #[test]
    fn test_unknown_field_policies() {
        let d = foo_delegate();
        let ctx = DispatchContext::new();
        let input = json!({"value": "x", "extra": 1});

        let err = d
            .deserialize(&input, &LoadOptions::new().unknown(UnknownPolicy::Raise), &ctx)
            .unwrap_err();
        assert_eq!(err.messages.get("extra").unwrap(), [UNKNOWN_FIELD]);
        assert_eq!(err.valid_data.unwrap().get("value"), Some(&json!("x")));

        let out = d
            .deserialize(&input, &LoadOptions::new().unknown(UnknownPolicy::Exclude), &ctx)
            .unwrap();
        assert_eq!(out, json!({"value": "x"}));

        let out = d
            .deserialize(&input, &LoadOptions::new().unknown(UnknownPolicy::Include), &ctx)
            .unwrap();
        assert_eq!(out, json!({"value": "x", "extra": 1}));
    }

    #[test]
    fn test_violation_keyed_by_field() {
        let err = foo_delegate()
            .deserialize(
                &json!({"value": "x", "note": "too long"}),
                &LoadOptions::new(),
                &DispatchContext::new(),
            )
            .unwrap_err();
        assert!(err.messages.contains_field("note"));
        let valid = err.valid_data.unwrap();
        assert!(valid.contains_key("value"));
        assert!(!valid.contains_key("note"));
    }

    #[test]
    fn test_root_violation_keyed_under_schema() {
        let d = JsonSchemaDelegate::new("small", json!({"type": "object", "maxProperties": 1})).unwrap();
        let err = d
            .deserialize(&json!({"a": 1, "b": 2}), &LoadOptions::new(), &DispatchContext::new())
            .unwrap_err();
        assert!(err.messages.contains_field(SCHEMA_KEY));
    }

    #[test]
    fn test_non_object_rejected() {
        let err = foo_delegate()
            .deserialize(&json!([1]), &LoadOptions::new(), &DispatchContext::new())
            .unwrap_err();
        assert_eq!(err.messages.get(SCHEMA_KEY).unwrap(), [INVALID_INPUT_TYPE]);
    }

    #[test]
    fn test_non_object_document_rejected() {
        let err = JsonSchemaDelegate::new("bad", json!(true)).unwrap_err();
        assert!(matches!(err, DelegateError::NotAnObject { .. }));
    }

    #[test]
    fn test_cross_document_ref() {
        let mut docs = HashMap::new();
        docs.insert(
            "name.schema.json".to_string(),
            json!({"type": "string", "minLength": 1}),
        );
        let d = JsonSchemaDelegate::with_retriever(
            "person",
            json!({
                "$id": "https://example.test/schemas/person.schema.json",
                "type": "object",
                "properties": {"name": {"$ref": "name.schema.json"}}
            }),
            LocalRetriever::new(docs),
        )
        .unwrap();
        let ctx = DispatchContext::new();
        assert!(d.deserialize(&json!({"name": "Ada"}), &LoadOptions::new(), &ctx).is_ok());
        let err = d
            .deserialize(&json!({"name": ""}), &LoadOptions::new(), &ctx)
            .unwrap_err();
        assert!(err.messages.contains_field("name"));
    }

    #[test]
    fn test_first_segment() {
        assert_eq!(first_segment(""), None);
        assert_eq!(first_segment("/value"), Some("value".to_string()));
        assert_eq!(first_segment("/items/0"), Some("items".to_string()));
        assert_eq!(first_segment("/a~1b"), Some("a/b".to_string()));
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Point {
        x: i64,
        y: i64,
    }

    #[test]
    fn test_typed_schema_round_trip() {
        let schema = TypedSchema::<Point>::new();
        let ctx = DispatchContext::new();
        let p = Point { x: 1, y: 2 };
        let data = Schema::<Point>::serialize(&schema, &p, &ctx);
        assert_eq!(data, json!({"x": 1, "y": 2}));
        let back = Schema::<Point>::deserialize(&schema, &data, &LoadOptions::new(), &ctx).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_typed_schema_serde_error_under_schema_key() {
        let schema = TypedSchema::<Point>::new();
        let err = Schema::<Point>::deserialize(
            &schema,
            &json!({"x": "one", "y": 2}),
            &LoadOptions::new(),
            &DispatchContext::new(),
        )
        .unwrap_err();
        assert!(err.messages.contains_field(SCHEMA_KEY));
        assert!(err.valid_data.is_some());
    }
}
