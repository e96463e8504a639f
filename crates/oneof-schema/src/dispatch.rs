//! # One-Of Schema Dispatch
//!
//! [`OneOfSchema`] multiplexes per-variant delegate schemas behind a single
//! [`Schema`]. Serializing resolves the value's discriminator, lets the
//! registered delegate produce the payload, and tags it with the
//! discriminator field. Deserializing reads the tag back, selects the
//! delegate, and hands it the payload (see `load.rs`).
//!
//! ## Invariants
//!
//! - The registry and configuration are frozen by
//!   [`OneOfSchemaBuilder::build`]; a built dispatcher is `Send + Sync` and
//!   can be shared across threads.
//! - Serialization never fails. Unknown or unsupported values degrade to a
//!   `{"_schema": "<message>"}` payload in place of the record.
//! - The effective delegate context is the delegate's own context overlaid
//!   by the caller's context: caller entries win on key collision.
//! - The discriminator is written last: if the delegate emits a field with
//!   the same name, it is overwritten.

use std::fmt;
use std::sync::Arc;

use oneof_core::{
    DispatchContext, LoadOptions, Schema, TypeName, UnknownPolicy, ValidationError, SCHEMA_KEY,
};
use serde_json::{Map, Value};

use crate::config::DispatchConfig;
use crate::registry::{SchemaDescriptor, TypeRegistry};
use crate::resolve::{FnResolver, TypeNameResolver, TypeResolver};

type NamingStrategy = Box<dyn FnMut(&str) -> String>;

/// Setup-time builder for a [`OneOfSchema`].
pub struct OneOfSchemaBuilder<T> {
    config: DispatchConfig,
    registry: TypeRegistry<T>,
    resolver: Arc<dyn TypeResolver<T>>,
    naming: NamingStrategy,
}

impl<T: TypeName + 'static> OneOfSchemaBuilder<T> {
    /// Default configuration, empty registry, type-name resolution.
    pub fn new() -> Self {
        Self {
            config: DispatchConfig::default(),
            registry: TypeRegistry::new(),
            resolver: Arc::new(TypeNameResolver),
            naming: Box::new(crate::registry::default_schema_name),
        }
    }
}

impl<T: TypeName + 'static> Default for OneOfSchemaBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> OneOfSchemaBuilder<T> {
    /// Replace the whole configuration.
    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Name of the discriminator field.
    pub fn type_field(mut self, name: impl Into<String>) -> Self {
        self.config.type_field = name.into();
        self
    }

    /// Whether the discriminator is stripped before the delegate loads.
    pub fn type_field_remove(mut self, remove: bool) -> Self {
        self.config.type_field_remove = remove;
        self
    }

    /// Default unknown-field policy.
    pub fn unknown(mut self, policy: UnknownPolicy) -> Self {
        self.config.unknown = policy;
        self
    }

    /// Whether many-load errors are keyed by element index.
    pub fn index_errors(mut self, enabled: bool) -> Self {
        self.config.index_errors = enabled;
        self
    }

    /// Install a custom classification strategy.
    pub fn resolver(mut self, resolver: impl TypeResolver<T> + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Install a classification closure.
    pub fn resolve_with<F>(self, f: F) -> Self
    where
        F: Fn(&T) -> Option<String> + Send + Sync + 'static,
    {
        self.resolver(FnResolver(f))
    }

    /// Override how [`register_one_of`](Self::register_one_of) derives a
    /// discriminator from a schema type name.
    pub fn naming(mut self, naming: impl FnMut(&str) -> String + 'static) -> Self {
        self.naming = Box::new(naming);
        self
    }

    /// Register a descriptor under an explicit discriminator.
    pub fn register(mut self, discriminator: impl Into<String>, descriptor: SchemaDescriptor<T>) -> Self {
        self.registry.register(discriminator, descriptor);
        self
    }

    /// Register a shared schema instance.
    pub fn register_instance(self, discriminator: impl Into<String>, schema: impl Schema<T> + 'static) -> Self {
        self.register(discriminator, SchemaDescriptor::instance(schema))
    }

    /// Register a schema built fresh for every dispatch call.
    pub fn register_factory<S, F>(self, discriminator: impl Into<String>, make: F) -> Self
    where
        S: Schema<T> + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.register(discriminator, SchemaDescriptor::factory(make))
    }

    /// Register schema type `S` under a discriminator derived from its type
    /// name by the naming strategy (by default `FooSchema` becomes `Foo`).
    pub fn register_one_of<S: Schema<T> + Default + 'static>(mut self) -> Self {
        let type_name = oneof_core::short_type_name::<S>();
        let discriminator = (self.naming)(type_name);
        tracing::debug!(
            schema = type_name,
            discriminator = %discriminator,
            "registering one-of schema"
        );
        self.registry.register(discriminator, SchemaDescriptor::of::<S>());
        self
    }

    /// Registry as populated so far.
    pub fn registry(&self) -> &TypeRegistry<T> {
        &self.registry
    }

    /// Freeze configuration and registry.
    pub fn build(self) -> OneOfSchema<T> {
        OneOfSchema {
            config: self.config,
            registry: self.registry,
            resolver: self.resolver,
        }
    }
}

/// A schema that dispatches to per-variant delegates by discriminator.
pub struct OneOfSchema<T> {
    pub(crate) config: DispatchConfig,
    pub(crate) registry: TypeRegistry<T>,
    resolver: Arc<dyn TypeResolver<T>>,
}

impl<T: TypeName + 'static> OneOfSchema<T> {
    /// Start building a dispatcher.
    pub fn builder() -> OneOfSchemaBuilder<T> {
        OneOfSchemaBuilder::new()
    }
}

impl<T> OneOfSchema<T> {
    /// The frozen configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// The frozen registry.
    pub fn registry(&self) -> &TypeRegistry<T> {
        &self.registry
    }

    /// Discriminator for `value`; empty results are treated as absent.
    pub fn resolve_type_for_value(&self, value: &T) -> Option<String> {
        self.resolver.resolve(value).filter(|t| !t.is_empty())
    }

    /// Registry lookup. `None` signals an unsupported type.
    pub fn resolve_schema_for_discriminator(&self, discriminator: &str) -> Option<&SchemaDescriptor<T>> {
        self.registry.get(discriminator)
    }
}

impl<T: TypeName> OneOfSchema<T> {
    /// Serialize one value and tag it with its discriminator.
    pub fn serialize(&self, value: &T, ctx: &DispatchContext) -> Value {
        let Some(obj_type) = self.resolve_type_for_value(value) else {
            return schema_error_payload(format!("Unknown object class: {}", value.type_name()));
        };

        let Some(descriptor) = self.resolve_schema_for_discriminator(&obj_type) else {
            tracing::debug!(obj_type = %obj_type, "no schema registered for object type");
            return schema_error_payload(format!("Unsupported object type: {obj_type}"));
        };

        let ctx = descriptor.context().merged_with(ctx);
        let mut result = descriptor.with_delegate(|schema| schema.serialize(value, &ctx));

        match &mut result {
            Value::Object(map) => {
                let previous = map.insert(self.config.type_field.clone(), Value::String(obj_type));
                if previous.is_some() {
                    tracing::debug!(
                        type_field = %self.config.type_field,
                        "delegate output already had the discriminator field; overwritten"
                    );
                }
            }
            Value::Null => {}
            other => {
                tracing::warn!(
                    obj_type = %obj_type,
                    kind = %other.type_name(),
                    "delegate produced a non-object payload; discriminator not added"
                );
            }
        }
        result
    }

    /// Serialize every element independently, preserving order. `None`
    /// serializes to `null`.
    pub fn serialize_many(&self, values: Option<&[T]>, ctx: &DispatchContext) -> Value {
        match values {
            Some(values) => Value::Array(values.iter().map(|v| self.serialize(v, ctx)).collect()),
            None => Value::Null,
        }
    }

    /// [`serialize`](Self::serialize) rendered as a JSON string.
    pub fn dumps(&self, value: &T, ctx: &DispatchContext) -> String {
        self.serialize(value, ctx).to_string()
    }

    /// [`serialize_many`](Self::serialize_many) rendered as a JSON string.
    pub fn dumps_many(&self, values: &[T], ctx: &DispatchContext) -> String {
        self.serialize_many(Some(values), ctx).to_string()
    }
}

/// Dispatchers are schemas themselves, so they can be registered as
/// delegates of other dispatchers.
impl<T: TypeName> Schema<T> for OneOfSchema<T> {
    fn serialize(&self, value: &T, ctx: &DispatchContext) -> Value {
        OneOfSchema::serialize(self, value, ctx)
    }

    fn deserialize(
        &self,
        data: &Value,
        options: &LoadOptions,
        ctx: &DispatchContext,
    ) -> Result<T, ValidationError> {
        self.load_type_schema(data, options, ctx)
    }
}

impl<T> fmt::Debug for OneOfSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneOfSchema")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

fn schema_error_payload(message: String) -> Value {
    let mut map = Map::new();
    map.insert(SCHEMA_KEY.to_string(), Value::String(message));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Emits the context it was handed, so tests can observe merging.
    struct ContextEcho;

    impl Schema<Value> for ContextEcho {
        fn serialize(&self, value: &Value, ctx: &DispatchContext) -> Value {
            json!({"value": value, "ctx": ctx})
        }

        fn deserialize(
            &self,
            data: &Value,
            _options: &LoadOptions,
            _ctx: &DispatchContext,
        ) -> Result<Value, ValidationError> {
            Ok(data.clone())
        }
    }

    struct Scalar(Value);

    impl Schema<Value> for Scalar {
        fn serialize(&self, _value: &Value, _ctx: &DispatchContext) -> Value {
            self.0.clone()
        }

        fn deserialize(
            &self,
            _data: &Value,
            _options: &LoadOptions,
            _ctx: &DispatchContext,
        ) -> Result<Value, ValidationError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_serialize_tags_output() {
        let schema = OneOfSchema::<Value>::builder()
            .register_instance("string", ContextEcho)
            .build();
        let out = schema.serialize(&json!("hi"), &DispatchContext::new());
        assert_eq!(out["type"], "string");
        assert_eq!(out["value"], "hi");
    }

    #[test]
    fn test_custom_type_field() {
        let schema = OneOfSchema::<Value>::builder()
            .type_field("kind")
            .register_instance("string", ContextEcho)
            .build();
        let out = schema.serialize(&json!("hi"), &DispatchContext::new());
        assert_eq!(out["kind"], "string");
        assert!(out.get("type").is_none());
    }

    #[test]
    fn test_unsupported_object_type() {
        let schema = OneOfSchema::<Value>::builder().build();
        let out = schema.serialize(&json!(5), &DispatchContext::new());
        assert_eq!(out, json!({"_schema": "Unsupported object type: number"}));
    }

    #[test]
    fn test_unknown_object_class() {
        let schema = OneOfSchema::<Value>::builder()
            .resolve_with(|_| Some(String::new()))
            .register_instance("", ContextEcho)
            .build();
        let out = schema.serialize(&json!([1]), &DispatchContext::new());
        assert_eq!(out, json!({"_schema": "Unknown object class: array"}));
    }

    #[test]
    fn test_unknown_object_class_when_unresolved() {
        let schema = OneOfSchema::<Value>::builder()
            .resolve_with(|_| None)
            .register_instance("object", ContextEcho)
            .build();
        let out = schema.serialize(&json!({"a": 1}), &DispatchContext::new());
        assert_eq!(out, json!({"_schema": "Unknown object class: object"}));
    }

    #[test]
    fn test_caller_context_overrides_delegate_context() {
        let delegate_ctx = DispatchContext::new().with("user", "delegate").with("locale", "fr");
        let schema = OneOfSchema::<Value>::builder()
            .register(
                "string",
                SchemaDescriptor::instance(ContextEcho).with_context(delegate_ctx),
            )
            .build();
        let caller_ctx = DispatchContext::new().with("user", "caller");
        let out = schema.serialize(&json!("x"), &caller_ctx);
        assert_eq!(out["ctx"], json!({"user": "caller", "locale": "fr"}));
    }

    #[test]
    fn test_discriminator_overwrites_delegate_field() {
        let schema = OneOfSchema::<Value>::builder()
            .register_instance("string", Scalar(json!({"type": "delegate", "a": 1})))
            .build();
        let out = schema.serialize(&json!("x"), &DispatchContext::new());
        assert_eq!(out, json!({"type": "string", "a": 1}));
    }

    #[test]
    fn test_null_delegate_output_is_not_tagged() {
        let schema = OneOfSchema::<Value>::builder()
            .register_instance("string", Scalar(Value::Null))
            .build();
        assert_eq!(schema.serialize(&json!("x"), &DispatchContext::new()), Value::Null);
    }

    #[test]
    fn test_serialize_many_preserves_order_and_isolates_failures() {
        let schema = OneOfSchema::<Value>::builder()
            .register_instance("string", ContextEcho)
            .build();
        let values = [json!("a"), json!(1), json!("b")];
        let out = schema.serialize_many(Some(&values[..]), &DispatchContext::new());
        let items = out.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["value"], "a");
        assert_eq!(items[1], json!({"_schema": "Unsupported object type: number"}));
        assert_eq!(items[2]["value"], "b");
    }

    #[test]
    fn test_serialize_many_none_is_null() {
        let schema = OneOfSchema::<Value>::builder().build();
        assert_eq!(schema.serialize_many(None, &DispatchContext::new()), Value::Null);
    }

    #[test]
    fn test_dumps_is_json_text() {
        let schema = OneOfSchema::<Value>::builder()
            .register_instance("string", Scalar(json!({"a": 1})))
            .build();
        let text = schema.dumps(&json!("x"), &DispatchContext::new());
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!({"a": 1, "type": "string"}));
    }
}
