//! # Deserialize Path
//!
//! Reads the discriminator out of each mapping, selects the registered
//! delegate, and lets it load the remaining payload.
//!
//! ## Error Regime
//!
//! [`OneOfSchema::load_type_schema`] reports failure of a single mapping
//! by returning a [`ValidationError`]. [`OneOfSchema::deserialize`]
//! catches it, records its messages in the caller's [`ErrorStore`] under
//! the element index, and substitutes whatever partially valid data the
//! error carried. A many-load therefore yields one result per input
//! element, in input order, whether or not that element loaded.

use std::fmt;

use oneof_core::messages::{INVALID_INPUT_TYPE, MISSING_REQUIRED};
use oneof_core::{DispatchContext, ErrorStore, LoadOptions, ValidationError};
use serde_json::{Map, Value};

use crate::collection::{display_value, is_collection, is_falsy, is_mapping, is_unhashable};
use crate::dispatch::OneOfSchema;

/// Outcome for one input mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<T> {
    /// The delegate produced a value.
    Valid(T),
    /// Loading failed; holds the data that survived validation.
    Invalid(Map<String, Value>),
}

impl<T> Loaded<T> {
    /// Returns true for [`Loaded::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Borrow the loaded value.
    pub fn as_valid(&self) -> Option<&T> {
        match self {
            Self::Valid(v) => Some(v),
            Self::Invalid(_) => None,
        }
    }

    /// Take the loaded value.
    pub fn into_valid(self) -> Option<T> {
        match self {
            Self::Valid(v) => Some(v),
            Self::Invalid(_) => None,
        }
    }

    /// Borrow the surviving data of a failed load.
    pub fn as_invalid(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(data) => Some(data),
        }
    }
}

/// Result shape of [`OneOfSchema::deserialize`].
#[derive(Debug, Clone, PartialEq)]
pub enum Deserialized<T> {
    /// Single-mapping load.
    One(Loaded<T>),
    /// Collection load, aligned with the input.
    Many(Vec<Loaded<T>>),
}

impl<T> Deserialized<T> {
    /// Flatten into a list of per-element outcomes.
    pub fn into_vec(self) -> Vec<Loaded<T>> {
        match self {
            Self::One(loaded) => vec![loaded],
            Self::Many(items) => items,
        }
    }
}

/// A load that recorded at least one error.
#[derive(Debug)]
pub struct LoadError<T> {
    /// Every error recorded during the load.
    pub errors: ErrorStore,
    /// Per-element outcomes, aligned with the input.
    pub results: Vec<Loaded<T>>,
}

impl<T> fmt::Display for LoadError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load failed with {} error(s): {}", self.errors.len(), self.errors.to_value())
    }
}

impl<T: fmt::Debug> std::error::Error for LoadError<T> {}

impl<T> OneOfSchema<T> {
    /// Deserialize a mapping (`many = false`) or an array of mappings
    /// (`many = true`), recording errors into `errors` at `index`.
    pub fn deserialize(
        &self,
        data: &Value,
        many: bool,
        options: &LoadOptions,
        ctx: &DispatchContext,
        errors: &mut ErrorStore,
        index: Option<usize>,
    ) -> Deserialized<T> {
        if !many {
            return Deserialized::One(self.deserialize_one(data, options, ctx, errors, index));
        }

        let index = self.error_index(index);
        if !is_collection(data) {
            errors.store_schema_error(INVALID_INPUT_TYPE, index);
            return Deserialized::Many(Vec::new());
        }
        let items = data.as_array().map(Vec::as_slice).unwrap_or_default();

        let loaded = items
            .iter()
            .enumerate()
            .map(|(idx, item)| self.deserialize_one(item, options, ctx, errors, Some(idx)))
            .collect();
        Deserialized::Many(loaded)
    }

    fn deserialize_one(
        &self,
        data: &Value,
        options: &LoadOptions,
        ctx: &DispatchContext,
        errors: &mut ErrorStore,
        index: Option<usize>,
    ) -> Loaded<T> {
        let index = self.error_index(index);
        if !is_mapping(data) {
            errors.store_schema_error(INVALID_INPUT_TYPE, index);
            return Loaded::Invalid(Map::new());
        }

        match self.load_type_schema(data, options, ctx) {
            Ok(value) => Loaded::Valid(value),
            Err(err) => {
                tracing::debug!(index = ?index, errors = %err.messages, "element failed to load");
                errors.store_error(err.messages, index);
                Loaded::Invalid(err.valid_data.unwrap_or_default())
            }
        }
    }

    fn error_index(&self, index: Option<usize>) -> Option<usize> {
        if self.config.index_errors {
            index
        } else {
            None
        }
    }

    /// Resolve the delegate for one mapping and let it load the payload.
    ///
    /// The input is never mutated: the discriminator is stripped from a
    /// shallow copy (when `type_field_remove` is set) and the copy is what
    /// the delegate sees. The delegate's result is returned unchanged.
    pub fn load_type_schema(
        &self,
        data: &Value,
        options: &LoadOptions,
        ctx: &DispatchContext,
    ) -> Result<T, ValidationError> {
        let Value::Object(map) = data else {
            return Err(ValidationError::schema(format!("Invalid data type: {data}")));
        };

        let type_field = self.config.type_field.as_str();
        let mut payload = map.clone();
        let data_type = if self.config.type_field_remove {
            payload.remove(type_field)
        } else {
            payload.get(type_field).cloned()
        };

        let data_type = match data_type {
            Some(value) if !is_falsy(&value) => value,
            _ => return Err(ValidationError::field(type_field, MISSING_REQUIRED)),
        };

        if is_unhashable(&data_type) {
            return Err(ValidationError::field(
                type_field,
                format!("Invalid value: {data_type}"),
            ));
        }

        let descriptor = data_type
            .as_str()
            .and_then(|discriminator| self.resolve_schema_for_discriminator(discriminator));
        let Some(descriptor) = descriptor else {
            return Err(ValidationError::field(
                type_field,
                format!("Unsupported value: {}", display_value(&data_type)),
            ));
        };

        let ctx = descriptor.context().merged_with(ctx);
        let options = LoadOptions {
            partial: options.partial.clone(),
            unknown: Some(options.unknown_or(self.config.unknown)),
        };
        let payload = Value::Object(payload);
        descriptor.with_delegate(|schema| schema.deserialize(&payload, &options, &ctx))
    }

    /// Load a single mapping, failing if any error was recorded.
    pub fn load(
        &self,
        data: &Value,
        options: &LoadOptions,
        ctx: &DispatchContext,
    ) -> Result<T, LoadError<T>> {
        let mut errors = ErrorStore::new();
        let loaded = self.deserialize(data, false, options, ctx, &mut errors, None);
        match loaded {
            Deserialized::One(Loaded::Valid(value)) if errors.is_empty() => Ok(value),
            other => Err(LoadError {
                errors,
                results: other.into_vec(),
            }),
        }
    }

    /// Load an array of mappings, failing if any element recorded an error.
    pub fn load_many(
        &self,
        data: &Value,
        options: &LoadOptions,
        ctx: &DispatchContext,
    ) -> Result<Vec<T>, LoadError<T>> {
        let mut errors = ErrorStore::new();
        let results = self.deserialize(data, true, options, ctx, &mut errors, None).into_vec();
        if !errors.is_empty() || !results.iter().all(Loaded::is_valid) {
            return Err(LoadError { errors, results });
        }
        Ok(results.into_iter().filter_map(Loaded::into_valid).collect())
    }

    /// Parse JSON text and [`load`](Self::load) it.
    pub fn loads(
        &self,
        json: &str,
        options: &LoadOptions,
        ctx: &DispatchContext,
    ) -> Result<T, LoadError<T>> {
        let data = parse_json::<T>(json)?;
        self.load(&data, options, ctx)
    }

    /// Parse JSON text and [`load_many`](Self::load_many) it.
    pub fn loads_many(
        &self,
        json: &str,
        options: &LoadOptions,
        ctx: &DispatchContext,
    ) -> Result<Vec<T>, LoadError<T>> {
        let data = parse_json::<T>(json)?;
        self.load_many(&data, options, ctx)
    }

    /// Run a load and return only the recorded errors.
    pub fn validate(
        &self,
        data: &Value,
        many: bool,
        options: &LoadOptions,
        ctx: &DispatchContext,
    ) -> ErrorStore {
        let mut errors = ErrorStore::new();
        let _ = self.deserialize(data, many, options, ctx, &mut errors, None);
        errors
    }
}

fn parse_json<T>(json: &str) -> Result<Value, LoadError<T>> {
    serde_json::from_str(json).map_err(|e| {
        let mut errors = ErrorStore::new();
        errors.store_schema_error(format!("Invalid JSON: {e}"), None);
        LoadError {
            errors,
            results: Vec::new(),
        }
    })
}
