//! # The Schema Capability
//!
//! A [`Schema`] converts between a typed value and its structured JSON
//! representation. It is the only interface the dispatcher knows about:
//! ready-made shared instances, per-call constructed schemas, and
//! dispatchers themselves all implement it.
//!
//! ## Heterogeneous Values
//!
//! A dispatcher is generic over one value type `T`, usually a closed enum
//! of variants. [`TypeName`] names the concrete variant held by a value;
//! [`VariantOf`] lets a schema written for one variant `V` read it out of
//! (and put it back into) the enclosing `T`.

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::Value;

use crate::context::DispatchContext;
use crate::error::ValidationError;
use crate::options::LoadOptions;

/// Converts values of `T` to and from structured data.
///
/// Implementations must be reentrant: one instance may serve concurrent
/// calls from several threads.
pub trait Schema<T>: Send + Sync {
    /// Serialize a single value.
    ///
    /// Serialization is best-effort and never fails; problems are reported
    /// in-band (for example as a `{"_schema": "..."}` object). Returning
    /// `Value::Null` means "nothing to emit".
    fn serialize(&self, value: &T, ctx: &DispatchContext) -> Value;

    /// Deserialize a single structured payload.
    fn deserialize(
        &self,
        data: &Value,
        options: &LoadOptions,
        ctx: &DispatchContext,
    ) -> Result<T, ValidationError>;
}

impl<T, S: Schema<T> + ?Sized> Schema<T> for Arc<S> {
    fn serialize(&self, value: &T, ctx: &DispatchContext) -> Value {
        (**self).serialize(value, ctx)
    }

    fn deserialize(
        &self,
        data: &Value,
        options: &LoadOptions,
        ctx: &DispatchContext,
    ) -> Result<T, ValidationError> {
        (**self).deserialize(data, options, ctx)
    }
}

impl<T, S: Schema<T> + ?Sized> Schema<T> for Box<S> {
    fn serialize(&self, value: &T, ctx: &DispatchContext) -> Value {
        (**self).serialize(value, ctx)
    }

    fn deserialize(
        &self,
        data: &Value,
        options: &LoadOptions,
        ctx: &DispatchContext,
    ) -> Result<T, ValidationError> {
        (**self).deserialize(data, options, ctx)
    }
}

/// Runtime name of the concrete type held by a value.
///
/// For a closed enum this is a total `match` over the variants. The name
/// is the default discriminator and appears in "Unknown object class"
/// messages.
pub trait TypeName {
    /// The concrete type name of `self`.
    fn type_name(&self) -> Cow<'_, str>;
}

/// JSON values are named after their JSON kind.
impl TypeName for Value {
    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        })
    }
}

/// A variant type `Self` carried inside the dispatcher's value type `T`.
pub trait VariantOf<T>: Sized {
    /// Borrow the variant out of `parent`, or `None` if `parent` holds a
    /// different variant.
    fn from_parent(parent: &T) -> Option<&Self>;

    /// Wrap the variant back into `T`.
    fn into_parent(self) -> T;
}

/// Every type is trivially a variant of itself.
impl<T> VariantOf<T> for T {
    fn from_parent(parent: &T) -> Option<&Self> {
        Some(parent)
    }

    fn into_parent(self) -> T {
        self
    }
}

/// The unqualified name of `S`, without module path or generic arguments.
///
/// `my_app::schemas::FooSchema` becomes `FooSchema`;
/// `oneof_schema::TypedSchema<my_app::Foo>` becomes `TypedSchema`.
pub fn short_type_name<S: ?Sized>() -> &'static str {
    let full = std::any::type_name::<S>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct SomeObjectSchema;
    struct Wrapper<T>(#[allow(dead_code)] T);

    #[test]
    fn test_short_type_name_strips_path() {
        assert_eq!(short_type_name::<SomeObjectSchema>(), "SomeObjectSchema");
        assert_eq!(short_type_name::<String>(), "String");
    }

    #[test]
    fn test_short_type_name_strips_generics() {
        assert_eq!(short_type_name::<Wrapper<SomeObjectSchema>>(), "Wrapper");
    }

    #[test]
    fn test_json_type_names() {
        assert_eq!(json!(null).type_name(), "null");
        assert_eq!(json!({"a": 1}).type_name(), "object");
        assert_eq!(json!([1]).type_name(), "array");
        assert_eq!(json!("s").type_name(), "string");
    }

    #[test]
    fn test_identity_variant() {
        let v = 7u32;
        assert_eq!(<u32 as VariantOf<u32>>::from_parent(&v), Some(&7));
        assert_eq!(<u32 as VariantOf<u32>>::into_parent(3), 3);
    }
}
