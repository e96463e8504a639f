//! # Type Resolution (serialize side)
//!
//! A [`TypeResolver`] classifies a value into the discriminator under
//! which its schema is registered. Resolution must be deterministic. A
//! resolver that returns `None` (or an empty string) makes the dispatcher
//! report an "Unknown object class" payload rather than fail.

use std::fmt;

use oneof_core::TypeName;

/// Maps a value to its discriminator.
pub trait TypeResolver<T>: Send + Sync {
    /// The discriminator for `value`, or `None` if it cannot be classified.
    fn resolve(&self, value: &T) -> Option<String>;
}

/// Default strategy: the value's runtime type name.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeNameResolver;

impl<T: TypeName> TypeResolver<T> for TypeNameResolver {
    fn resolve(&self, value: &T) -> Option<String> {
        Some(value.type_name().into_owned())
    }
}

/// Classify by position in a fixed list of known type names.
///
/// The discriminator is the decimal index of the value's type name in the
/// list (`"0"`, `"1"`, ...). Values of unlisted types are unclassifiable.
#[derive(Debug, Clone, Default)]
pub struct KnownVariants {
    names: Vec<String>,
}

impl KnownVariants {
    /// Build from type names in registration order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The known type names, in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl<T: TypeName> TypeResolver<T> for KnownVariants {
    fn resolve(&self, value: &T) -> Option<String> {
        let name = value.type_name();
        self.names
            .iter()
            .position(|known| *known == name)
            .map(|idx| idx.to_string())
    }
}

/// Adapter for an arbitrary classification closure.
pub struct FnResolver<F>(pub F);

impl<T, F> TypeResolver<T> for FnResolver<F>
where
    F: Fn(&T) -> Option<String> + Send + Sync,
{
    fn resolve(&self, value: &T) -> Option<String> {
        (self.0)(value)
    }
}

impl<F> fmt::Debug for FnResolver<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnResolver(..)")
    }
}
