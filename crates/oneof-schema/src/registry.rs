//! # Type Registry
//!
//! Maps discriminator strings to schema descriptors. Populated while the
//! dispatcher is being built and read-only afterwards.
//!
//! ## Descriptor Forms
//!
//! A descriptor is either a shared ready-made instance or a factory that
//! builds a fresh delegate for every dispatch call. Both forms expose the
//! same [`Schema`] operations, so the dispatcher never inspects which one
//! it holds beyond [`SchemaDescriptor::with_delegate`].
//!
//! ## Re-registration
//!
//! Registering a second descriptor under an existing discriminator replaces
//! the first (last registration wins). The replacement is logged at `warn`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use oneof_core::{short_type_name, DispatchContext, Schema};

/// Suffix stripped from schema type names when deriving discriminators.
pub const SCHEMA_SUFFIX: &str = "Schema";

type SchemaFactory<T> = Arc<dyn Fn() -> Box<dyn Schema<T>> + Send + Sync>;

enum DescriptorKind<T> {
    Instance(Arc<dyn Schema<T>>),
    Factory(SchemaFactory<T>),
}

/// A registered delegate: a shared instance or a per-call factory, plus
/// the delegate's own base context.
pub struct SchemaDescriptor<T> {
    kind: DescriptorKind<T>,
    context: DispatchContext,
}

impl<T: 'static> SchemaDescriptor<T> {
    /// A ready-made instance shared by every dispatch call.
    pub fn instance(schema: impl Schema<T> + 'static) -> Self {
        Self::shared(Arc::new(schema))
    }

    /// A ready-made instance already behind an `Arc`.
    pub fn shared(schema: Arc<dyn Schema<T>>) -> Self {
        Self {
            kind: DescriptorKind::Instance(schema),
            context: DispatchContext::new(),
        }
    }

    /// A factory invoked once per dispatch call.
    pub fn factory<S, F>(make: F) -> Self
    where
        S: Schema<T> + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        Self {
            kind: DescriptorKind::Factory(Arc::new(move || Box::new(make()) as Box<dyn Schema<T>>)),
            context: DispatchContext::new(),
        }
    }

    /// Factory form for a schema type with a `Default` constructor.
    pub fn of<S: Schema<T> + Default + 'static>() -> Self {
        Self::factory(S::default)
    }
}

impl<T> SchemaDescriptor<T> {
    /// Attach the delegate's own base context. The dispatcher's context is
    /// overlaid on top of it at dispatch time.
    pub fn with_context(mut self, context: DispatchContext) -> Self {
        self.context = context;
        self
    }

    /// The delegate's own base context.
    pub fn context(&self) -> &DispatchContext {
        &self.context
    }

    /// Returns true for the per-call factory form.
    pub fn is_factory(&self) -> bool {
        matches!(self.kind, DescriptorKind::Factory(_))
    }

    /// Run `f` against the delegate: the shared instance, or a freshly
    /// built one that is dropped when `f` returns.
    pub fn with_delegate<R>(&self, f: impl FnOnce(&dyn Schema<T>) -> R) -> R {
        match &self.kind {
            DescriptorKind::Instance(schema) => f(&**schema),
            DescriptorKind::Factory(make) => {
                let schema = make();
                f(&*schema)
            }
        }
    }
}

impl<T> Clone for SchemaDescriptor<T> {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            DescriptorKind::Instance(schema) => DescriptorKind::Instance(Arc::clone(schema)),
            DescriptorKind::Factory(make) => DescriptorKind::Factory(Arc::clone(make)),
        };
        Self {
            kind,
            context: self.context.clone(),
        }
    }
}

impl<T> fmt::Debug for SchemaDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let form = if self.is_factory() { "factory" } else { "instance" };
        f.debug_struct("SchemaDescriptor")
            .field("form", &form)
            .field("context", &self.context)
            .finish()
    }
}

/// Discriminator to descriptor mapping.
pub struct TypeRegistry<T> {
    entries: HashMap<String, SchemaDescriptor<T>>,
}

impl<T> TypeRegistry<T> {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register `descriptor` under `discriminator`, returning the
    /// descriptor it replaced, if any.
    pub fn register(
        &mut self,
        discriminator: impl Into<String>,
        descriptor: SchemaDescriptor<T>,
    ) -> Option<SchemaDescriptor<T>> {
        let discriminator = discriminator.into();
        let previous = self.entries.insert(discriminator.clone(), descriptor);
        if previous.is_some() {
            tracing::warn!(
                discriminator = %discriminator,
                "replacing previously registered schema"
            );
        }
        previous
    }

    /// Look up a discriminator.
    pub fn get(&self, discriminator: &str) -> Option<&SchemaDescriptor<T>> {
        self.entries.get(discriminator)
    }

    /// Returns true if `discriminator` is registered.
    pub fn contains(&self, discriminator: &str) -> bool {
        self.entries.contains_key(discriminator)
    }

    /// Number of registered discriminators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered discriminators, sorted alphabetically.
    pub fn discriminators(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<T> Default for TypeRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TypeRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T> fmt::Debug for TypeRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("discriminators", &self.discriminators())
            .finish()
    }
}

/// Derive a discriminator from a schema type name by stripping a trailing
/// `Schema` suffix. Names that are exactly `Schema`, or that do not end in
/// it, are returned unchanged.
pub fn default_schema_name(type_name: &str) -> String {
    match type_name.strip_suffix(SCHEMA_SUFFIX) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => type_name.to_string(),
    }
}

/// [`default_schema_name`] applied to the short type name of `S`.
pub fn schema_name_of<S: ?Sized>() -> String {
    default_schema_name(short_type_name::<S>())
}
