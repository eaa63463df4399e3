//! Property transforms resolved by name.
//!
//! A URL may set `propertiesTransform=<name>`; the parser looks the name up in
//! a [`TransformRegistry`] and runs the transform over the URL-derived
//! properties before named configurations and overrides are merged.
//!
//! ```rust
//! use myriad_url::{BoxError, ConnectionProperties, TransformRegistry};
//!
//! let mut registry = TransformRegistry::new();
//! registry.register("stamp", |mut props: ConnectionProperties| {
//!     props.set("connectionAttributes", "program_name:billing");
//!     Ok::<_, BoxError>(props)
//! });
//! assert!(registry.contains("stamp"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, DriverError, DriverResult};
use crate::properties::ConnectionProperties;

/// Rewrites connection properties before they are used.
pub trait PropertiesTransform: Send + Sync {
    /// Transform the properties.
    fn transform(&self, props: ConnectionProperties) -> Result<ConnectionProperties, BoxError>;
}

impl<F> PropertiesTransform for F
where
    F: Fn(ConnectionProperties) -> Result<ConnectionProperties, BoxError> + Send + Sync,
{
    fn transform(&self, props: ConnectionProperties) -> Result<ConnectionProperties, BoxError> {
        self(props)
    }
}

/// Registry of named property transforms.
#[derive(Clone, Default)]
pub struct TransformRegistry {
    transforms: HashMap<String, Arc<dyn PropertiesTransform>>,
}

impl TransformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, transform: impl PropertiesTransform + 'static) {
        self.transforms.insert(name.into(), Arc::new(transform));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, name: impl Into<String>, transform: impl PropertiesTransform + 'static) -> Self {
        self.register(name, transform);
        self
    }

    /// Look up a transform.
    pub fn get(&self, name: &str) -> Option<Arc<dyn PropertiesTransform>> {
        self.transforms.get(name).cloned()
    }

    /// Check if a transform is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Registered names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transforms.keys().map(String::as_str)
    }

    /// Resolve `name` and run it.
    ///
    /// An unknown name or a failing transform is an invalid connection attribute.
    pub fn apply(&self, name: &str, props: ConnectionProperties) -> DriverResult<ConnectionProperties> {
        let transform = self
            .get(name)
            .ok_or_else(|| DriverError::transform_failed(name, "no transform registered under this name"))?;
        transform
            .transform(props)
            .map_err(|e| DriverError::transform_failed(name, &e).with_source(e))
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("TransformRegistry")
            .field("transforms", &names)
            .finish()
    }
}
