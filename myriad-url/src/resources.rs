//! Named configuration resources.
//!
//! A named configuration is a flat TOML table of connection properties that a
//! URL pulls in with `useConfigs=name1,name2`. Scalar values are stored as
//! their string form; nested tables and arrays are rejected.
//!
//! ```rust
//! use myriad_url::resources::{BundledConfigurations, ResourceLoader};
//!
//! let props = BundledConfigurations.load("maxPerformance").unwrap();
//! assert_eq!(props.get("cachePrepStmts"), Some("true"));
//! ```

use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::properties::ConnectionProperties;

/// Errors raised by a [`ResourceLoader`].
#[derive(Error, Debug)]
pub enum ResourceError {
    /// No loader knows the name.
    #[error("Configuration '{0}' not found")]
    NotFound(String),

    /// Reading the resource failed.
    #[error("Failed to read configuration '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The resource is not a flat key/value table.
    #[error("Configuration '{name}' is malformed: {message}")]
    Format { name: String, message: String },
}

/// Loads named configurations.
pub trait ResourceLoader: Send + Sync {
    /// Load the configuration called `name`.
    fn load(&self, name: &str) -> Result<ConnectionProperties, ResourceError>;
}

/// Parse a flat TOML table into properties, keeping file order.
pub fn parse_configuration(name: &str, text: &str) -> Result<ConnectionProperties, ResourceError> {
    let table: IndexMap<String, toml::Value> =
        toml::from_str(text).map_err(|e| ResourceError::Format {
            name: name.to_string(),
            message: e.to_string(),
        })?;

    table
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Datetime(d) => d.to_string(),
                toml::Value::Array(_) | toml::Value::Table(_) => {
                    return Err(ResourceError::Format {
                        name: name.to_string(),
                        message: format!("value of '{}' must be a scalar", key),
                    });
                }
            };
            Ok((key, value))
        })
        .collect()
}

/// Configurations compiled into the driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledConfigurations;

impl BundledConfigurations {
    const ENTRIES: [(&'static str, &'static str); 4] = [
        (
            "maxPerformance",
            include_str!("../configurations/maxPerformance.toml"),
        ),
        ("fullDebug", include_str!("../configurations/fullDebug.toml")),
        (
            "clusterBase",
            include_str!("../configurations/clusterBase.toml"),
        ),
        ("coldFusion", include_str!("../configurations/coldFusion.toml")),
    ];

    /// Names of every bundled configuration.
    pub fn names() -> impl Iterator<Item = &'static str> {
        Self::ENTRIES.iter().map(|(name, _)| *name)
    }
}

impl ResourceLoader for BundledConfigurations {
    fn load(&self, name: &str) -> Result<ConnectionProperties, ResourceError> {
        let (_, text) = Self::ENTRIES
            .iter()
            .find(|(entry, _)| *entry == name)
            .ok_or_else(|| ResourceError::NotFound(name.to_string()))?;
        parse_configuration(name, text)
    }
}

/// Loads `<root>/<name>.toml`.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    /// Create a loader rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory searched by this loader.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceLoader for DirectoryLoader {
    fn load(&self, name: &str) -> Result<ConnectionProperties, ResourceError> {
        // names are file stems, never paths
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(ResourceError::NotFound(name.to_string()));
        }

        let path = self.root.join(format!("{}.toml", name));
        debug!(path = %path.display(), "Loading named configuration");
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ResourceError::NotFound(name.to_string()));
            }
            Err(source) => {
                return Err(ResourceError::Io {
                    name: name.to_string(),
                    source,
                });
            }
        };
        parse_configuration(name, &text)
    }
}

/// In-memory configurations.
#[derive(Debug, Clone, Default)]
pub struct MapLoader {
    configs: HashMap<String, ConnectionProperties>,
}

impl MapLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration.
    pub fn with(mut self, name: impl Into<String>, props: ConnectionProperties) -> Self {
        self.configs.insert(name.into(), props);
        self
    }
}

impl ResourceLoader for MapLoader {
    fn load(&self, name: &str) -> Result<ConnectionProperties, ResourceError> {
        self.configs
            .get(name)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(name.to_string()))
    }
}

/// Tries loaders in order; the first that knows the name wins.
#[derive(Clone, Default)]
pub struct ChainLoader {
    loaders: Vec<Arc<dyn ResourceLoader>>,
}

impl ChainLoader {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a loader to the chain.
    pub fn with(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.loaders.push(Arc::new(loader));
        self
    }
}

impl std::fmt::Debug for ChainLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainLoader")
            .field("loaders", &self.loaders.len())
            .finish()
    }
}

impl ResourceLoader for ChainLoader {
    fn load(&self, name: &str) -> Result<ConnectionProperties, ResourceError> {
        for loader in &self.loaders {
            match loader.load(name) {
                Err(ResourceError::NotFound(_)) => continue,
                other => return other,
            }
        }
        Err(ResourceError::NotFound(name.to_string()))
    }
}
