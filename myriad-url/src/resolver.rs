//! Property precedence.
//!
//! Four layers merge into the final configuration, later layers winning:
//!
//! 1. URL-derived values (`host.N`, `port.N`, `dbname`, `numHosts`)
//! 2. Query-string parameters
//! 3. Named configurations listed in `useConfigs`, under layers 1 and 2
//! 4. Caller overrides
//!
//! `numHosts` is the exception: it always comes from the URL.

use tracing::debug;

use crate::error::{DriverError, DriverResult};
use crate::properties::{ConnectionProperties, keys};
use crate::quote::split_unquoted;
use crate::resources::{ResourceError, ResourceLoader};

/// Merges configuration layers through a resource loader.
pub struct PropertyResolver<'a> {
    loader: &'a dyn ResourceLoader,
}

impl<'a> PropertyResolver<'a> {
    /// Create a resolver backed by `loader`.
    pub fn new(loader: &'a dyn ResourceLoader) -> Self {
        Self { loader }
    }

    /// Load a comma-separated list of named configurations in order.
    ///
    /// Later names overwrite earlier ones on collision.
    pub fn load_configurations(&self, names: &str) -> DriverResult<ConnectionProperties> {
        let mut merged = ConnectionProperties::new();

        for name in split_unquoted(names, ',', true) {
            if name.is_empty() {
                continue;
            }
            match self.loader.load(&name) {
                Ok(props) => {
                    debug!(config = %name, keys = props.len(), "Named configuration loaded");
                    merged.apply(&props);
                }
                Err(ResourceError::NotFound(_)) => {
                    return Err(DriverError::missing_configuration(&name));
                }
                Err(e) => {
                    return Err(DriverError::unloadable_configuration(&name).with_source(e));
                }
            }
        }

        Ok(merged)
    }

    /// Merge the URL layer, named configurations and overrides.
    ///
    /// `useConfigs` is taken from the overrides when they set it, otherwise
    /// from the URL layer.
    pub fn resolve(
        &self,
        url_layer: ConnectionProperties,
        overrides: Option<&ConnectionProperties>,
    ) -> DriverResult<ConnectionProperties> {
        let names = overrides
            .and_then(|o| o.get(keys::USE_CONFIGS))
            .or_else(|| url_layer.get(keys::USE_CONFIGS))
            .map(str::to_owned);

        let mut resolved = match names {
            Some(names) => {
                let mut configured = self.load_configurations(&names)?;
                configured.apply(&url_layer);
                configured
            }
            None => url_layer,
        };

        if let Some(overrides) = overrides {
            for (key, value) in overrides.iter() {
                if key != keys::NUM_HOSTS {
                    resolved.set(key, value);
                }
            }
        }

        Ok(resolved)
    }
}
