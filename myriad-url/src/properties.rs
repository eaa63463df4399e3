//! Flat, insertion-ordered connection properties.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DriverError, DriverResult};
use crate::host::{DEFAULT_HOST, DEFAULT_PORT};

/// Property keys recognised by the front door.
pub mod keys {
    /// Host of the first server.
    pub const HOST: &str = "host";
    /// Port of the first server.
    pub const PORT: &str = "port";
    /// Database name from the URL path.
    pub const DBNAME: &str = "dbname";
    /// User name.
    pub const USER: &str = "user";
    /// Password.
    pub const PASSWORD: &str = "password";
    /// Number of hosts named in the URL.
    pub const NUM_HOSTS: &str = "numHosts";
    /// Comma-separated list of named configurations.
    pub const USE_CONFIGS: &str = "useConfigs";
    /// Name of a registered properties transform.
    pub const PROPERTIES_TRANSFORM: &str = "propertiesTransform";
    /// Round-robin flag, meaningless for failover and load-balanced URLs.
    pub const ROUND_ROBIN_LOAD_BALANCE: &str = "roundRobinLoadBalance";
    /// Toggle for embedding-context auto configuration.
    pub const AUTO_CONFIGURE_FOR_EMBEDDING: &str = "autoConfigureForEmbedding";
    /// Socket factory used by the transport.
    pub const SOCKET_FACTORY: &str = "socketFactory";
    /// Marker set on the slave branch of a replication configuration.
    pub const REPLICATION_IS_SLAVE: &str = "replication.isSlave";

    /// `host.N` for a 1-based index.
    pub fn indexed_host(index: usize) -> String {
        format!("{}.{}", HOST, index)
    }

    /// `port.N` for a 1-based index.
    pub fn indexed_port(index: usize) -> String {
        format!("{}.{}", PORT, index)
    }
}

/// Resolved connection configuration.
///
/// Keys keep the order in which they were first inserted; overwriting a key
/// keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionProperties {
    entries: IndexMap<String, String>,
}

impl ConnectionProperties {
    /// Create an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a property value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Set a property, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Remove a property, preserving the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    /// Check if a property is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Copy every property of `other` over this set.
    pub fn apply(&mut self, other: &ConnectionProperties) {
        for (key, value) in other.iter() {
            self.set(key, value);
        }
    }

    /// Number of hosts recorded under `numHosts`.
    pub fn host_count(&self) -> DriverResult<usize> {
        let raw = self.get(keys::NUM_HOSTS).ok_or_else(|| {
            DriverError::invalid_attribute("Host count is missing from the configuration")
                .with_key(keys::NUM_HOSTS)
        })?;
        raw.trim().parse().map_err(|_| {
            DriverError::invalid_attribute(format!("Host count '{}' is not a number", raw))
                .with_key(keys::NUM_HOSTS)
        })
    }

    /// Host of the first server, `localhost` when unset.
    pub fn host(&self) -> &str {
        self.get(keys::HOST).unwrap_or(DEFAULT_HOST)
    }

    /// Port of the first server, 3306 when unset.
    pub fn port(&self) -> DriverResult<u16> {
        match self.get(keys::PORT) {
            None => Ok(DEFAULT_PORT),
            Some(raw) => raw.trim().parse().map_err(|_| {
                DriverError::invalid_attribute(format!("Port '{}' is not a valid port number", raw))
                    .with_key(keys::PORT)
            }),
        }
    }

    /// Database name, if the URL had one.
    pub fn database(&self) -> Option<&str> {
        self.get(keys::DBNAME)
    }

    /// Value of any property.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.get(name)
    }

    /// `host.N` for a 1-based index.
    pub fn indexed_host(&self, index: usize) -> Option<&str> {
        self.get(&keys::indexed_host(index))
    }

    /// `port.N` for a 1-based index.
    pub fn indexed_port(&self, index: usize) -> Option<&str> {
        self.get(&keys::indexed_port(index))
    }

    /// Render `host.N:port.N` for a 1-based index.
    ///
    /// Missing values render as `null`, which the downstream strategies reject.
    pub fn host_port(&self, index: usize) -> String {
        format!(
            "{}:{}",
            self.indexed_host(index).unwrap_or("null"),
            self.indexed_port(index).unwrap_or("null")
        )
    }

    /// Consume into the underlying map.
    pub fn into_inner(self) -> IndexMap<String, String> {
        self.entries
    }
}

impl From<IndexMap<String, String>> for ConnectionProperties {
    fn from(entries: IndexMap<String, String>) -> Self {
        Self { entries }
    }
}

impl<K, V> FromIterator<(K, V)> for ConnectionProperties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for ConnectionProperties {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Display for ConnectionProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if key == keys::PASSWORD {
                write!(f, "{}=****", key)?;
            } else {
                write!(f, "{}={}", key, value)?;
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_keeps_position() {
        let mut props = ConnectionProperties::new().with("a", "1").with("b", "2");
        props.set("a", "3");
        let keys: Vec<_> = props.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(props.get("a"), Some("3"));
    }

    #[test]
    fn test_deserialize_string_table() {
        let props: ConnectionProperties = toml::from_str("user = \"app\"\nhost = \"db\"\n").unwrap();
        let keys: Vec<_> = props.keys().collect();
        assert_eq!(keys, vec!["user", "host"]);
    }

    #[test]
    fn test_host_and_port_defaults() {
        let props = ConnectionProperties::new();
        assert_eq!(props.host(), "localhost");
        assert_eq!(props.port().unwrap(), 3306);
        assert_eq!(props.database(), None);
    }

    #[test]
    fn test_bad_port_is_invalid_attribute() {
        let props = ConnectionProperties::new().with(keys::PORT, "33o6");
        let err = props.port().unwrap_err();
        assert!(err.is_invalid_attribute());
    }

    #[test]
    fn test_host_count() {
        let props = ConnectionProperties::new().with(keys::NUM_HOSTS, "3");
        assert_eq!(props.host_count().unwrap(), 3);
        assert!(ConnectionProperties::new().host_count().is_err());
    }

    #[test]
    fn test_host_port_rendering() {
        let props = ConnectionProperties::new()
            .with("host.1", "db1")
            .with("port.1", "3307");
        assert_eq!(props.host_port(1), "db1:3307");
        assert_eq!(props.host_port(2), "null:null");
    }

    #[test]
    fn test_display_masks_password() {
        let props = ConnectionProperties::new()
            .with(keys::USER, "root")
            .with(keys::PASSWORD, "secret");
        let shown = props.to_string();
        assert!(shown.contains("user=root"));
        assert!(!shown.contains("secret"));
    }
}
