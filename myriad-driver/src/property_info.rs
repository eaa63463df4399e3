//! Connection property catalog.
//!
//! Lets a tool discover which properties to prompt for. The first five
//! entries are always `host`, `port`, `dbname`, `user` and `password`; the
//! rest of the catalog follows in a fixed order.

use serde::Serialize;

use myriad_url::{ConnectionProperties, DEFAULT_PORT, keys};

const BOOLEAN: &[&str] = &["true", "false"];

/// One property a tool may prompt for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyInfo {
    /// Property key.
    pub name: String,
    /// Current value, or the default when unset.
    pub value: Option<String>,
    /// Whether a connection needs a value.
    pub required: bool,
    /// Human-readable description.
    pub description: String,
    /// Allowed values, when the property is an enumeration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
}

/// Static description of a known property.
#[derive(Debug, Clone, Copy)]
pub struct KnownProperty {
    /// Property key.
    pub name: &'static str,
    /// Value used when the property is unset.
    pub default: Option<&'static str>,
    /// Human-readable description.
    pub description: &'static str,
    /// Allowed values; empty for free-form properties.
    pub choices: &'static [&'static str],
}

impl KnownProperty {
    const fn new(
        name: &'static str,
        default: Option<&'static str>,
        description: &'static str,
        choices: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            default,
            description,
            choices,
        }
    }

    fn describe(&self, props: &ConnectionProperties) -> PropertyInfo {
        PropertyInfo {
            name: self.name.to_string(),
            value: props
                .get(self.name)
                .or(self.default)
                .map(str::to_owned),
            required: false,
            description: self.description.to_string(),
            choices: (!self.choices.is_empty())
                .then(|| self.choices.iter().map(|c| c.to_string()).collect()),
        }
    }
}

/// Every property beyond the connection essentials.
pub const KNOWN_PROPERTIES: &[KnownProperty] = &[
    KnownProperty::new(
        keys::USE_CONFIGS,
        None,
        "Comma-separated named configurations to load before URL and caller values",
        &[],
    ),
    KnownProperty::new(
        keys::PROPERTIES_TRANSFORM,
        None,
        "Name of a registered transform applied to the URL-derived properties",
        &[],
    ),
    KnownProperty::new(
        keys::AUTO_CONFIGURE_FOR_EMBEDDING,
        Some("true"),
        "Load the embedding host's named configuration when one is detected",
        BOOLEAN,
    ),
    KnownProperty::new(
        keys::ROUND_ROBIN_LOAD_BALANCE,
        Some("false"),
        "Rotate through failover hosts instead of always starting with the first",
        BOOLEAN,
    ),
    KnownProperty::new(
        keys::SOCKET_FACTORY,
        None,
        "Name of the socket factory used to open server connections",
        &[],
    ),
    KnownProperty::new(
        "connectTimeout",
        Some("0"),
        "Socket connect timeout in milliseconds, 0 for none",
        &[],
    ),
    KnownProperty::new(
        "socketTimeout",
        Some("0"),
        "Socket read timeout in milliseconds, 0 for none",
        &[],
    ),
    KnownProperty::new(
        "autoReconnect",
        Some("false"),
        "Reconnect transparently when a connection goes stale",
        BOOLEAN,
    ),
    KnownProperty::new(
        "failOverReadOnly",
        Some("true"),
        "Put a failed-over connection into read-only mode",
        BOOLEAN,
    ),
    KnownProperty::new(
        "characterEncoding",
        None,
        "Character encoding used for the session",
        &[],
    ),
    KnownProperty::new(
        "sslMode",
        Some("PREFERRED"),
        "Transport security requirement",
        &["DISABLED", "PREFERRED", "REQUIRED", "VERIFY_CA", "VERIFY_IDENTITY"],
    ),
    KnownProperty::new(
        "cachePrepStmts",
        Some("false"),
        "Cache server-side prepared statements per connection",
        BOOLEAN,
    ),
    KnownProperty::new(
        "useLocalSessionState",
        Some("false"),
        "Track autocommit and isolation locally instead of querying the server",
        BOOLEAN,
    ),
    KnownProperty::new(
        "profileSQL",
        Some("false"),
        "Log query timings",
        BOOLEAN,
    ),
];

/// Describe `props`: the five essentials followed by [`KNOWN_PROPERTIES`].
pub fn describe(props: &ConnectionProperties) -> Vec<PropertyInfo> {
    let essential = |name: &str, value: Option<String>, required: bool, description: &str| {
        PropertyInfo {
            name: name.to_string(),
            value,
            required,
            description: description.to_string(),
            choices: None,
        }
    };
    let current = |key: &str| props.get(key).map(str::to_owned);

    let mut infos = vec![
        essential(keys::HOST, current(keys::HOST), true, "Hostname of the database server"),
        essential(
            keys::PORT,
            Some(current(keys::PORT).unwrap_or_else(|| DEFAULT_PORT.to_string())),
            false,
            "Port number of the database server",
        ),
        essential(keys::DBNAME, current(keys::DBNAME), false, "Database name"),
        essential(keys::USER, current(keys::USER), true, "Username to authenticate as"),
        essential(
            keys::PASSWORD,
            current(keys::PASSWORD),
            true,
            "Password to use for authentication",
        ),
    ];
    infos.extend(KNOWN_PROPERTIES.iter().map(|known| known.describe(props)));
    infos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_essentials_come_first() {
        let infos = describe(&ConnectionProperties::new());
        let names: Vec<_> = infos.iter().take(5).map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["host", "port", "dbname", "user", "password"]);
        assert_eq!(infos.len(), 5 + KNOWN_PROPERTIES.len());
    }

    #[test]
    fn test_required_flags_and_port_default() {
        let infos = describe(&ConnectionProperties::new());
        assert!(infos[0].required);
        assert!(!infos[1].required);
        assert_eq!(infos[1].value.as_deref(), Some("3306"));
        assert!(!infos[2].required);
        assert!(infos[3].required);
        assert!(infos[4].required);
    }

    #[test]
    fn test_current_values() {
        let props = ConnectionProperties::new()
            .with(keys::HOST, "db1")
            .with("connectTimeout", "500");
        let infos = describe(&props);
        assert_eq!(infos[0].value.as_deref(), Some("db1"));
        let timeout = infos.iter().find(|i| i.name == "connectTimeout").unwrap();
        assert_eq!(timeout.value.as_deref(), Some("500"));
    }

    #[test]
    fn test_boolean_choices() {
        let infos = describe(&ConnectionProperties::new());
        let reconnect = infos.iter().find(|i| i.name == "autoReconnect").unwrap();
        assert_eq!(
            reconnect.choices.as_deref(),
            Some(&["true".to_string(), "false".to_string()][..])
        );
        assert_eq!(reconnect.value.as_deref(), Some("false"));
    }

    #[test]
    fn test_serializes_to_json() {
        let infos = describe(&ConnectionProperties::new().with(keys::USER, "app"));
        let json = serde_json::to_value(&infos[3]).unwrap();
        assert_eq!(json["name"], "user");
        assert_eq!(json["value"], "app");
        assert_eq!(json["required"], true);
        assert!(json.get("choices").is_none());
    }
}
