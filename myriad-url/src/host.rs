//! Host descriptors and host-list expansion.
//!
//! A host token is either plain `host[:port]` or an extended descriptor:
//!
//! ```text
//! address=(host=db1)(port=3307)(type=master)
//! ```
//!
//! ```rust
//! use myriad_url::host::{expand_hosts, parse_host_port};
//!
//! let (host, port) = parse_host_port("db1:3307").unwrap();
//! assert_eq!(host, "db1");
//! assert_eq!(port.as_deref(), Some("3307"));
//!
//! let hosts = expand_hosts("db1:3307,db2").unwrap();
//! assert_eq!(hosts[1].to_host_port(), "db2:3306");
//! ```

use indexmap::IndexMap;

use crate::error::{DriverError, DriverResult};
use crate::quote::{split_unquoted, starts_with_ignore_case, unquote};

/// Host used when a token names none.
pub const DEFAULT_HOST: &str = "localhost";

/// Well-known MySQL port.
pub const DEFAULT_PORT: u16 = 3306;

/// Marker opening an extended descriptor.
pub const ADDRESS_MARKER: &str = "address=";

/// Attribute naming a descriptor's replication role.
pub const ROLE_ATTRIBUTE: &str = "type";

/// Keys upper-cased inside a descriptor.
const STRUCTURAL_KEYS: [&str; 5] = ["host", "dbname", "port", "protocol", "path"];

/// Keys lower-cased inside a descriptor.
const CREDENTIAL_KEYS: [&str; 2] = ["user", "password"];

/// One parsed host token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    /// Host name, or the trimmed raw text of an extended descriptor.
    pub host: String,
    /// Port as written, or the default port.
    pub port: String,
    /// Descriptor attributes; present only for extended descriptors.
    pub attributes: Option<IndexMap<String, String>>,
}

impl HostEntry {
    /// A plain `host:port` entry.
    pub fn plain(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            attributes: None,
        }
    }

    /// The `localhost:3306` entry.
    pub fn localhost() -> Self {
        Self::plain(DEFAULT_HOST, DEFAULT_PORT.to_string())
    }

    /// Check if this entry came from an extended descriptor.
    pub fn is_descriptor(&self) -> bool {
        self.attributes.is_some()
    }

    /// Role attribute of a descriptor (`master` / `slave`).
    pub fn role(&self) -> Option<&str> {
        self.attributes
            .as_ref()
            .and_then(|attrs| attrs.get(ROLE_ATTRIBUTE))
            .map(String::as_str)
    }

    /// Render as `host:port`.
    pub fn to_host_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split a `host[:port]` token on its first colon.
///
/// Descriptor tokens come back whole and trimmed with no port. A colon with
/// nothing after it is an [`InvalidConnectionAttribute`] error.
///
/// [`InvalidConnectionAttribute`]: crate::ErrorCode::InvalidConnectionAttribute
pub fn parse_host_port(token: &str) -> DriverResult<(String, Option<String>)> {
    if is_host_properties_list(token.trim_start()) {
        return Ok((token.trim().to_string(), None));
    }

    match token.split_once(':') {
        Some((_, "")) => Err(DriverError::dangling_port(token)),
        Some((host, port)) => Ok((host.to_string(), Some(port.to_string()))),
        None => Ok((token.to_string(), None)),
    }
}

/// Check if a host string is an extended descriptor.
pub fn is_host_properties_list(host: &str) -> bool {
    starts_with_ignore_case(host, ADDRESS_MARKER)
}

/// Parse the attributes of an extended descriptor.
///
/// Returns an empty map for anything that is not a descriptor.
pub fn expand_host_key_values(host: &str) -> IndexMap<String, String> {
    let mut attributes = IndexMap::new();
    if !is_host_properties_list(host) {
        return attributes;
    }

    // skip the opening parenthesis of the first group too
    let body = host.get(ADDRESS_MARKER.len() + 1..).unwrap_or("");
    for group in split_unquoted(body, ')', true) {
        let group = group.strip_prefix('(').unwrap_or(&group);
        let pair = split_unquoted(group, '=', true);
        let (Some(key), Some(value)) = (pair.first(), pair.get(1)) else {
            continue;
        };
        attributes.insert(normalize_key(key), unquote(value).to_string());
    }

    attributes
}

fn normalize_key(key: &str) -> String {
    if STRUCTURAL_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key)) {
        key.to_ascii_uppercase()
    } else if CREDENTIAL_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key)) {
        key.to_ascii_lowercase()
    } else {
        key.to_string()
    }
}

/// Check if a descriptor declares itself master.
pub fn is_host_master(host: &str) -> bool {
    expand_host_key_values(host)
        .get(ROLE_ATTRIBUTE)
        .is_some_and(|role| role.eq_ignore_ascii_case("master"))
}

/// Parse one token into a [`HostEntry`], filling in defaults.
pub fn parse_host_entry(token: &str) -> DriverResult<HostEntry> {
    let (host, port) = parse_host_port(token)?;
    let attributes = is_host_properties_list(&host).then(|| expand_host_key_values(&host));

    Ok(HostEntry {
        host: if host.trim().is_empty() {
            DEFAULT_HOST.to_string()
        } else {
            host
        },
        port: port.unwrap_or_else(|| DEFAULT_PORT.to_string()),
        attributes,
    })
}

/// Expand a comma-separated host segment into ordered entries.
///
/// An empty segment yields a single `localhost:3306` entry.
pub fn expand_hosts(segment: &str) -> DriverResult<Vec<HostEntry>> {
    if segment.trim().is_empty() {
        return Ok(vec![HostEntry::localhost()]);
    }

    split_unquoted(segment, ',', false)
        .iter()
        .map(|token| parse_host_entry(token))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_host_port() {
        assert_eq!(
            parse_host_port("h:5000").unwrap(),
            ("h".to_string(), Some("5000".to_string()))
        );
        assert_eq!(parse_host_port("h").unwrap(), ("h".to_string(), None));
    }

    #[test]
    fn test_dangling_colon() {
        let err = parse_host_port("h:").unwrap_err();
        assert!(err.is_invalid_attribute());
    }

    #[test]
    fn test_port_split_on_first_colon() {
        assert_eq!(
            parse_host_port("h:1:2").unwrap(),
            ("h".to_string(), Some("1:2".to_string()))
        );
    }

    #[test]
    fn test_address_prefixed_hostname_is_plain() {
        assert_eq!(
            parse_host_port("address-db:3307").unwrap(),
            ("address-db".to_string(), Some("3307".to_string()))
        );
        assert_eq!(
            parse_host_port("addressbook").unwrap(),
            ("addressbook".to_string(), None)
        );
    }

    #[test]
    fn test_descriptor_token_kept_whole() {
        let (host, port) = parse_host_port("  address=(host=h1)(port=9) ").unwrap();
        assert_eq!(host, "address=(host=h1)(port=9)");
        assert_eq!(port, None);
    }

    #[test]
    fn test_expand_descriptor_casing() {
        let attrs = expand_host_key_values("address=(host=h1)(port=9)(type=master)");
        let expected: IndexMap<String, String> = [("HOST", "h1"), ("PORT", "9"), ("type", "master")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(attrs, expected);
    }

    #[test]
    fn test_expand_descriptor_credentials_and_quotes() {
        let attrs =
            expand_host_key_values("address=(PROTOCOL=tcp)(USER='app')(Password=\"p)w\")(Zone=a)");
        assert_eq!(attrs.get("PROTOCOL").map(String::as_str), Some("tcp"));
        assert_eq!(attrs.get("user").map(String::as_str), Some("app"));
        assert_eq!(attrs.get("password").map(String::as_str), Some("p)w"));
        assert_eq!(attrs.get("Zone").map(String::as_str), Some("a"));
    }

    #[test]
    fn test_group_without_value_dropped() {
        let attrs = expand_host_key_values("address=(host=h1)(flag)");
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn test_not_a_descriptor() {
        assert!(expand_host_key_values("db1:3306").is_empty());
        assert!(!is_host_properties_list("db1"));
        assert!(is_host_properties_list("ADDRESS=(host=x)"));
    }

    #[test]
    fn test_is_host_master() {
        assert!(is_host_master("address=(host=a)(type=MASTER)"));
        assert!(!is_host_master("address=(host=a)(type=slave)"));
        assert!(!is_host_master("address=(host=a)"));
        assert!(!is_host_master("a:3306"));
    }

    #[test]
    fn test_expand_hosts_defaults() {
        let hosts = expand_hosts("a:1,b,:7").unwrap();
        assert_eq!(hosts[0], HostEntry::plain("a", "1"));
        assert_eq!(hosts[1], HostEntry::plain("b", "3306"));
        assert_eq!(hosts[2], HostEntry::plain("localhost", "7"));
    }

    #[test]
    fn test_expand_empty_segment() {
        assert_eq!(expand_hosts("").unwrap(), vec![HostEntry::localhost()]);
        assert_eq!(expand_hosts("   ").unwrap(), vec![HostEntry::localhost()]);
    }

    #[test]
    fn test_expand_descriptor_entry() {
        let hosts = expand_hosts("address=(host=h1)(port=9)(type=master),h2:2").unwrap();
        assert!(hosts[0].is_descriptor());
        assert_eq!(hosts[0].role(), Some("master"));
        assert_eq!(hosts[0].port, "3306");
        assert!(!hosts[1].is_descriptor());
    }

    #[test]
    fn test_expand_propagates_dangling_colon() {
        assert!(expand_hosts("a:1,b:").is_err());
    }
}
