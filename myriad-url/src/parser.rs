//! Connection URL parsing.
//!
//! Recognised forms:
//!
//! ```text
//! mysql://[host[:port]][,host[:port]]*[/database][?key=value[&key=value]*]
//! mysql:mxj://...
//! mysql:loadbalance://...
//! mysql:replication://...
//! ```
//!
//! Any other prefix is declined with `Ok(None)` so that a driver can pass on
//! URLs it does not own.
//!
//! ```rust
//! use myriad_url::{UrlParser, keys};
//!
//! let parser = UrlParser::new();
//! let props = parser
//!     .parse("mysql://a:1,b:2/shop?user=app", None)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(props.get(keys::NUM_HOSTS), Some("2"));
//! assert_eq!(props.get("host.2"), Some("b"));
//! assert_eq!(props.database(), Some("shop"));
//!
//! assert!(parser.parse("postgres://a/b", None).unwrap().is_none());
//! ```

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::env::{EmbeddingContext, EnvSource, StdEnvSource};
use crate::error::DriverResult;
use crate::host::{HostEntry, expand_hosts};
use crate::properties::{ConnectionProperties, keys};
use crate::quote::{find_unquoted, split_unquoted, starts_with_ignore_case};
use crate::resolver::PropertyResolver;
use crate::resources::{BundledConfigurations, ResourceLoader};
use crate::transform::TransformRegistry;

/// Socket factory installed by the management-launcher prefix.
pub const LAUNCHER_SOCKET_FACTORY: &str = "myriad.mxj.ServerLauncherSocketFactory";

/// URL prefix, which selects the connection topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlScheme {
    /// `mysql://`
    Standard,
    /// `mysql:mxj://`, a standard URL served by a managed server launcher.
    ManagedLauncher,
    /// `mysql:loadbalance://`
    LoadBalance,
    /// `mysql:replication://`
    Replication,
}

impl UrlScheme {
    /// Every recognised scheme.
    pub const ALL: [UrlScheme; 4] = [
        UrlScheme::Standard,
        UrlScheme::ManagedLauncher,
        UrlScheme::LoadBalance,
        UrlScheme::Replication,
    ];

    /// The literal URL prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Standard => "mysql://",
            Self::ManagedLauncher => "mysql:mxj://",
            Self::LoadBalance => "mysql:loadbalance://",
            Self::Replication => "mysql:replication://",
        }
    }

    /// Match the start of `url`, ignoring ASCII case.
    pub fn detect(url: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|scheme| starts_with_ignore_case(url, scheme.prefix()))
    }
}

impl fmt::Display for UrlScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A URL split into its parts, before any configuration is merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    /// Prefix the URL was written with.
    pub scheme: UrlScheme,
    /// Hosts in URL order; never empty.
    pub hosts: Vec<HostEntry>,
    /// Path after the host segment.
    pub database: Option<String>,
    /// Decoded query parameters in URL order.
    pub params: ConnectionProperties,
}

impl ParsedUrl {
    /// Number of hosts.
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Query parameters with the URL-derived properties written over them.
    ///
    /// `dbname`, `numHosts` and the host keys always reflect the URL itself,
    /// so `host`/`port` stay aliases of `host.1`/`port.1`.
    pub fn url_properties(&self) -> ConnectionProperties {
        let mut props = ConnectionProperties::new();

        if self.scheme == UrlScheme::ManagedLauncher {
            props.set(keys::SOCKET_FACTORY, LAUNCHER_SOCKET_FACTORY);
        }
        for (key, value) in self.params.iter() {
            if key != keys::NUM_HOSTS {
                props.set(key, value);
            }
        }

        for (i, entry) in self.hosts.iter().enumerate() {
            props.set(keys::indexed_host(i + 1), entry.host.as_str());
            props.set(keys::indexed_port(i + 1), entry.port.as_str());
        }
        props.set(keys::NUM_HOSTS, self.hosts.len().to_string());
        if let Some(first) = self.hosts.first() {
            props.set(keys::HOST, first.host.as_str());
            props.set(keys::PORT, first.port.as_str());
        }
        if let Some(database) = &self.database {
            props.set(keys::DBNAME, database.as_str());
        }

        props
    }
}

/// Split a URL into scheme, hosts, database and query parameters.
///
/// Returns `Ok(None)` for an unrecognised prefix.
pub fn parse_url(url: &str) -> DriverResult<Option<ParsedUrl>> {
    let Some(scheme) = UrlScheme::detect(url) else {
        return Ok(None);
    };

    let rest = &url[scheme.prefix().len()..];
    let (location, query) = match rest.split_once('?') {
        Some((location, query)) => (location, Some(query)),
        None => (rest, None),
    };

    let (segment, database) = match find_unquoted(location, '/') {
        Some(pos) => {
            let path = &location[pos + 1..];
            (&location[..pos], (!path.is_empty()).then(|| path.to_string()))
        }
        None => (location, None),
    };

    let hosts = expand_hosts(segment)?;
    let params = query.map(parse_query_params).unwrap_or_default();

    debug!(
        scheme = %scheme,
        hosts = hosts.len(),
        database = ?database,
        params = params.len(),
        "Parsed connection URL"
    );

    Ok(Some(ParsedUrl {
        scheme,
        hosts,
        database,
        params,
    }))
}

/// Parse `key=value&key=value`, splitting each pair on its first `=`.
///
/// Pairs with an empty key or value are skipped.
pub fn parse_query_params(query: &str) -> ConnectionProperties {
    let mut params = ConnectionProperties::new();

    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        if key.is_empty() || value.is_empty() {
            continue;
        }
        params.set(key, decode_value(value));
    }

    params
}

/// Form-decode a query value; malformed escapes leave the raw text.
fn decode_value(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Turns a connection URL plus caller overrides into the final configuration.
#[derive(Clone)]
pub struct UrlParser {
    loader: Arc<dyn ResourceLoader>,
    transforms: Arc<TransformRegistry>,
    env: Arc<dyn EnvSource>,
}

impl UrlParser {
    /// Parser with the bundled configurations, no transforms and the process
    /// environment.
    pub fn new() -> Self {
        Self {
            loader: Arc::new(BundledConfigurations),
            transforms: Arc::new(TransformRegistry::new()),
            env: Arc::new(StdEnvSource),
        }
    }

    /// Use a different named-configuration loader.
    pub fn with_loader(mut self, loader: Arc<dyn ResourceLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Use a transform registry.
    pub fn with_transforms(mut self, transforms: Arc<TransformRegistry>) -> Self {
        self.transforms = transforms;
        self
    }

    /// Use a different environment source.
    pub fn with_env(mut self, env: Arc<dyn EnvSource>) -> Self {
        self.env = env;
        self
    }

    /// The named-configuration loader.
    pub fn loader(&self) -> &dyn ResourceLoader {
        self.loader.as_ref()
    }

    /// The transform registry.
    pub fn transforms(&self) -> &TransformRegistry {
        &self.transforms
    }

    /// Check if the URL carries a recognised prefix and parses.
    pub fn accepts(&self, url: &str) -> bool {
        matches!(self.parse(url, None), Ok(Some(_)))
    }

    /// Parse `url` and merge it with `overrides`.
    ///
    /// Returns `Ok(None)` when the prefix is not recognised. Grammar,
    /// transform and named-configuration failures are
    /// [`InvalidConnectionAttribute`](crate::ErrorCode::InvalidConnectionAttribute)
    /// errors.
    pub fn parse(
        &self,
        url: &str,
        overrides: Option<&ConnectionProperties>,
    ) -> DriverResult<Option<ConnectionProperties>> {
        let Some(parsed) = parse_url(url)? else {
            debug!("Declining unrecognised URL");
            return Ok(None);
        };

        let mut props = parsed.url_properties();

        let transform = lookup(&props, overrides, keys::PROPERTIES_TRANSFORM).map(str::to_owned);
        if let Some(name) = transform {
            debug!(transform = %name, "Applying properties transform");
            props = self.transforms.apply(&name, props)?;
        }

        self.configure_for_embedding(&mut props, overrides);

        let resolved = PropertyResolver::new(self.loader.as_ref()).resolve(props, overrides)?;
        debug!(keys = resolved.len(), "Resolved connection properties");
        Ok(Some(resolved))
    }

    /// Append the embedding host's configuration to `useConfigs`.
    fn configure_for_embedding(
        &self,
        props: &mut ConnectionProperties,
        overrides: Option<&ConnectionProperties>,
    ) {
        let enabled = lookup(props, overrides, keys::AUTO_CONFIGURE_FOR_EMBEDDING)
            .unwrap_or("true")
            .trim()
            .eq_ignore_ascii_case("true");
        if !enabled {
            return;
        }
        let Some(context) = EmbeddingContext::detect(self.env.as_ref()) else {
            return;
        };

        let name = context.configuration_name();
        let configs = match lookup(props, overrides, keys::USE_CONFIGS) {
            Some(existing) if split_unquoted(existing, ',', true).iter().any(|n| n == name) => {
                return;
            }
            Some(existing) if !existing.trim().is_empty() => format!("{},{}", existing, name),
            _ => name.to_string(),
        };

        debug!(context = ?context, use_configs = %configs, "Embedding context detected");
        props.set(keys::USE_CONFIGS, configs);
    }
}

impl Default for UrlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UrlParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlParser")
            .field("transforms", &self.transforms)
            .finish_non_exhaustive()
    }
}

/// Value from the URL layer, falling back to the overrides.
fn lookup<'a>(
    props: &'a ConnectionProperties,
    overrides: Option<&'a ConnectionProperties>,
    key: &str,
) -> Option<&'a str> {
    props.get(key).or_else(|| overrides.and_then(|o| o.get(key)))
}
