//! # myriad-url
//!
//! Connection URL grammar for the myriad driver.
//!
//! This crate turns a connection URL and a set of caller overrides into one
//! resolved set of connection properties:
//! - Four URL prefixes (plain, managed launcher, load-balanced, replication)
//! - Multi-host segments with plain `host:port` tokens or `address=(...)` descriptors
//! - Query-string parameters
//! - Named configurations pulled in through `useConfigs`
//! - Property transforms resolved by name
//! - Fixed precedence: URL < query < named configurations < overrides
//!
//! ## Parsing
//!
//! ```rust
//! use myriad_url::{ConnectionProperties, UrlParser, keys};
//!
//! let parser = UrlParser::new();
//! let overrides = ConnectionProperties::new().with(keys::USER, "app");
//!
//! let props = parser
//!     .parse("mysql://db1:3307,db2/orders?connectTimeout=500", Some(&overrides))
//!     .unwrap()
//!     .expect("recognised prefix");
//!
//! assert_eq!(props.host(), "db1");
//! assert_eq!(props.port().unwrap(), 3307);
//! assert_eq!(props.get("port.2"), Some("3306"));
//! assert_eq!(props.get(keys::USER), Some("app"));
//! ```
//!
//! ## Named Configurations
//!
//! ```rust
//! use std::sync::Arc;
//! use myriad_url::{ConnectionProperties, UrlParser};
//! use myriad_url::resources::{BundledConfigurations, ChainLoader, MapLoader};
//!
//! let loader = ChainLoader::new()
//!     .with(MapLoader::new().with("site", ConnectionProperties::new().with("connectTimeout", "100")))
//!     .with(BundledConfigurations);
//! let parser = UrlParser::new().with_loader(Arc::new(loader));
//!
//! let props = parser
//!     .parse("mysql://h/db?useConfigs=site,maxPerformance", None)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(props.get("connectTimeout"), Some("100"));
//! assert_eq!(props.get("cachePrepStmts"), Some("true"));
//! ```

pub mod env;
pub mod error;
pub mod host;
pub mod parser;
pub mod properties;
pub mod quote;
pub mod resolver;
pub mod resources;
pub mod transform;

pub use env::{EmbeddingContext, EnvSource, MapEnvSource, StdEnvSource};
pub use error::{BoxError, DriverError, DriverResult, ErrorCode, ErrorContext};
pub use host::{
    DEFAULT_HOST, DEFAULT_PORT, HostEntry, expand_host_key_values, is_host_master,
    is_host_properties_list, parse_host_port,
};
pub use parser::{
    LAUNCHER_SOCKET_FACTORY, ParsedUrl, UrlParser, UrlScheme, parse_query_params, parse_url,
};
pub use properties::{ConnectionProperties, keys};
pub use resolver::PropertyResolver;
pub use resources::{ResourceError, ResourceLoader};
pub use transform::{PropertiesTransform, TransformRegistry};
