//! # Myriad
//!
//! The front door of a multi-host MySQL client.
//!
//! Myriad provides:
//! - A connection URL grammar with multi-host lists and `address=(...)` descriptors
//! - A fixed precedence chain for URL values, query parameters, named
//!   configurations and caller overrides
//! - Topology selection: direct, failover, load-balanced and replication
//! - Tracking of connections dropped without being closed
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use myriad::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DriverError> {
//!     let driver = Driver::new(Arc::new(MyTransport::default()));
//!
//!     let overrides = ConnectionProperties::new()
//!         .with("user", "app")
//!         .with("password", "secret");
//!
//!     if let Some(mut conn) = driver
//!         .connect("mysql:replication://primary,replica/shop", Some(&overrides))
//!         .await?
//!     {
//!         println!("connected via {}", conn.kind());
//!         conn.close().await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// URL grammar, host lists and property precedence.
pub mod url {
    pub use myriad_url::*;
}

/// Topology selection, connections and leak tracking.
pub mod driver {
    pub use myriad_driver::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::driver::{
        AbandonedConnectionTracker, Connection, Connector, Driver, DriverBuilder,
        NetworkResources, Session, TopologyKind, UrlDriver,
    };
    pub use crate::url::{
        BoxError, ConnectionProperties, DriverError, DriverResult, TransformRegistry, UrlParser,
        keys,
    };
}

// Re-export key types at the crate root
pub use driver::{Driver, UrlDriver};
pub use url::{ConnectionProperties, DriverError, DriverResult, UrlParser};
