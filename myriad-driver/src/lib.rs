//! # myriad-driver
//!
//! Topology selection and connection lifecycle for the myriad driver.
//!
//! Given a URL and caller overrides, the driver:
//! - resolves the configuration through [`myriad_url::UrlParser`]
//! - picks a topology (direct, failover, load-balanced, replication)
//! - asks a [`Connector`] to build the matching session
//! - registers the result with the [`AbandonedConnectionTracker`]
//!
//! The transport itself is out of scope: implement [`Connector`] and
//! [`Session`] for your protocol engine.
//!
//! ## Topologies
//!
//! ```rust
//! use myriad_driver::topology::{TopologyKind, TopologyPlan, classify};
//! use myriad_url::{UrlParser, UrlScheme};
//!
//! let url = "mysql:replication://primary:3306,replica:3306/shop";
//! let props = UrlParser::new().parse(url, None).unwrap().unwrap();
//! let plan = classify(UrlScheme::Replication, url, props).unwrap();
//!
//! assert_eq!(plan.kind(), TopologyKind::Replication);
//! if let TopologyPlan::Replication(replication) = plan {
//!     assert_eq!(replication.roles.masters, vec!["primary:3306"]);
//!     assert_eq!(replication.roles.slaves, vec!["replica:3306"]);
//! }
//! ```

pub mod connection;
pub mod connector;
pub mod driver;
pub mod logging;
pub mod property_info;
pub mod topology;
pub mod tracker;

pub use connection::{Connection, ConnectionStrategy};
pub use connector::{Connector, NetworkResources, Session};
pub use driver::{Driver, DriverBuilder, UrlDriver};
pub use property_info::{KNOWN_PROPERTIES, KnownProperty, PropertyInfo};
pub use topology::{
    DirectRoute, ReplicationPlan, RoleAssignment, TopologyKind, TopologyPlan, classify,
};
pub use tracker::{AbandonedConnectionTracker, CleanupError, TrackingGuard};
