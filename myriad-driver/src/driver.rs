//! The driver front door.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use myriad_driver::{Connector, Driver, UrlDriver};
//!
//! # async fn example(connector: Arc<dyn Connector>) -> myriad_url::DriverResult<()> {
//! let driver = Driver::builder(connector).build();
//!
//! assert!(driver.accepts_url("mysql://db1,db2/shop"));
//! if let Some(mut conn) = driver.connect("mysql://db1,db2/shop", None).await? {
//!     println!("connected via {}", conn.kind());
//!     conn.close().await?;
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use myriad_url::{
    BoxError, ConnectionProperties, DriverError, DriverResult, EnvSource, ResourceLoader,
    TransformRegistry, UrlParser, UrlScheme,
};

use crate::connection::{Connection, ConnectionStrategy};
use crate::connector::Connector;
use crate::property_info::{self, PropertyInfo};
use crate::topology::{TopologyPlan, classify};
use crate::tracker::AbandonedConnectionTracker;

/// What a URL-dispatching driver can do.
#[async_trait]
pub trait UrlDriver: Send + Sync {
    /// Check if this driver owns `url`.
    fn accepts_url(&self, url: &str) -> bool;

    /// Connect to `url`.
    ///
    /// Returns `Ok(None)` only when the URL prefix is not recognised; a
    /// recognised but invalid URL is an error.
    async fn connect(
        &self,
        url: &str,
        overrides: Option<&ConnectionProperties>,
    ) -> DriverResult<Option<Connection>>;

    /// Describe the properties a tool should prompt for.
    fn property_info(
        &self,
        url: &str,
        overrides: Option<&ConnectionProperties>,
    ) -> DriverResult<Vec<PropertyInfo>>;
}

/// Multi-host driver dispatching to a [`Connector`].
#[derive(Clone)]
pub struct Driver {
    parser: UrlParser,
    connector: Arc<dyn Connector>,
    tracker: Option<Arc<AbandonedConnectionTracker>>,
}

impl Driver {
    /// Driver with the default parser and the process-wide tracker.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self::builder(connector).build()
    }

    /// Create a builder.
    pub fn builder(connector: Arc<dyn Connector>) -> DriverBuilder {
        DriverBuilder::new(connector)
    }

    /// The URL parser.
    pub fn parser(&self) -> &UrlParser {
        &self.parser
    }

    /// The tracker, unless tracking is disabled.
    pub fn tracker(&self) -> Option<&Arc<AbandonedConnectionTracker>> {
        self.tracker.as_ref()
    }

    /// Driver major version.
    pub fn major_version() -> u32 {
        env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0)
    }

    /// Driver minor version.
    pub fn minor_version() -> u32 {
        env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0)
    }

    async fn establish(&self, plan: TopologyPlan) -> Result<ConnectionStrategy, BoxError> {
        let connector = self.connector.as_ref();

        let strategy = match plan {
            TopologyPlan::Direct(route) => {
                let session = connector
                    .direct(
                        &route.host,
                        route.port,
                        &route.properties,
                        route.database.as_deref(),
                        &route.url,
                    )
                    .await?;
                ConnectionStrategy::Direct {
                    host: route.host,
                    port: route.port,
                    database: route.database,
                    session,
                }
            }
            TopologyPlan::Failover { hosts, properties } => {
                let session = connector.failover(&hosts, &properties).await?;
                ConnectionStrategy::Failover { hosts, session }
            }
            TopologyPlan::LoadBalanced { hosts, properties } => {
                let session = connector.load_balanced(&hosts, &properties).await?;
                ConnectionStrategy::LoadBalanced { hosts, session }
            }
            TopologyPlan::Replication(plan) => {
                let session = connector.replication(&plan).await?;
                ConnectionStrategy::Replicated {
                    roles: plan.roles,
                    session,
                }
            }
        };

        Ok(strategy)
    }

    fn track(&self, strategy: ConnectionStrategy) -> Connection {
        let strategy = Arc::new(strategy);
        let tracking = match (&self.tracker, strategy.session().network_resources()) {
            (Some(tracker), Some(resources)) => Some(tracker.register(&strategy, resources)),
            _ => None,
        };
        Connection::new(strategy, tracking)
    }
}

#[async_trait]
impl UrlDriver for Driver {
    fn accepts_url(&self, url: &str) -> bool {
        self.parser.accepts(url)
    }

    async fn connect(
        &self,
        url: &str,
        overrides: Option<&ConnectionProperties>,
    ) -> DriverResult<Option<Connection>> {
        let Some(scheme) = UrlScheme::detect(url) else {
            return Ok(None);
        };
        crate::myriad_debug!(scheme = %scheme, "Connect requested");
        let Some(props) = self.parser.parse(url, overrides)? else {
            return Ok(None);
        };

        let plan = classify(scheme, url, props)?;
        let kind = plan.kind();
        debug!(topology = %kind, "Establishing connection");

        let strategy = self
            .establish(plan)
            .await
            .map_err(DriverError::unable_to_connect)?;
        let connection = self.track(strategy);

        info!(topology = %kind, tracking_id = ?connection.tracking_id(), "Connection established");
        Ok(Some(connection))
    }

    fn property_info(
        &self,
        url: &str,
        overrides: Option<&ConnectionProperties>,
    ) -> DriverResult<Vec<PropertyInfo>> {
        let props = if UrlScheme::detect(url) == Some(UrlScheme::Standard) {
            self.parser.parse(url, overrides)?.unwrap_or_default()
        } else {
            overrides.cloned().unwrap_or_default()
        };
        Ok(property_info::describe(&props))
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("parser", &self.parser)
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Driver`].
pub struct DriverBuilder {
    connector: Arc<dyn Connector>,
    loader: Option<Arc<dyn ResourceLoader>>,
    transforms: TransformRegistry,
    env: Option<Arc<dyn EnvSource>>,
    tracker: Option<Arc<AbandonedConnectionTracker>>,
    tracking: bool,
}

impl DriverBuilder {
    /// Create a builder around `connector`.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            loader: None,
            transforms: TransformRegistry::new(),
            env: None,
            tracker: None,
            tracking: true,
        }
    }

    /// Named-configuration loader; defaults to the bundled configurations.
    pub fn loader(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Transform registry used for `propertiesTransform`.
    pub fn transforms(mut self, transforms: TransformRegistry) -> Self {
        self.transforms = transforms;
        self
    }

    /// Environment source; defaults to the process environment.
    pub fn env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Some(Arc::new(env));
        self
    }

    /// Use a specific tracker instead of the process-wide one.
    pub fn tracker(mut self, tracker: Arc<AbandonedConnectionTracker>) -> Self {
        self.tracker = Some(tracker);
        self.tracking = true;
        self
    }

    /// Disable abandoned-connection tracking.
    pub fn without_tracking(mut self) -> Self {
        self.tracker = None;
        self.tracking = false;
        self
    }

    /// Build the driver.
    pub fn build(self) -> Driver {
        let mut parser = UrlParser::new().with_transforms(Arc::new(self.transforms));
        if let Some(loader) = self.loader {
            parser = parser.with_loader(loader);
        }
        if let Some(env) = self.env {
            parser = parser.with_env(env);
        }

        let tracker = if self.tracking {
            Some(self.tracker.unwrap_or_else(AbandonedConnectionTracker::global))
        } else {
            None
        };

        debug!(tracking = tracker.is_some(), "Driver built");
        Driver {
            parser,
            connector: self.connector,
            tracker,
        }
    }
}

impl fmt::Debug for DriverBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverBuilder")
            .field("transforms", &self.transforms)
            .field("tracking", &self.tracking)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::Session;
    use crate::topology::ReplicationPlan;
    use myriad_url::MapEnvSource;

    struct RefusingConnector;

    #[async_trait]
    impl Connector for RefusingConnector {
        async fn direct(
            &self,
            _host: &str,
            _port: u16,
            _props: &ConnectionProperties,
            _database: Option<&str>,
            _url: &str,
        ) -> Result<Box<dyn Session>, BoxError> {
            Err("connection refused".into())
        }

        async fn failover(
            &self,
            _hosts: &[String],
            _props: &ConnectionProperties,
        ) -> Result<Box<dyn Session>, BoxError> {
            Err("connection refused".into())
        }

        async fn load_balanced(
            &self,
            _hosts: &[String],
            _props: &ConnectionProperties,
        ) -> Result<Box<dyn Session>, BoxError> {
            Err("connection refused".into())
        }

        async fn replication(&self, _plan: &ReplicationPlan) -> Result<Box<dyn Session>, BoxError> {
            Err("connection refused".into())
        }
    }

    fn driver() -> Driver {
        Driver::builder(Arc::new(RefusingConnector))
            .env(MapEnvSource::new())
            .without_tracking()
            .build()
    }

    #[test]
    fn test_accepts_url() {
        let driver = driver();
        assert!(driver.accepts_url("mysql://h/db"));
        assert!(driver.accepts_url("MYSQL:REPLICATION://a,b/db"));
        assert!(!driver.accepts_url("postgres://h/db"));
        assert!(!driver.accepts_url("mysql://h:/db"));
    }

    #[tokio::test]
    async fn test_connect_declines_foreign_url() {
        assert!(driver().connect("sqlite://x", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connect_wraps_connector_failure() {
        let err = driver().connect("mysql://h/db", None).await.unwrap_err();
        assert!(err.is_unable_to_connect());
        assert_eq!(err.sql_state(), "08001");
        assert!(err.source.is_some());
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_declined() {
        let err = driver().connect("mysql://h:/db", None).await.unwrap_err();
        assert!(err.is_invalid_attribute());
    }

    #[test]
    fn test_property_info_parses_plain_urls_only() {
        let driver = driver();
        let infos = driver.property_info("mysql://db1:3310/shop", None).unwrap();
        assert_eq!(infos[0].value.as_deref(), Some("db1"));
        assert_eq!(infos[1].value.as_deref(), Some("3310"));
        assert_eq!(infos[2].value.as_deref(), Some("shop"));

        let overrides = ConnectionProperties::new().with("host", "given");
        let infos = driver
            .property_info("mysql:loadbalance://db1/shop", Some(&overrides))
            .unwrap();
        assert_eq!(infos[0].value.as_deref(), Some("given"));
        assert_eq!(infos[2].value, None);
    }

    #[test]
    fn test_versions() {
        assert_eq!(
            Driver::major_version().to_string(),
            env!("CARGO_PKG_VERSION_MAJOR")
        );
        assert_eq!(
            Driver::minor_version().to_string(),
            env!("CARGO_PKG_VERSION_MINOR")
        );
    }

    #[test]
    fn test_default_tracking_uses_global() {
        let driver = Driver::new(Arc::new(RefusingConnector));
        let tracker = driver.tracker().unwrap();
        assert!(Arc::ptr_eq(tracker, &AbandonedConnectionTracker::global()));
    }
}
