//! Transport collaborator boundary.
//!
//! The driver decides *which* topology a URL asks for; a [`Connector`]
//! builds it. Implementations own the handshake, routing and retry logic and
//! hand back a [`Session`].

use async_trait::async_trait;
use std::sync::Arc;

use myriad_url::{BoxError, ConnectionProperties};

use crate::topology::ReplicationPlan;

/// The socket-level resource behind a session.
///
/// The abandoned-connection tracker holds one of these for every live
/// connection and calls [`force_close`](Self::force_close) when the owning
/// connection is dropped without being closed.
pub trait NetworkResources: Send + Sync {
    /// Release the resource. Must tolerate being called after the session
    /// already closed it.
    fn force_close(&self) -> Result<(), BoxError>;
}

/// An established connection as seen by the driver.
#[async_trait]
pub trait Session: Send + Sync {
    /// Handle used for leak cleanup; `None` opts out of tracking.
    fn network_resources(&self) -> Option<Arc<dyn NetworkResources>> {
        None
    }

    /// Close the session.
    async fn close(&self) -> Result<(), BoxError>;

    /// Check if the session has been closed.
    fn is_closed(&self) -> bool;
}

/// Builds sessions for each topology.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to a single server.
    async fn direct(
        &self,
        host: &str,
        port: u16,
        props: &ConnectionProperties,
        database: Option<&str>,
        url: &str,
    ) -> Result<Box<dyn Session>, BoxError>;

    /// Build a failover strategy over `hosts` (`host:port`, in URL order).
    async fn failover(
        &self,
        hosts: &[String],
        props: &ConnectionProperties,
    ) -> Result<Box<dyn Session>, BoxError>;

    /// Build a load-balancing strategy over `hosts`.
    async fn load_balanced(
        &self,
        hosts: &[String],
        props: &ConnectionProperties,
    ) -> Result<Box<dyn Session>, BoxError>;

    /// Build a master/slave replication strategy.
    async fn replication(&self, plan: &ReplicationPlan) -> Result<Box<dyn Session>, BoxError>;
}
