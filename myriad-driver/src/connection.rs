//! Established connections.
//!
//! A [`Connection`] wraps one of four strategies. Callers use the same
//! surface whatever the topology; routing state lives in the variant.

use myriad_url::{DriverError, DriverResult};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::connector::Session;
use crate::topology::{RoleAssignment, TopologyKind};
use crate::tracker::TrackingGuard;

/// Topology-specific routing state plus the session built for it.
pub enum ConnectionStrategy {
    /// A single server.
    Direct {
        /// Server host name.
        host: String,
        /// Server port.
        port: u16,
        /// Database selected at connect time.
        database: Option<String>,
        /// Session to the server.
        session: Box<dyn Session>,
    },
    /// Ordered hosts tried in turn.
    Failover {
        /// Hosts as `host:port`.
        hosts: Vec<String>,
        /// Session to the current host.
        session: Box<dyn Session>,
    },
    /// Hosts sharing load.
    LoadBalanced {
        /// Hosts as `host:port`.
        hosts: Vec<String>,
        /// Balancing session.
        session: Box<dyn Session>,
    },
    /// Masters for writes, slaves for reads.
    Replicated {
        /// Hosts split by role.
        roles: RoleAssignment,
        /// Session routing between the roles.
        session: Box<dyn Session>,
    },
}

impl ConnectionStrategy {
    /// The topology this strategy implements.
    pub fn kind(&self) -> TopologyKind {
        match self {
            Self::Direct { .. } => TopologyKind::Direct,
            Self::Failover { .. } => TopologyKind::Failover,
            Self::LoadBalanced { .. } => TopologyKind::LoadBalanced,
            Self::Replicated { .. } => TopologyKind::Replication,
        }
    }

    /// The underlying session.
    pub fn session(&self) -> &dyn Session {
        match self {
            Self::Direct { session, .. }
            | Self::Failover { session, .. }
            | Self::LoadBalanced { session, .. }
            | Self::Replicated { session, .. } => session.as_ref(),
        }
    }

    /// Every host this strategy may route to, as `host:port`.
    pub fn hosts(&self) -> Vec<String> {
        match self {
            Self::Direct { host, port, .. } => vec![format!("{}:{}", host, port)],
            Self::Failover { hosts, .. } | Self::LoadBalanced { hosts, .. } => hosts.clone(),
            Self::Replicated { roles, .. } => roles
                .masters
                .iter()
                .chain(&roles.slaves)
                .cloned()
                .collect(),
        }
    }
}

impl fmt::Debug for ConnectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct {
                host,
                port,
                database,
                ..
            } => f
                .debug_struct("Direct")
                .field("host", host)
                .field("port", port)
                .field("database", database)
                .finish_non_exhaustive(),
            Self::Failover { hosts, .. } => f
                .debug_struct("Failover")
                .field("hosts", hosts)
                .finish_non_exhaustive(),
            Self::LoadBalanced { hosts, .. } => f
                .debug_struct("LoadBalanced")
                .field("hosts", hosts)
                .finish_non_exhaustive(),
            Self::Replicated { roles, .. } => f
                .debug_struct("Replicated")
                .field("roles", roles)
                .finish_non_exhaustive(),
        }
    }
}

/// A live connection returned by the driver.
///
/// Dropping it without [`close`](Self::close) hands its network resources
/// to the abandoned-connection tracker.
pub struct Connection {
    // dropped before `tracking`, so the tracker sees it gone
    strategy: Arc<ConnectionStrategy>,
    tracking: Option<TrackingGuard>,
}

impl Connection {
    pub(crate) fn new(strategy: Arc<ConnectionStrategy>, tracking: Option<TrackingGuard>) -> Self {
        Self { strategy, tracking }
    }

    /// The topology behind this connection.
    pub fn kind(&self) -> TopologyKind {
        self.strategy.kind()
    }

    /// The routing strategy.
    pub fn strategy(&self) -> &ConnectionStrategy {
        &self.strategy
    }

    /// The underlying session.
    pub fn session(&self) -> &dyn Session {
        self.strategy.session()
    }

    /// Check if the connection has been closed.
    pub fn is_closed(&self) -> bool {
        self.session().is_closed()
    }

    /// Leak-tracking id, if the connection is tracked.
    pub fn tracking_id(&self) -> Option<u64> {
        self.tracking.as_ref().map(TrackingGuard::id)
    }

    /// Close the connection and stop tracking it.
    ///
    /// A failed close leaves the connection tracked, so its network
    /// resources are still force-released once it is dropped.
    pub async fn close(&mut self) -> DriverResult<()> {
        debug!(topology = %self.kind(), "Closing connection");
        self.strategy
            .session()
            .close()
            .await
            .map_err(DriverError::close_failed)?;

        if let Some(guard) = self.tracking.take() {
            guard.release_tracking();
        }
        Ok(())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("strategy", &self.strategy)
            .field("tracking_id", &self.tracking_id())
            .finish()
    }
}
