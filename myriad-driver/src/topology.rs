//! Topology classification.
//!
//! One decision per connect call, from the URL scheme and the resolved host
//! count:
//!
//! | Scheme                 | Hosts | Topology     |
//! |------------------------|-------|--------------|
//! | `mysql:loadbalance://` | >= 1  | LoadBalanced |
//! | `mysql:replication://` | >= 2  | Replication  |
//! | `mysql://`, `mysql:mxj://` | 1 | Direct       |
//! | `mysql://`, `mysql:mxj://` | > 1 | Failover   |

use std::fmt;
use tracing::debug;

use myriad_url::{
    ConnectionProperties, DriverError, DriverResult, UrlScheme, is_host_master,
    is_host_properties_list, keys,
};

/// Connection topology selected for a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyKind {
    /// One server, no routing.
    Direct,
    /// Ordered hosts, the next one tried when the current fails.
    Failover,
    /// Hosts sharing load.
    LoadBalanced,
    /// Writes to masters, reads from slaves.
    Replication,
}

impl TopologyKind {
    /// Get the topology name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Failover => "failover",
            Self::LoadBalanced => "load-balanced",
            Self::Replication => "replication",
        }
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Master and slave host lists for replication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleAssignment {
    /// Write targets, as `host:port` or raw descriptors.
    pub masters: Vec<String>,
    /// Read targets, in the same form.
    pub slaves: Vec<String>,
}

/// Everything a single-server connection needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectRoute {
    /// Server host name.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database from the URL path or `dbname`.
    pub database: Option<String>,
    /// The URL as the caller wrote it.
    pub url: String,
    /// Fully resolved properties.
    pub properties: ConnectionProperties,
}

/// Inputs for a replication strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationPlan {
    /// Configuration for master connections.
    pub master_properties: ConnectionProperties,
    /// Configuration for slave connections, tagged with `replication.isSlave`.
    pub slave_properties: ConnectionProperties,
    /// Hosts split by role.
    pub roles: RoleAssignment,
}

/// Outcome of classification, ready to hand to a connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyPlan {
    /// Single-server connection.
    Direct(DirectRoute),
    /// Failover across `hosts`.
    Failover {
        /// Hosts as `host:port`, in URL order.
        hosts: Vec<String>,
        /// Resolved properties without `roundRobinLoadBalance`.
        properties: ConnectionProperties,
    },
    /// Load balancing across `hosts`.
    LoadBalanced {
        /// Hosts as `host:port`, in URL order.
        hosts: Vec<String>,
        /// Resolved properties without `roundRobinLoadBalance`.
        properties: ConnectionProperties,
    },
    /// Master/slave replication.
    Replication(ReplicationPlan),
}

impl TopologyPlan {
    /// The selected topology.
    pub fn kind(&self) -> TopologyKind {
        match self {
            Self::Direct(_) => TopologyKind::Direct,
            Self::Failover { .. } => TopologyKind::Failover,
            Self::LoadBalanced { .. } => TopologyKind::LoadBalanced,
            Self::Replication(_) => TopologyKind::Replication,
        }
    }
}

/// Select and configure the topology for resolved properties.
pub fn classify(
    scheme: UrlScheme,
    url: &str,
    mut props: ConnectionProperties,
) -> DriverResult<TopologyPlan> {
    let count = props.host_count()?;

    let plan = match scheme {
        UrlScheme::LoadBalance => {
            props.remove(keys::ROUND_ROBIN_LOAD_BALANCE);
            if count < 1 {
                return Err(DriverError::insufficient_hosts(count)
                    .with_help("A load-balanced URL needs at least one host"));
            }
            TopologyPlan::LoadBalanced {
                hosts: host_list(&props, count),
                properties: props,
            }
        }
        UrlScheme::Replication => {
            if count < 2 {
                return Err(DriverError::insufficient_hosts(count));
            }
            TopologyPlan::Replication(replication_plan(props, count))
        }
        UrlScheme::Standard | UrlScheme::ManagedLauncher if count == 1 => {
            TopologyPlan::Direct(DirectRoute {
                host: props.host().to_string(),
                port: props.port()?,
                database: props.database().map(str::to_owned),
                url: url.to_string(),
                properties: props,
            })
        }
        UrlScheme::Standard | UrlScheme::ManagedLauncher => {
            props.remove(keys::ROUND_ROBIN_LOAD_BALANCE);
            TopologyPlan::Failover {
                hosts: host_list(&props, count),
                properties: props,
            }
        }
    };

    debug!(scheme = %scheme, hosts = count, topology = %plan.kind(), "Classified connection");
    Ok(plan)
}

/// `host.N:port.N` for every host, in URL order.
pub fn host_list(props: &ConnectionProperties, count: usize) -> Vec<String> {
    (1..=count).map(|i| props.host_port(i)).collect()
}

/// Split hosts into masters and slaves.
///
/// When the first host is an `address=(...)` descriptor every host is
/// classified by its `type` attribute and listed as written; otherwise the
/// first host is the master and the rest are slaves.
pub fn assign_roles(props: &ConnectionProperties, count: usize) -> RoleAssignment {
    let mut roles = RoleAssignment::default();

    if is_host_properties_list(&props.host_port(1)) {
        for i in 1..=count {
            let host = props.indexed_host(i).unwrap_or("null").to_string();
            if is_host_master(&host) {
                roles.masters.push(host);
            } else {
                roles.slaves.push(host);
            }
        }
    } else {
        let mut hosts = host_list(props, count).into_iter();
        roles.masters.extend(hosts.next());
        roles.slaves.extend(hosts);
    }

    roles
}

fn replication_plan(props: ConnectionProperties, count: usize) -> ReplicationPlan {
    let roles = assign_roles(&props, count);

    let mut master_properties = props;
    for i in 1..=count {
        master_properties.remove(&keys::indexed_host(i));
        master_properties.remove(&keys::indexed_port(i));
    }
    master_properties.remove(keys::NUM_HOSTS);
    master_properties.remove(keys::HOST);
    master_properties.remove(keys::PORT);

    let mut slave_properties = master_properties.clone();
    slave_properties.set(keys::REPLICATION_IS_SLAVE, "true");

    ReplicationPlan {
        master_properties,
        slave_properties,
        roles,
    }
}
