//! Integration tests for the driver facade.

use async_trait::async_trait;
use std::sync::Arc;

use myriad::driver::ReplicationPlan;
use myriad::prelude::*;
use myriad::url::MapEnvSource;

/// Connector whose sessions are closed from the start.
struct ClosedConnector;

struct ClosedSession;

#[async_trait]
impl Session for ClosedSession {
    async fn close(&self) -> Result<(), BoxError> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        true
    }
}

#[async_trait]
impl Connector for ClosedConnector {
    async fn direct(
        &self,
        _host: &str,
        _port: u16,
        _props: &ConnectionProperties,
        _database: Option<&str>,
        _url: &str,
    ) -> Result<Box<dyn Session>, BoxError> {
        Ok(Box::new(ClosedSession))
    }

    async fn failover(
        &self,
        _hosts: &[String],
        _props: &ConnectionProperties,
    ) -> Result<Box<dyn Session>, BoxError> {
        Ok(Box::new(ClosedSession))
    }

    async fn load_balanced(
        &self,
        _hosts: &[String],
        _props: &ConnectionProperties,
    ) -> Result<Box<dyn Session>, BoxError> {
        Ok(Box::new(ClosedSession))
    }

    async fn replication(&self, _plan: &ReplicationPlan) -> Result<Box<dyn Session>, BoxError> {
        Ok(Box::new(ClosedSession))
    }
}

fn driver() -> Driver {
    Driver::builder(Arc::new(ClosedConnector))
        .env(MapEnvSource::new())
        .build()
}

/// Test sessions without network resources are not tracked
#[tokio::test]
async fn test_untracked_session() {
    let conn = driver()
        .connect("mysql:loadbalance://a,b/db", None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(conn.kind(), TopologyKind::LoadBalanced);
    assert_eq!(conn.tracking_id(), None);
    assert!(conn.is_closed());
}

/// Test property discovery through the facade
#[test]
fn test_property_info() {
    let overrides = ConnectionProperties::new().with(keys::USER, "app");
    let infos = driver()
        .property_info("mysql://db1/shop", Some(&overrides))
        .unwrap();

    let user = infos.iter().find(|i| i.name == keys::USER).unwrap();
    assert_eq!(user.value.as_deref(), Some("app"));
    assert!(user.required);
}

/// Test transforms registered on the builder reach the parser
#[tokio::test]
async fn test_builder_transforms() {
    let transforms = TransformRegistry::new().with("pin", |props: ConnectionProperties| {
        Ok::<_, BoxError>(props.with(keys::PORT, "4406"))
    });
    let driver = Driver::builder(Arc::new(ClosedConnector))
        .env(MapEnvSource::new())
        .transforms(transforms)
        .without_tracking()
        .build();

    let conn = driver
        .connect("mysql://h/db?propertiesTransform=pin", None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(conn.strategy().hosts(), vec!["h:4406"]);
}
