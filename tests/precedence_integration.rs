//! Integration tests for URL parsing and property precedence.
//!
//! These tests drive the public parser with in-memory and on-disk named
//! configurations.

use pretty_assertions::assert_eq;
use std::sync::Arc;

use myriad::url::resources::{BundledConfigurations, ChainLoader, DirectoryLoader, MapLoader};
use myriad::url::env::EMBEDDING_CONTEXT_VAR;
use myriad::url::{MapEnvSource, keys};
use myriad::{ConnectionProperties, UrlParser};

fn parser_with(loader: impl myriad::url::ResourceLoader + 'static) -> UrlParser {
    UrlParser::new()
        .with_loader(Arc::new(loader))
        .with_env(Arc::new(MapEnvSource::new()))
}

fn site_loader() -> MapLoader {
    MapLoader::new().with(
        "site",
        ConnectionProperties::new().with("connectTimeout", "100"),
    )
}

/// Test the caller override wins over query and named configuration
#[test]
fn test_override_beats_query_and_configuration() {
    let parser = parser_with(site_loader());
    let overrides = ConnectionProperties::new().with("connectTimeout", "300");

    let props = parser
        .parse(
            "mysql://h/db?useConfigs=site&connectTimeout=200",
            Some(&overrides),
        )
        .unwrap()
        .unwrap();

    assert_eq!(props.get("connectTimeout"), Some("300"));
}

/// Test the query value wins once the override is gone
#[test]
fn test_query_beats_configuration() {
    let parser = parser_with(site_loader());

    let props = parser
        .parse("mysql://h/db?useConfigs=site&connectTimeout=200", None)
        .unwrap()
        .unwrap();

    assert_eq!(props.get("connectTimeout"), Some("200"));
}

/// Test the named configuration value stands alone
#[test]
fn test_configuration_value_alone() {
    let parser = parser_with(site_loader());

    let props = parser
        .parse("mysql://h/db?useConfigs=site", None)
        .unwrap()
        .unwrap();

    assert_eq!(props.get("connectTimeout"), Some("100"));
}

/// Test an override cannot change the host count
#[test]
fn test_host_count_comes_from_url() {
    let parser = parser_with(MapLoader::new());
    let overrides = ConnectionProperties::new().with(keys::NUM_HOSTS, "7");

    let props = parser
        .parse("mysql://a,b,c/db?numHosts=9", Some(&overrides))
        .unwrap()
        .unwrap();

    assert_eq!(props.host_count().unwrap(), 3);
}

/// Test configurations loaded from a directory
#[test]
fn test_directory_configurations() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("reporting.toml"),
        "# Read-only reporting replicas.\nreadOnly = true\nconnectTimeout = 2500\n",
    )
    .unwrap();

    let loader = ChainLoader::new()
        .with(DirectoryLoader::new(dir.path()))
        .with(BundledConfigurations);
    let parser = parser_with(loader);

    let props = parser
        .parse("mysql://h/db?useConfigs=reporting,maxPerformance", None)
        .unwrap()
        .unwrap();

    assert_eq!(props.get("readOnly"), Some("true"));
    assert_eq!(props.get("connectTimeout"), Some("2500"));
    assert_eq!(props.get("cachePrepStmts"), Some("true"));
}

/// Test a malformed configuration file is an invalid attribute
#[test]
fn test_malformed_configuration_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.toml"), "[nested]\nkey = 1\n").unwrap();
    let parser = parser_with(DirectoryLoader::new(dir.path()));

    let err = parser
        .parse("mysql://h/db?useConfigs=broken", None)
        .unwrap_err();

    assert!(err.is_invalid_attribute());
    assert!(err.source.is_some());
}

/// Test the embedding context adds its configuration
#[test]
fn test_embedding_context() {
    let env = MapEnvSource::new().set(EMBEDDING_CONTEXT_VAR, "ColdFusion");
    let parser = UrlParser::new().with_env(Arc::new(env));

    let props = parser.parse("mysql://h/db", None).unwrap().unwrap();

    assert_eq!(props.get(keys::USE_CONFIGS), Some("coldFusion"));
    assert_eq!(props.get("useLocalSessionState"), Some("true"));
}
