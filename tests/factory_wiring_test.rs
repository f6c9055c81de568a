//! Store factory wiring tests
//!
//! End-to-end checks that a factory built from declarative configuration
//! wires the configured data source and dialect into the created store, that
//! the same factory configuration produces correctly wired stores on every
//! node it is shipped to, and that non-transmittable factories are rejected
//! at the configuration boundary.

use sql_dialect::{Dialect, DialectKind};
use std::sync::Arc;
use storebridge::prelude::*;

fn connection_config() -> ConnectionConfig {
    ConnectionConfig::new(
        "localhost".to_string(),
        5432,
        "cachedb".to_string(),
        "postgres".to_string(),
        "password".to_string(),
        1,
        5,
        30,
        600,
        3600,
    )
}

/// No-op dialect producing empty query text, used to verify wiring without
/// touching a backend
struct DummyDialect;

impl Dialect for DummyDialect {
    fn supports_upsert(&self) -> bool {
        false
    }

    fn max_parameters(&self) -> usize {
        0
    }

    fn select_range_query(&self, _table: &str, _key_cols: &[&str]) -> String {
        String::new()
    }

    fn load_cache_query(&self, _table: &str, _uniq_cols: &[&str]) -> String {
        String::new()
    }

    fn load_cache_range_query(
        &self,
        _table: &str,
        _key_cols: &[&str],
        _uniq_cols: &[&str],
        _append_lower_bound: bool,
        _append_upper_bound: bool,
    ) -> String {
        String::new()
    }

    fn load_query(
        &self,
        _table: &str,
        _key_cols: &[&str],
        _uniq_cols: &[&str],
        _key_count: usize,
    ) -> String {
        String::new()
    }

    fn insert_query(&self, _table: &str, _key_cols: &[&str], _val_cols: &[&str]) -> String {
        String::new()
    }

    fn update_query(&self, _table: &str, _key_cols: &[&str], _val_cols: &[&str]) -> String {
        String::new()
    }

    fn upsert_query(&self, _table: &str, _key_cols: &[&str], _val_cols: &[&str]) -> Option<String> {
        None
    }

    fn delete_query(&self, _table: &str, _key_cols: &[&str], _key_count: usize) -> String {
        String::new()
    }
}

/// Factory shared by all nodes of the test cluster
fn cache_configuration() -> SqlStoreFactory<i32, String> {
    SqlStoreFactory::new().with_data_source_name("simpleDataSource")
}

#[test]
fn test_cache_configuration_wires_the_registered_data_source() {
    // Two nodes register different provider types under the same name
    let mut node = StoreBridge::new();
    node.register_data_source(
        "simpleDataSource",
        Arc::new(SimpleDataSource::new(connection_config())),
    )
    .unwrap();

    let mut node1 = StoreBridge::new();
    node1
        .register_data_source(
            "simpleDataSource",
            Arc::new(PooledDataSource::new(connection_config())),
        )
        .unwrap();

    let factory = cache_configuration();

    // The factory is shipped to each node as serialized configuration
    let shipped = serde_json::to_string(&factory).unwrap();
    let factory_on_node: SqlStoreFactory<i32, String> = serde_json::from_str(&shipped).unwrap();
    let factory_on_node1: SqlStoreFactory<i32, String> = serde_json::from_str(&shipped).unwrap();

    let store = node.create_store(&factory_on_node).unwrap();
    assert!(store.data_source().as_any().is::<SimpleDataSource>());
    assert!(Arc::ptr_eq(
        store.data_source(),
        &node.data_source("simpleDataSource").unwrap()
    ));

    let store1 = node1.create_store(&factory_on_node1).unwrap();
    assert!(store1.data_source().as_any().is::<PooledDataSource>());

    // No backend was touched during creation
    assert_eq!(store.state(), StoreState::Configured);
    assert_eq!(store1.state(), StoreState::Configured);
}

#[test]
fn test_factory_with_dialect_instance_is_rejected_as_not_serializable() {
    let mut node = StoreBridge::new();
    node.register_data_source(
        "simpleDataSource",
        Arc::new(SimpleDataSource::new(connection_config())),
    )
    .unwrap();

    let factory: SqlStoreFactory<i32, String> =
        cache_configuration().with_dialect_instance(Arc::new(DummyDialect));

    let err = node.create_store(&factory).unwrap_err();
    assert!(err.to_string().contains("not transmittable"));

    // The unvalidated local path still wires the injected dialect
    let store = factory.create(node.registry()).unwrap();
    assert!(!store.dialect().supports_upsert());
    assert!(store
        .dialect()
        .upsert_query("cache_entries", &["k"], &["v"])
        .is_none());
}

#[test]
fn test_incorrect_reference_configuration_fails_with_the_name() {
    let node = StoreBridge::new();

    let factory: SqlStoreFactory<i32, String> =
        SqlStoreFactory::new().with_data_source_name("wrongDataSource");

    let err = node.create_store(&factory).unwrap_err();
    assert!(err.to_string().contains("wrongDataSource"));
}

#[test]
fn test_configured_dialect_kind_survives_shipping() {
    let mut node = StoreBridge::new();
    node.register_data_source(
        "simpleDataSource",
        Arc::new(SimpleDataSource::new(connection_config())),
    )
    .unwrap();

    let factory = cache_configuration().with_dialect(DialectKind::Embedded);

    let shipped = serde_json::to_string(&factory).unwrap();
    let restored: SqlStoreFactory<i32, String> = serde_json::from_str(&shipped).unwrap();
    assert_eq!(restored.dialect_kind(), DialectKind::Embedded);

    let store = node.create_store(&restored).unwrap();
    assert!(store.dialect().supports_upsert());
}

#[tokio::test]
async fn test_blob_store_factory_round_trip() {
    let node = StoreBridge::new();

    let mut properties = std::collections::HashMap::new();
    properties.insert("store.capacity".to_string(), "32".to_string());

    let factory: BlobStoreFactory<i32, String> =
        BlobStoreFactory::new().with_properties(properties);

    let shipped = serde_json::to_string(&factory).unwrap();
    let restored: BlobStoreFactory<i32, String> = serde_json::from_str(&shipped).unwrap();

    let store = node.create_store(&restored).unwrap();
    assert_eq!(store.state(), StoreState::Configured);

    store.write(&7, &"seven".to_string()).await.unwrap();
    assert_eq!(store.load(&7).await.unwrap(), Some("seven".to_string()));
    assert_eq!(store.state(), StoreState::Active);
}
