//! Core StoreBridge functionality
//!
//! This module contains the main StoreBridge struct and its implementation:
//! the named data-source registry shared by store factories and the validated
//! store-creation entry point used at the cache configuration boundary.

use std::sync::Arc;

use crate::errors::StoreBridgeError;
use config::AppConfig;
use store_core::{DataSource, DataSourceRegistry, PooledDataSource, StoreFactory};

/// Main StoreBridge coordinator that owns the data-source registry and
/// turns store factories into stores
#[derive(Default)]
pub struct StoreBridge {
    registry: DataSourceRegistry,
}

impl StoreBridge {
    /// Create a new StoreBridge with an empty registry
    pub fn new() -> Self {
        Self {
            registry: DataSourceRegistry::new(),
        }
    }

    /// Create a StoreBridge from declarative configuration, registering a
    /// pooled data source under the configured name.
    ///
    /// No connection is opened here; the data source connects on first use.
    pub fn from_config(config: &AppConfig) -> Result<Self, StoreBridgeError> {
        let mut bridge = Self::new();
        bridge.register_data_source(
            config.store.data_source.clone(),
            Arc::new(PooledDataSource::new(config.connection.clone())),
        )?;
        Ok(bridge)
    }

    /// Register a data source under a given name
    pub fn register_data_source(
        &mut self,
        name: impl Into<String>,
        source: Arc<dyn DataSource>,
    ) -> Result<(), StoreBridgeError> {
        self.registry.register(name, source)?;
        Ok(())
    }

    /// Resolve a registered data source by name
    pub fn data_source(&self, name: &str) -> Result<Arc<dyn DataSource>, StoreBridgeError> {
        Ok(self.registry.lookup(name)?)
    }

    /// Remove a data source by name
    pub fn unregister_data_source(&mut self, name: &str) -> Result<(), StoreBridgeError> {
        self.registry.unregister(name)?;
        Ok(())
    }

    /// List all registered data-source names
    pub fn data_source_names(&self) -> Vec<&String> {
        self.registry.names()
    }

    /// The registry consulted by store factories
    pub fn registry(&self) -> &DataSourceRegistry {
        &self.registry
    }

    /// Validate a factory and create its store.
    ///
    /// This is the cache configuration boundary: the factory must survive
    /// transmission to every node that may host the cache, so a factory
    /// holding direct object references is rejected here, before any store
    /// is created anywhere. Factories that are only used locally can call
    /// [`StoreFactory::create`] with the registry directly.
    pub fn create_store<F: StoreFactory>(&self, factory: &F) -> Result<F::Store, StoreBridgeError> {
        factory.ensure_transmittable()?;
        Ok(factory.create(&self.registry)?)
    }
}

impl std::fmt::Debug for StoreBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreBridge")
            .field("data_sources", &self.data_source_names())
            .finish()
    }
}
