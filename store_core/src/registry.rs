//! Named data-source registry
//!
//! Replaces ambient application-context lookup with an explicit name-to-object
//! mapping handed to store factories at creation time. The hosting platform
//! registers its providers once; factory configuration then only carries the
//! transmittable name.

use crate::data_source::DataSource;
use crate::errors::StoreError;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of named data sources consulted by store factories
#[derive(Default)]
pub struct DataSourceRegistry {
    sources: HashMap<String, Arc<dyn DataSource>>,
}

impl DataSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// Register a data source under a given name
    pub fn register(
        &mut self,
        name: impl Into<String>,
        source: Arc<dyn DataSource>,
    ) -> Result<(), StoreError> {
        let name = name.into();
        if self.sources.contains_key(&name) {
            return Err(StoreError::Configuration(format!(
                "Data source already registered: {}",
                name
            )));
        }

        self.sources.insert(name, source);
        Ok(())
    }

    /// Resolve a registered data source by name
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn DataSource>, StoreError> {
        self.sources.get(name).cloned().ok_or_else(|| {
            StoreError::Configuration(format!(
                "Failed to resolve data source '{}' in registry",
                name
            ))
        })
    }

    /// Remove a data source by name
    pub fn unregister(&mut self, name: &str) -> Result<(), StoreError> {
        self.sources.remove(name).map(|_| ()).ok_or_else(|| {
            StoreError::Configuration(format!(
                "Failed to resolve data source '{}' in registry",
                name
            ))
        })
    }

    /// List all registered names
    pub fn names(&self) -> Vec<&String> {
        self.sources.keys().collect()
    }
}

impl std::fmt::Debug for DataSourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSourceRegistry")
            .field("names", &self.names())
            .finish()
    }
}
