//! Store factories
//!
//! A factory is a transmittable configuration value: the hosting platform
//! constructs it from declarative configuration, ships it to every node that
//! may own the cache, and calls [`StoreFactory::create`] once per store
//! instance. Creation resolves references and validates the configuration
//! but opens no connections or sessions; the produced store connects lazily
//! on first use.

use crate::blob::BlobStore;
use crate::data_source::DataSource;
use crate::errors::StoreError;
use crate::registry::DataSourceRegistry;
use crate::session::{LocalSessionSource, SessionSource};
use crate::store::{SqlStore, TableMapping};
use serde::{Deserialize, Serialize};
use sql_dialect::{Dialect, DialectKind};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

const DEFAULT_WRITE_BATCH_SIZE: usize = 512;

fn default_write_batch_size() -> usize {
    DEFAULT_WRITE_BATCH_SIZE
}

/// Contract implemented by all store factories.
///
/// `create` is pure with respect to external state apart from resolving
/// named references against the registry, and is safe to call concurrently
/// from independent factory values.
pub trait StoreFactory {
    type Store;

    /// Produce a configured store, resolving named references in `registry`.
    fn create(&self, registry: &DataSourceRegistry) -> Result<Self::Store, StoreError>;

    /// Fail when this factory would not survive transmission to another
    /// node. Checked at configuration-validation time, before any store is
    /// created anywhere.
    fn ensure_transmittable(&self) -> Result<(), StoreError>;
}

/// Factory for [`SqlStore`]: a data source (named or direct), a dialect and
/// a table mapping.
///
/// Fields set through `with_*` calls prior to [`StoreFactory::create`]. The
/// serialized form carries only the transmittable fields; direct object
/// references are deliberately dropped and rejected by
/// [`StoreFactory::ensure_transmittable`].
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct SqlStoreFactory<K, V> {
    data_source_name: Option<String>,
    #[serde(skip)]
    data_source: Option<Arc<dyn DataSource>>,
    #[serde(default)]
    dialect: DialectKind,
    #[serde(skip)]
    dialect_instance: Option<Arc<dyn Dialect>>,
    #[serde(default)]
    mapping: TableMapping,
    #[serde(default = "default_write_batch_size")]
    write_batch_size: usize,
    #[serde(skip)]
    _entry: PhantomData<fn() -> (K, V)>,
}

impl<K, V> SqlStoreFactory<K, V> {
    pub fn new() -> Self {
        Self {
            data_source_name: None,
            data_source: None,
            dialect: DialectKind::default(),
            dialect_instance: None,
            mapping: TableMapping::default(),
            write_batch_size: DEFAULT_WRITE_BATCH_SIZE,
            _entry: PhantomData,
        }
    }

    /// Build a factory from declarative store configuration
    pub fn from_config(config: &config::StoreConfig) -> Self {
        Self {
            data_source_name: Some(config.data_source.clone()),
            data_source: None,
            dialect: config.dialect,
            dialect_instance: None,
            mapping: TableMapping::from(config),
            write_batch_size: config.write_batch_size,
            _entry: PhantomData,
        }
    }

    /// Reference a registered data source by name (transmittable)
    pub fn with_data_source_name(mut self, name: impl Into<String>) -> Self {
        self.data_source_name = Some(name.into());
        self
    }

    /// Inject a data source directly (not transmittable)
    pub fn with_data_source(mut self, data_source: Arc<dyn DataSource>) -> Self {
        self.data_source = Some(data_source);
        self
    }

    /// Select a dialect variant by kind (transmittable)
    pub fn with_dialect(mut self, dialect: DialectKind) -> Self {
        self.dialect = dialect;
        self
    }

    /// Inject a dialect instance directly (not transmittable)
    pub fn with_dialect_instance(mut self, dialect: Arc<dyn Dialect>) -> Self {
        self.dialect_instance = Some(dialect);
        self
    }

    pub fn with_mapping(mut self, mapping: TableMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_write_batch_size(mut self, write_batch_size: usize) -> Self {
        self.write_batch_size = write_batch_size;
        self
    }

    pub fn data_source_name(&self) -> Option<&str> {
        self.data_source_name.as_deref()
    }

    pub fn dialect_kind(&self) -> DialectKind {
        self.dialect
    }

    pub fn mapping(&self) -> &TableMapping {
        &self.mapping
    }
}

impl<K, V> Default for SqlStoreFactory<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for SqlStoreFactory<K, V> {
    fn clone(&self) -> Self {
        Self {
            data_source_name: self.data_source_name.clone(),
            data_source: self.data_source.clone(),
            dialect: self.dialect,
            dialect_instance: self.dialect_instance.clone(),
            mapping: self.mapping.clone(),
            write_batch_size: self.write_batch_size,
            _entry: PhantomData,
        }
    }
}

impl<K, V> std::fmt::Debug for SqlStoreFactory<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlStoreFactory")
            .field("data_source_name", &self.data_source_name)
            .field("has_direct_data_source", &self.data_source.is_some())
            .field("dialect", &self.dialect)
            .field("has_dialect_instance", &self.dialect_instance.is_some())
            .field("mapping", &self.mapping)
            .field("write_batch_size", &self.write_batch_size)
            .finish()
    }
}

impl<K, V> StoreFactory for SqlStoreFactory<K, V> {
    type Store = SqlStore<K, V>;

    fn create(&self, registry: &DataSourceRegistry) -> Result<SqlStore<K, V>, StoreError> {
        self.mapping.validate()?;

        if self.write_batch_size == 0 {
            return Err(StoreError::Configuration(
                "Store write_batch_size must be greater than 0".to_string(),
            ));
        }

        let data_source = match (&self.data_source_name, &self.data_source) {
            (Some(name), Some(_)) => {
                return Err(StoreError::Configuration(format!(
                    "Data source name '{}' and direct data source reference are mutually exclusive",
                    name
                )))
            }
            (Some(name), None) => registry.lookup(name)?,
            (None, Some(source)) => Arc::clone(source),
            (None, None) => {
                return Err(StoreError::Configuration(
                    "Data source is required: set a registry name or a direct reference"
                        .to_string(),
                ))
            }
        };

        let dialect = match &self.dialect_instance {
            Some(instance) => Arc::clone(instance),
            None => self.dialect.dialect(),
        };

        debug!(
            table = %self.mapping.table,
            data_source = %data_source.describe(),
            "creating sql store"
        );

        Ok(SqlStore::new(
            data_source,
            dialect,
            self.mapping.clone(),
            self.write_batch_size,
        ))
    }

    fn ensure_transmittable(&self) -> Result<(), StoreError> {
        if self.data_source.is_some() {
            return Err(StoreError::Serialization(
                "Failed to validate store configuration: store factory is not transmittable \
                 (direct data source reference does not survive transmission; register the \
                 data source by name instead)"
                    .to_string(),
            ));
        }

        if self.dialect_instance.is_some() {
            return Err(StoreError::Serialization(
                "Failed to validate store configuration: store factory is not transmittable \
                 (direct dialect instance does not survive transmission; select a dialect \
                 kind instead)"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Factory for [`BlobStore`]: a session source supplied exactly one way.
///
/// Either a direct handle (not transmittable), a path to a properties file,
/// or an inline properties table. Setting none or several is a configuration
/// error because the combinations carry incompatible semantics.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct BlobStoreFactory<K, V> {
    #[serde(skip)]
    session_source: Option<Arc<dyn SessionSource>>,
    config_path: Option<PathBuf>,
    properties: Option<HashMap<String, String>>,
    #[serde(skip)]
    _entry: PhantomData<fn() -> (K, V)>,
}

impl<K, V> BlobStoreFactory<K, V> {
    pub fn new() -> Self {
        Self {
            session_source: None,
            config_path: None,
            properties: None,
            _entry: PhantomData,
        }
    }

    /// Inject a session source directly (not transmittable)
    pub fn with_session_source(mut self, source: Arc<dyn SessionSource>) -> Self {
        self.session_source = Some(source);
        self
    }

    /// Load session properties from a TOML file at creation time
    /// (transmittable; every node needs the file)
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Supply session properties inline (transmittable)
    pub fn with_properties(mut self, properties: HashMap<String, String>) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }

    pub fn properties(&self) -> Option<&HashMap<String, String>> {
        self.properties.as_ref()
    }
}

impl<K, V> Default for BlobStoreFactory<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for BlobStoreFactory<K, V> {
    fn clone(&self) -> Self {
        Self {
            session_source: self.session_source.clone(),
            config_path: self.config_path.clone(),
            properties: self.properties.clone(),
            _entry: PhantomData,
        }
    }
}

impl<K, V> std::fmt::Debug for BlobStoreFactory<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStoreFactory")
            .field("has_session_source", &self.session_source.is_some())
            .field("config_path", &self.config_path)
            .field("has_properties", &self.properties.is_some())
            .finish()
    }
}

impl<K, V> StoreFactory for BlobStoreFactory<K, V> {
    type Store = BlobStore<K, V>;

    fn create(&self, _registry: &DataSourceRegistry) -> Result<BlobStore<K, V>, StoreError> {
        let source: Arc<dyn SessionSource> =
            match (&self.session_source, &self.config_path, &self.properties) {
                (Some(source), None, None) => Arc::clone(source),
                (None, Some(path), None) => {
                    let properties = config::load_properties(path).map_err(|err| {
                        StoreError::Configuration(format!(
                            "Failed to load session properties from '{}': {}",
                            path.display(),
                            err
                        ))
                    })?;
                    Arc::new(LocalSessionSource::from_properties(&properties)?)
                }
                (None, None, Some(properties)) => {
                    Arc::new(LocalSessionSource::from_properties(properties)?)
                }
                _ => {
                    return Err(StoreError::Configuration(
                        "Exactly one of session source, configuration path or properties \
                         must be set"
                            .to_string(),
                    ))
                }
            };

        Ok(BlobStore::new(source))
    }

    fn ensure_transmittable(&self) -> Result<(), StoreError> {
        if self.session_source.is_some() {
            return Err(StoreError::Serialization(
                "Failed to validate store configuration: store factory is not transmittable \
                 (direct session source does not survive transmission; configure the session \
                 through a path or properties instead)"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
