//! Convenience re-exports for common store-core usage

pub use crate::blob::BlobStore;
pub use crate::data_source::{DataSource, PooledDataSource, SimpleDataSource, SqlParam, SqlRow};
pub use crate::errors::StoreError;
pub use crate::factory::{BlobStoreFactory, SqlStoreFactory, StoreFactory};
pub use crate::registry::DataSourceRegistry;
pub use crate::session::{LocalSessionSource, Session, SessionSource};
pub use crate::store::{SqlStore, StoreState, TableMapping};

pub use sql_dialect::{Dialect, DialectKind, EmbeddedDialect, PostgresDialect, StandardDialect};
