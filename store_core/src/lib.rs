//! Store Core - pluggable persistent-store factories for StoreBridge
//!
//! This crate provides the store factory contract and its two bundled
//! backends: a SQL store driven by a [`sql_dialect::Dialect`] over a
//! [`data_source::DataSource`], and a session-backed blob store. Factories
//! are transmittable configuration values; stores are the runtime objects
//! performing load/write/delete against the backend.

pub mod blob;
pub mod data_source;
pub mod errors;
pub mod factory;
pub mod prelude;
pub mod registry;
pub mod session;
pub mod store;

pub use blob::BlobStore;
pub use data_source::{DataSource, PooledDataSource, SimpleDataSource, SqlParam, SqlRow};
pub use errors::StoreError;
pub use factory::{BlobStoreFactory, SqlStoreFactory, StoreFactory};
pub use registry::DataSourceRegistry;
pub use session::{LocalSessionSource, Session, SessionSource};
pub use store::{SqlStore, StoreState, TableMapping};
