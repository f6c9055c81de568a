//! # StoreBridge
//!
//! A pluggable persistent-store factory library for distributed caches:
//! transmittable store factories that wire a configured data source, query
//! dialect or session backend into a ready-to-use store.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use storebridge::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let conn_config = ConnectionConfig::new(
//!         "localhost".to_string(), 5432, "cachedb".to_string(),
//!         "postgres".to_string(), "password".to_string(),
//!         1, 5, 30, 600, 3600,
//!     );
//!
//!     let mut bridge = StoreBridge::new();
//!     bridge.register_data_source(
//!         "primary",
//!         Arc::new(PooledDataSource::new(conn_config)),
//!     )?;
//!
//!     let factory = SqlStoreFactory::<String, String>::new()
//!         .with_data_source_name("primary")
//!         .with_dialect(DialectKind::Postgres);
//!
//!     // Validates that the factory is transmittable, then wires the store
//!     let store = bridge.create_store(&factory)?;
//!
//!     store.write(&"greeting".to_string(), &"hello".to_string()).await?;
//!     let value = store.load(&"greeting".to_string()).await?;
//!     println!("Loaded: {:?}", value);
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use core::StoreBridge;
pub use errors::StoreBridgeError;

// Re-export centralized config
pub use config::{AppConfig, ConfigError, ConnectionConfig, StoreConfig};

// Re-export internal crates making up the public API
pub use sql_dialect;
pub use store_core;

// Re-export external dependencies used in public API
pub use async_trait;
pub use sqlx;
