//! Convenience re-exports for common StoreBridge usage
//!
//! This prelude module re-exports the most commonly used items from the
//! StoreBridge ecosystem, making it easier to import everything you need
//! with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use storebridge::prelude::*;
//!
//! // Now you have access to all the common StoreBridge types and traits
//! ```

// Core StoreBridge components
pub use crate::core::StoreBridge;
pub use crate::errors::StoreBridgeError;

// Re-export centralized config
pub use config::{AppConfig, ConfigError, ConnectionConfig, StoreConfig};

// Re-export commonly used store-core types for convenience
pub use store_core::prelude::*;

// Re-export store_core module for direct access
pub use store_core;

// Re-export the dialect crate for custom dialect implementations
pub use sql_dialect;

// Common external dependencies
pub use async_trait;
pub use sqlx;
pub use tokio;
