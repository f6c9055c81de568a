//! Error types for the StoreBridge crate
//!
//! This module contains all error types that can be returned by StoreBridge operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreBridgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] store_core::StoreError),
}
