use thiserror::Error;

/// Errors raised by store factories and the stores they produce.
///
/// Configuration and serialization errors are creation-time and fatal to
/// startup; the remaining variants are per-operation and leave the store
/// usable for the next call.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store configuration error: {0}")]
    Configuration(String),

    #[error("Store serialization error: {0}")]
    Serialization(String),

    #[error("Entry codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("Backend row error: {0}")]
    InvalidRow(String),

    #[error("Session error: {0}")]
    Session(String),
}
