//! Error types for pqstore
//!
//! Provides a unified error type for all storage operations.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for pqstore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Contract Errors
    // -------------------------------------------------------------------------
    #[error("Backend '{0}' is abstract and cannot be instantiated")]
    NotInstantiable(String),

    #[error("Invalid batch: {identifiers} identifiers for {rows} code rows")]
    InvalidBatch { identifiers: usize, rows: usize },

    #[error("Invalid code block: {0}")]
    InvalidBlock(String),

    // -------------------------------------------------------------------------
    // Backend Errors
    // -------------------------------------------------------------------------
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Capacity exceeded: {0}")]
    Capacity(String),

    #[error("Storage is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

// redb splits its failures into one type per operation; everything past open
// surfaces as a Storage error carrying the engine's message.
macro_rules! storage_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(err: $ty) -> Self {
                    StoreError::Storage(err.to_string())
                }
            }
        )*
    };
}

storage_error_from!(
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
