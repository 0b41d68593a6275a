/// Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database directory could not be created
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A flushed batch failed to commit
    #[error("Write failed: {0}")]
    Write(String),

    /// The background writer is gone
    #[error("Session writer has stopped")]
    WriterClosed,
}

impl From<StorageError> for radio_core::RadioError {
    fn from(err: StorageError) -> Self {
        radio_core::RadioError::storage(err.to_string())
    }
}
