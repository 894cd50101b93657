// Central Error Type for the Queue

use thiserror::Error;

/// Queue-level error type
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias using QueueError
pub type Result<T> = std::result::Result<T, QueueError>;

// From implementation for storage adapter crates (to avoid circular dependency)
impl From<String> for QueueError {
    fn from(err: String) -> Self {
        QueueError::Storage(err)
    }
}

// Note: sqlx::Error conversion is handled in the storage-sqlite crate
// by converting to QueueError::Storage(String)
