//! Error types for key-value backend operations.

use std::io;
use thiserror::Error;

/// Result type for backend operations.
pub type KvResult<T> = Result<T, KvError>;

/// Errors that can occur while talking to a key-value backend.
#[derive(Debug, Error)]
pub enum KvError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The persisted keyspace could not be loaded.
    #[error("keyspace corrupted: {0}")]
    Corrupted(String),

    /// The backend has been closed.
    #[error("backend is closed")]
    Closed,

    /// The atomic script could not evaluate the stored value.
    #[error("script error: {0}")]
    Script(String),

    /// Encoding the keyspace snapshot failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KvError {
    /// Creates a script error.
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script(message.into())
    }

    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }
}
