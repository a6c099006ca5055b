//! Error types for pharos-repo.

use thiserror::Error;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepoError>;

/// Errors that can occur while talking to a repository backend.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Backend read or write failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// A commit lost the race against a concurrent writer.
    #[error("commit conflict: {0}")]
    Conflict(String),

    /// Malformed resource path.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Record (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for RepoError {
    fn from(e: rocksdb::Error) -> Self {
        RepoError::Storage(e.to_string())
    }
}
