//! Error types for pharos-cluster.

use thiserror::Error;

/// Result type for view computation.
pub type Result<T> = std::result::Result<T, ViewError>;

/// Why a local cluster view could not be produced.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The membership signal does not describe a stable view yet: the
    /// descriptor is missing or not final, the active set is empty, or a
    /// member the view must contain cannot be resolved.
    #[error("no established view: {0}")]
    NoEstablishedView(String),

    /// A view exists but does not contain the local member.
    #[error("isolated from topology: {0}")]
    IsolatedFromTopology(String),

    /// Repository access or parsing failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl From<pharos_repo::RepoError> for ViewError {
    fn from(e: pharos_repo::RepoError) -> Self {
        ViewError::Repository(e.to_string())
    }
}
