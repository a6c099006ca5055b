//! Session traits.
//!
//! A [`Repository`] hands out short-lived [`Session`]s. A session sees a
//! consistent view of the store, stages writes locally, and applies them
//! atomically on [`Session::commit`]. Callers open one session per unit of
//! work and drop it on every exit path.

use crate::error::Result;
use crate::path::RepoPath;
use crate::record::Record;

/// Factory for repository sessions.
pub trait Repository: Send + Sync {
    /// Open a new session.
    fn open(&self) -> Result<Box<dyn Session>>;
}

/// One unit-of-work handle onto the repository.
pub trait Session {
    /// The raw discovery-lite descriptor published by the membership layer,
    /// or `None` when the store has never seen one.
    fn descriptor(&self) -> Result<Option<String>>;

    /// Read the record at `path`. Staged writes in this session win over
    /// committed state.
    fn get(&self, path: &RepoPath) -> Result<Option<Record>>;

    /// Stage a full-record write at `path`.
    fn put(&mut self, path: &RepoPath, record: Record) -> Result<()>;

    /// Apply all staged writes atomically.
    ///
    /// Returns [`RepoError::Conflict`](crate::RepoError::Conflict) when the
    /// store changed since this session observed it. A failed commit rolls
    /// the staged writes back, so subsequent reads observe the winner's
    /// state and the session can be reused for a retry.
    fn commit(&mut self) -> Result<()>;
}
