//! In-memory repository backend.
//!
//! The default backend for tests and embedded use. The whole store lives
//! behind one mutex; sessions stage writes locally and commit with
//! optimistic concurrency against a store-wide version counter.
//!
//! The repository handle doubles as the producer side: the membership layer
//! (or a test) publishes the discovery descriptor and seeds records through
//! it directly, without going through a session.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::trace;

use crate::error::{RepoError, Result};
use crate::path::RepoPath;
use crate::record::{Record, PROP_NODE_TYPE};
use crate::session::{Repository, Session};

#[derive(Default)]
struct Inner {
    nodes: BTreeMap<RepoPath, Record>,
    descriptor: Option<String>,
    /// Bumped on every committed or direct write.
    version: u64,
    /// Remaining commits that fail with a conflict (test hook).
    forced_conflicts: u32,
}

/// Shared in-memory resource tree.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish (or clear) the discovery descriptor.
    pub fn set_descriptor(&self, descriptor: Option<&str>) {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner.descriptor = descriptor.map(str::to_string);
        inner.version += 1;
    }

    /// Write a record directly, bypassing session staging.
    pub fn put_record(&self, path: &RepoPath, record: Record) {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner.nodes.insert(path.clone(), stamped(record));
        inner.version += 1;
    }

    /// Remove a record directly.
    pub fn remove_record(&self, path: &RepoPath) -> Option<Record> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        let removed = inner.nodes.remove(path);
        if removed.is_some() {
            inner.version += 1;
        }
        removed
    }

    /// Read a record directly.
    pub fn record(&self, path: &RepoPath) -> Option<Record> {
        let inner = self.inner.lock().expect("memory store poisoned");
        inner.nodes.get(path).cloned()
    }

    /// Force the next `n` commits (from any session) to fail with a
    /// conflict. Drives retry paths in tests.
    pub fn fail_commits(&self, n: u32) {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner.forced_conflicts = n;
    }
}

impl Repository for MemoryRepository {
    fn open(&self) -> Result<Box<dyn Session>> {
        let base_version = {
            let inner = self.inner.lock().expect("memory store poisoned");
            inner.version
        };
        Ok(Box::new(MemorySession {
            inner: Arc::clone(&self.inner),
            staged: BTreeMap::new(),
            base_version,
        }))
    }
}

struct MemorySession {
    inner: Arc<Mutex<Inner>>,
    staged: BTreeMap<RepoPath, Record>,
    base_version: u64,
}

impl Session for MemorySession {
    fn descriptor(&self) -> Result<Option<String>> {
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner.descriptor.clone())
    }

    fn get(&self, path: &RepoPath) -> Result<Option<Record>> {
        if let Some(staged) = self.staged.get(path) {
            return Ok(Some(staged.clone()));
        }
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner.nodes.get(path).cloned())
    }

    fn put(&mut self, path: &RepoPath, record: Record) -> Result<()> {
        self.staged.insert(path.clone(), record);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.staged.is_empty() {
            return Ok(());
        }
        let mut inner = self.inner.lock().expect("memory store poisoned");
        if inner.forced_conflicts > 0 {
            inner.forced_conflicts -= 1;
            self.staged.clear();
            self.base_version = inner.version;
            return Err(RepoError::Conflict("forced conflict".into()));
        }
        if inner.version != self.base_version {
            self.staged.clear();
            self.base_version = inner.version;
            return Err(RepoError::Conflict(format!(
                "store advanced to version {} since session opened",
                inner.version
            )));
        }
        trace!(writes = self.staged.len(), "committing staged writes");
        for (path, record) in std::mem::take(&mut self.staged) {
            inner.nodes.insert(path, stamped(record));
        }
        inner.version += 1;
        self.base_version = inner.version;
        Ok(())
    }
}

/// Ensure the stored record carries the internal node-type marker.
fn stamped(mut record: Record) -> Record {
    if record.get(PROP_NODE_TYPE).is_none() {
        record.set(PROP_NODE_TYPE, "node");
    }
    record
}
