//! Persistent repository backend using RocksDB.
//!
//! One database key per resource path, records stored as JSON. Session
//! commits apply a single write batch, which RocksDB guarantees atomic.
//! This backend is single-writer in practice and never reports a commit
//! conflict; multi-writer races are a property of shared stores and are
//! modeled by the in-memory backend.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use rocksdb::{Options, WriteBatch, DB};

use crate::error::Result;
use crate::path::RepoPath;
use crate::record::{Record, PROP_NODE_TYPE};
use crate::session::{Repository, Session};

const DESCRIPTOR_KEY: &[u8] = b"meta:descriptor";
const NODE_PREFIX: &str = "node:";

/// RocksDB-backed resource tree.
pub struct RocksRepository {
    db: Arc<DB>,
}

impl RocksRepository {
    /// Open or create a repository at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Publish (or clear) the discovery descriptor.
    pub fn set_descriptor(&self, descriptor: Option<&str>) -> Result<()> {
        match descriptor {
            Some(d) => self.db.put(DESCRIPTOR_KEY, d.as_bytes())?,
            None => self.db.delete(DESCRIPTOR_KEY)?,
        }
        Ok(())
    }
}

impl Repository for RocksRepository {
    fn open(&self) -> Result<Box<dyn Session>> {
        Ok(Box::new(RocksSession {
            db: Arc::clone(&self.db),
            staged: BTreeMap::new(),
        }))
    }
}

fn node_key(path: &RepoPath) -> Vec<u8> {
    format!("{NODE_PREFIX}{}", path.as_str()).into_bytes()
}

struct RocksSession {
    db: Arc<DB>,
    staged: BTreeMap<RepoPath, Record>,
}

impl Session for RocksSession {
    fn descriptor(&self) -> Result<Option<String>> {
        match self.db.get(DESCRIPTOR_KEY)? {
            Some(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            None => Ok(None),
        }
    }

    fn get(&self, path: &RepoPath) -> Result<Option<Record>> {
        if let Some(staged) = self.staged.get(path) {
            return Ok(Some(staged.clone()));
        }
        match self.db.get(node_key(path))? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    fn put(&mut self, path: &RepoPath, record: Record) -> Result<()> {
        self.staged.insert(path.clone(), record);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.staged.is_empty() {
            return Ok(());
        }
        let mut batch = WriteBatch::default();
        for (path, record) in std::mem::take(&mut self.staged) {
            let mut record = record;
            if record.get(PROP_NODE_TYPE).is_none() {
                record.set(PROP_NODE_TYPE, "node");
            }
            batch.put(node_key(&path), serde_json::to_vec(&record)?);
        }
        self.db.write(batch)?;
        Ok(())
    }
}
