//! Path-addressed repository abstraction for the pharos cluster view service.
//!
//! The view engine reads cluster membership state out of a content
//! repository: per-member records under a well-known parent path, an idmap
//! node, a persistent cluster-id record, and the discovery-lite descriptor
//! published by the membership layer.
//!
//! # Design
//!
//! This crate defines the narrow surface the engine is written against
//! ([`Repository`] and [`Session`]) and two backends:
//!
//! - [`MemoryRepository`]: shared in-memory tree with optimistic commits and
//!   conflict injection, the default for tests and embedded use.
//! - [`RocksRepository`]: RocksDB-backed tree, records stored as JSON.
//!
//! Sessions are unit-of-work handles: reads are consistent, writes are
//! staged, and `commit` applies them atomically or reports a conflict.

mod error;
mod memory;
mod path;
mod record;
mod rocks;
mod session;

pub use error::{RepoError, Result};
pub use memory::MemoryRepository;
pub use path::RepoPath;
pub use record::{is_internal_key, Record, INTERNAL_PREFIX, PROP_NODE_TYPE};
pub use rocks::RocksRepository;
pub use session::{Repository, Session};
