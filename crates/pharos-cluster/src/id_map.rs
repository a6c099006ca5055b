//! Slot id to stable id mapping.
//!
//! Members announce their own mapping by writing it to the shared `idmap`
//! node; this side only reads. The mapping is cached per process because it
//! is consulted for every member on every call, and the cache is cleared
//! whenever the engine detects that it may be stale (sequence number
//! change, resolution failure, partial view).

use std::collections::HashMap;
use std::sync::Mutex;

use pharos_repo::{RepoPath, Session};
use tracing::{debug, warn};

use crate::instance::SlotId;

/// Node under the discovery resource path holding the mapping. Each visible
/// property maps a stable id to its current slot number.
pub const IDMAP_NODE: &str = "idmap";

/// Bidirectional mapping between descriptor slot ids and stable ids.
///
/// `clear_cache` must be callable from any thread; the next lookup after a
/// clear observes fresh repository state.
pub trait IdMap: Send + Sync {
    /// Resolve a slot id to a stable id, or `None` when the mapping does
    /// not (yet) contain the slot.
    fn stable_id_of(
        &self,
        session: &dyn Session,
        slot: SlotId,
    ) -> pharos_repo::Result<Option<String>>;

    /// Drop the cached mapping.
    fn clear_cache(&self);
}

/// Repository-backed [`IdMap`].
pub struct RepoIdMap {
    idmap_path: RepoPath,
    cache: Mutex<Option<HashMap<i64, String>>>,
}

impl RepoIdMap {
    /// Create an id map reading from `<discovery_resource_path>/idmap`.
    pub fn new(discovery_resource_path: &RepoPath) -> Self {
        Self {
            idmap_path: discovery_resource_path.child(IDMAP_NODE),
            cache: Mutex::new(None),
        }
    }

    fn load(&self, session: &dyn Session) -> pharos_repo::Result<HashMap<i64, String>> {
        let mut mapping = HashMap::new();
        if let Some(record) = session.get(&self.idmap_path)? {
            for (stable_id, slot) in record.visible() {
                match slot.parse::<i64>() {
                    Ok(slot) => {
                        mapping.insert(slot, stable_id.to_string());
                    }
                    Err(_) => {
                        warn!(stable_id, slot, "ignoring unparsable idmap entry");
                    }
                }
            }
        }
        debug!(entries = mapping.len(), "loaded idmap");
        Ok(mapping)
    }
}

impl IdMap for RepoIdMap {
    fn stable_id_of(
        &self,
        session: &dyn Session,
        slot: SlotId,
    ) -> pharos_repo::Result<Option<String>> {
        let mut cache = self.cache.lock().expect("idmap cache poisoned");
        if cache.is_none() {
            *cache = Some(self.load(session)?);
        }
        let mapping = cache.as_ref().expect("cache filled above");
        Ok(mapping.get(&slot.0).cloned())
    }

    fn clear_cache(&self) {
        let mut cache = self.cache.lock().expect("idmap cache poisoned");
        *cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharos_repo::{MemoryRepository, Record, Repository};

    fn discovery_path() -> RepoPath {
        RepoPath::new("/var/discovery/pharos").unwrap()
    }

    fn seed(repo: &MemoryRepository, entries: &[(&str, i64)]) {
        let mut record = Record::new();
        for (stable_id, slot) in entries {
            record.set(*stable_id, slot.to_string());
        }
        repo.put_record(&discovery_path().child(IDMAP_NODE), record);
    }

    #[test]
    fn resolves_slots() {
        let repo = MemoryRepository::new();
        seed(&repo, &[("instance-one", 1), ("instance-two", 2)]);

        let idmap = RepoIdMap::new(&discovery_path());
        let session = repo.open().unwrap();
        assert_eq!(
            idmap.stable_id_of(session.as_ref(), SlotId(1)).unwrap(),
            Some("instance-one".to_string())
        );
        assert_eq!(
            idmap.stable_id_of(session.as_ref(), SlotId(2)).unwrap(),
            Some("instance-two".to_string())
        );
        assert_eq!(idmap.stable_id_of(session.as_ref(), SlotId(3)).unwrap(), None);
    }

    #[test]
    fn missing_idmap_node_resolves_nothing() {
        let repo = MemoryRepository::new();
        let idmap = RepoIdMap::new(&discovery_path());
        let session = repo.open().unwrap();
        assert_eq!(idmap.stable_id_of(session.as_ref(), SlotId(1)).unwrap(), None);
    }

    #[test]
    fn cache_is_stale_until_cleared() {
        let repo = MemoryRepository::new();
        seed(&repo, &[("instance-one", 1)]);

        let idmap = RepoIdMap::new(&discovery_path());
        let session = repo.open().unwrap();
        assert!(idmap.stable_id_of(session.as_ref(), SlotId(2)).unwrap().is_none());

        // a new member appears; the cached mapping does not see it
        seed(&repo, &[("instance-one", 1), ("instance-two", 2)]);
        let session = repo.open().unwrap();
        assert!(idmap.stable_id_of(session.as_ref(), SlotId(2)).unwrap().is_none());

        idmap.clear_cache();
        assert_eq!(
            idmap.stable_id_of(session.as_ref(), SlotId(2)).unwrap(),
            Some("instance-two".to_string())
        );
    }

    #[test]
    fn unparsable_entries_are_skipped() {
        let repo = MemoryRepository::new();
        let record = Record::new()
            .with("instance-one", "1")
            .with("instance-bad", "not-a-slot");
        repo.put_record(&discovery_path().child(IDMAP_NODE), record);

        let idmap = RepoIdMap::new(&discovery_path());
        let session = repo.open().unwrap();
        assert_eq!(
            idmap.stable_id_of(session.as_ref(), SlotId(1)).unwrap(),
            Some("instance-one".to_string())
        );
    }
}
