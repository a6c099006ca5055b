//! Per-member repository reads.
//!
//! Resolution chain for one slot: slot id to stable id through the id map,
//! then the member record under the cluster instances path. Any link can be
//! missing while a member is still starting up; the result says which one.

use pharos_repo::Session;
use tracing::{debug, warn};

use crate::config::ClusterConfig;
use crate::error::Result;
use crate::id_map::IdMap;
use crate::instance::{InstanceInfo, InstanceReadResult, SlotId};

/// Property holding the member's leader election token.
pub const PROP_LEADER_ELECTION_ID: &str = "leaderElectionId";

/// Property holding the member's last completed join sequence number.
pub const PROP_SYNC_TOKEN: &str = "syncToken";

/// Reads member state for one view computation.
pub struct ClusterReader<'a> {
    session: &'a dyn Session,
    config: &'a ClusterConfig,
    id_map: &'a dyn IdMap,
}

impl<'a> ClusterReader<'a> {
    /// Create a reader borrowing the call's session and collaborators.
    pub fn new(session: &'a dyn Session, config: &'a ClusterConfig, id_map: &'a dyn IdMap) -> Self {
        Self {
            session,
            config,
            id_map,
        }
    }

    /// Read one member's state.
    ///
    /// `tolerant` marks reads where an unresolvable member is an expected
    /// partial-start condition rather than a fault; it only changes how
    /// loudly the miss is logged. Either way the caller decides what a
    /// [`InstanceReadResult::Missing`] means.
    pub fn read_instance(&self, slot: SlotId, tolerant: bool) -> Result<InstanceReadResult> {
        let stable_id = match self.id_map.stable_id_of(self.session, slot)? {
            Some(id) => id,
            None => {
                return Ok(self.missing(
                    tolerant,
                    format!("slot {slot} cannot be resolved to a stable id"),
                ))
            }
        };

        let instance_path = self.config.cluster_instances_path.child(&stable_id);
        let record = match self.session.get(&instance_path)? {
            Some(record) => record,
            None => {
                return Ok(self.missing(
                    tolerant,
                    format!("no instance record at {instance_path} for slot {slot}"),
                ))
            }
        };

        let leader_election_token = match record.get(PROP_LEADER_ELECTION_ID) {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => {
                return Ok(self.missing(
                    tolerant,
                    format!("instance record at {instance_path} has no {PROP_LEADER_ELECTION_ID}"),
                ))
            }
        };

        // absent means the member never completed a join handshake
        let last_sync_token = match record.get(PROP_SYNC_TOKEN) {
            None => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(token) => Some(token),
                Err(_) => {
                    return Ok(self.missing(
                        tolerant,
                        format!("instance record at {instance_path} has unparsable {PROP_SYNC_TOKEN} {raw:?}"),
                    ))
                }
            },
        };

        Ok(InstanceReadResult::Found(InstanceInfo::new(
            slot,
            stable_id,
            leader_election_token,
            last_sync_token,
        )))
    }

    fn missing(&self, tolerant: bool, msg: String) -> InstanceReadResult {
        if tolerant {
            debug!("{msg}");
        } else {
            warn!("{msg}");
        }
        InstanceReadResult::Missing(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_map::{RepoIdMap, IDMAP_NODE};
    use pharos_repo::{MemoryRepository, Record, RepoPath, Repository};

    struct Fixture {
        repo: MemoryRepository,
        config: ClusterConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                repo: MemoryRepository::new(),
                config: ClusterConfig::default(),
            }
        }

        fn discovery_path(&self) -> RepoPath {
            self.config.discovery_resource_path().unwrap()
        }

        fn map_slot(&self, stable_id: &str, slot: i64) {
            let idmap_path = self.discovery_path().child(IDMAP_NODE);
            let mut record = self.repo.record(&idmap_path).unwrap_or_default();
            record.set(stable_id, slot.to_string());
            self.repo.put_record(&idmap_path, record);
        }

        fn put_instance(&self, stable_id: &str, record: Record) {
            self.repo
                .put_record(&self.config.cluster_instances_path.child(stable_id), record);
        }
    }

    fn read(fixture: &Fixture, slot: i64, tolerant: bool) -> InstanceReadResult {
        let session = fixture.repo.open().unwrap();
        let idmap = RepoIdMap::new(&fixture.discovery_path());
        let reader = ClusterReader::new(session.as_ref(), &fixture.config, &idmap);
        reader.read_instance(SlotId(slot), tolerant).unwrap()
    }

    #[test]
    fn reads_complete_instance() {
        let fixture = Fixture::new();
        fixture.map_slot("instance-one", 1);
        fixture.put_instance(
            "instance-one",
            Record::new()
                .with(PROP_LEADER_ELECTION_ID, "1_0001_instance-one")
                .with(PROP_SYNC_TOKEN, "7"),
        );

        let info = match read(&fixture, 1, false) {
            InstanceReadResult::Found(info) => info,
            other => panic!("expected Found, got {other:?}"),
        };
        assert_eq!(info.slot(), SlotId(1));
        assert_eq!(info.stable_id(), "instance-one");
        assert_eq!(info.leader_election_token(), "1_0001_instance-one");
        assert_eq!(info.last_sync_token(), Some(7));
    }

    #[test]
    fn unmapped_slot_is_missing() {
        let fixture = Fixture::new();
        let result = read(&fixture, 9, true);
        assert!(result.missing_reason().unwrap().contains("slot 9"));
    }

    #[test]
    fn mapped_slot_without_record_is_missing() {
        let fixture = Fixture::new();
        fixture.map_slot("instance-one", 1);
        let result = read(&fixture, 1, false);
        assert!(result.missing_reason().unwrap().contains("no instance record"));
    }

    #[test]
    fn empty_election_token_is_missing() {
        let fixture = Fixture::new();
        fixture.map_slot("instance-one", 1);
        fixture.put_instance(
            "instance-one",
            Record::new().with(PROP_LEADER_ELECTION_ID, ""),
        );
        let result = read(&fixture, 1, false);
        assert!(result
            .missing_reason()
            .unwrap()
            .contains(PROP_LEADER_ELECTION_ID));
    }

    #[test]
    fn absent_sync_token_defaults_to_never_joined() {
        let fixture = Fixture::new();
        fixture.map_slot("instance-one", 1);
        fixture.put_instance(
            "instance-one",
            Record::new().with(PROP_LEADER_ELECTION_ID, "1_a"),
        );
        let info = read(&fixture, 1, false);
        assert_eq!(info.instance().unwrap().last_sync_token(), None);
    }

    #[test]
    fn unparsable_sync_token_is_missing() {
        let fixture = Fixture::new();
        fixture.map_slot("instance-one", 1);
        fixture.put_instance(
            "instance-one",
            Record::new()
                .with(PROP_LEADER_ELECTION_ID, "1_a")
                .with(PROP_SYNC_TOKEN, "soon"),
        );
        let result = read(&fixture, 1, false);
        assert!(result.missing_reason().unwrap().contains("unparsable"));
    }
}
