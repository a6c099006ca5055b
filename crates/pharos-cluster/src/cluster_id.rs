//! Persistent cluster identity.
//!
//! The membership layer usually assigns a view id, but it may leave it out
//! (single-member clusters typically do). The cluster id must still be
//! stable across restarts, so the first member to notice the gap defines
//! one under the discovery resource node and every later reader returns it.
//!
//! Concurrent contenders race on the commit; the loser re-reads and adopts
//! the winner's id on the next attempt.

use std::time::Duration;

use pharos_repo::Session;
use tracing::{info, trace, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::ClusterConfig;
use crate::error::{Result, ViewError};

/// Property holding the cluster id.
pub const PROP_CLUSTER_ID: &str = "clusterId";

/// Property naming the member that defined the id.
pub const PROP_CLUSTER_ID_DEFINED_BY: &str = "clusterIdDefinedBy";

/// Property holding the definition time, unix millis.
pub const PROP_CLUSTER_ID_DEFINED_AT: &str = "clusterIdDefinedAt";

const MAX_RETRIES: u32 = 5;
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Read the persistent cluster id, defining it first if nobody has yet.
pub fn read_or_define_cluster_id(
    session: &mut dyn Session,
    config: &ClusterConfig,
    local_stable_id: &str,
    clock: &dyn Clock,
) -> Result<String> {
    let path = config.discovery_resource_path().ok_or_else(|| {
        ViewError::Repository(format!(
            "cluster instances path {} has no parent to store the cluster id under",
            config.cluster_instances_path
        ))
    })?;

    for attempt in 1..=MAX_RETRIES {
        let mut record = session.get(&path)?.unwrap_or_default();
        if let Some(id) = record.get(PROP_CLUSTER_ID) {
            if !id.is_empty() {
                trace!(cluster_id = id, "read cluster id from repository");
                return Ok(id.to_string());
            }
        }

        let new_id = Uuid::new_v4().to_string();
        record.set(PROP_CLUSTER_ID, new_id.clone());
        record.set(PROP_CLUSTER_ID_DEFINED_BY, local_stable_id);
        record.set(PROP_CLUSTER_ID_DEFINED_AT, clock.now_millis().to_string());
        session.put(&path, record)?;
        match session.commit() {
            Ok(()) => {
                info!(cluster_id = new_id.as_str(), "stored new cluster id");
                return Ok(new_id);
            }
            Err(e) => {
                warn!(
                    attempt,
                    remaining = MAX_RETRIES - attempt,
                    "could not persist cluster id, retrying in {:?}: {e}",
                    RETRY_BACKOFF
                );
                clock.sleep(RETRY_BACKOFF);
            }
        }
    }
    Err(ViewError::Repository(format!(
        "failed to persist a cluster id after {MAX_RETRIES} attempts"
    )))
}
