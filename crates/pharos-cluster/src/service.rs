//! The cluster view service.
//!
//! Bridges the raw membership signal (the discovery-lite descriptor, which
//! may flap, be non-final, or name members whose repository state lags)
//! into a stable, fully resolved, leader-elected [`LocalClusterView`] for
//! the topology layer above.
//!
//! One repository session is opened per call and dropped on every exit
//! path. Engine state carried across calls is updated only at the end of a
//! successful build, with one exception: the last seen sequence number
//! advances as soon as a descriptor is parsed, because the id-map cache
//! must be invalidated even for snapshots that never become a view.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use pharos_repo::{Repository, Session};
use tracing::{error, info, trace, warn};

use crate::cluster_id::read_or_define_cluster_id;
use crate::clock::Clock;
use crate::config::ClusterConfig;
use crate::descriptor::Descriptor;
use crate::election::election_order;
use crate::error::{Result, ViewError};
use crate::id_map::IdMap;
use crate::instance::{InstanceInfo, InstanceReadResult, SlotId};
use crate::reader::ClusterReader;
use crate::silencer::LogSilencer;
use crate::suppression::{next_deadline, suppression_enabled};
use crate::view::{LocalClusterView, MemberDescription};

/// Child node under a member record carrying announced properties.
pub const PROPERTIES_NODE: &str = "properties";

/// Host-provided identity of the local process.
pub trait Settings: Send + Sync {
    /// The restart-stable id of this process.
    fn local_stable_id(&self) -> &str;
}

/// State the engine carries across calls.
struct EngineState {
    /// Last descriptor sequence number seen, -1 for none.
    last_seq_num: i64,
    /// First sequence number ever turned into a view, -1 for never.
    lowest_seq_num: i64,
    /// Suppression deadline in unix millis, 0 when not armed.
    partial_suppression_deadline_millis: u64,
    /// Members of the last successful view, to spot unexplained
    /// disappearances. Clusters stay small, so this map does too.
    seen_instances: HashMap<SlotId, InstanceInfo>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            last_seq_num: -1,
            lowest_seq_num: -1,
            partial_suppression_deadline_millis: 0,
            seen_instances: HashMap::new(),
        }
    }
}

/// Computes [`LocalClusterView`]s on demand.
///
/// Calls must be serialized by the caller; `&mut self` encodes that. The
/// collaborators are injected at construction.
pub struct ClusterViewService {
    repository: Arc<dyn Repository>,
    settings: Arc<dyn Settings>,
    id_map: Arc<dyn IdMap>,
    config: ClusterConfig,
    clock: Arc<dyn Clock>,
    state: EngineState,
    silencer: LogSilencer,
}

impl ClusterViewService {
    /// Wire up a service.
    pub fn new(
        repository: Arc<dyn Repository>,
        settings: Arc<dyn Settings>,
        id_map: Arc<dyn IdMap>,
        config: ClusterConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!(
            suppress_partially_started = config.suppress_partially_started_instances,
            "cluster view service ready"
        );
        Self {
            repository,
            settings,
            id_map,
            config,
            clock,
            state: EngineState::default(),
            silencer: LogSilencer::new(),
        }
    }

    /// The restart-stable id of this process.
    pub fn local_stable_id(&self) -> &str {
        self.settings.local_stable_id()
    }

    /// Compute the current local cluster view.
    pub fn local_cluster_view(&mut self) -> Result<LocalClusterView> {
        trace!("local_cluster_view: start");
        let mut session = self
            .repository
            .open()
            .map_err(|e| ViewError::Repository(format!("cannot open repository session: {e}")))?;
        let result = self.compute_view(session.as_mut());
        match &result {
            Ok(view) => trace!("local_cluster_view: returning {view}"),
            Err(e) => info!("local_cluster_view: undefined cluster view: {e}"),
        }
        result
    }

    fn compute_view(&mut self, session: &mut dyn Session) -> Result<LocalClusterView> {
        let descriptor = match Descriptor::read(session) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                // can legitimately happen while the membership layer starts
                warn!("cannot process descriptor: {e}");
                return Err(e);
            }
        };
        if self.state.last_seq_num != descriptor.seq_num() {
            info!(
                seq_num = descriptor.seq_num(),
                "sequence number change detected, clearing idmap cache"
            );
            self.id_map.clear_cache();
            self.state.last_seq_num = descriptor.seq_num();
        }

        let cluster_id = match descriptor.view_id() {
            Some(id) => id.to_string(),
            None => {
                trace!("descriptor provides no view id, reading from repository");
                read_or_define_cluster_id(
                    &mut *session,
                    &self.config,
                    self.settings.local_stable_id(),
                    self.clock.as_ref(),
                )?
            }
        };

        if !descriptor.is_final() {
            return Err(ViewError::NoEstablishedView(format!(
                "descriptor is not yet final (deactivating: {}): {descriptor}",
                format_slots(descriptor.deactivating().iter())
            )));
        }
        if descriptor.active().is_empty() {
            return Err(ViewError::NoEstablishedView(format!(
                "descriptor contained no active ids: {descriptor}"
            )));
        }

        let session: &dyn Session = &*session;
        let reader = ClusterReader::new(session, &self.config, self.id_map.as_ref());
        let local_slot = descriptor.local_slot();
        let local = match reader.read_instance(local_slot, false)? {
            InstanceReadResult::Found(info) => info,
            InstanceReadResult::Missing(msg) => return Err(ViewError::NoEstablishedView(msg)),
        };

        let suppressing = suppression_enabled(
            &self.config,
            self.state.partial_suppression_deadline_millis,
            self.state.lowest_seq_num,
            &local,
            self.clock.now_millis(),
        );

        let mut regulars: HashMap<SlotId, InstanceInfo> = HashMap::new();
        let mut partially_started: BTreeSet<SlotId> = BTreeSet::new();
        for &slot in descriptor.active() {
            if slot == local_slot {
                regulars.insert(slot, local.clone());
                continue;
            }
            let mut result = reader.read_instance(slot, suppressing)?;
            if result.instance().is_none() && !suppressing {
                // the cached idmap may predate this member; retry once fresh
                self.id_map.clear_cache();
                result = reader.read_instance(slot, suppressing)?;
            }
            match result {
                InstanceReadResult::Found(info) => {
                    regulars.insert(slot, info);
                }
                InstanceReadResult::Missing(msg) => {
                    if suppressing {
                        partially_started.insert(slot);
                    } else {
                        return Err(ViewError::NoEstablishedView(msg));
                    }
                }
            }
        }

        let mut remaining_active: Vec<SlotId> = descriptor.active().to_vec();
        if !partially_started.is_empty() {
            self.silencer.info_or_debug(format!(
                "partially started members: {}",
                format_slots(partially_started.iter())
            ));
            remaining_active.retain(|slot| !partially_started.contains(slot));
        }

        let sorted = election_order(&regulars, self.config.invert_leader_election_prefix_order);
        if sorted.len() != remaining_active.len() {
            error!(
                sorted = sorted.len(),
                active = remaining_active.len(),
                partial = partially_started.len(),
                "count mismatch between sorted members and active list"
            );
        }

        let mut view = LocalClusterView::new(cluster_id, descriptor.seq_num().to_string());
        let mut seen_all_sync_tokens = true;
        for (index, slot) in sorted.iter().enumerate() {
            let info = &regulars[slot];
            if !info.is_sync_token_newer_or_equal(descriptor.seq_num()) {
                self.silencer.info_or_debug(format!(
                    "sync token {} not yet seen from {info}",
                    descriptor.seq_num()
                ));
                seen_all_sync_tokens = false;
            }
            let properties = read_member_properties(session, &self.config, info.stable_id())?;
            view.push_member(MemberDescription::new(
                info.stable_id().to_string(),
                index == 0,
                *slot == local_slot,
                properties,
            ));
        }

        // members are still converging; resolve against fresh state next call
        if !partially_started.is_empty() {
            self.silencer
                .info_or_debug("partially started member nearby, clearing idmap cache");
            self.id_map.clear_cache();
        } else if !seen_all_sync_tokens {
            self.silencer
                .info_or_debug("not seen all sync tokens yet, clearing idmap cache");
            self.id_map.clear_cache();
        }

        if partially_started.is_empty() {
            self.silencer.reset();
        } else {
            view.set_partially_started(partially_started.clone());
        }

        if view.local().is_none() {
            info!(
                "established view does not include the local member ({}); normal at startup, \
                 otherwise an indicator of repository delays or clocks out of sync",
                self.settings.local_stable_id()
            );
            return Err(ViewError::IsolatedFromTopology(
                "established view does not include the local member".into(),
            ));
        }

        if self.state.lowest_seq_num == -1 {
            self.state.lowest_seq_num = descriptor.seq_num();
        }

        // audit: a member seen in the last view may only be gone because the
        // descriptor dropped it
        for seen in self.state.seen_instances.values() {
            if regulars.contains_key(&seen.slot()) {
                continue;
            }
            if !remaining_active.contains(&seen.slot()) {
                continue;
            }
            error!("member unexpectedly no longer part of the view: {seen}");
        }
        self.state.seen_instances = regulars;
        self.state.partial_suppression_deadline_millis = next_deadline(
            &self.config,
            !partially_started.is_empty(),
            self.state.partial_suppression_deadline_millis,
            self.clock.now_millis(),
        );
        Ok(view)
    }

    #[cfg(test)]
    fn state(&self) -> (&i64, &i64, &u64) {
        (
            &self.state.last_seq_num,
            &self.state.lowest_seq_num,
            &self.state.partial_suppression_deadline_millis,
        )
    }
}

fn read_member_properties(
    session: &dyn Session,
    config: &ClusterConfig,
    stable_id: &str,
) -> Result<BTreeMap<String, String>> {
    let path = config
        .cluster_instances_path
        .child(stable_id)
        .child(PROPERTIES_NODE);
    let mut properties = BTreeMap::new();
    if let Some(record) = session.get(&path)? {
        for (key, value) in record.visible() {
            properties.insert(key.to_string(), value.to_string());
        }
    }
    Ok(properties)
}

fn format_slots<'a>(slots: impl Iterator<Item = &'a SlotId>) -> String {
    let items: Vec<String> = slots.map(SlotId::to_string).collect();
    format!("[{}]", items.join(", "))
}
