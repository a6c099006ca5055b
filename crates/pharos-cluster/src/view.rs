//! The assembled cluster view.

use std::collections::{BTreeMap, BTreeSet};

use crate::instance::SlotId;

/// One member entry in a [`LocalClusterView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDescription {
    stable_id: String,
    is_leader: bool,
    is_local: bool,
    properties: BTreeMap<String, String>,
}

impl MemberDescription {
    pub(crate) fn new(
        stable_id: String,
        is_leader: bool,
        is_local: bool,
        properties: BTreeMap<String, String>,
    ) -> Self {
        Self {
            stable_id,
            is_leader,
            is_local,
            properties,
        }
    }

    /// The member's restart-stable identity.
    pub fn stable_id(&self) -> &str {
        &self.stable_id
    }

    /// True for the elected leader.
    pub fn is_leader(&self) -> bool {
        self.is_leader
    }

    /// True for the member describing this process.
    pub fn is_local(&self) -> bool {
        self.is_local
    }

    /// Announced member properties.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

/// A stable, fully resolved, leader-elected view of the local cluster.
///
/// Members are in election order: `members()[0]` is the leader. Partially
/// started slots are advisory and never appear among the members.
#[derive(Debug, Clone)]
pub struct LocalClusterView {
    cluster_id: String,
    sync_token_id: String,
    members: Vec<MemberDescription>,
    partially_started: BTreeSet<SlotId>,
}

impl LocalClusterView {
    pub(crate) fn new(cluster_id: String, sync_token_id: String) -> Self {
        Self {
            cluster_id,
            sync_token_id,
            members: Vec::new(),
            partially_started: BTreeSet::new(),
        }
    }

    pub(crate) fn push_member(&mut self, member: MemberDescription) {
        self.members.push(member);
    }

    pub(crate) fn set_partially_started(&mut self, slots: BTreeSet<SlotId>) {
        self.partially_started = slots;
    }

    /// Identifier of the cluster, stable across restarts.
    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    /// Identifier of this membership snapshot; distinct for every change.
    pub fn sync_token_id(&self) -> &str {
        &self.sync_token_id
    }

    /// Members in election order.
    pub fn members(&self) -> &[MemberDescription] {
        &self.members
    }

    /// The elected leader.
    pub fn leader(&self) -> Option<&MemberDescription> {
        self.members.iter().find(|m| m.is_leader())
    }

    /// The member describing this process.
    pub fn local(&self) -> Option<&MemberDescription> {
        self.members.iter().find(|m| m.is_local())
    }

    /// Slots the descriptor lists active whose members were hidden as
    /// partially started.
    pub fn partially_started_slot_ids(&self) -> &BTreeSet<SlotId> {
        &self.partially_started
    }
}

impl std::fmt::Display for LocalClusterView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cluster {} (snapshot {}): {} members",
            self.cluster_id,
            self.sync_token_id,
            self.members.len()
        )?;
        if !self.partially_started.is_empty() {
            write!(f, ", {} partially started", self.partially_started.len())?;
        }
        Ok(())
    }
}
