//! Per-member instance data.

/// Cluster-local member identifier assigned by the membership layer.
///
/// Slot ids are small integers valid only within the current cluster; the
/// stable id is the identity that survives restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub i64);

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the engine knows about one member, recomputed on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    slot: SlotId,
    stable_id: String,
    leader_election_token: String,
    last_sync_token: Option<i64>,
}

impl InstanceInfo {
    /// Bundle up one member's repository state.
    pub fn new(
        slot: SlotId,
        stable_id: impl Into<String>,
        leader_election_token: impl Into<String>,
        last_sync_token: Option<i64>,
    ) -> Self {
        Self {
            slot,
            stable_id: stable_id.into(),
            leader_election_token: leader_election_token.into(),
            last_sync_token,
        }
    }

    /// The member's slot id in the current cluster.
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    /// The member's restart-stable identity.
    pub fn stable_id(&self) -> &str {
        &self.stable_id
    }

    /// The token this member drew at startup for leader election.
    pub fn leader_election_token(&self) -> &str {
        &self.leader_election_token
    }

    /// The last membership sequence number this member completed a join
    /// handshake for, or `None` if it never did.
    pub fn last_sync_token(&self) -> Option<i64> {
        self.last_sync_token
    }

    /// True when this member has joined at least up to `seq_num`. A member
    /// that never wrote a sync token has joined nothing.
    pub fn is_sync_token_newer_or_equal(&self, seq_num: i64) -> bool {
        self.last_sync_token.map_or(false, |token| token >= seq_num)
    }
}

impl std::fmt::Display for InstanceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "slot {} ({}, electionToken={}, syncToken=",
            self.slot, self.stable_id, self.leader_election_token
        )?;
        match self.last_sync_token {
            Some(token) => write!(f, "{token})"),
            None => write!(f, "none)"),
        }
    }
}

/// Outcome of reading one member's repository state.
#[derive(Debug, Clone)]
pub enum InstanceReadResult {
    /// The member record was fully resolvable.
    Found(InstanceInfo),
    /// The member could not be resolved; the message says what was missing.
    Missing(String),
}

impl InstanceReadResult {
    /// The instance, if resolved.
    pub fn instance(&self) -> Option<&InstanceInfo> {
        match self {
            InstanceReadResult::Found(info) => Some(info),
            InstanceReadResult::Missing(_) => None,
        }
    }

    /// The missing-state diagnostic, if unresolved.
    pub fn missing_reason(&self) -> Option<&str> {
        match self {
            InstanceReadResult::Found(_) => None,
            InstanceReadResult::Missing(msg) => Some(msg),
        }
    }
}
