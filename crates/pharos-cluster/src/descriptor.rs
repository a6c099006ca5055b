//! Discovery-lite descriptor parsing.
//!
//! The membership layer publishes one JSON snapshot of cluster membership,
//! e.g. `{"me":2,"id":"v1","seq":8,"final":true,"active":[1,2,3]}`. The
//! descriptor is the only membership signal the engine trusts; everything
//! else is per-member state read from the repository.
//!
//! A descriptor with `final == false` is mid-change and must not be turned
//! into a view. Readers never block waiting for finality.

use pharos_repo::Session;
use serde::Deserialize;

use crate::error::{Result, ViewError};
use crate::instance::SlotId;

/// Wire form of the descriptor.
#[derive(Debug, Deserialize)]
struct RawDescriptor {
    me: i64,
    seq: i64,
    #[serde(rename = "final", default)]
    is_final: bool,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    active: Vec<i64>,
    #[serde(default)]
    deactivating: Vec<i64>,
}

/// One immutable membership snapshot.
#[derive(Debug, Clone)]
pub struct Descriptor {
    raw: String,
    view_id: Option<String>,
    seq_num: i64,
    is_final: bool,
    local_slot: SlotId,
    active: Vec<SlotId>,
    deactivating: Vec<SlotId>,
}

impl Descriptor {
    /// Read and parse the current descriptor through a session.
    ///
    /// A missing descriptor is a repository-level failure: the membership
    /// layer has not published anything to interpret yet.
    pub fn read(session: &dyn Session) -> Result<Self> {
        let raw = session
            .descriptor()
            .map_err(|e| ViewError::Repository(format!("cannot read descriptor: {e}")))?
            .ok_or_else(|| {
                ViewError::Repository("no discovery-lite descriptor available".into())
            })?;
        Self::parse(&raw)
    }

    /// Parse a raw descriptor string.
    pub fn parse(raw: &str) -> Result<Self> {
        let parsed: RawDescriptor = serde_json::from_str(raw)
            .map_err(|e| ViewError::Repository(format!("malformed descriptor {raw:?}: {e}")))?;
        // null, missing and empty ids all mean "no view id assigned"
        let view_id = parsed.id.filter(|id| !id.is_empty());
        Ok(Self {
            raw: raw.to_string(),
            view_id,
            seq_num: parsed.seq,
            is_final: parsed.is_final,
            local_slot: SlotId(parsed.me),
            active: parsed.active.into_iter().map(SlotId).collect(),
            deactivating: parsed.deactivating.into_iter().map(SlotId).collect(),
        })
    }

    /// The view id assigned by the membership layer, if any.
    pub fn view_id(&self) -> Option<&str> {
        self.view_id.as_deref()
    }

    /// The membership snapshot sequence number.
    pub fn seq_num(&self) -> i64 {
        self.seq_num
    }

    /// Whether the membership layer considers this snapshot settled.
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// The local process's slot id.
    pub fn local_slot(&self) -> SlotId {
        self.local_slot
    }

    /// Slot ids constituting the active cluster.
    pub fn active(&self) -> &[SlotId] {
        &self.active
    }

    /// Slot ids currently leaving the cluster. Diagnostic only.
    pub fn deactivating(&self) -> &[SlotId] {
        &self.deactivating
    }

    /// The raw descriptor string, for log and error messages.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
