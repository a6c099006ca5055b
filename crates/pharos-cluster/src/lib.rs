//! Cluster view computation engine.
//!
//! Turns the membership layer's discovery-lite descriptor into a stable,
//! fully resolved, leader-elected [`LocalClusterView`] for topology
//! announcement.
//!
//! # Design
//!
//! The descriptor is a low-level signal: it can flap, stay non-final while
//! membership changes, and name members whose repository records have not
//! caught up yet. [`ClusterViewService`] bridges that into a view with
//! strict guarantees: exactly one leader (elected by total order over
//! startup tokens), exactly one local member, a cluster id stable across
//! restarts, and a distinct snapshot id per membership change.
//!
//! Members the descriptor lists active before their records are readable
//! can be suppressed from the view for a bounded time instead of failing
//! it, which keeps topology quiet during rolling restarts (see
//! [`suppression`]).
//!
//! All collaborators (repository, settings, id map, clock) are injected as
//! trait objects; the in-memory repository backend makes the whole engine
//! testable without infrastructure.

mod cluster_id;
mod clock;
mod config;
mod descriptor;
mod election;
mod error;
mod id_map;
mod instance;
mod reader;
mod service;
mod silencer;
pub mod suppression;
mod view;

pub use cluster_id::{
    read_or_define_cluster_id, PROP_CLUSTER_ID, PROP_CLUSTER_ID_DEFINED_AT,
    PROP_CLUSTER_ID_DEFINED_BY,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClusterConfig, DEFAULT_CLUSTER_INSTANCES_PATH};
pub use descriptor::Descriptor;
pub use election::{compare_tokens, election_order, token_prefix};
pub use error::{Result, ViewError};
pub use id_map::{IdMap, RepoIdMap, IDMAP_NODE};
pub use instance::{InstanceInfo, InstanceReadResult, SlotId};
pub use reader::{ClusterReader, PROP_LEADER_ELECTION_ID, PROP_SYNC_TOKEN};
pub use service::{ClusterViewService, Settings, PROPERTIES_NODE};
pub use silencer::LogSilencer;
pub use view::{LocalClusterView, MemberDescription};
