//! Engine configuration.

use pharos_repo::RepoPath;

/// Default parent node for per-member records.
pub const DEFAULT_CLUSTER_INSTANCES_PATH: &str = "/var/discovery/pharos/clusterInstances";

/// Configuration for the cluster view engine.
///
/// Injected by the host; the engine never reads configuration sources
/// itself.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Repository node holding one child record per stable member id.
    pub cluster_instances_path: RepoPath,

    /// Whether members write sync tokens after completing a join handshake.
    /// Partial-start suppression needs these to reason about lag.
    pub sync_token_enabled: bool,

    /// Whether members listed active by the descriptor but not yet readable
    /// from the repository are hidden from the view instead of failing it.
    pub suppress_partially_started_instances: bool,

    /// Upper bound on continuous suppression, in seconds. Non-positive
    /// disables the deadline.
    pub suppression_timeout_seconds: i64,

    /// Order leader election tokens by numeric prefix descending before the
    /// lexicographic fallback.
    pub invert_leader_election_prefix_order: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            cluster_instances_path: RepoPath::new(DEFAULT_CLUSTER_INSTANCES_PATH)
                .expect("default path is valid"),
            sync_token_enabled: true,
            suppress_partially_started_instances: false,
            suppression_timeout_seconds: 600,
            invert_leader_election_prefix_order: false,
        }
    }
}

impl ClusterConfig {
    /// Set the cluster instances path.
    #[must_use]
    pub fn with_cluster_instances_path(mut self, path: RepoPath) -> Self {
        self.cluster_instances_path = path;
        self
    }

    /// Enable or disable sync token tracking.
    #[must_use]
    pub fn with_sync_token_enabled(mut self, enabled: bool) -> Self {
        self.sync_token_enabled = enabled;
        self
    }

    /// Enable or disable partial-start suppression.
    #[must_use]
    pub fn with_suppression(mut self, enabled: bool) -> Self {
        self.suppress_partially_started_instances = enabled;
        self
    }

    /// Set the suppression deadline, in seconds. Non-positive disables it.
    #[must_use]
    pub fn with_suppression_timeout_seconds(mut self, seconds: i64) -> Self {
        self.suppression_timeout_seconds = seconds;
        self
    }

    /// Enable or disable inverted prefix ordering for leader election.
    #[must_use]
    pub fn with_inverted_prefix_order(mut self, inverted: bool) -> Self {
        self.invert_leader_election_prefix_order = inverted;
        self
    }

    /// Parent of the cluster instances node. The persistent cluster-id
    /// record and the idmap node live here.
    pub fn discovery_resource_path(&self) -> Option<RepoPath> {
        self.cluster_instances_path.parent()
    }
}
