//! Partial-start suppression policy.
//!
//! During a cluster-wide restart the descriptor can declare a member active
//! before that member's repository records exist. Failing the view over it
//! would churn the topology for every restart wave, so such members can be
//! hidden until they finish joining.
//!
//! Suppression is bounded by a deadline. Once the deadline elapses the next
//! call runs with suppression off, which either resolves the member or
//! surfaces the failure honestly. The deadline is armed when a build first
//! suppresses someone and reset by the first clean build.

use crate::config::ClusterConfig;
use crate::instance::InstanceInfo;

/// Whether this call may hide unresolvable members from the view.
///
/// All of the following must hold:
/// sync tokens are enabled, suppression is configured on, the deadline has
/// not elapsed, and the local member has itself completed a join at least
/// once (`last_sync_token >= lowest_seq_num`). Until the local member has
/// joined, lag of the others cannot be reasoned about.
pub fn suppression_enabled(
    config: &ClusterConfig,
    deadline_millis: u64,
    lowest_seq_num: i64,
    local: &InstanceInfo,
    now_millis: u64,
) -> bool {
    let mut enabled =
        config.sync_token_enabled && config.suppress_partially_started_instances;
    if deadline_millis > 0 && deadline_millis < now_millis {
        enabled = false;
    }
    if !(enabled && local.is_sync_token_newer_or_equal(lowest_seq_num)) {
        enabled = false;
    }
    enabled
}

/// The deadline to carry after a successful view build.
///
/// A clean build disarms the deadline. A suppressing build arms it once,
/// `suppression_timeout_seconds` from now; a non-positive timeout leaves it
/// disarmed. An already armed deadline is kept.
pub fn next_deadline(
    config: &ClusterConfig,
    any_suppressed: bool,
    current_deadline_millis: u64,
    now_millis: u64,
) -> u64 {
    if !any_suppressed {
        return 0;
    }
    if current_deadline_millis != 0 {
        return current_deadline_millis;
    }
    let seconds = config.suppression_timeout_seconds;
    if seconds <= 0 {
        0
    } else {
        now_millis + (seconds as u64) * 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::SlotId;

    fn config() -> ClusterConfig {
        ClusterConfig::default().with_suppression(true)
    }

    fn local(last_sync_token: Option<i64>) -> InstanceInfo {
        InstanceInfo::new(SlotId(1), "local", "0_local", last_sync_token)
    }

    #[test]
    fn enabled_when_all_conditions_hold() {
        assert!(suppression_enabled(&config(), 0, 5, &local(Some(5)), 1_000));
    }

    #[test]
    fn disabled_without_sync_tokens() {
        let config = config().with_sync_token_enabled(false);
        assert!(!suppression_enabled(&config, 0, 5, &local(Some(5)), 1_000));
    }

    #[test]
    fn disabled_without_suppression_flag() {
        let config = ClusterConfig::default();
        assert!(!suppression_enabled(&config, 0, 5, &local(Some(5)), 1_000));
    }

    #[test]
    fn disabled_after_deadline_elapsed() {
        assert!(!suppression_enabled(&config(), 999, 5, &local(Some(5)), 1_000));
    }

    #[test]
    fn deadline_exactly_now_still_suppresses() {
        assert!(suppression_enabled(&config(), 1_000, 5, &local(Some(5)), 1_000));
    }

    #[test]
    fn disabled_until_local_member_joined_once() {
        // local sync token behind the first handled sequence number
        assert!(!suppression_enabled(&config(), 0, 6, &local(Some(5)), 1_000));
        assert!(suppression_enabled(&config(), 0, 6, &local(Some(6)), 1_000));
    }

    #[test]
    fn disabled_on_a_fresh_process() {
        // nothing handled yet and no sync token written: no basis to
        // reason about other members' lag
        assert!(!suppression_enabled(&config(), 0, -1, &local(None), 1_000));
    }

    #[test]
    fn clean_build_disarms_deadline() {
        assert_eq!(next_deadline(&config(), false, 55_000, 1_000), 0);
    }

    #[test]
    fn suppressing_build_arms_deadline_once() {
        let config = config().with_suppression_timeout_seconds(60);
        assert_eq!(next_deadline(&config, true, 0, 1_000), 61_000);
        // already armed: kept, not re-armed
        assert_eq!(next_deadline(&config, true, 30_000, 1_000), 30_000);
    }

    #[test]
    fn non_positive_timeout_never_arms() {
        let config = config().with_suppression_timeout_seconds(0);
        assert_eq!(next_deadline(&config, true, 0, 1_000), 0);
        let config = config.with_suppression_timeout_seconds(-5);
        assert_eq!(next_deadline(&config, true, 0, 1_000), 0);
    }
}
