//! Leader election ordering.
//!
//! Members are totally ordered by their leader election token; the minimum
//! element leads. Two modes:
//!
//! - plain: lexicographic order of the raw token.
//! - inverted prefix: tokens shaped `<prefix>_<rest>` order by numeric
//!   prefix descending first, raw token ascending second. Tokens without a
//!   parsable prefix collapse to prefix -1 and therefore sort last, among
//!   themselves by the lexicographic fallback.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::instance::{InstanceInfo, SlotId};

/// Numeric prefix of an election token, or -1 when there is no underscore
/// or the part before it does not parse as a signed decimal.
pub fn token_prefix(token: &str) -> i64 {
    match token.find('_') {
        None => -1,
        Some(idx) => token[..idx].parse::<i64>().unwrap_or(-1),
    }
}

/// Compare two election tokens under the configured mode.
pub fn compare_tokens(a: &str, b: &str, inverted_prefix_order: bool) -> Ordering {
    if !inverted_prefix_order {
        return a.cmp(b);
    }
    let prefix_a = token_prefix(a);
    let prefix_b = token_prefix(b);
    if prefix_a == prefix_b {
        // covers real ties and everything that collapsed to -1
        a.cmp(b)
    } else {
        prefix_b.cmp(&prefix_a)
    }
}

/// Slot ids of `regulars` in election order; index 0 is the leader.
///
/// Equal full tokens tie-break by slot id so the order is total.
pub fn election_order(
    regulars: &HashMap<SlotId, InstanceInfo>,
    inverted_prefix_order: bool,
) -> Vec<SlotId> {
    let mut slots: Vec<SlotId> = regulars.keys().copied().collect();
    slots.sort_by(|a, b| {
        let token_a = regulars[a].leader_election_token();
        let token_b = regulars[b].leader_election_token();
        compare_tokens(token_a, token_b, inverted_prefix_order).then_with(|| a.cmp(b))
    });
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regulars(entries: &[(i64, &str)]) -> HashMap<SlotId, InstanceInfo> {
        entries
            .iter()
            .map(|(slot, token)| {
                let slot = SlotId(*slot);
                (slot, InstanceInfo::new(slot, format!("i{slot}"), *token, None))
            })
            .collect()
    }

    #[test]
    fn prefix_parsing() {
        assert_eq!(token_prefix("1_0001_abc"), 1);
        assert_eq!(token_prefix("42_x"), 42);
        assert_eq!(token_prefix("-1_x"), -1);
        assert_eq!(token_prefix("_x"), -1);
        assert_eq!(token_prefix("notALong_x"), -1);
        assert_eq!(token_prefix("noUnderscore"), -1);
    }

    #[test]
    fn plain_order_is_lexicographic() {
        let order = election_order(&regulars(&[(1, "b"), (2, "a"), (3, "c")]), false);
        assert_eq!(order, vec![SlotId(2), SlotId(1), SlotId(3)]);
    }

    #[test]
    fn inverted_order_puts_highest_prefix_first() {
        let order = election_order(
            &regulars(&[(1, "1_z_u1"), (2, "3_a_u2"), (3, "2_m_u3")]),
            true,
        );
        assert_eq!(order, vec![SlotId(2), SlotId(3), SlotId(1)]);
    }

    #[test]
    fn inverted_order_same_prefix_falls_back_to_lex() {
        let order = election_order(
            &regulars(&[(1, "2_bb"), (2, "2_aa"), (3, "2_cc")]),
            true,
        );
        assert_eq!(order, vec![SlotId(2), SlotId(1), SlotId(3)]);
    }

    #[test]
    fn inverted_order_malformed_prefixes_sort_last() {
        let order = election_order(
            &regulars(&[
                (1, "notALong_x"),
                (2, "1_x"),
                (3, "_x"),
                (4, "-1_y"),
            ]),
            true,
        );
        // slot 2 has the only valid prefix; the rest collapse to -1 and
        // order lexicographically among themselves
        assert_eq!(order, vec![SlotId(2), SlotId(4), SlotId(3), SlotId(1)]);
    }

    #[test]
    fn equal_tokens_tie_break_by_slot() {
        let plain = election_order(&regulars(&[(5, "same"), (2, "same")]), false);
        assert_eq!(plain, vec![SlotId(2), SlotId(5)]);

        let inverted = election_order(&regulars(&[(5, "1_same"), (2, "1_same")]), true);
        assert_eq!(inverted, vec![SlotId(2), SlotId(5)]);
    }

    #[test]
    fn plain_mode_ignores_prefixes() {
        let order = election_order(&regulars(&[(1, "10_a"), (2, "9_a")]), false);
        // lexicographic: "10_a" < "9_a"
        assert_eq!(order, vec![SlotId(1), SlotId(2)]);
    }
}
