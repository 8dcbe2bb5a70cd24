//! Cache Replacement Policy Tests.
//!
//! Verifies the saturating-counter LRU used by every set and by the victim buffer.
//! Records are plain values, so the policy is exercised on hand-built sets.

use cachesim_core::cache::line::LineRecord;
use cachesim_core::cache::policies::{self, LruPolicy, ReplacementPolicy};
use cachesim_core::config::ReplacementPolicy as PolicyType;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn valid(tag: u64, recency: usize) -> LineRecord {
    LineRecord {
        valid: true,
        dirty: false,
        tag,
        recency,
    }
}

fn recencies(lines: &[LineRecord]) -> Vec<usize> {
    lines.iter().map(|l| l.recency).collect()
}

// ══════════════════════════════════════════════════════════
// 1. Hit update
// ══════════════════════════════════════════════════════════

/// Only lines more recent than the hit line age.
#[test]
fn hit_ages_only_more_recent_lines() {
    let mut set = vec![valid(0, 0), valid(1, 1), valid(2, 2), valid(3, 3)];
    LruPolicy.hit_update(&mut set, 2);
    assert_eq!(recencies(&set), vec![1, 2, 0, 3]);
}

/// A hit on the most recent line changes nothing else.
#[test]
fn hit_on_mru_is_stable() {
    let mut set = vec![valid(0, 0), valid(1, 1)];
    LruPolicy.hit_update(&mut set, 0);
    assert_eq!(recencies(&set), vec![0, 1]);
}

// ══════════════════════════════════════════════════════════
// 2. Replacement update
// ══════════════════════════════════════════════════════════

/// A fill ages every other valid line and leaves invalid lines alone.
#[test]
fn fill_ages_all_valid_lines() {
    let mut set = vec![valid(0, 0), LineRecord::default(), valid(2, 1), valid(3, 0)];
    LruPolicy.replacement_update(&mut set, 3);
    assert_eq!(recencies(&set), vec![1, 0, 2, 0]);
    assert!(!set[1].valid);
}

/// Counters stop at the set size.
#[test]
fn counters_saturate_at_set_size() {
    let mut set = vec![valid(0, 2), valid(1, 0)];
    LruPolicy.replacement_update(&mut set, 1);
    LruPolicy.replacement_update(&mut set, 1);
    assert_eq!(set[0].recency, 2);
}

// ══════════════════════════════════════════════════════════
// 3. Selection
// ══════════════════════════════════════════════════════════

/// The line with the largest counter is chosen.
#[test]
fn selects_largest_counter() {
    let set = vec![valid(0, 1), valid(1, 3), valid(2, 0), valid(3, 2)];
    assert_eq!(LruPolicy.least_recently_used(&set), Some(1));
}

/// Ties go to the first line in scan order.
#[test]
fn ties_break_to_first_way() {
    let set = vec![valid(0, 0), valid(1, 2), valid(2, 2)];
    assert_eq!(LruPolicy.least_recently_used(&set), Some(1));
}

/// Invalid lines are never chosen, and an empty set has no candidate.
#[test]
fn invalid_lines_are_skipped() {
    let mut set = vec![LineRecord::default(), valid(1, 0)];
    set[0].recency = 9;
    assert_eq!(LruPolicy.least_recently_used(&set), Some(1));
    assert_eq!(LruPolicy.least_recently_used(&[LineRecord::default(); 4]), None);
}

/// Filling ways 0..n in order makes way 0 the LRU.
#[test]
fn sequential_fills_make_first_way_lru() {
    let policy = policies::build(PolicyType::Lru);
    let mut set = vec![LineRecord::default(); 4];
    for way in 0..4 {
        set[way] = valid(way as u64, 0);
        policy.replacement_update(&mut set, way);
    }
    assert_eq!(recencies(&set), vec![3, 2, 1, 0]);
    assert_eq!(policy.least_recently_used(&set), Some(0));

    policy.hit_update(&mut set, 0);
    assert_eq!(policy.least_recently_used(&set), Some(1));
}

// ══════════════════════════════════════════════════════════
// 4. Properties
// ══════════════════════════════════════════════════════════

/// A full set with distinct counters 0..n in some order.
fn permuted_set(ways: usize) -> impl Strategy<Value = Vec<LineRecord>> {
    Just((0..ways).collect::<Vec<_>>())
        .prop_shuffle()
        .prop_map(|order| {
            order
                .into_iter()
                .enumerate()
                .map(|(tag, recency)| valid(tag as u64, recency))
                .collect()
        })
}

proptest! {
    /// After a hit on way w: w is 0, lines younger than w's old counter gain one, older
    /// lines keep their counter.
    #[test]
    fn hit_update_law(set in (1usize..=8).prop_flat_map(permuted_set), pick in any::<prop::sample::Index>()) {
        let way = pick.index(set.len());
        let old = set[way].recency;
        let mut after = set.clone();
        LruPolicy.hit_update(&mut after, way);

        prop_assert_eq!(after[way].recency, 0);
        for (i, (before, now)) in set.iter().zip(&after).enumerate() {
            if i == way {
                continue;
            }
            if before.recency < old {
                prop_assert_eq!(now.recency, before.recency + 1);
            } else {
                prop_assert_eq!(now.recency, before.recency);
            }
        }
    }

    /// Counters stay a permutation of 0..n under hits, so the LRU is unique.
    #[test]
    fn hits_preserve_distinct_counters(
        set in (1usize..=8).prop_flat_map(permuted_set),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..32),
    ) {
        let mut set = set;
        for pick in picks {
            let way = pick.index(set.len());
            LruPolicy.hit_update(&mut set, way);
        }
        let mut seen = recencies(&set);
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..set.len()).collect::<Vec<_>>());

        let lru = LruPolicy.least_recently_used(&set).unwrap();
        prop_assert_eq!(set[lru].recency, set.len() - 1);
    }
}
