//! Victim Buffer Tests.
//!
//! Verifies the fully associative buffer behind a set-associative level: demotion of
//! the set's LRU block on a conflict miss, swap on a buffer hit, eviction from a full
//! buffer, and the counters that go with each.
//!
//! All tests use 64 B, 2-way, 16 B blocks (2 sets). Even block numbers map to set 0:
//! `0x00`, `0x20`, `0x40`, `0x60` all conflict.

use cachesim_core::common::Request;
use pretty_assertions::assert_eq;

use crate::common::{drive, drive_all, level};

// ══════════════════════════════════════════════════════════
// 1. Demotion and swap
// ══════════════════════════════════════════════════════════

/// Conflict miss demotes the set's LRU block; re-referencing it swaps it back without
/// touching the next level.
#[test]
fn demote_then_swap_back() {
    let mut cache = level(64, 2, 16, 1);
    drive_all(&mut cache, &[Request::load(0x00), Request::load(0x20)]);

    let sent = drive(&mut cache, Request::load(0x40));
    assert_eq!(sent, vec![Request::load(0x40)]);
    assert!(cache.victim_contains(0x00));
    assert!(!cache.contains(0x00));

    let sent = drive(&mut cache, Request::load(0x00));
    assert!(sent.is_empty(), "a victim hit is served locally");
    assert!(cache.contains(0x00));
    assert!(cache.contains(0x40));
    // 0x20 was the set's LRU and took 0x00's place in the buffer.
    assert!(cache.victim_contains(0x20));

    let c = cache.counters();
    assert_eq!(c.reads, 4);
    assert_eq!(c.read_misses, 4);
    assert_eq!(c.swap_requests, 2);
    assert_eq!(c.swaps, 1);
    assert_eq!(c.writebacks, 0);
    assert!((c.combined_miss_rate() - 0.75).abs() < f64::EPSILON);
}

/// A compulsory miss into a set with a free way never probes the buffer.
#[test]
fn free_way_skips_buffer() {
    let mut cache = level(64, 2, 16, 1);
    drive_all(&mut cache, &[Request::load(0x00), Request::load(0x20)]);
    assert_eq!(cache.counters().swap_requests, 0);
    assert!(cache.victim_buffer().unwrap().first_invalid().is_some());
}

/// Dirty state travels with the block through demotion and swap.
#[test]
fn dirty_bit_survives_swap() {
    let mut cache = level(64, 2, 16, 1);
    drive_all(
        &mut cache,
        &[Request::store(0x00), Request::load(0x20), Request::load(0x40)],
    );
    assert!(cache.is_dirty(0x00), "demoted block stays dirty in the buffer");

    let _ = drive(&mut cache, Request::load(0x00));
    assert!(cache.contains(0x00));
    assert!(cache.is_dirty(0x00));
    assert!(!cache.is_dirty(0x20));
}

/// A store that hits in the buffer dirties the promoted block.
#[test]
fn store_victim_hit_dirties_block() {
    let mut cache = level(64, 2, 16, 1);
    drive_all(
        &mut cache,
        &[Request::load(0x00), Request::load(0x20), Request::load(0x40)],
    );
    let _ = drive(&mut cache, Request::store(0x08));
    assert!(cache.contains(0x00));
    assert!(cache.is_dirty(0x00));
    assert_eq!(cache.counters().write_misses, 1);
    assert_eq!(cache.counters().swaps, 1);
}

// ══════════════════════════════════════════════════════════
// 2. Full buffer
// ══════════════════════════════════════════════════════════

/// With the buffer full, its LRU block leaves the level, written back if dirty, and
/// the set's LRU block takes its slot.
#[test]
fn full_buffer_evicts_its_lru() {
    let mut cache = level(64, 2, 16, 1);
    drive_all(
        &mut cache,
        &[Request::store(0x00), Request::load(0x20), Request::load(0x40)],
    );

    let sent = drive(&mut cache, Request::load(0x60));
    assert_eq!(sent, vec![Request::store(0x00), Request::load(0x60)]);
    assert!(!cache.victim_contains(0x00));
    assert!(!cache.contains(0x00));
    assert!(cache.victim_contains(0x20));
    assert!(cache.contains(0x40));
    assert!(cache.contains(0x60));
    assert_eq!(cache.counters().writebacks, 1);
}

/// A clean block leaving a full buffer is dropped silently.
#[test]
fn clean_buffer_eviction_is_silent() {
    let mut cache = level(64, 2, 16, 1);
    drive_all(
        &mut cache,
        &[Request::load(0x00), Request::load(0x20), Request::load(0x40)],
    );
    let sent = drive(&mut cache, Request::load(0x60));
    assert_eq!(sent, vec![Request::load(0x60)]);
    assert_eq!(cache.counters().writebacks, 0);
}

/// The buffer keeps the most recently demoted blocks, evicting the oldest.
#[test]
fn buffer_is_lru_ordered() {
    let mut cache = level(64, 2, 16, 2);
    drive_all(
        &mut cache,
        &[
            Request::load(0x00),
            Request::load(0x20),
            Request::load(0x40), // demotes 0x00
            Request::load(0x60), // demotes 0x20
            Request::load(0x80), // demotes 0x40, evicts 0x00
        ],
    );
    assert!(!cache.victim_contains(0x00));
    assert!(cache.victim_contains(0x20));
    assert!(cache.victim_contains(0x40));
    assert_eq!(cache.victim_buffer().unwrap().capacity(), 2);
}

/// The contents dump includes the buffer with full-width tags.
#[test]
fn contents_dump_lists_buffer() {
    let mut cache = level(64, 2, 16, 1);
    drive_all(
        &mut cache,
        &[Request::load(0x00), Request::load(0x20), Request::load(0x40)],
    );
    let dump = cache.to_string();
    let buffer = dump.split("victim buffer contents").nth(1).unwrap();
    assert_eq!(buffer.lines().nth(1).unwrap(), "  set      0:        0  ");
}
