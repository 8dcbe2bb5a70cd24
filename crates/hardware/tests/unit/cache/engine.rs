//! Lookup Engine Tests.
//!
//! Verifies one cache level on its own: hits and misses, write-allocate with dirty
//! tracking, writebacks of dirty evictions, and the single-outstanding request/fill
//! discipline. The next level is simulated by answering every forwarded request at once
//! (see `common::drive`), or not at all when a test needs the level left mid-miss.

use cachesim_core::cache::pending::LinkState;
use cachesim_core::common::{ProtocolError, Request, Response};
use cachesim_core::soc::{Action, MemoryLevel};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::{drive, drive_all, level};

// ══════════════════════════════════════════════════════════
// 1. Hit and miss
// ══════════════════════════════════════════════════════════

/// 64 B, 1-way, 16 B blocks: `0x34` misses cold, then hits.
#[test]
fn cold_miss_then_hit() {
    let mut cache = level(64, 1, 16, 0);

    let sent = drive(&mut cache, Request::load(0x34));
    assert_eq!(sent, vec![Request::load(0x34)]);
    assert!(cache.contains(0x34));

    let sent = drive(&mut cache, Request::load(0x34));
    assert!(sent.is_empty(), "a hit must not reach the next level");

    let c = cache.counters();
    assert_eq!((c.reads, c.read_misses, c.writes, c.write_misses), (2, 1, 0, 0));
}

/// Any offset within a filled block hits.
#[rstest]
#[case(0x30)]
#[case(0x38)]
#[case(0x3F)]
fn same_block_other_offset_hits(#[case] addr: u64) {
    let mut cache = level(64, 1, 16, 0);
    let _ = drive(&mut cache, Request::load(0x34));
    let action = cache.accept_request(Request::load(addr)).unwrap();
    assert_eq!(action, Action::Respond(Response::ready(addr)));
}

/// Misses forward the request unchanged, op kind included.
#[rstest]
#[case::load(Request::load(0x1000))]
#[case::store(Request::store(0x1000))]
fn miss_forwards_original_request(#[case] request: Request) {
    let mut cache = level(256, 2, 16, 0);
    let action = cache.accept_request(request).unwrap();
    assert_eq!(action, Action::Forward(request));
}

// ══════════════════════════════════════════════════════════
// 2. Dirty tracking and writeback
// ══════════════════════════════════════════════════════════

/// A store miss allocates the block dirty; a load miss allocates it clean.
#[test]
fn write_allocate_sets_dirty() {
    let mut cache = level(256, 2, 16, 0);
    drive_all(&mut cache, &[Request::store(0x40), Request::load(0x80)]);
    assert!(cache.is_dirty(0x40));
    assert!(!cache.is_dirty(0x80));
}

/// A store hit dirties a clean block.
#[test]
fn store_hit_sets_dirty() {
    let mut cache = level(256, 2, 16, 0);
    drive_all(&mut cache, &[Request::load(0x40), Request::store(0x44)]);
    assert!(cache.is_dirty(0x40));
    assert_eq!(cache.counters().write_misses, 0);
}

/// `0x34`, `0x74`, `0x34` in a direct-mapped cache: each access evicts the other block.
/// Only a dirty eviction is written back, to the evicted block's address `0x30`.
#[rstest]
#[case::clean(Request::load(0x34), vec![], 0)]
#[case::dirty(Request::store(0x34), vec![Request::store(0x30)], 1)]
fn conflict_writes_back_only_dirty_blocks(
    #[case] first: Request,
    #[case] expected_writebacks: Vec<Request>,
    #[case] writebacks: u64,
) {
    let mut cache = level(64, 1, 16, 0);
    let _ = drive(&mut cache, first);

    let sent = drive(&mut cache, Request::load(0x74));
    let mut expected = expected_writebacks;
    expected.push(Request::load(0x74));
    assert_eq!(sent, expected);
    assert!(cache.contains(0x74));
    assert!(!cache.contains(0x34));

    // 0x74 was loaded, so evicting it again is clean.
    let sent = drive(&mut cache, Request::load(0x34));
    assert_eq!(sent, vec![Request::load(0x34)]);
    assert_eq!(cache.counters().writebacks, writebacks);
}

/// A dirty block with tag 1 leaves the set as a store to `0x70`.
#[test]
fn dirty_tagged_block_writes_back_to_its_own_address() {
    let mut cache = level(64, 1, 16, 0);
    drive_all(&mut cache, &[Request::load(0x34), Request::store(0x74)]);
    assert!(cache.is_dirty(0x74));

    let sent = drive(&mut cache, Request::load(0x34));
    assert_eq!(sent, vec![Request::store(0x70), Request::load(0x34)]);
    assert_eq!(cache.counters().writebacks, 1);
    assert!(!cache.is_dirty(0x34));
}

/// The writeback address is rebuilt from tag and set, not from the new request.
#[test]
fn writeback_targets_evicted_block() {
    // 4 sets of 2 ways, 16 B blocks: 0x010, 0x050 and 0x090 share set 1.
    let mut cache = level(128, 2, 16, 0);
    drive_all(
        &mut cache,
        &[Request::store(0x01C), Request::load(0x050)],
    );
    let sent = drive(&mut cache, Request::load(0x09A));
    assert_eq!(sent, vec![Request::store(0x010), Request::load(0x09A)]);
}

/// A dirty block keeps its dirty bit across hits and is written back once.
#[test]
fn dirty_block_written_back_once() {
    let mut cache = level(64, 1, 16, 0);
    drive_all(
        &mut cache,
        &[
            Request::store(0x00),
            Request::load(0x04),
            Request::store(0x08),
            Request::load(0x40),
            Request::load(0x00),
        ],
    );
    assert_eq!(cache.counters().writebacks, 1);
}

// ══════════════════════════════════════════════════════════
// 3. Request/fill discipline
// ══════════════════════════════════════════════════════════

/// A second request before the fill is a protocol violation.
#[test]
fn request_while_outstanding_is_rejected() {
    let mut cache = level(64, 1, 16, 0);
    let _ = cache.accept_request(Request::load(0x34)).unwrap();

    let err = cache.accept_request(Request::load(0x00)).unwrap_err();
    assert_eq!(
        err,
        ProtocolError::RequestWhileOutstanding {
            level: "L1".to_string(),
            address: 0x00,
            outstanding: 0x34,
        }
    );
}

/// A fill with nothing outstanding is a protocol violation.
#[test]
fn fill_without_pending_is_rejected() {
    let mut cache = level(64, 1, 16, 0);
    let err = cache.accept_fill(Response::ready(0x34)).unwrap_err();
    assert!(matches!(err, ProtocolError::FillWithoutPending { address: 0x34, .. }));
}

/// A fill must answer the outstanding address and be ready.
#[test]
fn fill_must_match_and_be_ready() {
    let mut cache = level(64, 1, 16, 0);
    let _ = cache.accept_request(Request::load(0x34)).unwrap();

    let err = cache.accept_fill(Response::ready(0x38)).unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::FillAddressMismatch { expected: 0x34, got: 0x38, .. }
    ));

    let not_ready = Response {
        ready: false,
        address: 0x34,
    };
    let err = cache.accept_fill(not_ready).unwrap_err();
    assert!(matches!(err, ProtocolError::NotReady { address: 0x34, .. }));

    // The miss is still pending and completes normally.
    let action = cache.accept_fill(Response::ready(0x34)).unwrap();
    assert_eq!(action, Action::Respond(Response::ready(0x34)));
}

/// The pending record is reserved at forward time and consumed by the fill.
#[test]
fn pending_fill_lifecycle() {
    let mut cache = level(64, 1, 16, 0);
    assert!(cache.pending().is_none());

    let _ = cache.accept_request(Request::load(0x34)).unwrap();
    let pending = cache.pending().unwrap();
    assert_eq!((pending.slot.set, pending.slot.way), (3, 0));
    assert!(!pending.replacement);
    assert!(matches!(cache.state(), LinkState::AwaitingFill { .. }));

    let _ = cache.accept_fill(Response::ready(0x34)).unwrap();
    assert!(cache.pending().is_none());
    assert!(cache.state().is_idle());

    let filled = cache.store().get(pending.slot);
    assert!(filled.valid && !filled.dirty);
    assert_eq!((filled.tag, filled.recency), (0, 0));
    assert_eq!((cache.store().num_sets(), cache.store().ways()), (4, 1));
}

// ══════════════════════════════════════════════════════════
// 4. Reset and contents
// ══════════════════════════════════════════════════════════

/// Reset returns the level to cold; it is refused mid-miss.
#[test]
fn reset_clears_lines_and_counters() {
    let mut cache = level(64, 1, 16, 0);
    let _ = drive(&mut cache, Request::store(0x34));
    let _ = cache.accept_request(Request::load(0x00)).unwrap();

    assert!(matches!(
        cache.reset(),
        Err(ProtocolError::ResetWhileOutstanding { outstanding: 0x00, .. })
    ));
    let _ = cache.accept_fill(Response::ready(0x00)).unwrap();

    cache.reset().unwrap();
    assert!(!cache.contains(0x34));
    assert_eq!(cache.counters().accesses(), 0);
}

/// The contents dump lists blocks most recent first and marks dirty ones.
#[test]
fn contents_dump_orders_by_recency() {
    // One set of 2 ways.
    let mut cache = level(32, 2, 16, 0);
    drive_all(&mut cache, &[Request::store(0x00), Request::load(0x10)]);

    let dump = cache.to_string();
    assert!(dump.contains("===== L1 contents ====="));
    let line = dump.lines().find(|l| l.contains("set")).unwrap();
    assert_eq!(line, "  set      0:        1          0 D");
}
