//! Least Recently Used (LRU) Replacement Policy.
//!
//! Each record carries a saturating `recency` counter in `[0, len]`, where `len` is the
//! number of records in the set. 0 marks the most recently used record.
//!
//! - A hit resets the hit record to 0 and ages only the records that were more recent
//!   than it (counter below the hit record's old value).
//! - A fill resets the new record to 0 and ages every other valid record, since the new
//!   block is unconditionally the most recent.
//! - The victim is the valid record with the largest counter; on ties the first one in
//!   scan order wins.
//!
//! # Performance
//!
//! - **Time Complexity:** O(W) for every operation, W = number of ways.
//! - **Space Complexity:** no state beyond the records.

use super::ReplacementPolicy;
use crate::cache::line::LineRecord;

/// LRU Policy. Stateless; the counters live in the records.
#[derive(Clone, Copy, Debug, Default)]
pub struct LruPolicy;

impl ReplacementPolicy for LruPolicy {
    fn hit_update(&self, lines: &mut [LineRecord], way: usize) {
        let limit = lines.len();
        let old = lines[way].recency;
        lines[way].recency = 0;
        for (i, line) in lines.iter_mut().enumerate() {
            if i != way && line.valid && line.recency < old {
                line.recency = (line.recency + 1).min(limit);
            }
        }
        tracing::trace!(way, old, "lru hit update");
    }

    fn replacement_update(&self, lines: &mut [LineRecord], way: usize) {
        let limit = lines.len();
        lines[way].recency = 0;
        for (i, line) in lines.iter_mut().enumerate() {
            if i != way && line.valid {
                line.recency = (line.recency + 1).min(limit);
            }
        }
        tracing::trace!(way, "lru replacement update");
    }

    fn least_recently_used(&self, lines: &[LineRecord]) -> Option<usize> {
        let mut victim: Option<(usize, usize)> = None;
        for (i, line) in lines.iter().enumerate() {
            if !line.valid {
                continue;
            }
            match victim {
                Some((_, max)) if line.recency <= max => {}
                _ => victim = Some((i, line.recency)),
            }
        }
        victim.map(|(way, _)| way)
    }
}
