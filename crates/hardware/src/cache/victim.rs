//! Fully associative victim buffer.
//!
//! Holds lines demoted from full sets. Tags here keep the set-index bits (see
//! [`AddressDecoder::victim_tag`](super::decoder::AddressDecoder::victim_tag)) because the
//! buffer is not indexed by set.

use super::line::{self, LineRecord};

/// Small fully associative overflow store for one cache level.
#[derive(Clone, Debug)]
pub struct VictimBuffer {
    lines: Vec<LineRecord>,
}

impl VictimBuffer {
    /// Allocates a buffer of `capacity` invalid records.
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: vec![LineRecord::default(); capacity],
        }
    }

    /// Number of records.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.lines.len()
    }

    /// Slot holding the block tagged `victim_tag`, if any.
    #[inline]
    pub fn find(&self, victim_tag: u64) -> Option<usize> {
        line::find(&self.lines, victim_tag)
    }

    /// First slot not holding a block, if any.
    #[inline]
    pub fn first_invalid(&self) -> Option<usize> {
        line::first_invalid(&self.lines)
    }

    /// All records, slot 0 first.
    #[inline]
    pub fn lines(&self) -> &[LineRecord] {
        &self.lines
    }

    /// Mutable records.
    #[inline]
    pub fn lines_mut(&mut self) -> &mut [LineRecord] {
        &mut self.lines
    }

    /// Invalidates every record.
    pub fn clear(&mut self) {
        self.lines.fill(LineRecord::default());
    }
}
