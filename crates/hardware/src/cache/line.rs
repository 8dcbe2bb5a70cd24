//! Line records and the per-level line store.
//!
//! A [`LineStore`] owns `num_sets * ways` [`LineRecord`]s in one flat vector, allocated
//! once at construction. Set `s` occupies the slice `[s * ways, (s + 1) * ways)`. Only
//! record fields change during simulation.

/// Metadata of one cache block. No data payload is modelled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineRecord {
    /// The record holds a block.
    pub valid: bool,
    /// The block was stored to since it was filled.
    pub dirty: bool,
    /// Tag of the held block (set tag or victim tag, depending on the owner).
    pub tag: u64,
    /// Saturating age counter; 0 is most recently used.
    pub recency: usize,
}

impl LineRecord {
    /// Returns `true` if this record holds the block tagged `tag`.
    #[inline]
    pub const fn matches(&self, tag: u64) -> bool {
        self.valid && self.tag == tag
    }

    /// Clears the record back to its cold state.
    #[inline]
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }
}

/// Returns the way of the valid record tagged `tag`, if any.
pub fn find(lines: &[LineRecord], tag: u64) -> Option<usize> {
    lines.iter().position(|line| line.matches(tag))
}

/// Returns the first record that does not hold a block, if any.
pub fn first_invalid(lines: &[LineRecord]) -> Option<usize> {
    lines.iter().position(|line| !line.valid)
}

/// Handle to one record of a [`LineStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineSlot {
    /// Set index.
    pub set: usize,
    /// Way within the set.
    pub way: usize,
}

/// The fixed-geometry record array of one cache level.
#[derive(Clone, Debug)]
pub struct LineStore {
    lines: Vec<LineRecord>,
    num_sets: usize,
    ways: usize,
}

impl LineStore {
    /// Allocates `num_sets` sets of `ways` invalid records.
    pub fn new(num_sets: usize, ways: usize) -> Self {
        Self {
            lines: vec![LineRecord::default(); num_sets * ways],
            num_sets,
            ways,
        }
    }

    /// Number of sets.
    #[inline]
    pub const fn num_sets(&self) -> usize {
        self.num_sets
    }

    /// Associativity.
    #[inline]
    pub const fn ways(&self) -> usize {
        self.ways
    }

    /// Records of set `set`, way 0 first.
    ///
    /// # Panics
    ///
    /// Panics if `set >= num_sets`; callers index with a decoded set index, which is
    /// always in range.
    #[inline]
    pub fn set(&self, set: usize) -> &[LineRecord] {
        let base = set * self.ways;
        &self.lines[base..base + self.ways]
    }

    /// Mutable records of set `set`.
    #[inline]
    pub fn set_mut(&mut self, set: usize) -> &mut [LineRecord] {
        let base = set * self.ways;
        &mut self.lines[base..base + self.ways]
    }

    /// Record addressed by `slot`.
    #[inline]
    pub fn get(&self, slot: LineSlot) -> &LineRecord {
        &self.set(slot.set)[slot.way]
    }

    /// Iterates over all sets in index order.
    pub fn sets(&self) -> impl Iterator<Item = &[LineRecord]> + '_ {
        self.lines.chunks(self.ways)
    }

    /// Invalidates every record.
    pub fn clear(&mut self) {
        self.lines.fill(LineRecord::default());
    }
}
