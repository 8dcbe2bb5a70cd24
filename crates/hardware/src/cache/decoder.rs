//! Address decomposition.
//!
//! Splits a byte address into block offset, set index and tag, and provides the inverse
//! mappings used when a line migrates between a set and the victim buffer or is written
//! back to the next level.
//!
//! ```text
//!  63                      set_bits+block_bits      block_bits        0
//! +--------------------------+-------------------+-------------------+
//! |          cache tag       |     set index     |   block offset    |
//! +--------------------------+-------------------+-------------------+
//! |                 victim tag                   |
//! +----------------------------------------------+
//! ```

use crate::config::Geometry;

/// Pure address decoder for one cache level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressDecoder {
    block_bits: u32,
    set_bits: u32,
}

impl AddressDecoder {
    /// Creates a decoder from raw bit widths.
    pub const fn new(block_bits: u32, set_bits: u32) -> Self {
        Self {
            block_bits,
            set_bits,
        }
    }

    /// Creates a decoder for a validated geometry.
    pub const fn from_geometry(geometry: &Geometry) -> Self {
        Self::new(geometry.block_bits(), geometry.set_bits())
    }

    /// Number of block-offset bits.
    #[inline]
    pub const fn block_bits(&self) -> u32 {
        self.block_bits
    }

    /// Number of set-index bits.
    #[inline]
    pub const fn set_bits(&self) -> u32 {
        self.set_bits
    }

    /// Byte offset within the block.
    #[inline]
    pub const fn block_offset(&self, addr: u64) -> u64 {
        addr & low_mask(self.block_bits)
    }

    /// Set selected by `addr`.
    #[inline]
    pub const fn set_index(&self, addr: u64) -> usize {
        (shr(addr, self.block_bits) & low_mask(self.set_bits)) as usize
    }

    /// Tag stored in a set: the address without block-offset and set-index bits.
    #[inline]
    pub const fn cache_tag(&self, addr: u64) -> u64 {
        shr(addr, self.block_bits + self.set_bits)
    }

    /// Tag stored in the victim buffer: the address without block-offset bits.
    #[inline]
    pub const fn victim_tag(&self, addr: u64) -> u64 {
        shr(addr, self.block_bits)
    }

    /// Re-tags a set line for the victim buffer by appending its set index.
    #[inline]
    pub const fn widen(&self, tag: u64, set: usize) -> u64 {
        shl(tag, self.set_bits) | set as u64
    }

    /// Re-tags a victim-buffer line for a set by dropping the set-index bits.
    #[inline]
    pub const fn narrow(&self, victim_tag: u64) -> u64 {
        shr(victim_tag, self.set_bits)
    }

    /// Block-aligned address of the line holding `tag` in `set`.
    #[inline]
    pub const fn block_address(&self, tag: u64, set: usize) -> u64 {
        shl(self.widen(tag, set), self.block_bits)
    }

    /// Block-aligned address of a victim-buffer line.
    #[inline]
    pub const fn victim_block_address(&self, victim_tag: u64) -> u64 {
        shl(victim_tag, self.block_bits)
    }

    /// Block-aligned base of `addr`.
    #[inline]
    pub const fn block_base(&self, addr: u64) -> u64 {
        addr & !low_mask(self.block_bits)
    }
}

/// Mask of the `bits` lowest bits.
const fn low_mask(bits: u32) -> u64 {
    if bits >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Logical right shift that yields 0 for shifts of 64 or more.
const fn shr(value: u64, bits: u32) -> u64 {
    if bits >= u64::BITS { 0 } else { value >> bits }
}

/// Left shift that yields 0 for shifts of 64 or more.
const fn shl(value: u64, bits: u32) -> u64 {
    if bits >= u64::BITS { 0 } else { value << bits }
}
