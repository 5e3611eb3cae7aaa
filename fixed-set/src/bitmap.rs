//! Bitmap API.

use alloc::{vec, vec::Vec};

/// Bit-compressed [`Vec<bool>`], used as scratch space while checking for collisions.
pub(crate) struct BitMap {
    /// Underlying container.
    ///
    /// Bit `index` is stored in word `index / 64` at bit `index % 64`, counting from LSB.
    data: Vec<u64>,
}

impl BitMap {
    /// Create a bitmap of a given length, filled with zero bits.
    pub(crate) fn new_zeros(len: usize) -> Self {
        Self {
            data: vec![0; len.div_ceil(64)],
        }
    }

    /// Reset every bit to zero.
    pub(crate) fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Set the bit at `index` to one. Returns `false` if it already was one.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub(crate) fn insert(&mut self, index: usize) -> bool {
        let word = &mut self.data[index / 64];
        let mask = 1 << (index % 64);
        let was_clear = *word & mask == 0;
        *word |= mask;
        was_clear
    }
}
