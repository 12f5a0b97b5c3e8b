//! The shared brightness buffer written by patterns and read by the refresh engine.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::config::{LIGHT_COUNT, LIGHTS_PER_BANK};

/// Brightness level that reads as "on for the whole PWM cycle" on every bank.
///
/// Anything at or above [`CYCLE_LENGTH`](crate::CYCLE_LENGTH) saturates the
/// comparator.
pub const FULL_ON: u8 = u8::MAX;

/// Nine brightness cells, one per light.
///
/// Each cell is an independent byte with a single writer (the foreground) and
/// a single reader (the refresh interrupt). The refresh engine only reads a
/// bank's cells at its own cycle boundary, so writes never tear within a bank.
/// Values above [`MAX_LEVEL`](crate::MAX_LEVEL) are stored as-is.
pub struct FrameBuffer {
    cells: [AtomicU8; LIGHT_COUNT],
}

impl FrameBuffer {
    /// Creates an all-dark buffer.
    pub const fn new() -> Self {
        Self {
            cells: [const { AtomicU8::new(0) }; LIGHT_COUNT],
        }
    }

    /// Returns the level of one light, or `None` for an out-of-range index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<u8> {
        self.cells.get(index).map(|cell| cell.load(Ordering::Relaxed))
    }

    /// Sets the level of one light. Out-of-range indices are ignored.
    #[inline]
    pub fn set(&self, index: usize, level: u8) {
        if let Some(cell) = self.cells.get(index) {
            cell.store(level, Ordering::Relaxed);
        }
    }

    /// Sets every light to the same level.
    pub fn fill(&self, level: u8) {
        for cell in &self.cells {
            cell.store(level, Ordering::Relaxed);
        }
    }

    /// Turns every light off.
    pub fn clear(&self) {
        self.fill(0);
    }

    /// Sets every light from `levels`, in index order.
    pub fn load(&self, levels: &[u8; LIGHT_COUNT]) {
        for (cell, &level) in self.cells.iter().zip(levels) {
            cell.store(level, Ordering::Relaxed);
        }
    }

    /// Copies the whole buffer.
    pub fn snapshot(&self) -> [u8; LIGHT_COUNT] {
        core::array::from_fn(|i| self.cells[i].load(Ordering::Relaxed))
    }

    /// Reads the three cells of one bank. `bank` must be below
    /// [`BANK_COUNT`](crate::BANK_COUNT).
    #[inline]
    pub fn bank(&self, bank: usize) -> [u8; LIGHTS_PER_BANK] {
        let base = bank * LIGHTS_PER_BANK;
        core::array::from_fn(|i| self.get(base + i).unwrap_or(0))
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
