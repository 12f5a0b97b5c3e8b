//! The growing bounce: a lit bar that sweeps back and forth and grows by one
//! light every fourth time it returns to the left edge.

use crate::config::{LIGHT_COUNT, MAX_LEVEL};
use crate::frame::FrameBuffer;

/// Sweep direction along the row of lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Towards index 0.
    Left,

    /// Towards index 8.
    Right,
}

/// Left-edge returns between each growth step.
const PASSES_PER_GROWTH: u8 = 3;

/// Position and size of the bouncing bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bounce {
    pos: u8,
    size: u8,
    direction: Direction,
    passes: u8,
}

impl Bounce {
    /// A single light at the left edge moving right.
    pub const fn new() -> Self {
        Self {
            pos: 0,
            size: 1,
            direction: Direction::Right,
            passes: 0,
        }
    }

    /// Index of the leftmost lit light.
    #[inline]
    pub const fn position(&self) -> u8 {
        self.pos
    }

    /// Number of lit lights.
    #[inline]
    pub const fn size(&self) -> u8 {
        self.size
    }

    /// Current sweep direction.
    #[inline]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// True once the bar covers every light.
    #[inline]
    pub const fn is_full(&self) -> bool {
        self.size as usize >= LIGHT_COUNT
    }

    /// Whether light `index` is inside the bar.
    #[inline]
    pub fn covers(&self, index: usize) -> bool {
        let start = usize::from(self.pos);
        (start..start + usize::from(self.size)).contains(&index)
    }

    /// Draws the bar at full brightness and everything else dark.
    pub fn render(&self, frame: &FrameBuffer) {
        for index in 0..LIGHT_COUNT {
            frame.set(index, if self.covers(index) { MAX_LEVEL } else { 0 });
        }
    }

    /// The next position. Hitting the right edge turns the bar around;
    /// reaching the left edge turns it around and, every fourth time, grows it.
    /// A full bar starts over.
    pub fn advance(self) -> Self {
        if self.is_full() {
            return Self::new();
        }

        let mut next = self;
        loop {
            match next.direction {
                Direction::Right if usize::from(next.pos + next.size) < LIGHT_COUNT => {
                    next.pos += 1;
                    return next;
                }
                Direction::Right => next.direction = Direction::Left,
                Direction::Left if next.pos > 0 => {
                    next.pos -= 1;
                    return next;
                }
                Direction::Left => {
                    next.direction = Direction::Right;
                    if next.passes == PASSES_PER_GROWTH {
                        next.passes = 0;
                        next.size += 1;
                        return next;
                    }
                    next.passes += 1;
                }
            }
        }
    }
}

impl Default for Bounce {
    fn default() -> Self {
        Self::new()
    }
}
