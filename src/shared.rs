//! State shared between the refresh interrupt and the foreground loop.
//!
//! Every field is a single atomic word with one writer at a time:
//!
//! | field          | written by             | read by    |
//! |----------------|------------------------|------------|
//! | frame buffer   | foreground             | interrupt  |
//! | loop counter   | interrupt (+ reset)    | foreground |
//! | down-count     | interrupt (+ wake)     | interrupt  |
//! | mode request   | interrupt              | both       |
//! | active mode    | foreground             | foreground |
//! | shutdown flag  | interrupt (+ clear)    | foreground |
//!
//! Only plain loads and stores are used, so the state works on cores without
//! atomic read-modify-write instructions.

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, Ordering};

use crate::frame::FrameBuffer;
use crate::patterns::Pattern;

/// Highest mode number. The top mode rotates through every pattern.
pub const MAX_MODE: u8 = Pattern::ALL.len() as u8 + 1;

/// A user-selectable mode, `1..=MAX_MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mode(u8);

impl Mode {
    /// The mode selected at power-on.
    pub const FIRST: Mode = Mode(1);

    /// The "rotate all patterns" mode.
    pub const ROTATE: Mode = Mode(MAX_MODE);

    /// Returns the mode numbered `number`, if it exists.
    pub const fn new(number: u8) -> Option<Mode> {
        if number >= 1 && number <= MAX_MODE {
            Some(Mode(number))
        } else {
            None
        }
    }

    /// The mode number.
    #[inline]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// The next mode, wrapping from the top mode back to the first.
    pub const fn next(self) -> Mode {
        if self.0 >= MAX_MODE {
            Mode::FIRST
        } else {
            Mode(self.0 + 1)
        }
    }

    /// The single pattern this mode runs, or `None` for [`Mode::ROTATE`].
    pub fn pattern(self) -> Option<Pattern> {
        Pattern::ALL.get(usize::from(self.0) - 1).copied()
    }

    fn from_raw(raw: u8) -> Mode {
        Mode::new(raw).unwrap_or(Mode::FIRST)
    }
}

/// Everything the interrupt and foreground contexts exchange.
///
/// Declare one as a `static` and hand `&'static SharedState` to both sides.
pub struct SharedState {
    frame: FrameBuffer,
    loops: AtomicU16,
    down_count: AtomicU8,
    mode_request: AtomicU8,
    active_mode: AtomicU8,
    shutdown: AtomicBool,
}

impl SharedState {
    /// Fresh power-on state: dark buffer, mode 1 active and requested.
    pub const fn new() -> Self {
        Self {
            frame: FrameBuffer::new(),
            loops: AtomicU16::new(0),
            down_count: AtomicU8::new(0),
            mode_request: AtomicU8::new(Mode::FIRST.number()),
            active_mode: AtomicU8::new(Mode::FIRST.number()),
            shutdown: AtomicBool::new(false),
        }
    }

    /// The brightness buffer.
    #[inline]
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// True when the button has requested a mode the foreground has not adopted.
    #[inline]
    pub fn mode_changed(&self) -> bool {
        self.mode_request.load(Ordering::Relaxed) != self.active_mode.load(Ordering::Relaxed)
    }

    /// Makes the requested mode active and returns it.
    pub fn adopt_mode(&self) -> Mode {
        let requested = self.mode_request.load(Ordering::Relaxed);
        self.active_mode.store(requested, Ordering::Relaxed);
        Mode::from_raw(requested)
    }

    /// The mode the foreground is currently running.
    #[inline]
    pub fn active_mode(&self) -> Mode {
        Mode::from_raw(self.active_mode.load(Ordering::Relaxed))
    }

    /// The mode most recently requested by the button.
    #[inline]
    pub fn mode_request(&self) -> Mode {
        Mode::from_raw(self.mode_request.load(Ordering::Relaxed))
    }

    /// True when a long press has asked for power-down.
    #[inline]
    pub fn shutdown_pending(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Acknowledges a shutdown request. Called once the foreground starts
    /// powering down.
    #[inline]
    pub fn begin_shutdown(&self) {
        self.shutdown.store(false, Ordering::Relaxed);
    }

    /// True when a running routine should return to the dispatcher.
    #[inline]
    pub fn cancel_requested(&self) -> bool {
        self.mode_changed() || self.shutdown_pending()
    }

    /// Frames completed since the current routine began.
    #[inline]
    pub fn loops(&self) -> u16 {
        self.loops.load(Ordering::Relaxed)
    }

    /// Consecutive frames the button has been seen pressed.
    #[inline]
    pub fn down_count(&self) -> u8 {
        self.down_count.load(Ordering::Relaxed)
    }

    pub(crate) fn reset_loops(&self) {
        self.loops.store(0, Ordering::Relaxed);
    }

    // Load then store: the interrupt cannot be preempted by the foreground,
    // and the foreground's reset is a single store.
    pub(crate) fn advance_loops(&self) {
        let loops = self.loops.load(Ordering::Relaxed);
        self.loops.store(loops.wrapping_add(1), Ordering::Relaxed);
    }

    pub(crate) fn set_down_count(&self, count: u8) {
        self.down_count.store(count, Ordering::Relaxed);
    }

    pub(crate) fn request_next_mode(&self) -> Mode {
        let next = self.mode_request().next();
        self.mode_request.store(next.number(), Ordering::Relaxed);
        next
    }

    pub(crate) fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
