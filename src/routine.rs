//! Cooperative cancellation for long-running patterns.
//!
//! A pattern never gets preempted. Instead it receives a [`RoutineContext`]
//! and calls [`wait_ms`](RoutineContext::wait_ms) or
//! [`check`](RoutineContext::check) at every visual step; both return
//! `Err(Cancelled)` once the button has asked for something else, and the
//! pattern leaves with `?`.

use embedded_hal::delay::DelayNs;

use crate::config::BlinkieConfig;
use crate::frame::FrameBuffer;
use crate::shared::SharedState;

/// Signal that the running routine must return to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cancelled;

impl core::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "routine cancelled")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Cancelled {}

/// Outcome of a routine step.
pub type Flow = Result<(), Cancelled>;

/// Handle given to a pattern for the duration of one run.
pub struct RoutineContext<'a, D: DelayNs> {
    shared: &'a SharedState,
    delay: &'a mut D,
    ceiling: u16,
    frames_per_second: u16,
}

impl<'a, D: DelayNs> RoutineContext<'a, D> {
    /// Starts a routine: clears the frame buffer and restarts the frame
    /// counter the watchdog measures against.
    pub fn begin(shared: &'a SharedState, delay: &'a mut D, config: &BlinkieConfig) -> Self {
        shared.frame().clear();
        shared.reset_loops();

        Self {
            shared,
            delay,
            ceiling: config.watchdog_frames(),
            frames_per_second: config.frames_per_second,
        }
    }

    /// The brightness buffer to draw into.
    #[inline]
    pub fn frame(&self) -> &FrameBuffer {
        self.shared.frame()
    }

    /// Turns every light off.
    #[inline]
    pub fn clear(&self) {
        self.shared.frame().clear();
    }

    /// Frames refreshed since the routine began.
    #[inline]
    pub fn loops(&self) -> u16 {
        self.shared.loops()
    }

    /// Frames per second, for patterns that time themselves in frames.
    #[inline]
    pub fn frames_per_second(&self) -> u16 {
        self.frames_per_second
    }

    /// Sleeps for `ms` milliseconds in 1 ms steps, returning early with
    /// `Err(Cancelled)` as soon as a mode change or shutdown is pending.
    pub fn wait_ms(&mut self, ms: u32) -> Flow {
        for _ in 0..ms {
            self.delay.delay_ms(1);
            if self.shared.cancel_requested() {
                return Err(Cancelled);
            }
        }
        Ok(())
    }

    /// Non-sleeping check for tight loops.
    ///
    /// Cancels on a pending mode change or shutdown, and also once the routine
    /// has run for the configured watchdog ceiling.
    pub fn check(&self) -> Flow {
        if self.shared.cancel_requested() {
            return Err(Cancelled);
        }
        if self.shared.loops() >= self.ceiling {
            #[cfg(feature = "defmt")]
            defmt::trace!("routine hit the {=u16} frame ceiling", self.ceiling);

            return Err(Cancelled);
        }
        Ok(())
    }
}
