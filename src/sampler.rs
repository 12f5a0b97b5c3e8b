//! Once-per-frame button debouncing.
//!
//! The sampler is a counter, not a timer: it sees the button once per frame
//! during the dark slot and turns the run length of "pressed" samples into
//! a click (mode advance) or a long press (shutdown request).

use crate::config::BlinkieConfig;
use crate::shared::{Mode, SharedState};

/// What one button sample changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleEvent {
    /// Nothing to report.
    None,

    /// A click was released; the requested mode advanced.
    ModeAdvanced(Mode),

    /// The button has been held long enough to power down.
    ShutdownRequested,
}

/// Debounce thresholds, copied out of [`BlinkieConfig`] for the interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonSampler {
    debounce_frames: u8,
    shutdown_frames: u8,
    handled: u8,
}

impl ButtonSampler {
    /// Creates a sampler from the configured thresholds.
    pub const fn new(config: &BlinkieConfig) -> Self {
        Self {
            debounce_frames: config.debounce_frames,
            shutdown_frames: config.shutdown_frames,
            handled: config.handled_sentinel(),
        }
    }

    /// Feeds one frame's button reading into the shared state.
    ///
    /// Pressed: the down-count grows; the frame it reaches the shutdown
    /// threshold raises the shutdown request once and parks the count at the
    /// handled sentinel. Released: a count strictly between the debounce
    /// threshold and the sentinel advances the requested mode; the count is
    /// reset either way.
    pub fn sample(&self, shared: &SharedState, pressed: bool) -> SampleEvent {
        let count = shared.down_count();

        if pressed {
            if count >= self.handled {
                return SampleEvent::None;
            }

            let count = count + 1;
            if count >= self.shutdown_frames {
                shared.set_down_count(self.handled);
                shared.request_shutdown();

                #[cfg(feature = "defmt")]
                defmt::debug!("long press: shutdown requested");

                return SampleEvent::ShutdownRequested;
            }

            shared.set_down_count(count);
            return SampleEvent::None;
        }

        shared.set_down_count(0);
        if count > self.debounce_frames && count < self.handled {
            let mode = shared.request_next_mode();

            #[cfg(feature = "defmt")]
            defmt::debug!("click: mode {=u8} requested", mode.number());

            return SampleEvent::ModeAdvanced(mode);
        }

        SampleEvent::None
    }
}

impl Default for ButtonSampler {
    fn default() -> Self {
        Self::new(&BlinkieConfig::DEFAULT)
    }
}
