//! Power-down and double-click wake.
//!
//! ```text
//! Running ─shutdown request─▶ ShutdownAnimation ─▶ AwaitRelease ─▶ Sleeping
//!    ▲                                                              │  ▲
//!    │                                                button change │  │ no second press
//!    └──────────── Wake ◀── second press ── AwaitDoubleClick ◀──────┘  │
//!                                                 └────────────────────┘
//! ```
//!
//! The whole sequence runs in the foreground. Once refresh is suspended the
//! button is polled directly, since the sampler only runs inside the refresh
//! interrupt.

use embedded_hal::delay::DelayNs;

use crate::config::BlinkieConfig;
use crate::frame::FrameBuffer;
use crate::port::PowerPort;
use crate::shared::SharedState;

const CENTER: usize = 4;

/// Where the power controller is in the shutdown/wake cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Normal operation; patterns are running.
    Running,

    /// Playing the fixed fade-out.
    ShutdownAnimation,

    /// Refresh stopped, waiting for the long press to end.
    AwaitRelease,

    /// Halted until the button line changes.
    Sleeping,

    /// Woken by the button; waiting for the confirming second press.
    AwaitDoubleClick,

    /// Second press seen; re-arming refresh.
    Wake,
}

/// Drives the power-down state machine.
#[derive(Debug, Clone)]
pub struct PowerController {
    state: PowerState,
    debounce_ms: u32,
    window_ms: u32,
    handled: u8,
}

impl PowerController {
    /// Creates a controller in the [`PowerState::Running`] state.
    pub const fn new(config: &BlinkieConfig) -> Self {
        Self {
            state: PowerState::Running,
            debounce_ms: config.wake_debounce_ms,
            window_ms: config.double_click_window_ms,
            handled: config.handled_sentinel(),
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Performs one transition and returns the new state.
    ///
    /// In [`PowerState::Running`] this only looks at the shutdown request;
    /// every other state blocks for as long as that stage takes.
    pub fn step<P, D>(&mut self, shared: &SharedState, port: &mut P, delay: &mut D) -> PowerState
    where
        P: PowerPort,
        D: DelayNs,
    {
        let next = match self.state {
            PowerState::Running => {
                if shared.shutdown_pending() {
                    shared.begin_shutdown();
                    PowerState::ShutdownAnimation
                } else {
                    PowerState::Running
                }
            }
            PowerState::ShutdownAnimation => {
                play_shutdown_fade(shared.frame(), delay);
                PowerState::AwaitRelease
            }
            PowerState::AwaitRelease => {
                port.suspend_refresh();
                wait_for_release(port, delay);
                delay.delay_ms(self.debounce_ms);
                PowerState::Sleeping
            }
            PowerState::Sleeping => {
                port.sleep_until_button_change();
                PowerState::AwaitDoubleClick
            }
            PowerState::AwaitDoubleClick => {
                delay.delay_ms(self.debounce_ms);
                wait_for_release(port, delay);
                delay.delay_ms(self.debounce_ms);

                if self.second_press_within_window(port, delay) {
                    PowerState::Wake
                } else {
                    PowerState::Sleeping
                }
            }
            PowerState::Wake => {
                // The refresh interrupt must not observe a stale down-count.
                critical_section::with(|_| {
                    shared.set_down_count(self.handled);
                    port.resume_refresh();
                });
                PowerState::Running
            }
        };

        #[cfg(feature = "defmt")]
        if next != self.state {
            defmt::debug!("power: {} -> {}", self.state, next);
        }

        self.state = next;
        next
    }

    /// Handles a pending shutdown request end to end: fade, sleep, and wake on
    /// a double click. Returns immediately if no shutdown is pending.
    pub fn power_down<P, D>(&mut self, shared: &SharedState, port: &mut P, delay: &mut D)
    where
        P: PowerPort,
        D: DelayNs,
    {
        if self.step(shared, port, delay) == PowerState::Running {
            return;
        }
        while self.step(shared, port, delay) != PowerState::Running {}
    }

    fn second_press_within_window<P: PowerPort, D: DelayNs>(
        &self,
        port: &mut P,
        delay: &mut D,
    ) -> bool {
        for _ in 0..self.window_ms {
            if port.button_pressed() {
                return true;
            }
            delay.delay_ms(1);
        }
        false
    }
}

fn wait_for_release<P: PowerPort, D: DelayNs>(port: &mut P, delay: &mut D) {
    while port.button_pressed() {
        delay.delay_ms(1);
    }
}

/// Plays the fixed power-down fade: everything dims, the outer lights go out
/// in pairs while the centre brightens, then the centre fades away.
///
/// Runs to completion; it does not observe cancellation.
pub fn play_shutdown_fade<D: DelayNs>(frame: &FrameBuffer, delay: &mut D) {
    frame.fill(1);
    delay.delay_ms(100);

    for step in (1..=CENTER).rev() {
        delay.delay_ms(100);
        frame.set(CENTER - step, 0);
        frame.set(CENTER + step, 0);
        frame.set(CENTER, 15 - 3 * step as u8);
    }
    delay.delay_ms(100);

    for level in (0..15).rev() {
        delay.delay_ms(50);
        frame.set(CENTER, level);
    }
}
