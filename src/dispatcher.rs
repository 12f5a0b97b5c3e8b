//! The foreground loop: pick what to show, show it, repeat.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::config::BlinkieConfig;
use crate::patterns::{self, Pattern};
use crate::port::PowerPort;
use crate::power::{PowerController, PowerState};
use crate::routine::RoutineContext;
use crate::shared::{Mode, SharedState};

/// Patterns visited, in order, by the rotate mode.
pub type Playlist = Vec<Pattern, { Pattern::ALL.len() }>;

/// What one dispatcher iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Activity {
    /// Ran the boot self test.
    SelfTest,
    /// Went through power-down and woke again.
    PoweredDown,
    /// Adopted a newly requested mode and displayed its number.
    ShowedMode(Mode),
    /// Ran a pattern until it was cancelled or timed out.
    Ran(Pattern),
}

/// Foreground controller tying patterns, mode changes and power-down together.
pub struct Blinkie<'a, P: PowerPort, D: DelayNs> {
    shared: &'a SharedState,
    port: P,
    delay: D,
    config: BlinkieConfig,
    power: PowerController,
    playlist: Playlist,
    rotation: usize,
    booted: bool,
}

impl<'a, P: PowerPort, D: DelayNs> Blinkie<'a, P, D> {
    /// Creates the dispatcher. The rotate mode plays every pattern in order.
    ///
    /// `config` must be the one the [`RefreshEngine`](crate::RefreshEngine)
    /// was built with. Waking presets the down-count to the handled sentinel
    /// derived from it, and the sampler only ignores the waking press if its
    /// own sentinel matches.
    pub fn new(shared: &'a SharedState, port: P, delay: D, config: BlinkieConfig) -> Self {
        let mut playlist = Playlist::new();
        for pattern in Pattern::ALL {
            let _ = playlist.push(pattern);
        }

        Self {
            shared,
            port,
            delay,
            config,
            power: PowerController::new(&config),
            playlist,
            rotation: 0,
            booted: false,
        }
    }

    /// Replaces the rotate-mode playlist. An empty playlist is ignored.
    pub fn set_playlist(&mut self, playlist: Playlist) {
        if !playlist.is_empty() {
            self.playlist = playlist;
            self.rotation = 0;
        }
    }

    /// Runs one iteration: shutdown first, then a pending mode change, else
    /// the active mode's pattern.
    pub fn run_once(&mut self) -> Activity {
        if !self.booted {
            self.booted = true;
            if self.config.self_test_on_boot {
                let mut ctx = RoutineContext::begin(self.shared, &mut self.delay, &self.config);
                let _ = patterns::self_test(&mut ctx);
                return Activity::SelfTest;
            }
        }

        if self.shared.shutdown_pending() {
            #[cfg(feature = "defmt")]
            defmt::info!("powering down");

            self.power
                .power_down(self.shared, &mut self.port, &mut self.delay);
            return Activity::PoweredDown;
        }

        if self.shared.mode_changed() {
            let mode = self.shared.adopt_mode();

            #[cfg(feature = "defmt")]
            defmt::info!("mode {=u8}", mode.number());

            let mut ctx = RoutineContext::begin(self.shared, &mut self.delay, &self.config);
            let _ = patterns::show_mode(&mut ctx, mode);
            return Activity::ShowedMode(mode);
        }

        let pattern = match self.shared.active_mode().pattern() {
            Some(pattern) => pattern,
            None => self.next_in_rotation(),
        };

        // Cancellation is the normal way out of a pattern.
        let mut ctx = RoutineContext::begin(self.shared, &mut self.delay, &self.config);
        let _ = pattern.run(&mut ctx);
        Activity::Ran(pattern)
    }

    /// Runs forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.run_once();
        }
    }

    fn next_in_rotation(&mut self) -> Pattern {
        let index = self.rotation % self.playlist.len();
        self.rotation = index + 1;
        self.playlist[index]
    }

    /// Where the power-down controller is.
    #[inline]
    pub fn power_state(&self) -> PowerState {
        self.power.state()
    }
}
