//! The display refresh engine, run once per hardware timer tick.
//!
//! Each tick performs one step of software PWM for the active bank. A frame
//! is four slots of [`CYCLE_LENGTH`] ticks: three slots light banks 0, 1 and
//! 2, the fourth is dark and samples the button.
//!
//! ```text
//! slot:   |  bank 0  |  bank 1  |  bank 2  |  sample  |
//! ticks:  0 ...... 19 0 ...... 19 0 ...... 19 0 1 .... 19
//!                                              ^ button read  ^ loops += 1
//! ```
//!
//! Output lags computation by one tick, so the button is read on tick 1 of
//! the sample slot, the first tick with every line floating.

use crate::config::{BlinkieConfig, CYCLE_LENGTH, LIGHTS_PER_BANK, SAMPLE_SLOT, SLOT_COUNT};
use crate::frame::FrameBuffer;
use crate::port::{BankLayout, BankWiring, LightPort, Polarity, PortDrive};
use crate::sampler::{ButtonSampler, SampleEvent};
use crate::shared::SharedState;

/// Tick of the sample slot on which the button is read.
const SAMPLE_TICK: u8 = 1;

/// Converts a brightness level to the PWM tick at which the light line drops.
///
/// A line is high from tick 0 up to, but not including, the comparator, so 0
/// is never high and anything at or above [`CYCLE_LENGTH`] is always high.
/// Inverted banks light on a low line, so their comparator counts the other
/// way; saturating keeps over-range levels fully lit there too.
#[inline]
pub const fn comparator(level: u8, polarity: Polarity) -> u8 {
    match polarity {
        Polarity::Normal => level,
        Polarity::Inverted => CYCLE_LENGTH.saturating_sub(level).saturating_sub(1),
    }
}

/// Per-tick multiplexing state, owned by the timer interrupt.
#[derive(Debug, Clone)]
pub struct RefreshEngine {
    layout: BankLayout,
    sampler: ButtonSampler,
    pwm: u8,
    slot: u8,
    compare: [u8; LIGHTS_PER_BANK],
    pending: PortDrive,
}

impl RefreshEngine {
    /// Creates an engine positioned at the start of bank 0 with all lines dark.
    ///
    /// Pass the same `config` to [`Blinkie::new`](crate::Blinkie::new).
    pub const fn new(layout: BankLayout, config: &BlinkieConfig) -> Self {
        Self {
            layout,
            sampler: ButtonSampler::new(config),
            pwm: 0,
            slot: 0,
            compare: [0; LIGHTS_PER_BANK],
            pending: PortDrive::DARK,
        }
    }

    /// Runs one timer tick.
    ///
    /// The port first receives the drive computed on the previous tick, so the
    /// output edge lands at the same point of every tick regardless of how long
    /// the rest of this call takes. Returns what the button sampler saw on
    /// this tick.
    pub fn tick<P: LightPort>(&mut self, shared: &SharedState, port: &mut P) -> SampleEvent {
        port.apply(self.pending);

        // The dark drive latched at the start of the sample slot is on the
        // lines from its second tick.
        let event = if self.slot == SAMPLE_SLOT && self.pwm == SAMPLE_TICK {
            let pressed = port.button_pressed();
            self.sampler.sample(shared, pressed)
        } else {
            SampleEvent::None
        };

        if self.pwm == 0 {
            self.latch(shared.frame());
        }

        if self.active_bank().is_some() {
            for (&bit, &compare) in self.layout.light_bits.iter().zip(&self.compare) {
                if compare == self.pwm {
                    self.pending.level &= !bit;
                }
            }
        }

        self.pwm += 1;
        if self.pwm == CYCLE_LENGTH {
            self.pwm = 0;
            let finished = self.slot;
            self.slot = (self.slot + 1) % SLOT_COUNT;

            if finished == SAMPLE_SLOT {
                shared.advance_loops();
            }
        }

        event
    }

    // Comparators are only reloaded here, at the start of a slot, so a bank
    // never shows a mix of old and new frame values.
    fn latch(&mut self, frame: &FrameBuffer) {
        match self.active_bank() {
            Some(wiring) => {
                let levels = frame.bank(usize::from(self.slot));
                self.compare = levels.map(|level| comparator(level, wiring.polarity));
                self.pending = wiring.drive;
            }
            None => {
                self.pending = PortDrive::DARK;
            }
        }
    }

    fn active_bank(&self) -> Option<BankWiring> {
        self.layout.banks.get(usize::from(self.slot)).copied()
    }

    /// Current slot, `0..SLOT_COUNT`.
    #[inline]
    pub fn slot(&self) -> u8 {
        self.slot
    }

    /// Position within the current PWM cycle, `0..CYCLE_LENGTH`.
    #[inline]
    pub fn pwm_count(&self) -> u8 {
        self.pwm
    }

    /// Comparators latched for the current slot.
    #[inline]
    pub fn comparators(&self) -> [u8; LIGHTS_PER_BANK] {
        self.compare
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BANK_COUNT;

    struct NullPort {
        applied: u32,
        samples: u32,
    }

    impl LightPort for NullPort {
        fn apply(&mut self, _drive: PortDrive) {
            self.applied += 1;
        }

        fn button_pressed(&mut self) -> bool {
            self.samples += 1;
            false
        }
    }

    /// Remembers which drive was on the lines when the button was read.
    struct ListeningPort {
        current: PortDrive,
        heard_under: Option<PortDrive>,
    }

    impl LightPort for ListeningPort {
        fn apply(&mut self, drive: PortDrive) {
            self.current = drive;
        }

        fn button_pressed(&mut self) -> bool {
            self.heard_under = Some(self.current);
            false
        }
    }

    #[test]
    fn button_is_read_with_every_line_floating() {
        let shared = SharedState::new();
        shared.frame().fill(15);
        let mut engine = RefreshEngine::new(BankLayout::FIVE_LINE, &BlinkieConfig::DEFAULT);
        let mut port = ListeningPort {
            current: PortDrive::DARK,
            heard_under: None,
        };

        let mut reads = 0;
        for _ in 0..u32::from(CYCLE_LENGTH) * u32::from(SLOT_COUNT) * 3 {
            engine.tick(&shared, &mut port);
            if let Some(drive) = port.heard_under.take() {
                assert_eq!(drive, PortDrive::DARK);
                assert_eq!(engine.slot(), SAMPLE_SLOT);
                reads += 1;
            }
        }
        assert_eq!(reads, 3);
    }

    #[test]
    fn comparator_inverts_and_saturates() {
        assert_eq!(comparator(0, Polarity::Normal), 0);
        assert_eq!(comparator(15, Polarity::Normal), 15);
        assert_eq!(comparator(255, Polarity::Normal), 255);
        assert_eq!(comparator(0, Polarity::Inverted), 19);
        assert_eq!(comparator(15, Polarity::Inverted), 4);
        assert_eq!(comparator(19, Polarity::Inverted), 0);
        assert_eq!(comparator(255, Polarity::Inverted), 0);
    }

    #[test]
    fn slots_advance_every_cycle_and_samples_once_per_frame() {
        let shared = SharedState::new();
        let mut engine = RefreshEngine::new(BankLayout::FIVE_LINE, &BlinkieConfig::DEFAULT);
        let mut port = NullPort {
            applied: 0,
            samples: 0,
        };

        let frame_ticks = u32::from(CYCLE_LENGTH) * u32::from(SLOT_COUNT);
        for _ in 0..CYCLE_LENGTH {
            engine.tick(&shared, &mut port);
        }
        assert_eq!(engine.slot(), 1);
        assert_eq!(engine.pwm_count(), 0);

        for _ in u32::from(CYCLE_LENGTH)..frame_ticks {
            engine.tick(&shared, &mut port);
        }
        assert_eq!(engine.slot(), 0);
        assert_eq!(port.samples, 1);
        assert_eq!(shared.loops(), 1);
        assert_eq!(port.applied, frame_ticks);
    }

    #[test]
    fn latch_uses_bank_polarity() {
        let shared = SharedState::new();
        shared.frame().load(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let mut engine = RefreshEngine::new(BankLayout::FIVE_LINE, &BlinkieConfig::DEFAULT);
        let mut port = NullPort {
            applied: 0,
            samples: 0,
        };

        let mut seen = [[0u8; LIGHTS_PER_BANK]; BANK_COUNT];
        for bank in 0..BANK_COUNT {
            engine.tick(&shared, &mut port);
            seen[bank] = engine.comparators();
            for _ in 1..CYCLE_LENGTH {
                engine.tick(&shared, &mut port);
            }
        }

        assert_eq!(seen[0], [1, 2, 3]);
        assert_eq!(seen[1], [4, 5, 6]);
        assert_eq!(seen[2], [12, 11, 10]);
    }
}
