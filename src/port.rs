//! Hardware abstraction for the multiplexed lines and the power controls.
//!
//! All lights and the button share one small GPIO port. Each line is set by a
//! direction bit (1 = output) and a level bit (1 = high, or pull-up enabled
//! for an input), the same pair most microcontroller ports expose directly.

use crate::config::{BANK_COUNT, LIGHTS_PER_BANK};

/// Direction and level masks for the whole port, applied in one write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortDrive {
    /// Lines configured as outputs.
    pub direction: u8,

    /// Output level (or pull-up for inputs) of each line.
    pub level: u8,
}

impl PortDrive {
    /// Every line a floating input: nothing lit, nothing driven.
    pub const DARK: Self = Self {
        direction: 0,
        level: 0,
    };

    /// True if `mask` lines are outputs driven high.
    #[inline]
    pub const fn drives_high(&self, mask: u8) -> bool {
        self.direction & mask == mask && self.level & mask == mask
    }
}

/// Which output level lights a light within a bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Common line low; a high light line lights it.
    Normal,

    /// Common line high; a low light line lights it, so comparators invert.
    Inverted,
}

/// Electrical configuration of one bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BankWiring {
    /// Port configuration at the start of the bank's PWM cycle, with every
    /// light line high.
    pub drive: PortDrive,

    /// How the bank's lights respond to the light lines.
    pub polarity: Polarity,
}

/// How the nine lights and the button map onto port lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BankLayout {
    /// Bit for each light position within a bank. Light `i` of bank `b` is
    /// frame index `b * 3 + i`.
    pub light_bits: [u8; LIGHTS_PER_BANK],

    /// Per-bank common line setup.
    pub banks: [BankWiring; BANK_COUNT],

    /// Line the button pulls low when pressed.
    pub button_bit: u8,
}

const LIGHT_LINES: u8 = 1 << 0 | 1 << 1 | 1 << 4;
const COMMON_A: u8 = 1 << 2;
const COMMON_B: u8 = 1 << 3;

impl BankLayout {
    /// Five-line layout: light lines 0, 1 and 4, commons on 2 and 3, button
    /// sharing line 0.
    ///
    /// Bank 0 returns through line 2 low, bank 1 through line 3 low and bank
    /// 2 through line 2 driven high, which inverts its polarity.
    pub const FIVE_LINE: Self = Self {
        light_bits: [1 << 0, 1 << 1, 1 << 4],
        banks: [
            BankWiring {
                drive: PortDrive {
                    direction: LIGHT_LINES | COMMON_A,
                    level: LIGHT_LINES,
                },
                polarity: Polarity::Normal,
            },
            BankWiring {
                drive: PortDrive {
                    direction: LIGHT_LINES | COMMON_B,
                    level: LIGHT_LINES,
                },
                polarity: Polarity::Normal,
            },
            BankWiring {
                drive: PortDrive {
                    direction: LIGHT_LINES | COMMON_A,
                    level: LIGHT_LINES | COMMON_A,
                },
                polarity: Polarity::Inverted,
            },
        ],
        button_bit: 1 << 0,
    };
}

impl Default for BankLayout {
    fn default() -> Self {
        Self::FIVE_LINE
    }
}

/// The multiplexed light port, driven from the refresh interrupt.
///
/// Implementations must be cheap: both methods run inside the tick handler.
pub trait LightPort {
    /// Writes direction and level for every line at once.
    fn apply(&mut self, drive: PortDrive);

    /// Samples the button.
    ///
    /// Called only while [`PortDrive::DARK`] is applied. Every line must stay
    /// a floating input for the read, except the button line, which gets its
    /// pull-up; then put the port back to the last applied drive. Returns
    /// `true` when the line reads low. Must not block.
    fn button_pressed(&mut self) -> bool;
}

/// Power and wake controls used by the power-down sequence.
pub trait PowerPort {
    /// Stops the periodic refresh interrupt and floats all light lines, with
    /// the button line left as a pulled-up input.
    fn suspend_refresh(&mut self);

    /// Restarts the periodic refresh interrupt.
    fn resume_refresh(&mut self);

    /// Reads the button directly. `true` when pressed.
    fn button_pressed(&mut self) -> bool;

    /// Arms a level-change wake on the button line and halts in the lowest
    /// power mode until it fires.
    fn sleep_until_button_change(&mut self);
}
