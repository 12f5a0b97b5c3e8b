//! Geometry constants and runtime timing configuration.
//!
//! The geometry (9 lights, 3 banks, 20-tick PWM cycle, 4 slots) is fixed at
//! compile time. Thresholds and durations that only shape behaviour live in
//! [`BlinkieConfig`], built through a validating [`ConfigBuilder`].

/// Number of lights in the array.
pub const LIGHT_COUNT: usize = 9;

/// Number of physical driving banks.
pub const BANK_COUNT: usize = 3;

/// Lights sharing one bank return path.
pub const LIGHTS_PER_BANK: usize = LIGHT_COUNT / BANK_COUNT;

/// Highest nominal brightness level (4-bit duty).
pub const MAX_LEVEL: u8 = 15;

/// Ticks per software PWM cycle.
///
/// Longer than [`MAX_LEVEL`] so even full brightness keeps some off-time.
pub const CYCLE_LENGTH: u8 = 20;

/// Slots per frame: one per bank plus the button sampling slot.
pub const SLOT_COUNT: u8 = BANK_COUNT as u8 + 1;

/// The slot that drives no lights and samples the button instead.
pub const SAMPLE_SLOT: u8 = BANK_COUNT as u8;

/// Validation errors for [`BlinkieConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Frame rate of zero.
    ZeroFrameRate,

    /// Debounce threshold not below the shutdown threshold.
    DebounceNotBelowShutdown,

    /// Shutdown threshold leaves no room for the handled sentinel.
    ShutdownThresholdTooLarge,

    /// Watchdog ceiling does not fit the 16-bit frame counter.
    WatchdogOutOfRange,

    /// Double-click window of zero milliseconds.
    ZeroWakeWindow,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ZeroFrameRate => write!(f, "frame rate must be non-zero"),
            ConfigError::DebounceNotBelowShutdown => {
                write!(f, "debounce threshold must be below the shutdown threshold")
            }
            ConfigError::ShutdownThresholdTooLarge => {
                write!(f, "shutdown threshold must be below 255 frames")
            }
            ConfigError::WatchdogOutOfRange => {
                write!(f, "watchdog ceiling must be non-zero and fit in 65535 frames")
            }
            ConfigError::ZeroWakeWindow => write!(f, "double-click window must be non-zero"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Timing and threshold configuration shared by every part of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkieConfig {
    /// Frames (full refreshes of all banks) per second.
    pub frames_per_second: u16,

    /// A release after more than this many pressed frames is a click.
    pub debounce_frames: u8,

    /// Pressed frames after which shutdown is requested.
    pub shutdown_frames: u8,

    /// Runtime ceiling for a single routine, in seconds.
    pub watchdog_secs: u16,

    /// Settle time after each button edge while powered down, in milliseconds.
    pub wake_debounce_ms: u32,

    /// Window for the second press of the wake double-click, in milliseconds.
    pub double_click_window_ms: u32,

    /// Run the light self test once before the first pattern.
    pub self_test_on_boot: bool,
}

impl BlinkieConfig {
    /// Defaults for a 10 kHz refresh tick.
    pub const DEFAULT: Self = Self {
        frames_per_second: 125,
        debounce_frames: 5,
        shutdown_frames: 100,
        watchdog_secs: 60,
        wake_debounce_ms: 50,
        double_click_window_ms: 500,
        self_test_on_boot: false,
    };

    /// Creates a builder seeded with [`BlinkieConfig::DEFAULT`].
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            config: Self::DEFAULT,
        }
    }

    /// Down-count value meaning "press already handled, ignore until release".
    #[inline]
    pub const fn handled_sentinel(&self) -> u8 {
        self.shutdown_frames.saturating_add(1)
    }

    /// Routine runtime ceiling expressed in frames.
    #[inline]
    pub const fn watchdog_frames(&self) -> u16 {
        self.watchdog_secs.saturating_mul(self.frames_per_second)
    }

    /// Timer interrupt rate needed to hit the configured frame rate.
    #[inline]
    pub const fn tick_hz(&self) -> u32 {
        self.frames_per_second as u32 * SLOT_COUNT as u32 * CYCLE_LENGTH as u32
    }
}

impl Default for BlinkieConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Builder for [`BlinkieConfig`] that validates on [`build`](Self::build).
#[derive(Debug, Clone, Copy)]
pub struct ConfigBuilder {
    config: BlinkieConfig,
}

impl ConfigBuilder {
    /// Sets the frame rate.
    pub fn frames_per_second(mut self, fps: u16) -> Self {
        self.config.frames_per_second = fps;
        self
    }

    /// Sets the bounce-rejection threshold.
    pub fn debounce_frames(mut self, frames: u8) -> Self {
        self.config.debounce_frames = frames;
        self
    }

    /// Sets the long-press shutdown threshold.
    pub fn shutdown_frames(mut self, frames: u8) -> Self {
        self.config.shutdown_frames = frames;
        self
    }

    /// Sets the routine runtime ceiling.
    pub fn watchdog_secs(mut self, secs: u16) -> Self {
        self.config.watchdog_secs = secs;
        self
    }

    /// Sets the power-down button settle time.
    pub fn wake_debounce_ms(mut self, ms: u32) -> Self {
        self.config.wake_debounce_ms = ms;
        self
    }

    /// Sets the wake double-click window.
    pub fn double_click_window_ms(mut self, ms: u32) -> Self {
        self.config.double_click_window_ms = ms;
        self
    }

    /// Enables or disables the boot self test.
    pub fn self_test_on_boot(mut self, enabled: bool) -> Self {
        self.config.self_test_on_boot = enabled;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<BlinkieConfig, ConfigError> {
        let c = self.config;

        if c.frames_per_second == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }
        if c.debounce_frames >= c.shutdown_frames {
            return Err(ConfigError::DebounceNotBelowShutdown);
        }
        if c.shutdown_frames == u8::MAX {
            return Err(ConfigError::ShutdownThresholdTooLarge);
        }
        match c.watchdog_secs.checked_mul(c.frames_per_second) {
            Some(frames) if frames > 0 => {}
            _ => return Err(ConfigError::WatchdogOutOfRange),
        }
        if c.double_click_window_ms == 0 {
            return Err(ConfigError::ZeroWakeWindow);
        }

        Ok(c)
    }
}
