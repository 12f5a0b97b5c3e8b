#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`SharedState`**: Frame buffer, frame counter, button and mode flags shared by the
//!   refresh interrupt and the foreground, one atomic word per field
//! - **`RefreshEngine`**: Per-tick software PWM and bank multiplexing, run from a timer interrupt
//! - **`ButtonSampler`**: Frame-counting debounce that turns presses into mode and shutdown requests
//! - **`RoutineContext`**: Cooperative cancellation handed to every pattern (`wait_ms`, `check`)
//! - **`PowerController`**: Shutdown fade, sleep and double-click wake state machine
//! - **`Blinkie`**: The foreground dispatcher
//! - **`LightPort`** / **`PowerPort`**: Traits to implement for your GPIO and power hardware
//! - **`BlinkieConfig`**: Validated timing and threshold configuration
//!
//! Brightness is a 4-bit level per light (`0..=15`). Levels above 15 are not
//! clamped; they light for the whole PWM cycle.

pub mod bounce;
pub mod config;
pub mod dispatcher;
pub mod frame;
pub mod patterns;
pub mod port;
pub mod power;
pub mod refresh;
pub mod routine;
pub mod sampler;
pub mod shared;

pub use config::{
    BANK_COUNT, BlinkieConfig, CYCLE_LENGTH, ConfigBuilder, ConfigError, LIGHT_COUNT,
    LIGHTS_PER_BANK, MAX_LEVEL, SAMPLE_SLOT, SLOT_COUNT,
};
pub use dispatcher::{Activity, Blinkie, Playlist};
pub use frame::{FULL_ON, FrameBuffer};
pub use patterns::Pattern;
pub use port::{BankLayout, BankWiring, LightPort, Polarity, PortDrive, PowerPort};
pub use power::{PowerController, PowerState, play_shutdown_fade};
pub use refresh::{RefreshEngine, comparator};
pub use routine::{Cancelled, Flow, RoutineContext};
pub use sampler::{ButtonSampler, SampleEvent};
pub use shared::{MAX_MODE, Mode, SharedState};

#[cfg(test)]
mod tests {
    use super::*;

    // A static must be constructible at compile time for the interrupt to share it.
    static SHARED: SharedState = SharedState::new();
    static ENGINE_TEMPLATE: RefreshEngine =
        RefreshEngine::new(BankLayout::FIVE_LINE, &BlinkieConfig::DEFAULT);

    #[test]
    fn core_state_is_const_constructible() {
        assert_eq!(SHARED.active_mode(), Mode::FIRST);
        assert_eq!(ENGINE_TEMPLATE.slot(), 0);
    }
}
