//! Shared test infrastructure for softpwm-blinkie integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::cell::RefCell;

use embedded_hal::delay::DelayNs;
use softpwm_blinkie::{
    BankLayout, BlinkieConfig, CYCLE_LENGTH, LightPort, PortDrive, PowerPort, RefreshEngine,
    SLOT_COUNT, SharedState,
};

/// Nanoseconds per refresh tick at the default 10 kHz tick rate.
pub const TICK_NS: u64 = 100_000;

/// Ticks in one frame (four slots of one PWM cycle each).
pub const FRAME_TICKS: u32 = CYCLE_LENGTH as u32 * SLOT_COUNT as u32;

pub const MS: u64 = 1_000_000;

// ============================================================================
// Mock light port
// ============================================================================

/// Light port that records every drive it is given
pub struct RecordingPort {
    pub pressed: bool,
    pub applied: heapless::Vec<PortDrive, 256>,
    pub last: PortDrive,
    pub samples: u32,
    /// Button reads made while any line was still driven.
    pub reads_while_driven: u32,
}

impl RecordingPort {
    pub fn new() -> Self {
        Self {
            pressed: false,
            applied: heapless::Vec::new(),
            last: PortDrive::DARK,
            samples: 0,
            reads_while_driven: 0,
        }
    }
}

impl LightPort for RecordingPort {
    fn apply(&mut self, drive: PortDrive) {
        self.last = drive;
        let _ = self.applied.push(drive);
    }

    fn button_pressed(&mut self) -> bool {
        self.samples += 1;
        if self.last != PortDrive::DARK {
            self.reads_while_driven += 1;
        }
        self.pressed
    }
}

// ============================================================================
// Button script
// ============================================================================

/// Press intervals on the virtual clock, `[start, end)` in nanoseconds
pub struct ButtonScript {
    presses: heapless::Vec<(u64, u64), 16>,
}

impl ButtonScript {
    pub fn idle() -> Self {
        Self {
            presses: heapless::Vec::new(),
        }
    }

    /// Adds a press starting at `start_ms` lasting `duration_ms`
    pub fn press(mut self, start_ms: u64, duration_ms: u64) -> Self {
        let start = start_ms * MS;
        self.presses
            .push((start, start + duration_ms * MS))
            .expect("too many scripted presses");
        self
    }

    pub fn pressed_at(&self, now: u64) -> bool {
        self.presses
            .iter()
            .any(|&(start, end)| (start..end).contains(&now))
    }

    /// First press or release edge strictly after `now`
    pub fn next_edge_after(&self, now: u64) -> Option<u64> {
        self.presses
            .iter()
            .flat_map(|&(start, end)| [start, end])
            .filter(|&edge| edge > now)
            .min()
    }
}

// ============================================================================
// Simulated board
// ============================================================================

/// A virtual board: clock, refresh interrupt, button and power state
pub struct World<'s> {
    pub shared: &'s SharedState,
    pub engine: RefreshEngine,
    pub lights: RecordingPort,
    pub button: ButtonScript,
    pub now: u64,
    pub next_tick: u64,
    pub refresh_enabled: bool,
    pub suspends: u32,
    pub resumes: u32,
    pub sleeps: u32,
}

impl<'s> World<'s> {
    pub fn new(shared: &'s SharedState, button: ButtonScript) -> Self {
        Self::with_config(shared, button, &BlinkieConfig::DEFAULT)
    }

    /// A board whose refresh engine is built from `config`
    pub fn with_config(
        shared: &'s SharedState,
        button: ButtonScript,
        config: &BlinkieConfig,
    ) -> Self {
        Self {
            shared,
            engine: RefreshEngine::new(BankLayout::FIVE_LINE, config),
            lights: RecordingPort::new(),
            button,
            now: 0,
            next_tick: 0,
            refresh_enabled: true,
            suspends: 0,
            resumes: 0,
            sleeps: 0,
        }
    }

    /// Moves the clock forward, running every refresh tick that falls due
    pub fn advance(&mut self, ns: u64) {
        let target = self.now + ns;
        while self.refresh_enabled && self.next_tick <= target {
            self.now = self.next_tick;
            self.lights.pressed = self.button.pressed_at(self.now);
            self.engine.tick(self.shared, &mut self.lights);
            self.next_tick += TICK_NS;
        }
        self.now = target;
        if !self.refresh_enabled {
            self.next_tick = target;
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now / MS
    }
}

/// Delay that advances the virtual clock
pub struct SimDelay<'w, 's>(pub &'w RefCell<World<'s>>);

impl DelayNs for SimDelay<'_, '_> {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().advance(u64::from(ns));
    }
}

/// Power port backed by the virtual board
pub struct SimPower<'w, 's>(pub &'w RefCell<World<'s>>);

impl PowerPort for SimPower<'_, '_> {
    fn suspend_refresh(&mut self) {
        let mut world = self.0.borrow_mut();
        world.refresh_enabled = false;
        world.suspends += 1;
        world.lights.apply(PortDrive::DARK);
    }

    fn resume_refresh(&mut self) {
        let mut world = self.0.borrow_mut();
        world.refresh_enabled = true;
        world.next_tick = world.now;
        world.resumes += 1;
    }

    fn button_pressed(&mut self) -> bool {
        let world = self.0.borrow();
        world.button.pressed_at(world.now)
    }

    fn sleep_until_button_change(&mut self) {
        let mut world = self.0.borrow_mut();
        world.sleeps += 1;
        let edge = world
            .button
            .next_edge_after(world.now)
            .expect("slept with no further button activity scripted");
        world.now = edge;
        world.next_tick = edge;
    }
}

// ============================================================================
// Test helper functions
// ============================================================================

/// Runs whole frames of the refresh engine with the button held as given
pub fn run_frames(
    engine: &mut RefreshEngine,
    shared: &SharedState,
    port: &mut RecordingPort,
    frames: u32,
) {
    for _ in 0..frames * FRAME_TICKS {
        engine.tick(shared, port);
    }
}

/// Counts ticks in `drives` during which all of `mask` is driven high
pub fn ticks_high(drives: &[PortDrive], mask: u8) -> usize {
    drives.iter().filter(|drive| drive.drives_high(mask)).count()
}
