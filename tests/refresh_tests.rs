//! Integration tests for RefreshEngine

mod common;
use common::*;

use softpwm_blinkie::{
    BankLayout, BlinkieConfig, CYCLE_LENGTH, FULL_ON, LIGHTS_PER_BANK, PortDrive, Polarity,
    RefreshEngine, SharedState,
};

/// Runs one full frame and returns the drives applied during each bank's slot
fn capture_frame(shared: &SharedState) -> [heapless::Vec<PortDrive, 256>; 4] {
    let mut engine = RefreshEngine::new(BankLayout::FIVE_LINE, &BlinkieConfig::DEFAULT);
    let mut port = RecordingPort::new();

    // Output lags computation by one tick; the first tick applies the idle drive.
    engine.tick(shared, &mut port);

    core::array::from_fn(|_| {
        port.applied.clear();
        for _ in 0..CYCLE_LENGTH {
            engine.tick(shared, &mut port);
        }
        port.applied.clone()
    })
}

#[test]
fn duty_matches_level_on_every_light() {
    let layout = BankLayout::FIVE_LINE;

    for level in 0..=15u8 {
        let shared = SharedState::new();
        shared.frame().fill(level);
        let windows = capture_frame(&shared);

        for (bank, wiring) in layout.banks.iter().enumerate() {
            for light in 0..LIGHTS_PER_BANK {
                let high = ticks_high(&windows[bank], layout.light_bits[light]);
                let expected = match wiring.polarity {
                    Polarity::Normal => usize::from(level),
                    Polarity::Inverted => usize::from(CYCLE_LENGTH - level - 1),
                };
                assert_eq!(
                    high, expected,
                    "level {level}, bank {bank}, light {light}: {high} ticks high"
                );
            }
        }
    }
}

#[test]
fn each_light_follows_its_own_cell() {
    let layout = BankLayout::FIVE_LINE;
    let shared = SharedState::new();
    shared.frame().load(&[1, 5, 9, 2, 6, 10, 3, 7, 11]);
    let windows = capture_frame(&shared);

    assert_eq!(ticks_high(&windows[0], layout.light_bits[0]), 1);
    assert_eq!(ticks_high(&windows[0], layout.light_bits[1]), 5);
    assert_eq!(ticks_high(&windows[0], layout.light_bits[2]), 9);
    assert_eq!(ticks_high(&windows[1], layout.light_bits[0]), 2);
    assert_eq!(ticks_high(&windows[1], layout.light_bits[1]), 6);
    assert_eq!(ticks_high(&windows[1], layout.light_bits[2]), 10);
    assert_eq!(ticks_high(&windows[2], layout.light_bits[0]), 16);
    assert_eq!(ticks_high(&windows[2], layout.light_bits[1]), 12);
    assert_eq!(ticks_high(&windows[2], layout.light_bits[2]), 8);
}

#[test]
fn over_range_level_is_always_on() {
    let layout = BankLayout::FIVE_LINE;
    let shared = SharedState::new();
    shared.frame().fill(FULL_ON);
    let windows = capture_frame(&shared);

    for light in 0..LIGHTS_PER_BANK {
        let bit = layout.light_bits[light];
        assert_eq!(ticks_high(&windows[0], bit), usize::from(CYCLE_LENGTH));
        assert_eq!(ticks_high(&windows[1], bit), usize::from(CYCLE_LENGTH));
        // Inverted bank lights on a low line.
        assert_eq!(ticks_high(&windows[2], bit), 0);
    }
}

#[test]
fn bank_windows_use_their_own_common_line() {
    let layout = BankLayout::FIVE_LINE;
    let shared = SharedState::new();
    let windows = capture_frame(&shared);

    for bank in 0..3 {
        let direction = layout.banks[bank].drive.direction;
        assert!(windows[bank].iter().all(|d| d.direction == direction));
    }
}

#[test]
fn sample_slot_drives_nothing() {
    let shared = SharedState::new();
    shared.frame().fill(15);
    let windows = capture_frame(&shared);

    assert_eq!(windows[3].len(), usize::from(CYCLE_LENGTH));
    assert!(windows[3].iter().all(|drive| *drive == PortDrive::DARK));
}

#[test]
fn mid_window_writes_wait_for_the_next_latch() {
    let layout = BankLayout::FIVE_LINE;
    let bit = layout.light_bits[0];
    let shared = SharedState::new();
    shared.frame().fill(10);

    let mut engine = RefreshEngine::new(layout, &BlinkieConfig::DEFAULT);
    let mut port = RecordingPort::new();
    engine.tick(&shared, &mut port);
    port.applied.clear();

    for _ in 0..5 {
        engine.tick(&shared, &mut port);
    }
    let latched = engine.comparators();
    shared.frame().fill(2);
    for _ in 5..CYCLE_LENGTH {
        engine.tick(&shared, &mut port);
        if engine.slot() == 0 {
            assert_eq!(engine.comparators(), latched);
        }
    }
    assert_eq!(ticks_high(&port.applied, bit), 10);

    // A full frame later the same bank shows the new value.
    for _ in 0..(FRAME_TICKS - u32::from(CYCLE_LENGTH)) {
        engine.tick(&shared, &mut port);
    }
    port.applied.clear();
    for _ in 0..CYCLE_LENGTH {
        engine.tick(&shared, &mut port);
    }
    assert_eq!(ticks_high(&port.applied, bit), 2);
}

#[test]
fn loop_counter_counts_frames() {
    let shared = SharedState::new();
    let mut engine = RefreshEngine::new(BankLayout::FIVE_LINE, &BlinkieConfig::DEFAULT);
    let mut port = RecordingPort::new();

    run_frames(&mut engine, &shared, &mut port, 25);
    assert_eq!(shared.loops(), 25);
    assert_eq!(port.samples, 25);
}
