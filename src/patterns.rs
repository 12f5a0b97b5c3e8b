//! The light patterns selectable with the button.
//!
//! Every pattern draws into the frame buffer and paces itself with
//! [`RoutineContext::wait_ms`], so a click or long press ends it within a
//! millisecond. Patterns loop until cancelled or until the routine watchdog
//! expires.

use embedded_hal::delay::DelayNs;

use crate::bounce::{Bounce, Direction};
use crate::config::{LIGHT_COUNT, MAX_LEVEL};
use crate::frame::FrameBuffer;
use crate::routine::{Flow, RoutineContext};
use crate::shared::Mode;

const LAST: usize = LIGHT_COUNT - 1;
const CENTER: usize = LIGHT_COUNT / 2;

/// A light pattern. Mode `n` runs `Pattern::ALL[n - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pattern {
    /// A fading scanner dot that overshoots both ends.
    KnightRider,
    /// One light stepping along the row.
    Chase,
    /// Alternating triple flashes on the left and right halves.
    EmtFlash,
    /// A fast sweep followed by a pause.
    Laser,
    /// Brightness welling out of the centre and back.
    CenterThrob,
    /// Everything flashes on and decays.
    Surge,
    /// A bar that bounces and grows until it fills the row.
    GrowingBounce,
    /// Every third light, marching like a theatre marquee.
    Cinema,
    /// A single light cross-fading along the row and back.
    SlowFade,
    /// A flickering pair of neighbours creeping along the row.
    MovingIrritation,
    /// Four quick pops then a slow buzzing decay.
    PopPopPopBuzz,
}

impl Pattern {
    /// Every pattern in mode order.
    pub const ALL: [Pattern; 11] = [
        Pattern::KnightRider,
        Pattern::Chase,
        Pattern::EmtFlash,
        Pattern::Laser,
        Pattern::CenterThrob,
        Pattern::Surge,
        Pattern::GrowingBounce,
        Pattern::Cinema,
        Pattern::SlowFade,
        Pattern::MovingIrritation,
        Pattern::PopPopPopBuzz,
    ];

    /// Runs the pattern until it is cancelled.
    pub fn run<D: DelayNs>(self, ctx: &mut RoutineContext<'_, D>) -> Flow {
        match self {
            Pattern::KnightRider => knight_rider(ctx),
            Pattern::Chase => chase(ctx),
            Pattern::EmtFlash => emt_flash(ctx),
            Pattern::Laser => laser(ctx),
            Pattern::CenterThrob => center_throb(ctx),
            Pattern::Surge => surge(ctx),
            Pattern::GrowingBounce => growing_bounce(ctx),
            Pattern::Cinema => cinema(ctx),
            Pattern::SlowFade => slow_fade(ctx),
            Pattern::MovingIrritation => moving_irritation(ctx),
            Pattern::PopPopPopBuzz => pop_pop_pop_buzz(ctx),
        }
    }
}

/// Shows `mode` in binary across the lights (all lit for the rotate mode)
/// for one second.
pub fn show_mode<D: DelayNs>(ctx: &mut RoutineContext<'_, D>, mode: Mode) -> Flow {
    let number = u16::from(mode.number());
    for index in 0..LIGHT_COUNT {
        let lit = mode == Mode::ROTATE || number & (1 << index) != 0;
        ctx.frame().set(index, if lit { MAX_LEVEL } else { 0 });
    }

    let one_second = ctx.frames_per_second();
    while ctx.loops() < one_second {
        ctx.check()?;
        ctx.wait_ms(1)?;
    }
    Ok(())
}

/// Lights each light in turn, ramps all of them through every level, then
/// flashes three times.
pub fn self_test<D: DelayNs>(ctx: &mut RoutineContext<'_, D>) -> Flow {
    const STEP_MS: u32 = 60;

    for index in 0..LIGHT_COUNT {
        ctx.frame().set(index, MAX_LEVEL);
        ctx.wait_ms(STEP_MS)?;
        ctx.frame().set(index, 0);
    }

    for level in 1..MAX_LEVEL {
        ctx.frame().fill(level);
        ctx.wait_ms(STEP_MS)?;
    }

    for _ in 0..3 {
        ctx.frame().fill(MAX_LEVEL);
        ctx.wait_ms(STEP_MS)?;
        ctx.clear();
        ctx.wait_ms(STEP_MS)?;
    }
    Ok(())
}

/// Spreads `value` outward from the centre, at most [`MAX_LEVEL`] per light
/// pair, so larger values light a wider band.
pub fn center_weighted(frame: &FrameBuffer, mut value: u16) {
    for offset in 0..=CENTER {
        let level = value.min(u16::from(MAX_LEVEL));
        value -= level;
        frame.set(CENTER - offset, level as u8);
        if offset > 0 {
            frame.set(CENTER + offset, level as u8);
        }
    }
}

/// Dims every light by `amount`, stopping at zero.
pub fn dim_all(frame: &FrameBuffer, amount: u8) {
    for index in 0..LIGHT_COUNT {
        let level = frame.get(index).unwrap_or(0);
        frame.set(index, level.saturating_sub(amount));
    }
}

fn knight_rider<D: DelayNs>(ctx: &mut RoutineContext<'_, D>) -> Flow {
    const OVERSHOOT: i8 = 5;
    const END: i8 = LAST as i8;

    let mut dot: i8 = 0;
    let mut direction = Direction::Right;
    loop {
        ctx.check()?;
        ctx.wait_ms(50)?;

        dim_all(ctx.frame(), 4);
        if let Ok(index) = usize::try_from(dot) {
            ctx.frame().set(index, MAX_LEVEL);
        }

        match direction {
            Direction::Right if dot == END + OVERSHOOT => {
                dot = END;
                direction = Direction::Left;
            }
            Direction::Right => dot += 1,
            Direction::Left if dot == -OVERSHOOT => {
                dot = 0;
                direction = Direction::Right;
            }
            Direction::Left => dot -= 1,
        }
    }
}

fn chase<D: DelayNs>(ctx: &mut RoutineContext<'_, D>) -> Flow {
    loop {
        ctx.check()?;
        for index in 0..LIGHT_COUNT {
            ctx.frame().set(index, MAX_LEVEL);
            ctx.wait_ms(100)?;
            ctx.frame().set(index, 0);
        }
    }
}

fn emt_flash<D: DelayNs>(ctx: &mut RoutineContext<'_, D>) -> Flow {
    const LEFT: core::ops::Range<usize> = 0..4;
    const RIGHT: core::ops::Range<usize> = 5..9;

    let mut side = LEFT;
    loop {
        ctx.check()?;
        for _ in 0..3 {
            for index in side.clone() {
                ctx.frame().set(index, MAX_LEVEL);
            }
            ctx.wait_ms(30)?;
            ctx.clear();
            ctx.wait_ms(30)?;
        }
        ctx.wait_ms(300)?;
        side = if side == LEFT { RIGHT } else { LEFT };
    }
}

fn laser<D: DelayNs>(ctx: &mut RoutineContext<'_, D>) -> Flow {
    loop {
        ctx.check()?;
        for index in 0..LIGHT_COUNT {
            ctx.frame().set(index, MAX_LEVEL);
            ctx.wait_ms(20)?;
            ctx.frame().set(index, 0);
        }
        ctx.wait_ms(100)?;
    }
}

fn center_throb<D: DelayNs>(ctx: &mut RoutineContext<'_, D>) -> Flow {
    const PEAK: u16 = 70;

    loop {
        ctx.check()?;
        for value in (0..PEAK).step_by(2) {
            center_weighted(ctx.frame(), value);
            ctx.wait_ms(4)?;
        }
        for value in (0..=PEAK).rev().step_by(2) {
            center_weighted(ctx.frame(), value);
            ctx.wait_ms(4)?;
        }
        ctx.wait_ms(200)?;
    }
}

fn fade_out_all<D: DelayNs>(ctx: &mut RoutineContext<'_, D>, step_ms: u32) -> Flow {
    for level in (0..MAX_LEVEL).rev() {
        ctx.wait_ms(step_ms)?;
        ctx.frame().fill(level);
    }
    Ok(())
}

fn surge<D: DelayNs>(ctx: &mut RoutineContext<'_, D>) -> Flow {
    loop {
        ctx.check()?;
        ctx.frame().fill(MAX_LEVEL);
        fade_out_all(ctx, 20)?;
        ctx.wait_ms(200)?;
    }
}

fn growing_bounce<D: DelayNs>(ctx: &mut RoutineContext<'_, D>) -> Flow {
    let mut bounce = Bounce::new();
    loop {
        ctx.check()?;
        bounce.render(ctx.frame());
        ctx.wait_ms(80)?;

        if bounce.is_full() {
            ctx.wait_ms(300)?;
            for level in (0..MAX_LEVEL).rev() {
                ctx.frame().fill(level);
                ctx.wait_ms(50)?;
            }
            ctx.wait_ms(100)?;
        }
        bounce = bounce.advance();
    }
}

fn cinema<D: DelayNs>(ctx: &mut RoutineContext<'_, D>) -> Flow {
    loop {
        ctx.check()?;
        for phase in 0..3 {
            ctx.clear();
            for index in (phase..LIGHT_COUNT).step_by(3) {
                ctx.frame().set(index, MAX_LEVEL);
            }
            ctx.wait_ms(60)?;
        }
    }
}

fn slow_fade<D: DelayNs>(ctx: &mut RoutineContext<'_, D>) -> Flow {
    let mut current = 0usize;
    let mut direction = Direction::Right;
    loop {
        ctx.check()?;
        let frame = ctx.frame();

        if frame.get(current) == Some(MAX_LEVEL) {
            (current, direction) = match direction {
                Direction::Right if current == LAST => (LAST - 1, Direction::Left),
                Direction::Right => (current + 1, Direction::Right),
                Direction::Left if current == 0 => (1, Direction::Right),
                Direction::Left => (current - 1, Direction::Left),
            };
        }

        let level = frame.get(current).unwrap_or(0);
        frame.set(current, level.saturating_add(1));

        let trailing = match direction {
            Direction::Right => current.checked_sub(1),
            Direction::Left => Some(current + 1),
        };
        if let Some(index) = trailing {
            if let Some(level) = frame.get(index) {
                frame.set(index, level.saturating_sub(1));
            }
        }

        ctx.wait_ms(100)?;
    }
}

fn moving_irritation<D: DelayNs>(ctx: &mut RoutineContext<'_, D>) -> Flow {
    let mut current = 0usize;
    loop {
        ctx.check()?;
        let neighbour = (current + 1) % LIGHT_COUNT;
        for _ in 0..4 {
            ctx.frame().set(current, MAX_LEVEL);
            ctx.frame().set(neighbour, MAX_LEVEL);
            ctx.wait_ms(40)?;
            ctx.clear();
            ctx.wait_ms(40)?;
        }
        current = neighbour;
    }
}

fn pop_pop_pop_buzz<D: DelayNs>(ctx: &mut RoutineContext<'_, D>) -> Flow {
    loop {
        ctx.check()?;
        for _ in 0..4 {
            ctx.wait_ms(80)?;
            ctx.clear();
            ctx.wait_ms(80)?;
            ctx.frame().fill(MAX_LEVEL);
        }
        fade_out_all(ctx, 30)?;
        ctx.wait_ms(250)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_weighted_fills_outward() {
        let frame = FrameBuffer::new();

        center_weighted(&frame, 10);
        assert_eq!(frame.snapshot(), [0, 0, 0, 0, 10, 0, 0, 0, 0]);

        center_weighted(&frame, 40);
        assert_eq!(frame.snapshot(), [0, 0, 10, 15, 15, 15, 10, 0, 0]);

        center_weighted(&frame, 70);
        assert_eq!(frame.snapshot(), [10, 15, 15, 15, 15, 15, 15, 15, 10]);
    }

    #[test]
    fn dim_all_stops_at_zero() {
        let frame = FrameBuffer::new();
        frame.load(&[0, 1, 3, 4, 5, 15, 2, 8, 255]);
        dim_all(&frame, 4);
        assert_eq!(frame.snapshot(), [0, 0, 0, 0, 1, 11, 0, 4, 251]);
    }

    #[test]
    fn every_mode_below_rotate_has_a_distinct_pattern() {
        for (i, a) in Pattern::ALL.iter().enumerate() {
            for b in &Pattern::ALL[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
