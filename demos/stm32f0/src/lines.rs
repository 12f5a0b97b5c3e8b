//! The blinkie's five port lines on PA0..PA4, driven through raw registers.
//!
//! The refresh interrupt rewrites direction, level and pull-up of all five
//! lines every tick, which the typed HAL pins cannot do without consuming
//! and rebuilding them.

use core::sync::atomic::{AtomicBool, Ordering};

use cortex_m::peripheral::{NVIC, SCB};
use softpwm_blinkie::{BankLayout, LightPort, PortDrive, PowerPort};
use stm32f0xx_hal::pac::{self, Interrupt};

/// PA0..PA4.
const LINE_COUNT: u8 = 5;
const LINE_MASK: u32 = (1 << LINE_COUNT) - 1;
const MODE_MASK: u32 = (1 << (2 * LINE_COUNT)) - 1;

const BUTTON: u8 = BankLayout::FIVE_LINE.button_bit;

static WOKEN: AtomicBool = AtomicBool::new(false);

fn gpioa() -> &'static pac::gpioa::RegisterBlock {
    // SAFETY: only the refresh interrupt touches PA0..PA4 while refresh runs,
    // and only the foreground while it is suspended.
    unsafe { &*pac::GPIOA::ptr() }
}

/// Writes one drive to PA0..PA4: outputs where `direction` is set, pulled-up
/// inputs where only `level` is set, floating inputs elsewhere.
fn write_lines(drive: PortDrive) {
    let port = gpioa();
    let direction = u32::from(drive.direction) & LINE_MASK;
    let level = u32::from(drive.level) & LINE_MASK;

    let mut moder = port.moder.read().bits() & !MODE_MASK;
    let mut pupdr = port.pupdr.read().bits() & !MODE_MASK;
    for line in 0..u32::from(LINE_COUNT) {
        let bit = 1 << line;
        if direction & bit != 0 {
            moder |= 0b01 << (2 * line);
        } else if level & bit != 0 {
            pupdr |= 0b01 << (2 * line);
        }
    }

    // Levels first so a line turning into an output never glitches.
    let set = level & direction;
    let reset = LINE_MASK & !set;
    port.bsrr.write(|w| unsafe { w.bits(set | reset << 16) });
    port.pupdr.write(|w| unsafe { w.bits(pupdr) });
    port.moder.write(|w| unsafe { w.bits(moder) });
}

fn read_button() -> bool {
    gpioa().idr.read().bits() & u32::from(BUTTON) == 0
}

/// The light lines as seen from the refresh interrupt.
pub struct GpioLines {
    last: PortDrive,
}

impl GpioLines {
    pub const fn new() -> Self {
        Self {
            last: PortDrive::DARK,
        }
    }
}

impl Default for GpioLines {
    fn default() -> Self {
        Self::new()
    }
}

impl LightPort for GpioLines {
    fn apply(&mut self, drive: PortDrive) {
        write_lines(drive);
        self.last = drive;
    }

    fn button_pressed(&mut self) -> bool {
        // Every line floats so no light has a current path through the button.
        let listen = PortDrive {
            direction: 0,
            level: BUTTON,
        };
        write_lines(listen);
        // Let the pull-up charge the line.
        cortex_m::asm::delay(16);
        let pressed = read_button();
        write_lines(self.last);
        pressed
    }
}

/// Refresh interrupt gating and STOP-mode sleep.
pub struct BoardPower {
    scb: SCB,
}

impl BoardPower {
    pub fn new(scb: SCB) -> Self {
        // SAFETY: single register writes during init.
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.pwren().set_bit());
        let pwr = unsafe { &*pac::PWR::ptr() };
        pwr.cr.modify(|_, w| w.pdds().clear_bit().lpds().set_bit());

        Self { scb }
    }

    fn arm_wake(&mut self, armed: bool) {
        let exti = unsafe { &*pac::EXTI::ptr() };
        let line = u32::from(BUTTON);

        // EXTICR1 resets to port A, so EXTI0 already follows PA0.
        exti.pr.write(|w| unsafe { w.bits(line) });
        if armed {
            exti.rtsr.modify(|r, w| unsafe { w.bits(r.bits() | line) });
            exti.ftsr.modify(|r, w| unsafe { w.bits(r.bits() | line) });
            exti.imr.modify(|r, w| unsafe { w.bits(r.bits() | line) });
            unsafe { NVIC::unmask(Interrupt::EXTI0_1) };
        } else {
            NVIC::mask(Interrupt::EXTI0_1);
            exti.imr.modify(|r, w| unsafe { w.bits(r.bits() & !line) });
        }
    }
}

impl PowerPort for BoardPower {
    fn suspend_refresh(&mut self) {
        NVIC::mask(Interrupt::TIM2);
        write_lines(PortDrive {
            direction: 0,
            level: BUTTON,
        });
    }

    fn resume_refresh(&mut self) {
        unsafe { NVIC::unmask(Interrupt::TIM2) };
    }

    fn button_pressed(&mut self) -> bool {
        read_button()
    }

    fn sleep_until_button_change(&mut self) {
        WOKEN.store(false, Ordering::Relaxed);
        self.arm_wake(true);
        self.scb.set_sleepdeep();

        while !WOKEN.load(Ordering::Relaxed) {
            cortex_m::asm::wfi();
        }

        self.scb.clear_sleepdeep();
        self.arm_wake(false);
    }
}

/// Body of the EXTI0_1 handler: acknowledges the button edge.
pub fn on_button_edge() {
    let exti = unsafe { &*pac::EXTI::ptr() };
    exti.pr.write(|w| unsafe { w.bits(u32::from(BUTTON)) });
    WOKEN.store(true, Ordering::Relaxed);
}
