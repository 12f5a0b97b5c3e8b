#![no_std]
#![no_main]

use core::cell::RefCell;

use cortex_m_rt::entry;
use critical_section::Mutex;
use panic_halt as _;
use rtt_target::{rprintln, rtt_init_print};
use stm32f0xx_hal::pac::interrupt;

use softpwm_blinkie::{BankLayout, Blinkie, BlinkieConfig, RefreshEngine, SharedState};
use stm32f0_blinkie::lines::{self, GpioLines};
use stm32f0_blinkie::time_source;

mod hardware_setup;

const CONFIG: BlinkieConfig = BlinkieConfig::DEFAULT;

static SHARED: SharedState = SharedState::new();

static REFRESH: Mutex<RefCell<(RefreshEngine, GpioLines)>> = Mutex::new(RefCell::new((
    RefreshEngine::new(BankLayout::FIVE_LINE, &CONFIG),
    GpioLines::new(),
)));

/// SysTick interrupt handler - called every 1ms
#[cortex_m_rt::exception]
fn SysTick() {
    time_source::tick();
}

/// Refresh tick
#[interrupt]
fn TIM2() {
    hardware_setup::clear_refresh_flag();
    critical_section::with(|cs| {
        let mut refresh = REFRESH.borrow_ref_mut(cs);
        let (engine, port) = &mut *refresh;
        engine.tick(&SHARED, port);
    });
}

/// Button edge while asleep
#[interrupt]
fn EXTI0_1() {
    lines::on_button_edge();
}

#[entry]
fn main() -> ! {
    rtt_init_print!();
    rprintln!("=== softpwm-blinkie ===");

    let hw = hardware_setup::init_hardware(&CONFIG);
    let _refresh_timer = hw.refresh_timer;

    rprintln!("Click to change mode, hold to power down, double click to wake");

    let mut blinkie = Blinkie::new(&SHARED, hw.power, hw.delay, CONFIG);
    blinkie.run()
}
