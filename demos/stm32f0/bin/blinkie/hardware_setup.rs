use cortex_m::peripheral::{NVIC, SYST};
use rtt_target::rprintln;
use stm32f0xx_hal::{
    pac::{self, Interrupt},
    prelude::*,
    rcc::Rcc,
    time::Hertz,
    timers::{Event, Timer},
};

use softpwm_blinkie::BlinkieConfig;
use stm32f0_blinkie::{lines::BoardPower, time_source::TickDelay};

/// Container for all initialized hardware
pub struct HardwareContext {
    pub power: BoardPower,
    pub delay: TickDelay,
    pub refresh_timer: Timer<pac::TIM2>,
}

/// Initialize all hardware peripherals
///
/// - System clock on the 8 MHz HSI, which is also what STOP mode wakes on
/// - SysTick at 1 kHz for delays
/// - GPIOA clock for the five blinkie lines
/// - TIM2 at the refresh tick rate, interrupt enabled
pub fn init_hardware(config: &BlinkieConfig) -> HardwareContext {
    let mut dp = pac::Peripherals::take().unwrap();
    let mut cp = cortex_m::Peripherals::take().unwrap();

    let mut rcc = configure_clock(&mut dp.FLASH, dp.RCC);
    configure_systick(&rcc, &mut cp.SYST);

    // Only the port clock is needed; the lines are driven through raw registers.
    let _gpioa = dp.GPIOA.split(&mut rcc);

    let refresh_timer = setup_refresh_timer(dp.TIM2, config.tick_hz(), &mut rcc);

    HardwareContext {
        power: BoardPower::new(cp.SCB),
        delay: TickDelay::new(rcc.clocks.sysclk().0),
        refresh_timer,
    }
}

fn configure_clock(flash: &mut pac::FLASH, rcc: pac::RCC) -> Rcc {
    let rcc = rcc.configure().freeze(flash);

    rprintln!("System clock configured: {} Hz", rcc.clocks.sysclk().0);
    rcc
}

fn configure_systick(rcc: &Rcc, syst: &mut SYST) {
    let sysclk_freq = rcc.clocks.sysclk();

    syst.set_clock_source(cortex_m::peripheral::syst::SystClkSource::Core);
    syst.set_reload((sysclk_freq.0 / 1_000) - 1);
    syst.clear_current();
    syst.enable_counter();
    syst.enable_interrupt();
}

/// Starts TIM2 at `tick_hz` and enables its update interrupt
fn setup_refresh_timer(tim2: pac::TIM2, tick_hz: u32, rcc: &mut Rcc) -> Timer<pac::TIM2> {
    let mut timer = Timer::tim2(tim2, Hertz(tick_hz), rcc);
    timer.listen(Event::TimeOut);
    unsafe { NVIC::unmask(Interrupt::TIM2) };

    rprintln!("Refresh timer running at {} Hz", tick_hz);
    timer
}

/// Acknowledges the TIM2 update interrupt
pub fn clear_refresh_flag() {
    // SAFETY: write-zero-to-clear of the update flag only.
    let tim2 = unsafe { &*pac::TIM2::ptr() };
    tim2.sr.modify(|_, w| w.uif().clear_bit());
}
