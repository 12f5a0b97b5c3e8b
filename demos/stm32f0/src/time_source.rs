use core::cell::Cell;
use critical_section::Mutex;
use embedded_hal::delay::DelayNs;

/// Global millisecond counter incremented by the SysTick interrupt.
///
/// Wraps after ~49.7 days of continuous operation. Stops while the core is
/// in STOP mode.
static MILLIS_COUNTER: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

/// Increments the global millisecond counter.
///
/// Call this from the SysTick interrupt handler every 1ms.
pub fn tick() {
    critical_section::with(|cs| {
        let counter = MILLIS_COUNTER.borrow(cs);
        counter.set(counter.get().wrapping_add(1));
    });
}

/// Milliseconds since SysTick was started.
pub fn millis() -> u32 {
    critical_section::with(|cs| MILLIS_COUNTER.borrow(cs).get())
}

/// Delay paced by the SysTick millisecond counter.
///
/// Each millisecond of delay waits for the next SysTick edge, so a run of
/// `delay_ms(1)` calls keeps a steady 1 kHz cadence however long the caller
/// spends between them. Sub-millisecond remainders spin on the cycle counter.
pub struct TickDelay {
    cycles_per_us: u32,
}

impl TickDelay {
    pub fn new(sysclk_hz: u32) -> Self {
        Self {
            cycles_per_us: (sysclk_hz / 1_000_000).max(1),
        }
    }

    fn wait_for_edges(&self, edges: u32) {
        for _ in 0..edges {
            let start = millis();
            while millis() == start {
                cortex_m::asm::wfi();
            }
        }
    }
}

impl DelayNs for TickDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.wait_for_edges(ns / 1_000_000);

        let rest_us = (ns % 1_000_000) / 1_000;
        if rest_us > 0 {
            cortex_m::asm::delay(rest_us * self.cycles_per_us);
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        self.wait_for_edges(ms);
    }
}
