//! Busy-wait delay
//!
//! Calibrated against a four-cycle loop, so it is only as accurate as the
//! configured CPU frequency. Interrupts that fire during the wait stretch it.

use embedded_hal::delay::DelayNs;

/// CPU cycles per iteration of the spin loop
const CYCLES_PER_LOOP: u32 = 4;

/// Spin-loop delay for a known CPU clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusyDelay {
    cpu_hz: u32,
}

impl BusyDelay {
    pub const fn new(cpu_hz: u32) -> Self {
        Self { cpu_hz }
    }

    /// Loop iterations per microsecond
    pub const fn loops_per_us(&self) -> u32 {
        self.cpu_hz / 1_000_000 / CYCLES_PER_LOOP
    }

    fn spin(&self, loops: u32) {
        for _ in 0..loops {
            core::hint::spin_loop();
        }
    }
}

impl DelayNs for BusyDelay {
    fn delay_ns(&mut self, ns: u32) {
        // Round up to whole microseconds
        self.delay_us(ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        let per_us = self.loops_per_us().max(1);
        self.spin(us.saturating_mul(per_us));
    }

    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1_000);
        }
    }
}
