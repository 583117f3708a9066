//! Single LED on a GPIO pin
//!
//! The LED can be wired to light when the pin is high (anode on the pin)
//! or when it is low (cathode on the pin).

use etamini_hal::gpio::{DigitalIo, Level, PinDirection, PinId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which level lights the LED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Wiring {
    #[default]
    ActiveHigh,
    ActiveLow,
}

impl Wiring {
    /// Pin level that lights the LED
    pub const fn on_level(self) -> Level {
        match self {
            Wiring::ActiveHigh => Level::High,
            Wiring::ActiveLow => Level::Low,
        }
    }
}

/// LED pin and wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LedConfig {
    pub pin: PinId,
    pub wiring: Wiring,
}

/// LED driver
pub struct Led<IO> {
    io: IO,
    config: LedConfig,
    /// Logical state (true = lit)
    on: bool,
}

impl<IO: DigitalIo> Led<IO> {
    pub fn new(io: IO, config: LedConfig) -> Self {
        Self {
            io,
            config,
            on: false,
        }
    }

    pub fn active_high(io: IO, pin: PinId) -> Self {
        Self::new(
            io,
            LedConfig {
                pin,
                wiring: Wiring::ActiveHigh,
            },
        )
    }

    pub fn active_low(io: IO, pin: PinId) -> Self {
        Self::new(
            io,
            LedConfig {
                pin,
                wiring: Wiring::ActiveLow,
            },
        )
    }

    /// Make the pin an output
    pub fn init(&mut self) {
        self.io
            .set_pin_direction(self.config.pin, PinDirection::Output);
    }

    pub fn on(&mut self) {
        self.set(true);
    }

    pub fn off(&mut self) {
        self.set(false);
    }

    pub fn toggle(&mut self) {
        self.set(!self.on);
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn config(&self) -> &LedConfig {
        &self.config
    }

    pub fn free(self) -> IO {
        self.io
    }

    fn set(&mut self, on: bool) {
        let lit = self.config.wiring.on_level();
        let level = if on { lit } else { !lit };
        self.io.write_pin(self.config.pin, level);
        self.on = on;
    }
}
