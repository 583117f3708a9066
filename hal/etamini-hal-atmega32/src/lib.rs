//! ATmega32 register-level drivers
//!
//! This crate implements the `etamini-hal` traits for the ATmega32 and
//! provides the register-level peripheral drivers (the MCAL):
//!
//! - TWI (I2C) master transfer engine
//! - Timer0 / Timer1 configuration with an interrupt callback registry
//! - SPI master/slave
//! - USART
//! - GPIO ports
//! - Busy-wait delay (implements `embedded_hal::delay::DelayNs`)
//!
//! Every driver is generic over a [`RegisterFile`]. On the AVR target
//! [`mmio::Mmio`] maps it onto the real data space; on the host the `sim`
//! feature provides simulated register files for tests.
//!
//! # Features
//!
//! - `defmt` - Enable debug formatting and tracing
//! - `serde` - Derive `Serialize`/`Deserialize` on configuration types
//! - `sim` - Simulated register files for host-side testing

#![cfg_attr(not(test), no_std)]

pub mod delay;
pub mod gpio;
pub mod interrupt;
#[cfg(target_arch = "avr")]
pub mod mmio;
pub mod registers;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod spi;
pub mod timer;
pub mod twi;
pub mod uart;

// Re-export shared traits from etamini-hal for convenience
pub use etamini_hal::{RegisterFile, Spin, Wait};

pub use delay::BusyDelay;
pub use gpio::Gpio;
pub use interrupt::{InterruptRegistry, InterruptSource, SharedRegistry, VECTORS};
pub use spi::Spi;
pub use timer::{Timer0, Timer1};
pub use twi::{BusConfiguration, Status, StatusKind, Twi};
pub use uart::Usart;
