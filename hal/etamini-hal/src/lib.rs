//! Etamini Hardware Abstraction Layer
//!
//! This crate defines the traits that sit between the ATmega32 register
//! drivers and the device drivers built on top of them. The chip crate
//! implements them against real (or simulated) registers; device drivers
//! only ever see the traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  etamini-drivers (EEPROM, LCD, keypad)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  etamini-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  etamini-hal-atmega32 (register level)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`register::RegisterFile`] - Byte-wide peripheral register access
//! - [`wait::Wait`] - Completion-flag polling strategy
//! - [`gpio::DigitalIo`] - Port/pin addressed digital I/O
//! - [`i2c::I2cBus`] - I2C bus operations
//! - [`spi::SpiBus`] - SPI bus operations
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;
pub mod register;
pub mod spi;
pub mod uart;
pub mod wait;

// Re-export key traits at crate root for convenience
pub use gpio::{DigitalIo, Level, PinDirection, PinId, Port, PortDirection};
pub use i2c::I2cBus;
pub use register::RegisterFile;
pub use spi::SpiBus;
pub use uart::{UartRx, UartTx};
pub use wait::{BoundedSpin, Spin, TimedOut, Wait};
