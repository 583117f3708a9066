//! Board-level device drivers
//!
//! Drivers for the devices on the Etamini ATmega32 board, built on the
//! `etamini-hal` traits:
//!
//! - External 24C16 EEPROM (over the TWI engine)
//! - HD44780 character LCD (8-bit port, 8-bit pins, 4-bit)
//! - Matrix keypad
//! - DC motor on an H-bridge
//! - LEDs
//!
//! GPIO drivers own their [`DigitalIo`](etamini_hal::gpio::DigitalIo);
//! pass `&mut gpio` to share one port driver between several devices.
//!
//! # Features
//!
//! - `defmt` - Enable debug formatting and logging
//! - `serde` - Derive `Serialize`/`Deserialize` on wiring configuration

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod eeprom;
pub mod keypad;
pub mod lcd;
pub mod led;
#[cfg(test)]
mod mock;
pub mod motor;

pub use eeprom::{Eeprom, EepromError};
pub use keypad::{Keypad, KeypadConfig};
pub use lcd::{Command, Lcd, LcdBus, LcdError};
pub use led::{Led, LedConfig, Wiring};
pub use motor::{DcMotor, MotorPins, Rotation};
