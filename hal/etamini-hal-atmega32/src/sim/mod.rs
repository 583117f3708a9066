//! Simulated register files for host-side testing
//!
//! - [`RegisterBank`]: plain memory behind the whole I/O register block.
//!   Registers hold whatever was last written; hardware flags never set
//!   themselves, so tests preset them.
//! - [`SimEeprom`]: a 24C16-style EEPROM behind the TWI registers. It
//!   reacts to TWCR writes the way the TWI peripheral and the slave would,
//!   and records every status it produced and every bus operation.

mod bank;
mod eeprom;

pub use bank::RegisterBank;
pub use eeprom::{BusOp, SimEeprom, EEPROM_SIZE};
