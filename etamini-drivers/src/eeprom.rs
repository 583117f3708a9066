//! 24C16-style external EEPROM on the TWI bus
//!
//! 2 KiB of memory behind device address 0xA0. The upper three bits of the
//! 11-bit memory address (A10:A8) travel in the device address byte, the
//! lower eight as the first data byte.
//!
//! Every step of a transfer is checked against the status the TWI engine
//! reports. On the first mismatch the transfer is abandoned and the error
//! returned **without** a STOP condition: the bus stays claimed until the
//! caller calls [`Eeprom::release`]. Existing board code relies on this
//! sequence, so it is kept as is.
//!
//! ```ignore
//! let mut twi = Twi::new(Mmio::take().unwrap());
//! twi.init(&BusConfiguration::default());
//! let mut eeprom = Eeprom::new(twi);
//!
//! if eeprom.write_byte(0x0010, 0x42).is_err() {
//!     eeprom.release();
//! }
//! ```

use etamini_hal::i2c::Direction;
use etamini_hal::{RegisterFile, Spin, Wait};
use etamini_hal_atmega32::twi::{Status, Twi};

/// Device type identifier (1010) in the address byte
pub const DEVICE_BASE: u8 = 0xA0;

/// Highest memory address
pub const MAX_ADDRESS: u16 = 0x07FF;

/// Error from an EEPROM transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EepromError<E> {
    /// A bus step reported something other than the expected status
    UnexpectedStatus { expected: Status, found: Status },
    /// The wait strategy gave up on a bus step
    Wait(E),
    /// Address beyond the 11-bit memory range
    AddressOutOfRange(u16),
}

/// Address byte for a memory address: base, block bits A10:A8, R/W
pub const fn device_address(address: u16, direction: Direction) -> u8 {
    let block = ((address & 0x0700) >> 7) as u8;
    let rw = match direction {
        Direction::Write => 0,
        Direction::Read => 1,
    };
    DEVICE_BASE | block | rw
}

/// External EEPROM driver
pub struct Eeprom<R, W = Spin> {
    twi: Twi<R, W>,
}

impl<R: RegisterFile, W: Wait> Eeprom<R, W> {
    /// Wrap an initialized TWI engine
    pub fn new(twi: Twi<R, W>) -> Self {
        Self { twi }
    }

    /// Write one byte
    pub fn write_byte(&mut self, address: u16, data: u8) -> Result<(), EepromError<W::Error>> {
        Self::check_range(address)?;

        self.start(Status::START)?;
        self.send(
            device_address(address, Direction::Write),
            Status::ADDRESS_WRITE_ACK,
        )?;
        self.send(address as u8, Status::DATA_WRITE_ACK)?;
        self.send(data, Status::DATA_WRITE_ACK)?;
        self.twi.send_stop();
        Ok(())
    }

    /// Read one byte (random read: dummy write, repeated start, read)
    pub fn read_byte(&mut self, address: u16) -> Result<u8, EepromError<W::Error>> {
        Self::check_range(address)?;

        self.start(Status::START)?;
        self.send(
            device_address(address, Direction::Write),
            Status::ADDRESS_WRITE_ACK,
        )?;
        self.send(address as u8, Status::DATA_WRITE_ACK)?;
        self.twi.send_repeated_start().map_err(EepromError::Wait)?;
        self.expect(Status::REPEATED_START)?;
        self.send(
            device_address(address, Direction::Read),
            Status::ADDRESS_READ_ACK,
        )?;
        let data = self.twi.read_byte_nack().map_err(EepromError::Wait)?;
        self.expect(Status::DATA_READ_NACK)?;
        self.twi.send_stop();
        Ok(data)
    }

    /// Release the bus after a failed transfer
    pub fn release(&mut self) {
        self.twi.send_stop();
    }

    /// Access the TWI engine
    pub fn twi(&self) -> &Twi<R, W> {
        &self.twi
    }

    /// Give back the TWI engine
    pub fn free(self) -> Twi<R, W> {
        self.twi
    }

    fn check_range(address: u16) -> Result<(), EepromError<W::Error>> {
        if address > MAX_ADDRESS {
            return Err(EepromError::AddressOutOfRange(address));
        }
        Ok(())
    }

    fn start(&mut self, expected: Status) -> Result<(), EepromError<W::Error>> {
        self.twi.send_start().map_err(EepromError::Wait)?;
        self.expect(expected)
    }

    fn send(&mut self, byte: u8, expected: Status) -> Result<(), EepromError<W::Error>> {
        self.twi.write_byte(byte).map_err(EepromError::Wait)?;
        self.expect(expected)
    }

    fn expect(&self, expected: Status) -> Result<(), EepromError<W::Error>> {
        let found = self.twi.status();
        if found == expected {
            return Ok(());
        }

        #[cfg(feature = "defmt")]
        defmt::warn!(
            "eeprom: abandoned transfer, expected {=u8:#x} got {=u8:#x}",
            expected.code(),
            found.code()
        );

        Err(EepromError::UnexpectedStatus { expected, found })
    }
}
