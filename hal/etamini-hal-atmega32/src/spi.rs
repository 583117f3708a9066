//! SPI master/slave driver
//!
//! Every transfer writes SPDR, waits for SPIF in SPSR and reads back the
//! byte that was shifted in. Strings on the wire are NUL-terminated.

use etamini_hal::spi::{DataOrder, Mode, Phase, Polarity, SpiBus};
use etamini_hal::{RegisterFile, Spin, Wait};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::registers::{spcr, spsr, SPCR, SPDR, SPSR};

/// Byte clocked out when only receiving
const FILL: u8 = 0xFF;

/// String terminator
const NUL: u8 = 0;

/// Master SCK rate as a division of the CPU clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SpiClock {
    #[default]
    Div4,
    Div16,
    Div64,
    Div128,
    Div2,
    Div8,
    Div32,
}

impl SpiClock {
    /// SPR1:0 bits and SPI2X
    pub const fn bits(self) -> (u8, bool) {
        match self {
            SpiClock::Div4 => (0b00, false),
            SpiClock::Div16 => (0b01, false),
            SpiClock::Div64 => (0b10, false),
            SpiClock::Div128 => (0b11, false),
            SpiClock::Div2 => (0b00, true),
            SpiClock::Div8 => (0b01, true),
            SpiClock::Div32 => (0b10, true),
        }
    }

    pub const fn divider(self) -> u32 {
        match self {
            SpiClock::Div2 => 2,
            SpiClock::Div4 => 4,
            SpiClock::Div8 => 8,
            SpiClock::Div16 => 16,
            SpiClock::Div32 => 32,
            SpiClock::Div64 => 64,
            SpiClock::Div128 => 128,
        }
    }
}

/// Master or slave operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Role {
    #[default]
    Master,
    /// Clock, mode and order are set by the master
    Slave,
}

/// SPI configuration applied by [`Spi::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpiConfig {
    pub role: Role,
    /// Ignored in slave role
    pub clock: SpiClock,
    pub mode: Mode,
    pub data_order: DataOrder,
}

/// Error from an SPI operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiError<E> {
    /// The wait strategy gave up on SPIF
    Wait(E),
    /// No terminator arrived before the buffer was full
    BufferFull,
}

/// SPI driver
pub struct Spi<R, W = Spin> {
    regs: R,
    wait: W,
}

impl<R: RegisterFile> Spi<R, Spin> {
    pub fn new(regs: R) -> Self {
        Self::with_wait(regs, Spin)
    }
}

impl<R: RegisterFile, W: Wait> Spi<R, W> {
    /// Create a driver with a custom wait strategy
    pub fn with_wait(regs: R, wait: W) -> Self {
        Self { regs, wait }
    }

    /// Enable as master: MSB first, mode 0, fosc/4
    pub fn init_master(&mut self) {
        self.regs
            .write(SPCR, (1 << spcr::SPE) | (1 << spcr::MSTR));
        self.regs.write(SPSR, 0);
    }

    /// Enable as slave with every other setting left to the master
    pub fn init_slave(&mut self) {
        self.regs.write(SPCR, 1 << spcr::SPE);
    }

    /// Apply a full configuration
    pub fn init(&mut self, config: &SpiConfig) {
        match config.role {
            Role::Master => {
                self.init_master();
                self.set_master_frequency(config.clock);
            }
            Role::Slave => self.init_slave(),
        }
        self.set_mode(config.mode);
        self.set_data_order(config.data_order);
    }

    /// Select the SCK rate (master only)
    pub fn set_master_frequency(&mut self, clock: SpiClock) {
        let (spr, double) = clock.bits();
        self.regs
            .modify(SPCR, |v| (v & !0b11) | spr);
        if double {
            self.regs.set_bits(SPSR, 1 << spsr::SPI2X);
        } else {
            self.regs.clear_bits(SPSR, 1 << spsr::SPI2X);
        }
    }

    pub fn set_data_order(&mut self, order: DataOrder) {
        match order {
            DataOrder::MsbFirst => self.regs.clear_bits(SPCR, 1 << spcr::DORD),
            DataOrder::LsbFirst => self.regs.set_bits(SPCR, 1 << spcr::DORD),
        }
    }

    /// Set clock polarity and phase
    pub fn set_mode(&mut self, mode: Mode) {
        let (polarity, phase): (Polarity, Phase) = mode.into();
        let mut bits = 0;
        if polarity == Polarity::IdleHigh {
            bits |= 1 << spcr::CPOL;
        }
        if phase == Phase::CaptureOnSecondTransition {
            bits |= 1 << spcr::CPHA;
        }
        let mask = (1 << spcr::CPOL) | (1 << spcr::CPHA);
        self.regs.modify(SPCR, |v| (v & !mask) | bits);
    }

    /// Exchange one byte
    pub fn transfer_byte(&mut self, byte: u8) -> Result<u8, W::Error> {
        self.regs.write(SPDR, byte);
        let regs = &self.regs;
        self.wait
            .wait_until(|| regs.bit_is_set(SPSR, spsr::SPIF))?;
        Ok(self.regs.read(SPDR))
    }

    /// Send a NUL-terminated string
    ///
    /// Bytes up to and including the first NUL are sent. A slice without
    /// NUL is sent whole, followed by one.
    pub fn send_string(&mut self, data: &[u8]) -> Result<(), W::Error> {
        for &byte in data {
            self.transfer_byte(byte)?;
            if byte == NUL {
                return Ok(());
            }
        }
        self.transfer_byte(NUL)?;
        Ok(())
    }

    /// Receive a NUL-terminated string
    ///
    /// Returns the length without the terminator, which is stored after
    /// the data.
    pub fn receive_string(&mut self, buf: &mut [u8]) -> Result<usize, SpiError<W::Error>> {
        for (i, slot) in buf.iter_mut().enumerate() {
            let byte = self.transfer_byte(FILL).map_err(SpiError::Wait)?;
            *slot = byte;
            if byte == NUL {
                return Ok(i);
            }
        }
        Err(SpiError::BufferFull)
    }

    /// Access the underlying registers
    pub fn registers(&self) -> &R {
        &self.regs
    }
}

impl<R: RegisterFile, W: Wait> SpiBus for Spi<R, W> {
    type Error = W::Error;

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        for (rx, &tx) in read.iter_mut().zip(write) {
            *rx = self.transfer_byte(tx)?;
        }
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        for &byte in data {
            self.transfer_byte(byte)?;
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        for byte in buf.iter_mut() {
            *byte = self.transfer_byte(FILL)?;
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, data: &mut [u8]) -> Result<(), Self::Error> {
        for byte in data.iter_mut() {
            *byte = self.transfer_byte(*byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RegisterBank;
    use etamini_hal::{BoundedSpin, TimedOut};
    use heapless::{Deque, Vec};

    /// Slave that answers from a script and records what it was sent
    struct ScriptedSlave {
        replies: Deque<u8, 16>,
        sent: Vec<u8, 16>,
        spdr: u8,
    }

    impl ScriptedSlave {
        fn new(replies: &[u8]) -> Self {
            let mut queue = Deque::new();
            for &byte in replies {
                queue.push_back(byte).unwrap();
            }
            Self {
                replies: queue,
                sent: Vec::new(),
                spdr: 0,
            }
        }
    }

    impl RegisterFile for ScriptedSlave {
        fn read(&self, address: u16) -> u8 {
            match address {
                SPSR => 1 << spsr::SPIF,
                SPDR => self.spdr,
                _ => 0,
            }
        }

        fn write(&mut self, address: u16, value: u8) {
            if address == SPDR {
                self.sent.push(value).unwrap();
                self.spdr = self.replies.pop_front().unwrap_or(0xEE);
            }
        }
    }

    /// Register bank with SPIF stuck high, so SPDR reads back what was written
    fn loopback() -> Spi<RegisterBank> {
        let mut bank = RegisterBank::new();
        bank.write(SPSR, 1 << spsr::SPIF);
        Spi::new(bank)
    }

    #[test]
    fn test_init_master_and_slave() {
        let mut spi = Spi::new(RegisterBank::new());
        spi.init_master();
        assert_eq!(spi.registers().read(SPCR), 0x50);
        assert_eq!(spi.registers().read(SPSR), 0);

        spi.init_slave();
        assert_eq!(spi.registers().read(SPCR), 0x40);
    }

    #[test]
    fn test_master_frequency() {
        let mut spi = Spi::new(RegisterBank::new());
        spi.init_master();

        spi.set_master_frequency(SpiClock::Div128);
        assert_eq!(spi.registers().read(SPCR), 0x53);
        assert_eq!(spi.registers().read(SPSR), 0);

        spi.set_master_frequency(SpiClock::Div8);
        assert_eq!(spi.registers().read(SPCR), 0x51);
        assert_eq!(spi.registers().read(SPSR), 1);

        spi.set_master_frequency(SpiClock::Div4);
        assert_eq!(spi.registers().read(SPCR), 0x50);
        assert_eq!(spi.registers().read(SPSR), 0);
    }

    #[test]
    fn test_mode_and_order() {
        let mut spi = Spi::new(RegisterBank::new());
        spi.init(&SpiConfig {
            mode: Mode::Mode3,
            data_order: DataOrder::LsbFirst,
            ..Default::default()
        });
        assert_eq!(spi.registers().read(SPCR), 0x50 | 0x20 | 0x08 | 0x04);

        spi.set_mode(Mode::Mode1);
        spi.set_data_order(DataOrder::MsbFirst);
        assert_eq!(spi.registers().read(SPCR), 0x50 | 0x04);
    }

    #[test]
    fn test_transfer_byte_loopback() {
        let mut spi = loopback();
        assert_eq!(spi.transfer_byte(0x5A), Ok(0x5A));
    }

    #[test]
    fn test_transfer_times_out_without_spif() {
        let mut spi = Spi::with_wait(RegisterBank::new(), BoundedSpin::new(8));
        assert_eq!(spi.transfer_byte(0x01), Err(TimedOut));
    }

    #[test]
    fn test_send_string_stops_at_nul() {
        let mut spi = Spi::new(ScriptedSlave::new(&[]));
        spi.send_string(b"hi\0junk").unwrap();
        assert_eq!(spi.registers().sent.as_slice(), b"hi\0");
    }

    #[test]
    fn test_send_string_appends_nul() {
        let mut spi = Spi::new(ScriptedSlave::new(&[]));
        spi.send_string(b"ok").unwrap();
        assert_eq!(spi.registers().sent.as_slice(), b"ok\0");
    }

    #[test]
    fn test_receive_string() {
        let mut spi = Spi::new(ScriptedSlave::new(b"abc\0"));
        let mut buf = [0u8; 8];

        assert_eq!(spi.receive_string(&mut buf), Ok(3));
        assert_eq!(&buf[..4], b"abc\0");
        assert_eq!(spi.registers().sent.as_slice(), &[0xFF; 4]);
    }

    #[test]
    fn test_receive_string_buffer_full() {
        let mut spi = Spi::new(ScriptedSlave::new(b"abcdef"));
        let mut buf = [0u8; 4];

        assert_eq!(spi.receive_string(&mut buf), Err(SpiError::BufferFull));
        assert_eq!(&buf, b"abcd");
    }

    #[test]
    fn test_spi_bus_transfer() {
        let mut spi = Spi::new(ScriptedSlave::new(&[1, 2, 3]));
        let mut read = [0u8; 3];
        spi.transfer(&mut read, &[0x10, 0x20, 0x30]).unwrap();

        assert_eq!(read, [1, 2, 3]);
        assert_eq!(spi.registers().sent.as_slice(), &[0x10, 0x20, 0x30]);
    }

    #[test]
    fn test_spi_bus_in_place() {
        let mut spi = loopback();
        let mut data = [9, 8, 7];
        spi.transfer_in_place(&mut data).unwrap();
        assert_eq!(data, [9, 8, 7]);

        let mut buf = [0u8; 2];
        SpiBus::read(&mut spi, &mut buf).unwrap();
        assert_eq!(buf, [0xFF, 0xFF]);
    }
}
