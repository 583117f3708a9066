//! TWI (I2C) master transfer engine
//!
//! A thin mirror of the ATmega32 TWI hardware handshake. Each primitive
//! writes TWCR (and TWDR for transmits), then waits for the hardware to
//! set TWINT. The engine never looks at the status register on its own:
//! after every step the caller reads [`Twi::status`] and decides whether
//! the transaction can go on.
//!
//! ```text
//! IDLE ─start─▶ START_SENT ─SLA+W─▶ ADDR_W_ACKED ─data─▶ DATA_ACKED
//!                                                          │
//!        ┌──────────────────── repeated start ◀────────────┘
//!        ▼
//! REPEATED_START_SENT ─SLA+R─▶ ADDR_R_ACKED ─read NACK─▶ DATA_NACKED ─stop─▶ IDLE
//! ```
//!
//! Any unexpected status ends the transaction. The engine does not retry
//! and does not release the bus; that is the caller's job.
//!
//! For consumers that only need whole transactions, [`Twi`] also
//! implements [`I2cBus`], which checks every status and always sends STOP.

use etamini_hal::i2c::{address_byte, Direction, I2cBus};
use etamini_hal::{RegisterFile, Spin, Wait};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::registers::{twar, twcr, twsr, TWAR, TWBR, TWCR, TWDR, TWSR};

/// Bit rate prescaler (TWPS1:0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Prescaler {
    #[default]
    Div1,
    Div4,
    Div16,
    Div64,
}

impl Prescaler {
    /// TWPS1:0 bit pattern
    pub const fn bits(self) -> u8 {
        match self {
            Prescaler::Div1 => 0b00,
            Prescaler::Div4 => 0b01,
            Prescaler::Div16 => 0b10,
            Prescaler::Div64 => 0b11,
        }
    }

    /// Prescaler from the TWPS1:0 bits (upper bits ignored)
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Prescaler::Div1,
            0b01 => Prescaler::Div4,
            0b10 => Prescaler::Div16,
            _ => Prescaler::Div64,
        }
    }

    /// Division factor (4^TWPS)
    pub const fn factor(self) -> u32 {
        match self {
            Prescaler::Div1 => 1,
            Prescaler::Div4 => 4,
            Prescaler::Div16 => 16,
            Prescaler::Div64 => 64,
        }
    }
}

/// TWI bus configuration
///
/// Applied once by [`Twi::init`]. The default matches the Etamini board:
/// own address 0x01, no general call, TWBR = 2 with no prescaling, which
/// gives 400 kHz SCL from an 8 MHz clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BusConfiguration {
    /// 7-bit slave address this device answers to when addressed
    pub own_address: u8,
    /// Respond to the general call address (TWGCE)
    pub general_call: bool,
    /// Bit rate register value (TWBR)
    pub bit_rate: u8,
    /// Bit rate prescaler (TWPS)
    pub prescaler: Prescaler,
}

impl Default for BusConfiguration {
    fn default() -> Self {
        Self {
            own_address: 0x01,
            general_call: false,
            bit_rate: 2,
            prescaler: Prescaler::Div1,
        }
    }
}

impl BusConfiguration {
    /// Configuration for a target SCL frequency with no prescaling
    ///
    /// SCL = F_CPU / (16 + 2 * TWBR). The result saturates to the range
    /// of TWBR, so frequencies out of reach get the nearest one.
    pub const fn for_scl(cpu_hz: u32, scl_hz: u32) -> Self {
        let bit_rate = if scl_hz == 0 {
            u8::MAX
        } else {
            let ratio = cpu_hz / scl_hz;
            let twbr = ratio.saturating_sub(16) / 2;
            if twbr > u8::MAX as u32 {
                u8::MAX
            } else {
                twbr as u8
            }
        };

        Self {
            own_address: 0x01,
            general_call: false,
            bit_rate,
            prescaler: Prescaler::Div1,
        }
    }

    /// Resulting SCL frequency for a given CPU clock
    pub const fn scl_hz(&self, cpu_hz: u32) -> u32 {
        cpu_hz / (16 + 2 * self.bit_rate as u32 * self.prescaler.factor())
    }

    /// TWAR value: address in bits 7:1, TWGCE in bit 0
    pub const fn address_register(&self) -> u8 {
        (self.own_address << 1) | ((self.general_call as u8) << twar::TWGCE)
    }
}

/// Named-field view of TWCR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TwiControl {
    /// TWINT: operation complete (write 1 to clear and start the next one)
    pub interrupt_flag: bool,
    /// TWEA: acknowledge received bytes
    pub enable_ack: bool,
    /// TWSTA: generate a START condition
    pub start: bool,
    /// TWSTO: generate a STOP condition
    pub stop: bool,
    /// TWWC: TWDR written while TWINT was low
    pub write_collision: bool,
    /// TWEN: peripheral enabled
    pub enable: bool,
    /// TWIE: interrupt on TWINT
    pub interrupt_enable: bool,
}

impl TwiControl {
    /// Enable the peripheral without starting an operation
    pub const ENABLE: Self = Self::new().with_enable();
    /// START (or repeated START) condition
    pub const START: Self = Self::new().with_enable().with_interrupt_flag().with_start();
    /// STOP condition
    pub const STOP: Self = Self::new().with_enable().with_interrupt_flag().with_stop();
    /// Transmit TWDR, or receive a byte and NACK it
    pub const TRANSFER: Self = Self::new().with_enable().with_interrupt_flag();
    /// Receive a byte and ACK it
    pub const RECEIVE_ACK: Self = Self::TRANSFER.with_ack();

    const fn new() -> Self {
        Self {
            interrupt_flag: false,
            enable_ack: false,
            start: false,
            stop: false,
            write_collision: false,
            enable: false,
            interrupt_enable: false,
        }
    }

    const fn with_enable(mut self) -> Self {
        self.enable = true;
        self
    }

    const fn with_interrupt_flag(mut self) -> Self {
        self.interrupt_flag = true;
        self
    }

    const fn with_start(mut self) -> Self {
        self.start = true;
        self
    }

    const fn with_stop(mut self) -> Self {
        self.stop = true;
        self
    }

    const fn with_ack(mut self) -> Self {
        self.enable_ack = true;
        self
    }

    /// Decode a raw TWCR value (reserved bit 1 is ignored)
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            interrupt_flag: bits & (1 << twcr::TWINT) != 0,
            enable_ack: bits & (1 << twcr::TWEA) != 0,
            start: bits & (1 << twcr::TWSTA) != 0,
            stop: bits & (1 << twcr::TWSTO) != 0,
            write_collision: bits & (1 << twcr::TWWC) != 0,
            enable: bits & (1 << twcr::TWEN) != 0,
            interrupt_enable: bits & (1 << twcr::TWIE) != 0,
        }
    }

    /// Encode to the raw TWCR value
    pub const fn bits(self) -> u8 {
        (self.interrupt_flag as u8) << twcr::TWINT
            | (self.enable_ack as u8) << twcr::TWEA
            | (self.start as u8) << twcr::TWSTA
            | (self.stop as u8) << twcr::TWSTO
            | (self.write_collision as u8) << twcr::TWWC
            | (self.enable as u8) << twcr::TWEN
            | (self.interrupt_enable as u8) << twcr::TWIE
    }
}

/// Status code read from TWSR (bits 7:3, low bits always zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(u8);

impl Status {
    /// Bus error due to an illegal START or STOP
    pub const BUS_ERROR: Self = Self(0x00);
    /// START condition transmitted
    pub const START: Self = Self(0x08);
    /// Repeated START condition transmitted
    pub const REPEATED_START: Self = Self(0x10);
    /// SLA+W transmitted, ACK received
    pub const ADDRESS_WRITE_ACK: Self = Self(0x18);
    /// SLA+W transmitted, NACK received
    pub const ADDRESS_WRITE_NACK: Self = Self(0x20);
    /// Data byte transmitted, ACK received
    pub const DATA_WRITE_ACK: Self = Self(0x28);
    /// Data byte transmitted, NACK received
    pub const DATA_WRITE_NACK: Self = Self(0x30);
    /// Arbitration lost in SLA+R/W or data
    pub const ARBITRATION_LOST: Self = Self(0x38);
    /// SLA+R transmitted, ACK received
    pub const ADDRESS_READ_ACK: Self = Self(0x40);
    /// SLA+R transmitted, NACK received
    pub const ADDRESS_READ_NACK: Self = Self(0x48);
    /// Data byte received, ACK returned
    pub const DATA_READ_ACK: Self = Self(0x50);
    /// Data byte received, NACK returned
    pub const DATA_READ_NACK: Self = Self(0x58);
    /// No relevant state information (TWINT = 0)
    pub const NO_INFO: Self = Self(0xF8);

    /// Status from a raw TWSR value, dropping the prescaler bits
    pub const fn from_register(raw: u8) -> Self {
        Self(raw & twsr::STATUS_MASK)
    }

    /// The masked status code
    pub const fn code(self) -> u8 {
        self.0
    }

    /// Classify the status code
    pub const fn kind(self) -> StatusKind {
        match self.0 {
            0x08 => StatusKind::StartSent,
            0x10 => StatusKind::RepeatedStartSent,
            0x18 => StatusKind::AddressWriteAcked,
            0x40 => StatusKind::AddressReadAcked,
            0x28 => StatusKind::DataWriteAcked,
            0x50 => StatusKind::DataReadAcked,
            0x58 => StatusKind::DataReadNacked,
            0x20 => StatusKind::AddressWriteNacked,
            0x30 => StatusKind::DataWriteNacked,
            0x38 => StatusKind::ArbitrationLost,
            0x48 => StatusKind::AddressReadNacked,
            0xF8 => StatusKind::NoInfo,
            0x00 => StatusKind::BusError,
            code => StatusKind::Other(code),
        }
    }
}

/// Classified master-mode status
///
/// The first seven variants are the outcomes a master transfer expects to
/// see; everything else means the step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusKind {
    StartSent,
    RepeatedStartSent,
    AddressWriteAcked,
    AddressReadAcked,
    DataWriteAcked,
    DataReadAcked,
    DataReadNacked,
    AddressWriteNacked,
    DataWriteNacked,
    ArbitrationLost,
    AddressReadNacked,
    NoInfo,
    BusError,
    /// Slave-mode or undocumented code
    Other(u8),
}

impl StatusKind {
    /// Check if this is one of the expected master-mode outcomes
    pub const fn is_success(self) -> bool {
        matches!(
            self,
            StatusKind::StartSent
                | StatusKind::RepeatedStartSent
                | StatusKind::AddressWriteAcked
                | StatusKind::AddressReadAcked
                | StatusKind::DataWriteAcked
                | StatusKind::DataReadAcked
                | StatusKind::DataReadNacked
        )
    }
}

/// Named-field view of TWSR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TwiStatusRegister {
    /// Status code (bits 7:3)
    pub status: Status,
    /// Prescaler (bits 1:0)
    pub prescaler: Prescaler,
}

impl TwiStatusRegister {
    /// Decode a raw TWSR value (reserved bit 2 is ignored)
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            status: Status::from_register(bits),
            prescaler: Prescaler::from_bits(bits),
        }
    }

    /// Encode to the raw TWSR value
    pub const fn bits(self) -> u8 {
        self.status.code() | self.prescaler.bits()
    }
}

/// Error from a composite [`I2cBus`] transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TwiError<E> {
    /// A step completed with a status other than the expected one
    UnexpectedStatus { expected: Status, found: Status },
    /// The wait strategy gave up on a step
    Wait(E),
}

/// TWI master transfer engine
///
/// Owns the TWI registers; every operation takes `&mut self`, so at most
/// one transaction is in flight.
pub struct Twi<R, W = Spin> {
    regs: R,
    wait: W,
}

impl<R: RegisterFile> Twi<R, Spin> {
    /// Create an engine that spins forever on completion flags
    pub fn new(regs: R) -> Self {
        Self::with_wait(regs, Spin)
    }
}

impl<R: RegisterFile, W: Wait> Twi<R, W> {
    /// Create an engine with a custom wait strategy
    pub fn with_wait(regs: R, wait: W) -> Self {
        Self { regs, wait }
    }

    /// Program bit rate and own address, then enable the peripheral
    ///
    /// Writes the same values every time, so calling it again with the
    /// same configuration leaves the peripheral unchanged.
    pub fn init(&mut self, config: &BusConfiguration) {
        #[cfg(feature = "defmt")]
        defmt::trace!(
            "twi: init twbr={=u8} twar={=u8}",
            config.bit_rate,
            config.address_register()
        );

        self.regs.write(TWBR, config.bit_rate);
        self.regs.write(TWSR, config.prescaler.bits());
        self.regs.write(TWAR, config.address_register());
        self.regs.write(TWCR, TwiControl::ENABLE.bits());
    }

    /// Send a START condition and wait for it to complete
    pub fn send_start(&mut self) -> Result<(), W::Error> {
        self.regs.write(TWCR, TwiControl::START.bits());
        self.wait_for_completion()
    }

    /// Send a repeated START condition (same bus operation as START)
    pub fn send_repeated_start(&mut self) -> Result<(), W::Error> {
        self.send_start()
    }

    /// Send a STOP condition and release the bus
    ///
    /// STOP completion does not set TWINT, so this does not wait.
    pub fn send_stop(&mut self) {
        self.regs.write(TWCR, TwiControl::STOP.bits());
    }

    /// Transmit one byte and wait for it to complete
    ///
    /// Whether the receiver acknowledged is reported by [`Twi::status`].
    pub fn write_byte(&mut self, data: u8) -> Result<(), W::Error> {
        self.regs.write(TWDR, data);
        self.regs.write(TWCR, TwiControl::TRANSFER.bits());
        self.wait_for_completion()
    }

    /// Receive one byte and acknowledge it
    pub fn read_byte_ack(&mut self) -> Result<u8, W::Error> {
        self.regs.write(TWCR, TwiControl::RECEIVE_ACK.bits());
        self.wait_for_completion()?;
        Ok(self.regs.read(TWDR))
    }

    /// Receive one byte without acknowledging it (last byte of a read)
    pub fn read_byte_nack(&mut self) -> Result<u8, W::Error> {
        self.regs.write(TWCR, TwiControl::TRANSFER.bits());
        self.wait_for_completion()?;
        Ok(self.regs.read(TWDR))
    }

    /// Status of the last operation (TWSR with the prescaler bits masked)
    pub fn status(&self) -> Status {
        Status::from_register(self.regs.read(TWSR))
    }

    /// Access the underlying registers
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Release the registers and wait strategy
    pub fn free(self) -> (R, W) {
        (self.regs, self.wait)
    }

    fn wait_for_completion(&mut self) -> Result<(), W::Error> {
        let regs = &self.regs;
        self.wait
            .wait_until(|| regs.bit_is_set(TWCR, twcr::TWINT))
    }

    fn expect(&self, expected: Status) -> Result<(), TwiError<W::Error>> {
        let found = self.status();
        if found == expected {
            Ok(())
        } else {
            Err(TwiError::UnexpectedStatus { expected, found })
        }
    }

    fn start_checked(&mut self, expected: Status) -> Result<(), TwiError<W::Error>> {
        self.send_start().map_err(TwiError::Wait)?;
        self.expect(expected)
    }

    fn write_checked(&mut self, data: u8, expected: Status) -> Result<(), TwiError<W::Error>> {
        self.write_byte(data).map_err(TwiError::Wait)?;
        self.expect(expected)
    }

    fn read_checked(&mut self, buf: &mut [u8]) -> Result<(), TwiError<W::Error>> {
        let last = buf.len().saturating_sub(1);
        for (i, byte) in buf.iter_mut().enumerate() {
            if i == last {
                *byte = self.read_byte_nack().map_err(TwiError::Wait)?;
                self.expect(Status::DATA_READ_NACK)?;
            } else {
                *byte = self.read_byte_ack().map_err(TwiError::Wait)?;
                self.expect(Status::DATA_READ_ACK)?;
            }
        }
        Ok(())
    }

    /// Run a transaction body and release the bus whatever the outcome
    fn transaction<F>(&mut self, body: F) -> Result<(), TwiError<W::Error>>
    where
        F: FnOnce(&mut Self) -> Result<(), TwiError<W::Error>>,
    {
        let result = body(self);
        self.send_stop();
        result
    }
}

impl<R: RegisterFile, W: Wait> I2cBus for Twi<R, W> {
    type Error = TwiError<W::Error>;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.transaction(|twi| {
            twi.start_checked(Status::START)?;
            twi.write_checked(
                address_byte(address, Direction::Write),
                Status::ADDRESS_WRITE_ACK,
            )?;
            for &byte in data {
                twi.write_checked(byte, Status::DATA_WRITE_ACK)?;
            }
            Ok(())
        })
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.transaction(|twi| {
            twi.start_checked(Status::START)?;
            twi.write_checked(
                address_byte(address, Direction::Read),
                Status::ADDRESS_READ_ACK,
            )?;
            twi.read_checked(buf)
        })
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.transaction(|twi| {
            twi.start_checked(Status::START)?;
            twi.write_checked(
                address_byte(address, Direction::Write),
                Status::ADDRESS_WRITE_ACK,
            )?;
            for &byte in write_data {
                twi.write_checked(byte, Status::DATA_WRITE_ACK)?;
            }
            twi.start_checked(Status::REPEATED_START)?;
            twi.write_checked(
                address_byte(address, Direction::Read),
                Status::ADDRESS_READ_ACK,
            )?;
            twi.read_checked(read_buf)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{BusOp, RegisterBank, SimEeprom};
    use etamini_hal::{BoundedSpin, TimedOut};
    use proptest::prelude::*;

    #[test]
    fn test_init_programs_registers() {
        let mut twi = Twi::new(RegisterBank::new());
        twi.init(&BusConfiguration::default());

        let regs = twi.registers();
        assert_eq!(regs.read(TWBR), 2);
        assert_eq!(regs.read(TWSR), 0x00);
        assert_eq!(regs.read(TWAR), 0x02);
        assert_eq!(regs.read(TWCR), 1 << twcr::TWEN);
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = BusConfiguration {
            own_address: 0x21,
            general_call: true,
            bit_rate: 72,
            prescaler: Prescaler::Div4,
        };

        let mut once = Twi::new(RegisterBank::new());
        once.init(&config);

        let mut twice = Twi::new(RegisterBank::new());
        twice.init(&config);
        twice.init(&config);

        assert_eq!(once.registers(), twice.registers());
        assert_eq!(twice.registers().read(TWAR), 0x43);
        assert_eq!(twice.registers().read(TWSR), 0b01);
    }

    #[test]
    fn test_bus_configuration_scl() {
        let config = BusConfiguration::default();
        assert_eq!(config.scl_hz(8_000_000), 400_000);

        let standard = BusConfiguration::for_scl(16_000_000, 100_000);
        assert_eq!(standard.bit_rate, 72);
        assert_eq!(standard.scl_hz(16_000_000), 100_000);

        // Out of reach in both directions
        assert_eq!(BusConfiguration::for_scl(1_000_000, 1_000).bit_rate, 255);
        assert_eq!(BusConfiguration::for_scl(1_000_000, 400_000).bit_rate, 0);
        assert_eq!(BusConfiguration::for_scl(8_000_000, 0).bit_rate, 255);
    }

    #[test]
    fn test_control_constants() {
        assert_eq!(TwiControl::ENABLE.bits(), 0x04);
        assert_eq!(TwiControl::START.bits(), 0xA4);
        assert_eq!(TwiControl::STOP.bits(), 0x94);
        assert_eq!(TwiControl::TRANSFER.bits(), 0x84);
        assert_eq!(TwiControl::RECEIVE_ACK.bits(), 0xC4);
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(Status::START.kind(), StatusKind::StartSent);
        assert_eq!(Status::DATA_READ_NACK.kind(), StatusKind::DataReadNacked);
        assert_eq!(Status::ADDRESS_WRITE_NACK.kind(), StatusKind::AddressWriteNacked);
        assert_eq!(Status::from_register(0x60).kind(), StatusKind::Other(0x60));
        assert!(Status::ADDRESS_READ_ACK.kind().is_success());
        assert!(!Status::ARBITRATION_LOST.kind().is_success());
    }

    #[test]
    fn test_start_reports_start_status() {
        let mut twi = Twi::new(SimEeprom::new());
        twi.init(&BusConfiguration::default());

        twi.send_start().unwrap();
        assert_eq!(twi.status(), Status::START);

        twi.send_repeated_start().unwrap();
        assert_eq!(twi.status(), Status::REPEATED_START);
    }

    #[test]
    fn test_stop_without_start_does_not_disturb_next_start() {
        let mut twi = Twi::with_wait(SimEeprom::new(), BoundedSpin::new(4));
        twi.init(&BusConfiguration::default());

        twi.send_stop();
        twi.send_start().unwrap();
        assert_eq!(twi.status(), Status::START);

        let (sim, _) = twi.free();
        assert_eq!(sim.ops(), &[BusOp::Stop, BusOp::Start]);
    }

    #[test]
    fn test_stalled_bus_times_out() {
        let mut twi = Twi::with_wait(SimEeprom::new().stalled(), BoundedSpin::new(100));
        twi.init(&BusConfiguration::default());

        assert_eq!(twi.send_start(), Err(TimedOut));
        assert_eq!(twi.write_byte(0xA0), Err(TimedOut));
        assert_eq!(twi.read_byte_nack(), Err(TimedOut));
    }

    #[test]
    fn test_byte_level_random_read() {
        let mut sim = SimEeprom::new();
        sim.set_memory(0x123, 0x5C);
        let mut twi = Twi::new(sim);
        twi.init(&BusConfiguration::default());

        twi.send_start().unwrap();
        assert_eq!(twi.status(), Status::START);
        twi.write_byte(0xA2).unwrap();
        assert_eq!(twi.status(), Status::ADDRESS_WRITE_ACK);
        twi.write_byte(0x23).unwrap();
        assert_eq!(twi.status(), Status::DATA_WRITE_ACK);
        twi.send_repeated_start().unwrap();
        assert_eq!(twi.status(), Status::REPEATED_START);
        twi.write_byte(0xA3).unwrap();
        assert_eq!(twi.status(), Status::ADDRESS_READ_ACK);
        assert_eq!(twi.read_byte_nack().unwrap(), 0x5C);
        assert_eq!(twi.status(), Status::DATA_READ_NACK);
        twi.send_stop();

        let (sim, _) = twi.free();
        assert!(sim.is_idle());
    }

    #[test]
    fn test_read_with_ack_advances() {
        let mut sim = SimEeprom::new();
        sim.set_memory(0, 1);
        sim.set_memory(1, 2);
        let mut twi = Twi::new(sim);
        twi.init(&BusConfiguration::default());

        twi.send_start().unwrap();
        twi.write_byte(0xA1).unwrap();
        assert_eq!(twi.read_byte_ack().unwrap(), 1);
        assert_eq!(twi.status(), Status::DATA_READ_ACK);
        assert_eq!(twi.read_byte_nack().unwrap(), 2);
        assert_eq!(twi.status(), Status::DATA_READ_NACK);
        twi.send_stop();
    }

    #[test]
    fn test_i2c_bus_write_then_write_read() {
        let mut twi = Twi::new(SimEeprom::new());
        twi.init(&BusConfiguration::default());

        twi.write(0x50, &[0x10, 0xDE, 0xAD]).unwrap();

        let mut buf = [0u8; 2];
        twi.write_read(0x50, &[0x10], &mut buf).unwrap();
        assert_eq!(buf, [0xDE, 0xAD]);

        // Current-address read continues after the last byte read
        let mut next = [0u8; 1];
        twi.read(0x50, &mut next).unwrap();
        assert_eq!(next, [0xFF]);
    }

    #[test]
    fn test_i2c_bus_releases_bus_on_nack() {
        let mut twi = Twi::new(SimEeprom::new());
        twi.init(&BusConfiguration::default());

        let result = twi.write(0x3C, &[0x00]);
        assert_eq!(
            result,
            Err(TwiError::UnexpectedStatus {
                expected: Status::ADDRESS_WRITE_ACK,
                found: Status::ADDRESS_WRITE_NACK,
            })
        );

        let (sim, _) = twi.free();
        assert_eq!(sim.ops(), &[BusOp::Start, BusOp::Transmit(0x78), BusOp::Stop]);
        assert!(sim.is_idle());
    }

    #[test]
    fn test_i2c_bus_empty_read_only_addresses() {
        let mut twi = Twi::new(SimEeprom::new());
        twi.init(&BusConfiguration::default());

        twi.read(0x50, &mut []).unwrap();

        let (sim, _) = twi.free();
        assert_eq!(sim.ops(), &[BusOp::Start, BusOp::Transmit(0xA1), BusOp::Stop]);
    }

    proptest! {
        #[test]
        fn prop_status_masks_low_bits(raw in any::<u8>()) {
            let mut bank = RegisterBank::new();
            bank.write(TWSR, raw);
            let twi = Twi::new(bank);

            prop_assert_eq!(twi.status().code(), raw & 0xF8);
            prop_assert_eq!(twi.status().code() & 0x07, 0);
        }

        #[test]
        fn prop_control_view_matches_register(raw in any::<u8>()) {
            // Bit 1 is reserved
            prop_assert_eq!(TwiControl::from_bits(raw).bits(), raw & !0b10);
        }

        #[test]
        fn prop_status_register_view(raw in any::<u8>()) {
            // Bit 2 is reserved
            prop_assert_eq!(TwiStatusRegister::from_bits(raw).bits(), raw & !0b100);
        }
    }
}
