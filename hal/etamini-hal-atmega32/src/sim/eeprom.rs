use etamini_hal::RegisterFile;
use heapless::Vec;

use crate::registers::{twcr, twsr, TWAR, TWBR, TWCR, TWDR, TWSR};
use crate::twi::{Status, TwiControl};

/// Size of the simulated memory (24C16: 8 blocks of 256 bytes)
pub const EEPROM_SIZE: usize = 2048;

/// Device type identifier in the upper nibble of the address byte
const DEVICE_TYPE: u8 = 0xA0;

const LOG_CAPACITY: usize = 64;

/// A bus operation triggered by a TWCR write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Start,
    Stop,
    Transmit(u8),
    Receive { ack: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    /// START sent, next transmit is the address byte
    Addressed,
    /// SLA+W acknowledged, next transmit is the word address
    WordAddress,
    Writing,
    Reading,
    /// Address byte was not acknowledged
    Ignored,
}

/// 24C16-style EEPROM behind the TWI registers
///
/// Every TWCR write with TWINT and TWEN set is carried out at once: the
/// resulting status lands in TWSR and TWINT is set again, so waits finish
/// on the first poll. STOP never sets TWINT, as on the hardware.
#[derive(Debug, Clone)]
pub struct SimEeprom {
    memory: [u8; EEPROM_SIZE],
    twbr: u8,
    twsr: u8,
    twar: u8,
    twdr: u8,
    twcr: u8,
    phase: Phase,
    pointer: u16,
    nack_address: bool,
    stalled: bool,
    statuses: Vec<Status, LOG_CAPACITY>,
    ops: Vec<BusOp, LOG_CAPACITY>,
}

impl Default for SimEeprom {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEeprom {
    /// Erased EEPROM (all 0xFF), TWI registers at their reset values
    pub fn new() -> Self {
        Self {
            memory: [0xFF; EEPROM_SIZE],
            twbr: 0,
            twsr: Status::NO_INFO.code(),
            twar: 0xFE,
            twdr: 0xFF,
            twcr: 0,
            phase: Phase::Idle,
            pointer: 0,
            nack_address: false,
            stalled: false,
            statuses: Vec::new(),
            ops: Vec::new(),
        }
    }

    /// Never acknowledge the address byte (no device on the bus)
    pub fn with_address_nack(mut self) -> Self {
        self.nack_address = true;
        self
    }

    /// Never complete an operation (a slave holding the bus)
    pub fn stalled(mut self) -> Self {
        self.stalled = true;
        self
    }

    /// Read a memory cell directly
    pub fn memory(&self, address: u16) -> u8 {
        self.memory[Self::wrap(address)]
    }

    /// Write a memory cell directly
    pub fn set_memory(&mut self, address: u16, value: u8) {
        self.memory[Self::wrap(address)] = value;
    }

    /// Every status produced so far, in order
    pub fn statuses(&self) -> &[Status] {
        &self.statuses
    }

    /// Every bus operation carried out so far, in order
    pub fn ops(&self) -> &[BusOp] {
        &self.ops
    }

    /// Forget the recorded statuses and operations
    pub fn clear_log(&mut self) {
        self.statuses.clear();
        self.ops.clear();
    }

    /// Check if no transaction is open on the bus
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    fn wrap(address: u16) -> usize {
        address as usize % EEPROM_SIZE
    }

    fn record(&mut self, op: BusOp) {
        // Logs are for inspection only; a full log drops new entries
        let _ = self.ops.push(op);
    }

    fn complete(&mut self, status: Status) {
        self.twsr = (self.twsr & !twsr::STATUS_MASK) | status.code();
        self.twcr |= 1 << twcr::TWINT;
        let _ = self.statuses.push(status);
    }

    fn on_control(&mut self, value: u8) {
        let control = TwiControl::from_bits(value);

        // Writing one to TWINT clears it; TWSTA/TWSTO are consumed below
        self.twcr = value & !(1 << twcr::TWINT);
        if !control.enable || !control.interrupt_flag {
            return;
        }

        let op = if control.start {
            BusOp::Start
        } else if control.stop {
            BusOp::Stop
        } else if self.phase == Phase::Reading {
            BusOp::Receive {
                ack: control.enable_ack,
            }
        } else {
            BusOp::Transmit(self.twdr)
        };
        self.record(op);

        if self.stalled {
            return;
        }

        match op {
            BusOp::Start => {
                let status = if self.phase == Phase::Idle {
                    Status::START
                } else {
                    Status::REPEATED_START
                };
                self.twcr &= !(1 << twcr::TWSTA);
                self.phase = Phase::Addressed;
                self.complete(status);
            }
            BusOp::Stop => {
                self.twcr &= !(1 << twcr::TWSTO);
                self.phase = Phase::Idle;
                self.twsr = (self.twsr & !twsr::STATUS_MASK) | Status::NO_INFO.code();
            }
            BusOp::Transmit(byte) => {
                let status = self.on_transmit(byte);
                self.complete(status);
            }
            BusOp::Receive { ack } => {
                self.twdr = self.memory[Self::wrap(self.pointer)];
                self.pointer = self.pointer.wrapping_add(1) % EEPROM_SIZE as u16;
                let status = if ack {
                    Status::DATA_READ_ACK
                } else {
                    Status::DATA_READ_NACK
                };
                self.complete(status);
            }
        }
    }

    fn on_transmit(&mut self, byte: u8) -> Status {
        match self.phase {
            Phase::Addressed => {
                let read = byte & 1 == 1;
                if byte & 0xF0 != DEVICE_TYPE || self.nack_address {
                    self.phase = Phase::Ignored;
                    return if read {
                        Status::ADDRESS_READ_NACK
                    } else {
                        Status::ADDRESS_WRITE_NACK
                    };
                }

                if read {
                    self.phase = Phase::Reading;
                    Status::ADDRESS_READ_ACK
                } else {
                    // Block select bits A10:A8 ride in the address byte
                    let block = u16::from((byte >> 1) & 0x07);
                    self.pointer = block << 8;
                    self.phase = Phase::WordAddress;
                    Status::ADDRESS_WRITE_ACK
                }
            }
            Phase::WordAddress => {
                self.pointer = (self.pointer & 0x0700) | u16::from(byte);
                self.phase = Phase::Writing;
                Status::DATA_WRITE_ACK
            }
            Phase::Writing => {
                self.memory[Self::wrap(self.pointer)] = byte;
                self.pointer = self.pointer.wrapping_add(1) % EEPROM_SIZE as u16;
                Status::DATA_WRITE_ACK
            }
            Phase::Idle | Phase::Reading | Phase::Ignored => Status::DATA_WRITE_NACK,
        }
    }
}

impl RegisterFile for SimEeprom {
    fn read(&self, address: u16) -> u8 {
        match address {
            TWBR => self.twbr,
            TWSR => self.twsr,
            TWAR => self.twar,
            TWDR => self.twdr,
            TWCR => self.twcr,
            _ => 0,
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            TWBR => self.twbr = value,
            // Only the prescaler bits are writable
            TWSR => self.twsr = (self.twsr & twsr::STATUS_MASK) | (value & 0b11),
            TWAR => self.twar = value,
            TWDR => self.twdr = value,
            TWCR => self.on_control(value),
            _ => {}
        }
    }
}
