//! GPIO port driver
//!
//! Implements [`DigitalIo`] over the DDRx / PORTx / PINx registers.

use etamini_hal::gpio::{DigitalIo, Level, PinDirection, PinId, Port, PortDirection};
use etamini_hal::RegisterFile;

use crate::registers::PortRegisters;

/// All four GPIO ports
pub struct Gpio<R> {
    regs: R,
}

impl<R: RegisterFile> Gpio<R> {
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Current direction of a pin
    pub fn pin_direction(&self, pin: PinId) -> PinDirection {
        let ddr = PortRegisters::of(pin.port()).ddr;
        if self.regs.bit_is_set(ddr, pin.pin()) {
            PinDirection::Output
        } else {
            PinDirection::Input
        }
    }

    /// Access the underlying registers
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Release the registers
    pub fn free(self) -> R {
        self.regs
    }
}

impl<R: RegisterFile> DigitalIo for Gpio<R> {
    fn set_pin_direction(&mut self, pin: PinId, direction: PinDirection) {
        let ddr = PortRegisters::of(pin.port()).ddr;
        match direction {
            PinDirection::Output => self.regs.set_bits(ddr, pin.mask()),
            PinDirection::Input => self.regs.clear_bits(ddr, pin.mask()),
        }
    }

    fn write_pin(&mut self, pin: PinId, level: Level) {
        let port = PortRegisters::of(pin.port()).port;
        match level {
            Level::High => self.regs.set_bits(port, pin.mask()),
            Level::Low => self.regs.clear_bits(port, pin.mask()),
        }
    }

    fn read_pin(&self, pin: PinId) -> Level {
        let input = PortRegisters::of(pin.port()).pin;
        Level::from(self.regs.bit_is_set(input, pin.pin()))
    }

    fn set_port_direction(&mut self, port: Port, direction: PortDirection) {
        self.regs.write(PortRegisters::of(port).ddr, direction.ddr());
    }

    fn write_port(&mut self, port: Port, value: u8) {
        self.regs.write(PortRegisters::of(port).port, value);
    }

    fn read_port(&self, port: Port) -> u8 {
        self.regs.read(PortRegisters::of(port).pin)
    }
}
