//! Peripheral register access
//!
//! AVR peripherals are controlled through byte-wide registers in the data
//! address space. Drivers talk to them through [`RegisterFile`] so the same
//! driver code runs against memory-mapped hardware or a simulated register
//! set on the host.

/// Byte-wide register file addressed by data-space address
///
/// Addresses are data-space addresses (I/O address + 0x20 on the ATmega
/// family), the same numbers the datasheet lists in parentheses.
pub trait RegisterFile {
    /// Read the register at `address`
    fn read(&self, address: u16) -> u8;

    /// Write `value` to the register at `address`
    fn write(&mut self, address: u16, value: u8);

    /// Read-modify-write a register
    fn modify<F>(&mut self, address: u16, f: F)
    where
        F: FnOnce(u8) -> u8,
    {
        let value = self.read(address);
        self.write(address, f(value));
    }

    /// Set the bits in `mask`, leaving the others untouched
    fn set_bits(&mut self, address: u16, mask: u8) {
        self.modify(address, |v| v | mask);
    }

    /// Clear the bits in `mask`, leaving the others untouched
    fn clear_bits(&mut self, address: u16, mask: u8) {
        self.modify(address, |v| v & !mask);
    }

    /// Check whether a single bit is set
    fn bit_is_set(&self, address: u16, bit: u8) -> bool {
        self.read(address) & (1 << bit) != 0
    }
}

impl<T: RegisterFile + ?Sized> RegisterFile for &mut T {
    fn read(&self, address: u16) -> u8 {
        (**self).read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        (**self).write(address, value)
    }
}
