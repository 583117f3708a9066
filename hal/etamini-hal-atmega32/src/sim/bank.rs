use etamini_hal::RegisterFile;

use crate::registers::{IO_END, IO_START};

const BANK_SIZE: usize = (IO_END - IO_START) as usize;

/// Plain memory register file covering 0x20..0x60
///
/// Accesses outside the I/O block read as zero and are otherwise ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterBank {
    cells: [u8; BANK_SIZE],
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBank {
    /// All registers zero
    pub const fn new() -> Self {
        Self {
            cells: [0; BANK_SIZE],
        }
    }

    fn slot(address: u16) -> Option<usize> {
        if (IO_START..IO_END).contains(&address) {
            Some((address - IO_START) as usize)
        } else {
            None
        }
    }
}

impl RegisterFile for RegisterBank {
    fn read(&self, address: u16) -> u8 {
        Self::slot(address).map_or(0, |i| self.cells[i])
    }

    fn write(&mut self, address: u16, value: u8) {
        if let Some(i) = Self::slot(address) {
            self.cells[i] = value;
        }
    }
}
