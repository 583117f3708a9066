//! Memory-mapped register access on the AVR target

use core::sync::atomic::{AtomicBool, Ordering};

use etamini_hal::RegisterFile;

use crate::registers::{IO_END, IO_START};

static TAKEN: AtomicBool = AtomicBool::new(false);

/// The I/O register block of the running chip
///
/// Only one instance can be obtained safely, so one driver owns each
/// peripheral's registers at a time.
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Take the register block, or `None` if it was already taken
    pub fn take() -> Option<Self> {
        // Interrupt handlers never call take(), so load/store cannot race
        if TAKEN.load(Ordering::Relaxed) {
            return None;
        }
        TAKEN.store(true, Ordering::Relaxed);
        Some(Self { _private: () })
    }

    /// Create another handle to the register block
    ///
    /// # Safety
    ///
    /// The caller must make sure no two drivers touch the same register
    /// concurrently.
    pub unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl RegisterFile for Mmio {
    fn read(&self, address: u16) -> u8 {
        debug_assert!((IO_START..IO_END).contains(&address));
        // SAFETY: every address in the I/O block is a valid byte register
        unsafe { core::ptr::read_volatile(address as *const u8) }
    }

    fn write(&mut self, address: u16, value: u8) {
        debug_assert!((IO_START..IO_END).contains(&address));
        // SAFETY: see read()
        unsafe { core::ptr::write_volatile(address as *mut u8, value) }
    }
}
