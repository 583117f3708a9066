//! Matrix keypad
//!
//! Rows and columns idle as inputs. A scan drives one row low at a time
//! and looks for a column pulled low through a pressed key; columns need
//! external pull-ups.

use embedded_hal::delay::DelayNs;
use etamini_hal::gpio::{DigitalIo, Level, PinDirection, PinId};

/// Settling time after each row
const ROW_SETTLE_MS: u32 = 5;

/// Keypad wiring and key values
///
/// `keymap[row][col]` is returned for the key at that crossing. The
/// default 4x4 layout stores digits as raw values and symbols as ASCII.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeypadConfig<const ROWS: usize, const COLS: usize> {
    pub rows: [PinId; ROWS],
    pub cols: [PinId; COLS],
    pub keymap: [[u8; COLS]; ROWS],
}

impl Default for KeypadConfig<4, 4> {
    fn default() -> Self {
        Self {
            rows: [PinId::B4, PinId::B5, PinId::B6, PinId::B7],
            cols: [PinId::D2, PinId::D3, PinId::D4, PinId::D5],
            keymap: [
                [7, 8, 9, b'/'],
                [4, 5, 6, b'*'],
                [1, 2, 3, b'-'],
                [b'c', 0, b'=', b'+'],
            ],
        }
    }
}

/// Keypad driver
pub struct Keypad<IO, D, const ROWS: usize, const COLS: usize> {
    io: IO,
    delay: D,
    config: KeypadConfig<ROWS, COLS>,
}

impl<IO, D, const ROWS: usize, const COLS: usize> Keypad<IO, D, ROWS, COLS>
where
    IO: DigitalIo,
    D: DelayNs,
{
    pub fn new(io: IO, delay: D, config: KeypadConfig<ROWS, COLS>) -> Self {
        Self { io, delay, config }
    }

    /// Release every row and column to input
    pub fn init(&mut self) {
        for &pin in self.config.rows.iter().chain(self.config.cols.iter()) {
            self.io.set_pin_direction(pin, PinDirection::Input);
        }
    }

    /// Scan every row once
    ///
    /// Returns the first pressed key found, scanning rows top to bottom
    /// and columns left to right. The driven row is back to input before
    /// this returns.
    pub fn scan(&mut self) -> Option<u8> {
        for (r, &row) in self.config.rows.iter().enumerate() {
            self.io.set_pin_direction(row, PinDirection::Output);
            self.io.write_pin(row, Level::Low);

            let hit = self
                .config
                .cols
                .iter()
                .position(|&col| self.io.read_pin(col).is_low());

            self.io.set_pin_direction(row, PinDirection::Input);

            if let Some(c) = hit {
                return Some(self.config.keymap[r][c]);
            }
            self.delay.delay_ms(ROW_SETTLE_MS);
        }
        None
    }

    /// Block until a key is pressed
    ///
    /// Never returns if no key is ever pressed.
    pub fn get_key(&mut self) -> u8 {
        self.init();
        loop {
            if let Some(key) = self.scan() {
                return key;
            }
        }
    }

    pub fn config(&self) -> &KeypadConfig<ROWS, COLS> {
        &self.config
    }

    /// Release the pins and delay
    pub fn free(self) -> (IO, D) {
        (self.io, self.delay)
    }
}
