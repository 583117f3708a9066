//! HD44780 character LCD
//!
//! Three parallel wirings are supported:
//! - a whole port as the 8-bit data bus
//! - eight arbitrary pins as the 8-bit data bus
//! - four arbitrary pins (D4..D7) in 4-bit mode
//!
//! Every byte is clocked in with a fixed 1 ms strobe around the enable
//! pin; the busy flag is never read.
//!
//! ```ignore
//! let mut lcd = Lcd::new(&mut gpio, BusyDelay::new(F_CPU), LcdBus::default());
//! lcd.init();
//! lcd.display_str("Temp");
//! lcd.move_cursor(1, 0)?;
//! lcd.display_float(21.5, 1);
//! ```

use core::fmt::Write as _;

use embedded_hal::delay::DelayNs;
use etamini_hal::gpio::{DigitalIo, Level, PinDirection, PinId, Port, PortDirection};
use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const POWER_ON_DELAY_MS: u32 = 20;
const STROBE_DELAY_MS: u32 = 1;

/// DDRAM address of the first column of each row
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x10, 0x50];

/// Largest supported number of decimals for [`Lcd::display_float`]
pub const MAX_PRECISION: u8 = 9;

/// Instruction codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    Clear = 0x01,
    ReturnHome = 0x02,
    /// Cursor moves left, display does not shift
    EntryDecrement = 0x04,
    /// Cursor moves left, display shifts
    EntryDecrementShift = 0x05,
    /// Cursor moves right, display does not shift
    EntryIncrement = 0x06,
    /// Cursor moves right, display shifts
    EntryIncrementShift = 0x07,
    DisplayOff = 0x08,
    /// Display on, cursor hidden
    DisplayOn = 0x0C,
    CursorNoBlink = 0x0E,
    CursorBlink = 0x0F,
    CursorLeft = 0x10,
    CursorRight = 0x14,
    ShiftLeft = 0x18,
    ShiftRight = 0x1C,
    FourBitOneLine5x8 = 0x20,
    FourBitOneLine5x10 = 0x24,
    FourBitTwoLine5x8 = 0x28,
    FourBitTwoLine5x10 = 0x2C,
    EightBitOneLine5x8 = 0x30,
    EightBitOneLine5x10 = 0x34,
    EightBitTwoLine5x8 = 0x38,
    EightBitTwoLine5x10 = 0x3C,
    /// Set DDRAM address; the address is OR-ed into the low seven bits
    SetDdramAddress = 0x80,
}

impl Command {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// How the display is wired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LcdBus {
    /// D0..D7 on the eight bits of one port
    FullPort { rs: PinId, enable: PinId, port: Port },
    /// D0..D7 on arbitrary pins, `data[0]` is D0
    EightBit {
        rs: PinId,
        enable: PinId,
        data: [PinId; 8],
    },
    /// D4..D7 on arbitrary pins, `data[0]` is D4
    FourBit {
        rs: PinId,
        enable: PinId,
        data: [PinId; 4],
    },
}

impl LcdBus {
    /// RS on D0, E on D1, data on port C
    pub const FULL_PORT: Self = LcdBus::FullPort {
        rs: PinId::D0,
        enable: PinId::D1,
        port: Port::C,
    };

    /// RS on A1, E on A2, data scattered over ports A and B
    pub const EIGHT_BIT: Self = LcdBus::EightBit {
        rs: PinId::A1,
        enable: PinId::A2,
        data: [
            PinId::B2,
            PinId::B1,
            PinId::B0,
            PinId::A7,
            PinId::A3,
            PinId::A4,
            PinId::A5,
            PinId::A6,
        ],
    };

    /// RS on A1, E on A2, D4..D7 on A3..A6
    pub const FOUR_BIT: Self = LcdBus::FourBit {
        rs: PinId::A1,
        enable: PinId::A2,
        data: [PinId::A3, PinId::A4, PinId::A5, PinId::A6],
    };

    pub const fn rs(&self) -> PinId {
        match *self {
            LcdBus::FullPort { rs, .. }
            | LcdBus::EightBit { rs, .. }
            | LcdBus::FourBit { rs, .. } => rs,
        }
    }

    pub const fn enable(&self) -> PinId {
        match *self {
            LcdBus::FullPort { enable, .. }
            | LcdBus::EightBit { enable, .. }
            | LcdBus::FourBit { enable, .. } => enable,
        }
    }
}

impl Default for LcdBus {
    fn default() -> Self {
        Self::FOUR_BIT
    }
}

/// LCD error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LcdError {
    /// Only rows 0 to 3 exist
    RowOutOfRange(u8),
}

/// Character LCD driver
pub struct Lcd<IO, D> {
    io: IO,
    delay: D,
    bus: LcdBus,
}

impl<IO: DigitalIo, D: DelayNs> Lcd<IO, D> {
    pub fn new(io: IO, delay: D, bus: LcdBus) -> Self {
        Self { io, delay, bus }
    }

    /// Configure the pins and run the power-on sequence
    ///
    /// Ends with the display on, cursor hidden and the screen cleared.
    pub fn init(&mut self) {
        self.io
            .set_pin_direction(self.bus.rs(), PinDirection::Output);
        self.io
            .set_pin_direction(self.bus.enable(), PinDirection::Output);

        match self.bus {
            LcdBus::FullPort { port, .. } => {
                self.io.set_port_direction(port, PortDirection::Output);
                self.delay.delay_ms(POWER_ON_DELAY_MS);
                self.send_command(Command::EightBitTwoLine5x10);
            }
            LcdBus::EightBit { data, .. } => {
                self.outputs(&data);
                self.delay.delay_ms(POWER_ON_DELAY_MS);
                self.send_command(Command::EightBitTwoLine5x10);
            }
            LcdBus::FourBit { data, .. } => {
                self.delay.delay_ms(POWER_ON_DELAY_MS);
                self.outputs(&data);
                self.delay.delay_ms(POWER_ON_DELAY_MS);
                self.send_command(Command::ReturnHome);
                self.send_command(Command::FourBitTwoLine5x8);
            }
        }

        self.send_command(Command::DisplayOn);
        self.send_command(Command::Clear);
    }

    pub fn send_command(&mut self, command: Command) {
        self.instruction(command.code());
    }

    /// Write one character code at the cursor
    pub fn display_char(&mut self, character: u8) {
        self.io.write_pin(self.bus.rs(), Level::High);
        self.send(character);
    }

    pub fn display_str(&mut self, text: &str) {
        for byte in text.bytes() {
            self.display_char(byte);
        }
    }

    /// Move the cursor to `row` (0-3), `col`
    pub fn move_cursor(&mut self, row: u8, col: u8) -> Result<(), LcdError> {
        let offset = ROW_OFFSETS
            .get(usize::from(row))
            .ok_or(LcdError::RowOutOfRange(row))?;
        self.instruction(Command::SetDdramAddress.code() | offset.wrapping_add(col));
        Ok(())
    }

    /// Show an unsigned integer in decimal
    pub fn display_integer(&mut self, value: u64) {
        let mut text: String<20> = String::new();
        // u64::MAX has 20 digits
        let _ = write!(text, "{}", value);
        self.display_str(&text);
    }

    /// Show a float with `precision` decimals (truncated, at most 9)
    ///
    /// The fractional part is zero-padded, so `1.0625` with three decimals
    /// shows as `1.062`. With a precision of 0 only the integer part and
    /// no point is shown.
    pub fn display_float(&mut self, value: f32, precision: u8) {
        let precision = precision.min(MAX_PRECISION);
        let negative = value < 0.0;
        let magnitude = if negative { -value } else { value };

        let whole = magnitude as u64;
        let scale = 10u64.pow(u32::from(precision));
        let fraction = ((magnitude - whole as f32) * scale as f32) as u64;

        let mut text: String<32> = String::new();
        // Sign, 20 digits, point and 9 decimals fit in 32 bytes
        if negative {
            let _ = text.push('-');
        }
        let _ = write!(text, "{}", whole);
        if precision > 0 {
            let _ = write!(
                text,
                ".{:0width$}",
                fraction.min(scale - 1),
                width = usize::from(precision)
            );
        }
        self.display_str(&text);
    }

    pub fn clear(&mut self) {
        self.send_command(Command::Clear);
    }

    /// Show a blinking cursor
    pub fn show_cursor(&mut self) {
        self.send_command(Command::CursorBlink);
    }

    pub fn display_on(&mut self) {
        self.send_command(Command::DisplayOn);
    }

    pub fn display_off(&mut self) {
        self.send_command(Command::DisplayOff);
    }

    pub fn bus(&self) -> &LcdBus {
        &self.bus
    }

    /// Release the pins and delay
    pub fn free(self) -> (IO, D) {
        (self.io, self.delay)
    }

    fn instruction(&mut self, code: u8) {
        self.io.write_pin(self.bus.rs(), Level::Low);
        self.send(code);
    }

    fn outputs(&mut self, pins: &[PinId]) {
        for &pin in pins {
            self.io.set_pin_direction(pin, PinDirection::Output);
        }
    }

    fn send(&mut self, value: u8) {
        self.delay.delay_ms(STROBE_DELAY_MS);
        match self.bus {
            LcdBus::FullPort { port, .. } => {
                self.enable_high();
                self.io.write_port(port, value);
                self.latch();
            }
            LcdBus::EightBit { data, .. } => {
                self.enable_high();
                self.write_bits(&data, value);
                self.latch();
            }
            LcdBus::FourBit { data, .. } => {
                self.enable_high();
                self.write_bits(&data, value >> 4);
                self.latch();
                self.enable_high();
                self.write_bits(&data, value & 0x0F);
                self.latch();
            }
        }
    }

    fn enable_high(&mut self) {
        self.io.write_pin(self.bus.enable(), Level::High);
        self.delay.delay_ms(STROBE_DELAY_MS);
    }

    // Data is taken on the falling edge of E
    fn latch(&mut self) {
        self.delay.delay_ms(STROBE_DELAY_MS);
        self.io.write_pin(self.bus.enable(), Level::Low);
        self.delay.delay_ms(STROBE_DELAY_MS);
    }

    fn write_bits(&mut self, pins: &[PinId], value: u8) {
        for (bit, &pin) in pins.iter().enumerate() {
            self.io.write_pin(pin, Level::from((value >> bit) & 1 == 1));
        }
    }
}
