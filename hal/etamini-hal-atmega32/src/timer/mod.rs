//! Timer/counter drivers
//!
//! Timer0 is an 8-bit counter with one compare unit, Timer1 a 16-bit
//! counter with two. Both share the TIMSK/TIFR registers and hand their
//! interrupt callbacks to the [`SharedRegistry`](crate::interrupt::SharedRegistry).
//!
//! Selecting a clock source only records it; the counter runs from
//! `start()` until `stop()`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod timer0;
pub mod timer1;

pub use timer0::{Timer0, Timer0Config, Timer0Mode};
pub use timer1::{Channel, Timer1, Timer1Config, Timer1Mode};

/// Counter clock source (CSn2:0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClockSelect {
    /// Counter stopped
    #[default]
    NoClock,
    /// clk_io with no prescaling
    System,
    Div8,
    Div64,
    Div256,
    Div1024,
    /// External clock on Tn, falling edge
    ExternalFalling,
    /// External clock on Tn, rising edge
    ExternalRising,
}

impl ClockSelect {
    /// CS2:0 bit pattern
    pub const fn bits(self) -> u8 {
        match self {
            ClockSelect::NoClock => 0,
            ClockSelect::System => 1,
            ClockSelect::Div8 => 2,
            ClockSelect::Div64 => 3,
            ClockSelect::Div256 => 4,
            ClockSelect::Div1024 => 5,
            ClockSelect::ExternalFalling => 6,
            ClockSelect::ExternalRising => 7,
        }
    }

    /// Clock source from the CS2:0 bits (upper bits ignored)
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0 => ClockSelect::NoClock,
            1 => ClockSelect::System,
            2 => ClockSelect::Div8,
            3 => ClockSelect::Div64,
            4 => ClockSelect::Div256,
            5 => ClockSelect::Div1024,
            6 => ClockSelect::ExternalFalling,
            _ => ClockSelect::ExternalRising,
        }
    }
}

/// Compare match output mode (COMn1:0), non-PWM meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CompareOutput {
    /// Normal port operation, OCn disconnected
    #[default]
    Disconnected,
    /// Toggle OCn on compare match
    Toggle,
    /// Clear OCn on compare match
    Clear,
    /// Set OCn on compare match
    Set,
}

impl CompareOutput {
    /// COM1:0 bit pattern, right-aligned
    pub const fn bits(self) -> u8 {
        match self {
            CompareOutput::Disconnected => 0b00,
            CompareOutput::Toggle => 0b01,
            CompareOutput::Clear => 0b10,
            CompareOutput::Set => 0b11,
        }
    }

    /// Output mode from right-aligned COM1:0 bits
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => CompareOutput::Disconnected,
            0b01 => CompareOutput::Toggle,
            0b10 => CompareOutput::Clear,
            _ => CompareOutput::Set,
        }
    }
}
