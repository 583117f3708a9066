//! GPIO abstractions
//!
//! The ATmega32 has four 8-bit ports. Device drivers address pins by
//! [`PinId`] and drive them through the port-level [`DigitalIo`] capability,
//! which can be implemented by the chip's register driver or by a test mock.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of pins per port
pub const PINS_PER_PORT: u8 = 8;

/// Number of GPIO ports
pub const PORT_COUNT: u8 = 4;

/// GPIO port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Port {
    A,
    B,
    C,
    D,
}

impl Port {
    /// Port index (A = 0 .. D = 3)
    pub const fn index(self) -> u8 {
        match self {
            Port::A => 0,
            Port::B => 1,
            Port::C => 2,
            Port::D => 3,
        }
    }

    /// Port from its index
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Port::A),
            1 => Some(Port::B),
            2 => Some(Port::C),
            3 => Some(Port::D),
            _ => None,
        }
    }
}

/// A single GPIO pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinId {
    port: Port,
    pin: u8,
}

impl PinId {
    /// Create a pin id, or `None` if `pin` is not 0-7
    pub const fn new(port: Port, pin: u8) -> Option<Self> {
        if pin < PINS_PER_PORT {
            Some(Self { port, pin })
        } else {
            None
        }
    }

    /// Pin from the flat numbering A0 = 0 .. D7 = 31
    pub const fn from_index(index: u8) -> Option<Self> {
        match Port::from_index(index / PINS_PER_PORT) {
            Some(port) => Some(Self {
                port,
                pin: index % PINS_PER_PORT,
            }),
            None => None,
        }
    }

    /// Flat pin number (A0 = 0 .. D7 = 31)
    pub const fn index(self) -> u8 {
        self.port.index() * PINS_PER_PORT + self.pin
    }

    /// Port this pin belongs to
    pub const fn port(self) -> Port {
        self.port
    }

    /// Bit position within the port
    pub const fn pin(self) -> u8 {
        self.pin
    }

    /// Bit mask within the port register
    pub const fn mask(self) -> u8 {
        1 << self.pin
    }

    const fn at(port: Port, pin: u8) -> Self {
        Self { port, pin }
    }

    pub const A0: Self = Self::at(Port::A, 0);
    pub const A1: Self = Self::at(Port::A, 1);
    pub const A2: Self = Self::at(Port::A, 2);
    pub const A3: Self = Self::at(Port::A, 3);
    pub const A4: Self = Self::at(Port::A, 4);
    pub const A5: Self = Self::at(Port::A, 5);
    pub const A6: Self = Self::at(Port::A, 6);
    pub const A7: Self = Self::at(Port::A, 7);
    pub const B0: Self = Self::at(Port::B, 0);
    pub const B1: Self = Self::at(Port::B, 1);
    pub const B2: Self = Self::at(Port::B, 2);
    pub const B3: Self = Self::at(Port::B, 3);
    pub const B4: Self = Self::at(Port::B, 4);
    pub const B5: Self = Self::at(Port::B, 5);
    pub const B6: Self = Self::at(Port::B, 6);
    pub const B7: Self = Self::at(Port::B, 7);
    pub const C0: Self = Self::at(Port::C, 0);
    pub const C1: Self = Self::at(Port::C, 1);
    pub const C2: Self = Self::at(Port::C, 2);
    pub const C3: Self = Self::at(Port::C, 3);
    pub const C4: Self = Self::at(Port::C, 4);
    pub const C5: Self = Self::at(Port::C, 5);
    pub const C6: Self = Self::at(Port::C, 6);
    pub const C7: Self = Self::at(Port::C, 7);
    pub const D0: Self = Self::at(Port::D, 0);
    pub const D1: Self = Self::at(Port::D, 1);
    pub const D2: Self = Self::at(Port::D, 2);
    pub const D3: Self = Self::at(Port::D, 3);
    pub const D4: Self = Self::at(Port::D, 4);
    pub const D5: Self = Self::at(Port::D, 5);
    pub const D6: Self = Self::at(Port::D, 6);
    pub const D7: Self = Self::at(Port::D, 7);
}

/// Logic level of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Check if this is the high level
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    /// Check if this is the low level
    pub const fn is_low(self) -> bool {
        matches!(self, Level::Low)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl core::ops::Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Direction of a single pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PinDirection {
    Input,
    Output,
}

/// Direction of a whole port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PortDirection {
    /// All eight pins input (DDR = 0x00)
    Input,
    /// All eight pins output (DDR = 0xFF)
    Output,
}

impl PortDirection {
    /// DDR register value for this direction
    pub const fn ddr(self) -> u8 {
        match self {
            PortDirection::Input => 0x00,
            PortDirection::Output => 0xFF,
        }
    }
}

/// Port/pin addressed digital I/O
///
/// Writing a pin that is configured as an input controls its internal
/// pull-up, as on the AVR hardware.
pub trait DigitalIo {
    /// Configure a pin as input or output
    fn set_pin_direction(&mut self, pin: PinId, direction: PinDirection);

    /// Drive a pin (or set its pull-up when it is an input)
    fn write_pin(&mut self, pin: PinId, level: Level);

    /// Read the current level on a pin
    fn read_pin(&self, pin: PinId) -> Level;

    /// Configure all pins of a port at once
    fn set_port_direction(&mut self, port: Port, direction: PortDirection);

    /// Write a whole port
    fn write_port(&mut self, port: Port, value: u8);

    /// Read a whole port
    fn read_port(&self, port: Port) -> u8;

    /// Enable the internal pull-up of an input pin
    fn enable_pull_up(&mut self, pin: PinId) {
        self.write_pin(pin, Level::High);
    }

    /// Disable the internal pull-up of an input pin
    fn disable_pull_up(&mut self, pin: PinId) {
        self.write_pin(pin, Level::Low);
    }
}

impl<T: DigitalIo + ?Sized> DigitalIo for &mut T {
    fn set_pin_direction(&mut self, pin: PinId, direction: PinDirection) {
        (**self).set_pin_direction(pin, direction)
    }

    fn write_pin(&mut self, pin: PinId, level: Level) {
        (**self).write_pin(pin, level)
    }

    fn read_pin(&self, pin: PinId) -> Level {
        (**self).read_pin(pin)
    }

    fn set_port_direction(&mut self, port: Port, direction: PortDirection) {
        (**self).set_port_direction(port, direction)
    }

    fn write_port(&mut self, port: Port, value: u8) {
        (**self).write_port(port, value)
    }

    fn read_port(&self, port: Port) -> u8 {
        (**self).read_port(port)
    }
}
