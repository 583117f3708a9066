//! Host-side doubles for driver tests

use embedded_hal::delay::DelayNs;
use etamini_hal::gpio::{DigitalIo, Level, PinDirection, PinId, Port, PortDirection};

/// One call made on [`MockIo`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Direction(PinId, PinDirection),
    Write(PinId, Level),
    PortDirection(Port, PortDirection),
    PortWrite(Port, u8),
}

/// GPIO double with DDR / PORT / input state per port and a call log
///
/// Output pins read back their driven level, input pins read `input`.
#[derive(Debug, Default)]
pub struct MockIo {
    pub ddr: [u8; 4],
    pub port: [u8; 4],
    pub input: [u8; 4],
    pub events: Vec<Event>,
}

impl MockIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_output(&self, pin: PinId) -> bool {
        self.ddr[pin.port().index() as usize] & pin.mask() != 0
    }

    /// Level currently driven on the PORT latch
    pub fn driven(&self, pin: PinId) -> Level {
        Level::from(self.port[pin.port().index() as usize] & pin.mask() != 0)
    }

    pub fn set_input(&mut self, pin: PinId, level: Level) {
        let slot = &mut self.input[pin.port().index() as usize];
        match level {
            Level::High => *slot |= pin.mask(),
            Level::Low => *slot &= !pin.mask(),
        }
    }

    /// Pin writes only, in order
    pub fn writes(&self) -> Vec<(PinId, Level)> {
        self.events
            .iter()
            .filter_map(|event| match *event {
                Event::Write(pin, level) => Some((pin, level)),
                _ => None,
            })
            .collect()
    }
}

impl DigitalIo for MockIo {
    fn set_pin_direction(&mut self, pin: PinId, direction: PinDirection) {
        self.events.push(Event::Direction(pin, direction));
        let ddr = &mut self.ddr[pin.port().index() as usize];
        match direction {
            PinDirection::Output => *ddr |= pin.mask(),
            PinDirection::Input => *ddr &= !pin.mask(),
        }
    }

    fn write_pin(&mut self, pin: PinId, level: Level) {
        self.events.push(Event::Write(pin, level));
        let port = &mut self.port[pin.port().index() as usize];
        match level {
            Level::High => *port |= pin.mask(),
            Level::Low => *port &= !pin.mask(),
        }
    }

    fn read_pin(&self, pin: PinId) -> Level {
        if self.is_output(pin) {
            self.driven(pin)
        } else {
            Level::from(self.input[pin.port().index() as usize] & pin.mask() != 0)
        }
    }

    fn set_port_direction(&mut self, port: Port, direction: PortDirection) {
        self.events.push(Event::PortDirection(port, direction));
        self.ddr[port.index() as usize] = direction.ddr();
    }

    fn write_port(&mut self, port: Port, value: u8) {
        self.events.push(Event::PortWrite(port, value));
        self.port[port.index() as usize] = value;
    }

    fn read_port(&self, port: Port) -> u8 {
        self.input[port.index() as usize]
    }
}

/// Delay double that only adds up the requested time
#[derive(Debug, Default)]
pub struct MockDelay {
    pub total_ns: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}
