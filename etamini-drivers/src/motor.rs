//! DC motor on an H-bridge (L293D style)
//!
//! Two input pins pick the direction and the enable pin switches the bridge
//! on. Speed is not controlled; the bridge is either fully on or off.
//!
//! ```ignore
//! let mut motor = DcMotor::new(&mut gpio, MotorPins::default());
//! motor.init();
//! motor.rotate(Rotation::Clockwise);
//! ```

use etamini_hal::gpio::{DigitalIo, Level, PinDirection, PinId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// H-bridge wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotorPins {
    /// Input A (high for clockwise)
    pub in_a: PinId,
    /// Input B (high for counter-clockwise)
    pub in_b: PinId,
    /// Bridge enable
    pub enable: PinId,
}

impl Default for MotorPins {
    fn default() -> Self {
        Self {
            in_a: PinId::B1,
            in_b: PinId::B0,
            enable: PinId::B2,
        }
    }
}

/// Requested motor motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Rotation {
    #[default]
    Stop,
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    /// Levels for (IN A, IN B, EN)
    const fn levels(self) -> (Level, Level, Level) {
        match self {
            Rotation::Stop => (Level::Low, Level::Low, Level::Low),
            Rotation::Clockwise => (Level::High, Level::Low, Level::High),
            Rotation::CounterClockwise => (Level::Low, Level::High, Level::High),
        }
    }
}

/// DC motor driver
pub struct DcMotor<IO> {
    io: IO,
    pins: MotorPins,
    rotation: Rotation,
}

impl<IO: DigitalIo> DcMotor<IO> {
    pub fn new(io: IO, pins: MotorPins) -> Self {
        Self {
            io,
            pins,
            rotation: Rotation::Stop,
        }
    }

    /// Make the bridge pins outputs with both inputs low
    ///
    /// The enable pin keeps its level.
    pub fn init(&mut self) {
        let MotorPins { in_a, in_b, enable } = self.pins;
        for pin in [in_a, in_b, enable] {
            self.io.set_pin_direction(pin, PinDirection::Output);
        }
        self.io.write_pin(in_a, Level::Low);
        self.io.write_pin(in_b, Level::Low);
        self.rotation = Rotation::Stop;
    }

    pub fn rotate(&mut self, rotation: Rotation) {
        let (a, b, en) = rotation.levels();
        self.io.write_pin(self.pins.in_a, a);
        self.io.write_pin(self.pins.in_b, b);
        self.io.write_pin(self.pins.enable, en);
        self.rotation = rotation;
    }

    /// Last requested rotation
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn pins(&self) -> &MotorPins {
        &self.pins
    }

    pub fn free(self) -> IO {
        self.io
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockIo;

    fn motor() -> DcMotor<MockIo> {
        let mut motor = DcMotor::new(MockIo::new(), MotorPins::default());
        motor.init();
        motor
    }

    #[test]
    fn test_init() {
        let motor = motor();
        assert_eq!(motor.rotation(), Rotation::Stop);

        let io = motor.free();
        for pin in [PinId::B0, PinId::B1, PinId::B2] {
            assert!(io.is_output(pin));
        }
        assert_eq!(
            io.writes(),
            vec![(PinId::B1, Level::Low), (PinId::B0, Level::Low)]
        );
    }

    #[test]
    fn test_clockwise() {
        let mut motor = motor();
        motor.rotate(Rotation::Clockwise);
        assert_eq!(motor.rotation(), Rotation::Clockwise);

        let io = motor.free();
        assert_eq!(io.driven(PinId::B1), Level::High);
        assert_eq!(io.driven(PinId::B0), Level::Low);
        assert_eq!(io.driven(PinId::B2), Level::High);
    }

    #[test]
    fn test_counter_clockwise() {
        let mut motor = motor();
        motor.rotate(Rotation::CounterClockwise);

        let io = motor.free();
        assert_eq!(io.driven(PinId::B1), Level::Low);
        assert_eq!(io.driven(PinId::B0), Level::High);
        assert_eq!(io.driven(PinId::B2), Level::High);
    }

    #[test]
    fn test_stop_after_run() {
        let mut motor = motor();
        motor.rotate(Rotation::Clockwise);
        motor.rotate(Rotation::Stop);
        assert_eq!(motor.rotation(), Rotation::Stop);

        let io = motor.free();
        assert_eq!(io.port[1] & 0b111, 0);
    }

    #[test]
    fn test_custom_pins() {
        let pins = MotorPins {
            in_a: PinId::D6,
            in_b: PinId::D7,
            enable: PinId::D5,
        };
        let mut motor = DcMotor::new(MockIo::new(), pins);
        motor.init();
        motor.rotate(Rotation::Clockwise);

        let io = motor.free();
        assert_eq!(io.port[3], 0b0110_0000);
    }
}
