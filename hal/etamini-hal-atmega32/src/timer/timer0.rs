//! Timer0: 8-bit timer/counter with one compare unit

use etamini_hal::RegisterFile;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{ClockSelect, CompareOutput};
use crate::interrupt::{Handler, InterruptSource, SharedRegistry, VECTORS};
use crate::registers::{tccr0, tifr, timsk, OCR0, TCCR0, TCNT0, TIFR, TIMSK};

/// Waveform generation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Timer0Mode {
    /// Count 0..=0xFF and overflow
    #[default]
    Normal,
    PhaseCorrectPwm,
    /// Clear the counter on compare match with OCR0
    Ctc,
    FastPwm,
}

impl Timer0Mode {
    /// Full TCCR0 value for this mode: clock stopped, OC0 disconnected
    ///
    /// Force-compare is only meaningful (and only set) in the non-PWM modes.
    pub const fn control(self) -> Tccr0 {
        let (force_compare, wgm00, wgm01) = match self {
            Timer0Mode::Normal => (true, false, false),
            Timer0Mode::PhaseCorrectPwm => (false, true, false),
            Timer0Mode::Ctc => (true, false, true),
            Timer0Mode::FastPwm => (false, true, true),
        };
        Tccr0 {
            force_compare,
            wgm00,
            compare_output: CompareOutput::Disconnected,
            wgm01,
            clock: ClockSelect::NoClock,
        }
    }
}

/// Named-field view of TCCR0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tccr0 {
    /// FOC0
    pub force_compare: bool,
    pub wgm00: bool,
    /// COM01:0
    pub compare_output: CompareOutput,
    pub wgm01: bool,
    /// CS02:0
    pub clock: ClockSelect,
}

impl Tccr0 {
    /// Decode a raw TCCR0 value
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            force_compare: bits & (1 << tccr0::FOC0) != 0,
            wgm00: bits & (1 << tccr0::WGM00) != 0,
            compare_output: CompareOutput::from_bits(bits >> tccr0::COM00),
            wgm01: bits & (1 << tccr0::WGM01) != 0,
            clock: ClockSelect::from_bits(bits),
        }
    }

    /// Encode to the raw TCCR0 value
    pub const fn bits(self) -> u8 {
        (self.force_compare as u8) << tccr0::FOC0
            | (self.wgm00 as u8) << tccr0::WGM00
            | self.compare_output.bits() << tccr0::COM00
            | (self.wgm01 as u8) << tccr0::WGM01
            | self.clock.bits()
    }
}

/// Timer0 configuration applied by [`Timer0::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timer0Config {
    pub mode: Timer0Mode,
    /// Clock used by the next `start()`
    pub clock: ClockSelect,
    pub compare_output: CompareOutput,
}

/// Timer0 driver
pub struct Timer0<'r, R> {
    regs: R,
    registry: &'r SharedRegistry,
    clock: ClockSelect,
}

impl<R: RegisterFile> Timer0<'static, R> {
    /// Create a driver that registers callbacks in [`VECTORS`]
    pub fn new(regs: R) -> Self {
        Self::with_registry(regs, &VECTORS)
    }
}

impl<'r, R: RegisterFile> Timer0<'r, R> {
    /// Create a driver with its own callback registry
    pub fn with_registry(regs: R, registry: &'r SharedRegistry) -> Self {
        Self {
            regs,
            registry,
            clock: ClockSelect::NoClock,
        }
    }

    /// Apply mode, output and clock selection (the counter stays stopped)
    pub fn init(&mut self, config: &Timer0Config) {
        self.set_mode(config.mode);
        self.set_compare_output(config.compare_output);
        self.set_clock(config.clock);
    }

    /// Select the waveform mode
    ///
    /// Rewrites all of TCCR0, which also stops the clock and disconnects
    /// OC0, then clears any pending overflow or compare flag.
    pub fn set_mode(&mut self, mode: Timer0Mode) {
        self.regs.write(TCCR0, mode.control().bits());
        self.regs
            .write(TIFR, (1 << tifr::OCF0) | (1 << tifr::TOV0));
    }

    /// Record the clock source used by [`Timer0::start`]
    pub fn set_clock(&mut self, clock: ClockSelect) {
        self.clock = clock;
    }

    /// Clock source the next `start()` will use
    pub fn clock(&self) -> ClockSelect {
        self.clock
    }

    /// Start counting with the selected clock
    pub fn start(&mut self) {
        let clock = self.clock.bits();
        self.regs
            .modify(TCCR0, |v| (v & !tccr0::CS_MASK) | clock);
    }

    /// Stop counting, keeping every other setting
    pub fn stop(&mut self) {
        self.regs.clear_bits(TCCR0, tccr0::CS_MASK);
    }

    /// Check if a clock source is currently applied
    pub fn is_running(&self) -> bool {
        self.regs.read(TCCR0) & tccr0::CS_MASK != 0
    }

    /// Select what OC0 does on compare match
    pub fn set_compare_output(&mut self, output: CompareOutput) {
        let com = output.bits() << tccr0::COM00;
        self.regs
            .modify(TCCR0, |v| (v & !tccr0::COM_MASK) | com);
    }

    /// Named-field view of the control register
    pub fn control(&self) -> Tccr0 {
        Tccr0::from_bits(self.regs.read(TCCR0))
    }

    /// Load the counter
    pub fn set_counter(&mut self, value: u8) {
        self.regs.write(TCNT0, value);
    }

    /// Current counter value
    pub fn ticks(&self) -> u8 {
        self.regs.read(TCNT0)
    }

    /// Load the compare register
    pub fn set_compare(&mut self, value: u8) {
        self.regs.write(OCR0, value);
    }

    pub fn compare(&self) -> u8 {
        self.regs.read(OCR0)
    }

    pub fn enable_overflow_interrupt(&mut self) {
        self.regs.set_bits(TIMSK, 1 << timsk::TOIE0);
    }

    pub fn disable_overflow_interrupt(&mut self) {
        self.regs.clear_bits(TIMSK, 1 << timsk::TOIE0);
    }

    pub fn enable_compare_interrupt(&mut self) {
        self.regs.set_bits(TIMSK, 1 << timsk::OCIE0);
    }

    pub fn disable_compare_interrupt(&mut self) {
        self.regs.clear_bits(TIMSK, 1 << timsk::OCIE0);
    }

    /// Check the overflow flag (TOV0)
    pub fn overflow_pending(&self) -> bool {
        self.regs.bit_is_set(TIFR, tifr::TOV0)
    }

    /// Check the compare match flag (OCF0)
    pub fn compare_pending(&self) -> bool {
        self.regs.bit_is_set(TIFR, tifr::OCF0)
    }

    /// Clear the overflow flag (flags clear by writing one)
    pub fn clear_overflow(&mut self) {
        self.regs.write(TIFR, 1 << tifr::TOV0);
    }

    /// Clear the compare match flag
    pub fn clear_compare(&mut self) {
        self.regs.write(TIFR, 1 << tifr::OCF0);
    }

    /// Handler for TIMER0_OVF, returning the one it replaced
    pub fn set_overflow_callback(&mut self, handler: Handler) -> Option<Handler> {
        self.registry
            .register(InterruptSource::Timer0Overflow, handler)
    }

    /// Handler for TIMER0_COMP, returning the one it replaced
    pub fn set_compare_callback(&mut self, handler: Handler) -> Option<Handler> {
        self.registry
            .register(InterruptSource::Timer0Compare, handler)
    }

    /// Access the underlying registers
    pub fn registers(&self) -> &R {
        &self.regs
    }
}
