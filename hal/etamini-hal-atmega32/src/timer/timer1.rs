//! Timer1: 16-bit timer/counter with two compare units
//!
//! The 16-bit registers go through the shared TEMP latch, so the high
//! byte is written first and the low byte is read first.

use etamini_hal::RegisterFile;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{ClockSelect, CompareOutput};
use crate::interrupt::{Handler, InterruptSource, SharedRegistry, VECTORS};
use crate::registers::{
    tccr1a, tccr1b, tifr, timsk, OCR1AH, OCR1AL, OCR1BH, OCR1BL, TCCR1A, TCCR1B, TCNT1H, TCNT1L,
    TIFR, TIMSK,
};

/// Waveform generation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Timer1Mode {
    /// Count 0..=0xFFFF and overflow
    #[default]
    Normal,
    /// Clear the counter on compare match with OCR1A
    Ctc,
}

impl Timer1Mode {
    /// WGM13:12 bits in TCCR1B
    const fn wgm_high(self) -> u8 {
        match self {
            Timer1Mode::Normal => 0,
            Timer1Mode::Ctc => 1 << tccr1b::WGM12,
        }
    }
}

/// Compare unit of Timer1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    A,
    B,
}

/// Timer1 configuration applied by [`Timer1::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timer1Config {
    pub mode: Timer1Mode,
    /// Clock used by the next `start()`
    pub clock: ClockSelect,
    pub output_a: CompareOutput,
    pub output_b: CompareOutput,
}

/// Timer1 driver
pub struct Timer1<'r, R> {
    regs: R,
    registry: &'r SharedRegistry,
    clock: ClockSelect,
}

impl<R: RegisterFile> Timer1<'static, R> {
    /// Create a driver that registers callbacks in [`VECTORS`]
    pub fn new(regs: R) -> Self {
        Self::with_registry(regs, &VECTORS)
    }
}

impl<'r, R: RegisterFile> Timer1<'r, R> {
    /// Create a driver with its own callback registry
    pub fn with_registry(regs: R, registry: &'r SharedRegistry) -> Self {
        Self {
            regs,
            registry,
            clock: ClockSelect::NoClock,
        }
    }

    /// Apply mode, outputs and clock selection (the counter stays stopped)
    pub fn init(&mut self, config: &Timer1Config) {
        self.set_mode(config.mode);
        self.set_output(Channel::A, config.output_a);
        self.set_output(Channel::B, config.output_b);
        self.set_clock(config.clock);
    }

    /// Select the waveform mode, leaving outputs and clock alone
    pub fn set_mode(&mut self, mode: Timer1Mode) {
        self.regs.clear_bits(TCCR1A, tccr1a::WGM_MASK);
        let wgm = mode.wgm_high();
        self.regs
            .modify(TCCR1B, |v| (v & !tccr1b::WGM_MASK) | wgm);
    }

    /// Current waveform mode (anything but CTC reads as normal)
    pub fn mode(&self) -> Timer1Mode {
        if self.regs.bit_is_set(TCCR1B, tccr1b::WGM12) {
            Timer1Mode::Ctc
        } else {
            Timer1Mode::Normal
        }
    }

    /// Record the clock source used by [`Timer1::start`]
    pub fn set_clock(&mut self, clock: ClockSelect) {
        self.clock = clock;
    }

    pub fn clock(&self) -> ClockSelect {
        self.clock
    }

    /// Start counting with the selected clock
    pub fn start(&mut self) {
        let clock = self.clock.bits();
        self.regs
            .modify(TCCR1B, |v| (v & !tccr1b::CS_MASK) | clock);
    }

    /// Stop counting, keeping every other setting
    pub fn stop(&mut self) {
        self.regs.clear_bits(TCCR1B, tccr1b::CS_MASK);
    }

    pub fn is_running(&self) -> bool {
        self.regs.read(TCCR1B) & tccr1b::CS_MASK != 0
    }

    /// Select what OC1A or OC1B does on compare match
    pub fn set_output(&mut self, channel: Channel, output: CompareOutput) {
        let (mask, shift) = match channel {
            Channel::A => (tccr1a::COM1A_MASK, tccr1a::COM1A0),
            Channel::B => (tccr1a::COM1B_MASK, tccr1a::COM1B0),
        };
        let com = output.bits() << shift;
        self.regs.modify(TCCR1A, |v| (v & !mask) | com);
    }

    pub fn set_output_a(&mut self, output: CompareOutput) {
        self.set_output(Channel::A, output);
    }

    pub fn set_output_b(&mut self, output: CompareOutput) {
        self.set_output(Channel::B, output);
    }

    /// Current output mode of a compare unit
    pub fn output(&self, channel: Channel) -> CompareOutput {
        let shift = match channel {
            Channel::A => tccr1a::COM1A0,
            Channel::B => tccr1a::COM1B0,
        };
        CompareOutput::from_bits(self.regs.read(TCCR1A) >> shift)
    }

    /// Load the counter
    pub fn set_counter(&mut self, value: u16) {
        self.write_wide(TCNT1H, TCNT1L, value);
    }

    /// Current counter value
    pub fn ticks(&self) -> u16 {
        self.read_wide(TCNT1H, TCNT1L)
    }

    /// Load compare register A (TOP in CTC mode)
    pub fn set_compare_a(&mut self, value: u16) {
        self.write_wide(OCR1AH, OCR1AL, value);
    }

    pub fn compare_a(&self) -> u16 {
        self.read_wide(OCR1AH, OCR1AL)
    }

    /// Load compare register B
    pub fn set_compare_b(&mut self, value: u16) {
        self.write_wide(OCR1BH, OCR1BL, value);
    }

    pub fn compare_b(&self) -> u16 {
        self.read_wide(OCR1BH, OCR1BL)
    }

    pub fn enable_overflow_interrupt(&mut self) {
        self.regs.set_bits(TIMSK, 1 << timsk::TOIE1);
    }

    pub fn disable_overflow_interrupt(&mut self) {
        self.regs.clear_bits(TIMSK, 1 << timsk::TOIE1);
    }

    pub fn enable_compare_interrupt(&mut self, channel: Channel) {
        self.regs.set_bits(TIMSK, 1 << Self::compare_interrupt_bit(channel));
    }

    pub fn disable_compare_interrupt(&mut self, channel: Channel) {
        self.regs
            .clear_bits(TIMSK, 1 << Self::compare_interrupt_bit(channel));
    }

    /// Check the overflow flag (TOV1)
    pub fn overflow_pending(&self) -> bool {
        self.regs.bit_is_set(TIFR, tifr::TOV1)
    }

    /// Check a compare match flag (OCF1A / OCF1B)
    pub fn compare_pending(&self, channel: Channel) -> bool {
        self.regs.bit_is_set(TIFR, Self::compare_flag_bit(channel))
    }

    /// Clear the overflow flag (flags clear by writing one)
    pub fn clear_overflow(&mut self) {
        self.regs.write(TIFR, 1 << tifr::TOV1);
    }

    pub fn clear_compare(&mut self, channel: Channel) {
        self.regs.write(TIFR, 1 << Self::compare_flag_bit(channel));
    }

    /// Handler for TIMER1_OVF, returning the one it replaced
    pub fn set_overflow_callback(&mut self, handler: Handler) -> Option<Handler> {
        self.registry
            .register(InterruptSource::Timer1Overflow, handler)
    }

    /// Handler for TIMER1_COMPA / TIMER1_COMPB, returning the one it replaced
    pub fn set_compare_callback(&mut self, channel: Channel, handler: Handler) -> Option<Handler> {
        let source = match channel {
            Channel::A => InterruptSource::Timer1CompareA,
            Channel::B => InterruptSource::Timer1CompareB,
        };
        self.registry.register(source, handler)
    }

    /// Access the underlying registers
    pub fn registers(&self) -> &R {
        &self.regs
    }

    const fn compare_interrupt_bit(channel: Channel) -> u8 {
        match channel {
            Channel::A => timsk::OCIE1A,
            Channel::B => timsk::OCIE1B,
        }
    }

    const fn compare_flag_bit(channel: Channel) -> u8 {
        match channel {
            Channel::A => tifr::OCF1A,
            Channel::B => tifr::OCF1B,
        }
    }

    fn write_wide(&mut self, high: u16, low: u16, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.regs.write(high, hi);
        self.regs.write(low, lo);
    }

    fn read_wide(&self, high: u16, low: u16) -> u16 {
        let lo = self.regs.read(low);
        let hi = self.regs.read(high);
        u16::from_be_bytes([hi, lo])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RegisterBank;
    use core::cell::RefCell;
    use core::sync::atomic::{AtomicUsize, Ordering};

    static COMPARE_B_HITS: AtomicUsize = AtomicUsize::new(0);

    fn timer() -> Timer1<'static, RegisterBank> {
        Timer1::new(RegisterBank::new())
    }

    /// Register file that records the order of accesses
    struct Recorder {
        bank: RegisterBank,
        reads: RefCell<heapless::Vec<u16, 8>>,
        writes: heapless::Vec<u16, 8>,
    }

    impl RegisterFile for Recorder {
        fn read(&self, address: u16) -> u8 {
            let _ = self.reads.borrow_mut().push(address);
            self.bank.read(address)
        }

        fn write(&mut self, address: u16, value: u8) {
            let _ = self.writes.push(address);
            self.bank.write(address, value);
        }
    }

    #[test]
    fn test_ctc_mode() {
        let mut timer = timer();
        timer.set_mode(Timer1Mode::Ctc);
        assert_eq!(timer.registers().read(TCCR1B), 1 << tccr1b::WGM12);
        assert_eq!(timer.registers().read(TCCR1A) & tccr1a::WGM_MASK, 0);
        assert_eq!(timer.mode(), Timer1Mode::Ctc);

        timer.set_mode(Timer1Mode::Normal);
        assert_eq!(timer.registers().read(TCCR1B), 0);
    }

    #[test]
    fn test_mode_keeps_outputs_and_clock() {
        let mut timer = timer();
        timer.set_output_a(CompareOutput::Toggle);
        timer.set_clock(ClockSelect::Div256);
        timer.start();

        timer.set_mode(Timer1Mode::Ctc);
        assert_eq!(timer.output(Channel::A), CompareOutput::Toggle);
        assert!(timer.is_running());
        assert_eq!(timer.registers().read(TCCR1B), 0x08 | 0x04);
    }

    #[test]
    fn test_outputs_are_independent() {
        let mut timer = timer();
        timer.init(&Timer1Config {
            output_a: CompareOutput::Set,
            output_b: CompareOutput::Clear,
            ..Default::default()
        });

        assert_eq!(timer.registers().read(TCCR1A), 0b1110_0000);
        timer.set_output_b(CompareOutput::Disconnected);
        assert_eq!(timer.output(Channel::A), CompareOutput::Set);
        assert_eq!(timer.output(Channel::B), CompareOutput::Disconnected);
    }

    #[test]
    fn test_start_stop() {
        let mut timer = timer();
        timer.set_clock(ClockSelect::Div1024);
        assert!(!timer.is_running());

        timer.start();
        assert_eq!(timer.registers().read(TCCR1B) & tccr1b::CS_MASK, 5);

        timer.stop();
        assert!(!timer.is_running());
    }

    #[test]
    fn test_sixteen_bit_registers() {
        let mut timer = timer();
        timer.set_counter(0x1234);
        timer.set_compare_a(0xABCD);
        timer.set_compare_b(0x00FF);

        assert_eq!(timer.registers().read(TCNT1H), 0x12);
        assert_eq!(timer.registers().read(TCNT1L), 0x34);
        assert_eq!(timer.ticks(), 0x1234);
        assert_eq!(timer.compare_a(), 0xABCD);
        assert_eq!(timer.compare_b(), 0x00FF);
    }

    #[test]
    fn test_wide_access_order() {
        let recorder = Recorder {
            bank: RegisterBank::new(),
            reads: RefCell::new(heapless::Vec::new()),
            writes: heapless::Vec::new(),
        };
        let mut timer = Timer1::new(recorder);

        timer.set_compare_a(0x0102);
        let _ = timer.compare_a();

        let recorder = timer.registers();
        assert_eq!(recorder.writes.as_slice(), &[OCR1AH, OCR1AL]);
        assert_eq!(recorder.reads.borrow().as_slice(), &[OCR1AL, OCR1AH]);
    }

    #[test]
    fn test_interrupt_bits() {
        let mut timer = timer();
        timer.enable_overflow_interrupt();
        timer.enable_compare_interrupt(Channel::A);
        timer.enable_compare_interrupt(Channel::B);
        assert_eq!(timer.registers().read(TIMSK), 0b1_1100);

        timer.disable_compare_interrupt(Channel::A);
        assert_eq!(timer.registers().read(TIMSK), 0b0_1100);
    }

    #[test]
    fn test_flags() {
        let mut bank = RegisterBank::new();
        bank.write(TIFR, 1 << tifr::OCF1B);
        let timer = Timer1::new(bank);

        assert!(timer.compare_pending(Channel::B));
        assert!(!timer.compare_pending(Channel::A));
        assert!(!timer.overflow_pending());
    }

    #[test]
    fn test_compare_b_callback() {
        static REGISTRY: SharedRegistry = SharedRegistry::new();

        fn on_match() {
            COMPARE_B_HITS.fetch_add(1, Ordering::SeqCst);
        }

        let mut timer = Timer1::with_registry(RegisterBank::new(), &REGISTRY);
        timer.set_compare_callback(Channel::B, on_match);

        assert!(!REGISTRY.dispatch(InterruptSource::Timer1CompareA));
        assert!(REGISTRY.dispatch(InterruptSource::Timer1CompareB));
        assert_eq!(COMPARE_B_HITS.load(Ordering::SeqCst), 1);
    }
}
