//! USART driver (asynchronous, double speed)
//!
//! Frames are sent once UDRE reports an empty data register and received
//! once RXC reports a complete byte. Text received with
//! [`Usart::receive_string`] ends at a `#`.

use etamini_hal::uart::{DataBits, Parity, StopBits, UartConfig, UartRx, UartTx};
use etamini_hal::{RegisterFile, Spin, Wait};

use crate::registers::{ucsra, ucsrb, ucsrc, UBRRH, UBRRL, UCSRA, UCSRB, UCSRC, UDR};

/// Terminator of received strings
pub const STRING_TERMINATOR: u8 = b'#';

/// Largest value of the 12-bit baud rate register
const UBRR_MAX: u16 = 0x0FFF;

/// Baud rate register value in double-speed mode
///
/// UBRR = F_CPU / (8 * baud) - 1, clamped to the 12-bit register.
pub const fn baud_divisor(cpu_hz: u32, baudrate: u32) -> u16 {
    if baudrate == 0 {
        return UBRR_MAX;
    }
    let divisor = (cpu_hz / 8 / baudrate).saturating_sub(1);
    if divisor > UBRR_MAX as u32 {
        UBRR_MAX
    } else {
        divisor as u16
    }
}

/// UCSRC value (URSEL set) for a frame format
pub const fn frame_format(config: &UartConfig) -> u8 {
    let size = match config.data_bits {
        DataBits::Five => 0b00,
        DataBits::Six => 0b01,
        DataBits::Seven => 0b10,
        DataBits::Eight => 0b11,
    };
    let parity = match config.parity {
        Parity::None => 0,
        Parity::Even => 1 << ucsrc::UPM1,
        Parity::Odd => (1 << ucsrc::UPM1) | (1 << ucsrc::UPM0),
    };
    let stop = match config.stop_bits {
        StopBits::One => 0,
        StopBits::Two => 1 << ucsrc::USBS,
    };
    (1 << ucsrc::URSEL) | parity | stop | (size << ucsrc::UCSZ0)
}

/// Error from a USART operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartError<E> {
    /// The wait strategy gave up on a status flag
    Wait(E),
    /// No terminator arrived before the buffer was full
    BufferFull,
}

impl<E: core::fmt::Debug> embedded_io::Error for UartError<E> {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            UartError::Wait(_) => embedded_io::ErrorKind::TimedOut,
            UartError::BufferFull => embedded_io::ErrorKind::OutOfMemory,
        }
    }
}

/// USART driver
pub struct Usart<R, W = Spin> {
    regs: R,
    wait: W,
    cpu_hz: u32,
    /// A byte went out since the last flush
    sending: bool,
}

impl<R: RegisterFile> Usart<R, Spin> {
    pub fn new(regs: R, cpu_hz: u32) -> Self {
        Self::with_wait(regs, cpu_hz, Spin)
    }
}

impl<R: RegisterFile, W: Wait> Usart<R, W> {
    /// Create a driver with a custom wait strategy
    pub fn with_wait(regs: R, cpu_hz: u32, wait: W) -> Self {
        Self {
            regs,
            wait,
            cpu_hz,
            sending: false,
        }
    }

    /// Enable receiver and transmitter with the given frame and baud rate
    pub fn init(&mut self, config: &UartConfig) {
        self.regs.write(UCSRA, 1 << ucsra::U2X);
        self.regs
            .write(UCSRB, (1 << ucsrb::RXEN) | (1 << ucsrb::TXEN));
        self.regs.write(UCSRC, frame_format(config));

        // URSEL clear selects UBRRH on the shared address
        let [high, low] = baud_divisor(self.cpu_hz, config.baudrate).to_be_bytes();
        self.regs.write(UBRRH, high);
        self.regs.write(UBRRL, low);

        #[cfg(feature = "defmt")]
        defmt::trace!(
            "usart: init baud={=u32} ubrr={=u16}",
            config.baudrate,
            u16::from_be_bytes([high, low])
        );
    }

    /// Send one byte once the data register is empty
    pub fn send_byte(&mut self, data: u8) -> Result<(), W::Error> {
        let regs = &self.regs;
        self.wait
            .wait_until(|| regs.bit_is_set(UCSRA, ucsra::UDRE))?;
        self.regs.write(UDR, data);
        self.sending = true;
        Ok(())
    }

    /// Wait for a received byte and return it
    pub fn receive_byte(&mut self) -> Result<u8, W::Error> {
        let regs = &self.regs;
        self.wait
            .wait_until(|| regs.bit_is_set(UCSRA, ucsra::RXC))?;
        Ok(self.regs.read(UDR))
    }

    /// Send text up to (not including) the first NUL
    pub fn send_string(&mut self, text: &[u8]) -> Result<(), W::Error> {
        for &byte in text.iter().take_while(|&&b| b != 0) {
            self.send_byte(byte)?;
        }
        Ok(())
    }

    /// Receive text until `#`
    ///
    /// The terminator is consumed but not stored. Returns the text length.
    pub fn receive_string(&mut self, buf: &mut [u8]) -> Result<usize, UartError<W::Error>> {
        for (i, slot) in buf.iter_mut().enumerate() {
            let byte = self.receive_byte().map_err(UartError::Wait)?;
            if byte == STRING_TERMINATOR {
                return Ok(i);
            }
            *slot = byte;
        }
        Err(UartError::BufferFull)
    }

    /// Check if a received byte is waiting
    pub fn byte_available(&self) -> bool {
        self.regs.bit_is_set(UCSRA, ucsra::RXC)
    }

    /// Wait until the last byte sent has left the shift register
    pub fn flush(&mut self) -> Result<(), W::Error> {
        if !self.sending {
            return Ok(());
        }
        let regs = &self.regs;
        self.wait
            .wait_until(|| regs.bit_is_set(UCSRA, ucsra::TXC))?;
        // TXC clears by writing one
        self.regs.set_bits(UCSRA, 1 << ucsra::TXC);
        self.sending = false;
        Ok(())
    }

    /// Access the underlying registers
    pub fn registers(&self) -> &R {
        &self.regs
    }
}

impl<R: RegisterFile, W: Wait> UartTx for Usart<R, W> {
    type Error = W::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        for &byte in data {
            self.send_byte(byte)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Usart::flush(self)
    }
}

impl<R: RegisterFile, W: Wait> UartRx for Usart<R, W> {
    type Error = W::Error;

    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        for byte in buf.iter_mut() {
            *byte = self.receive_byte()?;
        }
        Ok(buf.len())
    }
}

impl<R: RegisterFile, W: Wait> embedded_io::ErrorType for Usart<R, W>
where
    W::Error: core::fmt::Debug,
{
    type Error = UartError<W::Error>;
}

impl<R: RegisterFile, W: Wait> embedded_io::Write for Usart<R, W>
where
    W::Error: core::fmt::Debug,
{
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        UartTx::write_blocking(self, buf).map_err(UartError::Wait)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Usart::flush(self).map_err(UartError::Wait)
    }
}

impl<R: RegisterFile, W: Wait> embedded_io::Read for Usart<R, W>
where
    W::Error: core::fmt::Debug,
{
    /// Blocks for the first byte, then takes whatever else is already waiting
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        buf[0] = self.receive_byte().map_err(UartError::Wait)?;
        let mut count = 1;
        while count < buf.len() && self.byte_available() {
            buf[count] = self.regs.read(UDR);
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use etamini_hal::{BoundedSpin, TimedOut};
    use heapless::{Deque, Vec};

    /// USART register model: UDR reads pop the receive queue, UDR writes
    /// land in the transmit log and the shared UBRRH/UCSRC address is
    /// routed by URSEL.
    #[derive(Default)]
    struct SimUsart {
        ucsra: u8,
        ucsrb: u8,
        ucsrc: u8,
        ubrrh: u8,
        ubrrl: u8,
        rx: RefCell<Deque<u8, 32>>,
        tx: Vec<u8, 32>,
        tx_complete: bool,
    }

    impl SimUsart {
        fn receiving(data: &[u8]) -> Self {
            let sim = Self::default();
            for &byte in data {
                sim.rx.borrow_mut().push_back(byte).unwrap();
            }
            sim
        }
    }

    impl RegisterFile for SimUsart {
        fn read(&self, address: u16) -> u8 {
            match address {
                UCSRA => {
                    let mut value = self.ucsra | (1 << ucsra::UDRE);
                    if !self.rx.borrow().is_empty() {
                        value |= 1 << ucsra::RXC;
                    }
                    if self.tx_complete {
                        value |= 1 << ucsra::TXC;
                    }
                    value
                }
                UCSRB => self.ucsrb,
                UBRRL => self.ubrrl,
                UDR => self.rx.borrow_mut().pop_front().unwrap_or(0),
                _ => 0,
            }
        }

        fn write(&mut self, address: u16, value: u8) {
            match address {
                UCSRA => {
                    self.ucsra = value & (1 << ucsra::U2X);
                    if value & (1 << ucsra::TXC) != 0 {
                        self.tx_complete = false;
                    }
                }
                UCSRB => self.ucsrb = value,
                UCSRC if value & (1 << ucsrc::URSEL) != 0 => self.ucsrc = value,
                UBRRH => self.ubrrh = value,
                UBRRL => self.ubrrl = value,
                UDR => {
                    self.tx.push(value).unwrap();
                    self.tx_complete = true;
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_baud_divisor() {
        assert_eq!(baud_divisor(8_000_000, 9600), 103);
        assert_eq!(baud_divisor(16_000_000, 115_200), 16);
        assert_eq!(baud_divisor(1_000_000, 1), UBRR_MAX);
        assert_eq!(baud_divisor(8_000_000, 0), UBRR_MAX);
        assert_eq!(baud_divisor(8_000_000, 2_000_000), 0);
    }

    #[test]
    fn test_frame_format() {
        assert_eq!(frame_format(&UartConfig::default()), 0x86);

        let config = UartConfig {
            data_bits: DataBits::Seven,
            parity: Parity::Odd,
            stop_bits: StopBits::Two,
            ..Default::default()
        };
        assert_eq!(frame_format(&config), 0x80 | 0x30 | 0x08 | 0x04);
    }

    #[test]
    fn test_init() {
        let mut usart = Usart::new(SimUsart::default(), 8_000_000);
        usart.init(&UartConfig::default());

        let regs = usart.registers();
        assert_eq!(regs.ucsra, 1 << ucsra::U2X);
        assert_eq!(regs.ucsrb, 0x18);
        assert_eq!(regs.ucsrc, 0x86);
        assert_eq!(regs.ubrrh, 0);
        assert_eq!(regs.ubrrl, 103);
    }

    #[test]
    fn test_slow_baud_uses_high_register() {
        let mut usart = Usart::new(SimUsart::default(), 8_000_000);
        usart.init(&UartConfig {
            baudrate: 300,
            ..Default::default()
        });

        // 8 MHz / 2400 - 1 = 3332 = 0x0D04
        assert_eq!(usart.registers().ubrrh, 0x0D);
        assert_eq!(usart.registers().ubrrl, 0x04);
        assert_eq!(usart.registers().ucsrc, 0x86);
    }

    #[test]
    fn test_send_string_stops_at_nul() {
        let mut usart = Usart::new(SimUsart::default(), 8_000_000);
        usart.send_string(b"AT\0ignored").unwrap();
        assert_eq!(usart.registers().tx.as_slice(), b"AT");
    }

    #[test]
    fn test_receive_string_until_hash() {
        let mut usart = Usart::new(SimUsart::receiving(b"hello#rest"), 8_000_000);
        let mut buf = [0u8; 16];

        assert_eq!(usart.receive_string(&mut buf), Ok(5));
        assert_eq!(&buf[..5], b"hello");
        assert_eq!(usart.receive_byte(), Ok(b'r'));
    }

    #[test]
    fn test_receive_string_buffer_full() {
        let mut usart = Usart::new(SimUsart::receiving(b"abcdef#"), 8_000_000);
        let mut buf = [0u8; 3];
        assert_eq!(usart.receive_string(&mut buf), Err(UartError::BufferFull));
    }

    #[test]
    fn test_receive_times_out_when_idle() {
        let mut usart = Usart::with_wait(SimUsart::default(), 8_000_000, BoundedSpin::new(16));
        assert_eq!(usart.receive_byte(), Err(TimedOut));
    }

    #[test]
    fn test_flush_clears_tx_complete() {
        let mut usart = Usart::with_wait(SimUsart::default(), 8_000_000, BoundedSpin::new(4));
        // Nothing sent, nothing to wait for
        assert_eq!(usart.flush(), Ok(()));

        UartTx::write_blocking(&mut usart, b"x").unwrap();
        assert_eq!(usart.flush(), Ok(()));
        assert!(!usart.registers().tx_complete);
    }

    #[test]
    fn test_embedded_io_read_takes_available_bytes() {
        let mut usart = Usart::new(SimUsart::receiving(b"abc"), 8_000_000);
        let mut buf = [0u8; 8];

        let count = embedded_io::Read::read(&mut usart, &mut buf).unwrap();
        assert_eq!(&buf[..count], b"abc");
    }

    #[test]
    fn test_embedded_io_write() {
        let mut usart = Usart::new(SimUsart::default(), 8_000_000);
        embedded_io::Write::write_all(&mut usart, b"ok").unwrap();
        assert_eq!(usart.registers().tx.as_slice(), b"ok");
    }
}
