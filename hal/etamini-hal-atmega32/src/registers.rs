//! ATmega32 register map
//!
//! Data-space addresses (I/O address + 0x20) and bit positions, as listed
//! in the ATmega32 datasheet register summary. Only the registers used by
//! the drivers in this crate are listed.

use etamini_hal::gpio::Port;

// TWI
pub const TWBR: u16 = 0x20;
pub const TWSR: u16 = 0x21;
pub const TWAR: u16 = 0x22;
pub const TWDR: u16 = 0x23;
pub const TWCR: u16 = 0x56;

// USART
pub const UBRRL: u16 = 0x29;
pub const UCSRB: u16 = 0x2A;
pub const UCSRA: u16 = 0x2B;
pub const UDR: u16 = 0x2C;
/// UBRRH and UCSRC share one address; URSEL selects the target on write
pub const UBRRH: u16 = 0x40;
pub const UCSRC: u16 = 0x40;

// SPI
pub const SPCR: u16 = 0x2D;
pub const SPSR: u16 = 0x2E;
pub const SPDR: u16 = 0x2F;

// GPIO
pub const PIND: u16 = 0x30;
pub const DDRD: u16 = 0x31;
pub const PORTD: u16 = 0x32;
pub const PINC: u16 = 0x33;
pub const DDRC: u16 = 0x34;
pub const PORTC: u16 = 0x35;
pub const PINB: u16 = 0x36;
pub const DDRB: u16 = 0x37;
pub const PORTB: u16 = 0x38;
pub const PINA: u16 = 0x39;
pub const DDRA: u16 = 0x3A;
pub const PORTA: u16 = 0x3B;

// Timer1
pub const OCR1BL: u16 = 0x48;
pub const OCR1BH: u16 = 0x49;
pub const OCR1AL: u16 = 0x4A;
pub const OCR1AH: u16 = 0x4B;
pub const TCNT1L: u16 = 0x4C;
pub const TCNT1H: u16 = 0x4D;
pub const TCCR1B: u16 = 0x4E;
pub const TCCR1A: u16 = 0x4F;

// Timer0
pub const TCNT0: u16 = 0x52;
pub const TCCR0: u16 = 0x53;
pub const OCR0: u16 = 0x5C;

// Shared timer interrupt registers
pub const TIFR: u16 = 0x58;
pub const TIMSK: u16 = 0x59;

/// Lowest data-space address of the I/O register block
pub const IO_START: u16 = 0x20;

/// One past the highest data-space address of the I/O register block
pub const IO_END: u16 = 0x60;

/// PIN / DDR / PORT addresses of one GPIO port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRegisters {
    /// Input pins register
    pub pin: u16,
    /// Data direction register
    pub ddr: u16,
    /// Output / pull-up register
    pub port: u16,
}

impl PortRegisters {
    /// Register addresses for a port
    pub const fn of(port: Port) -> Self {
        match port {
            Port::A => Self {
                pin: PINA,
                ddr: DDRA,
                port: PORTA,
            },
            Port::B => Self {
                pin: PINB,
                ddr: DDRB,
                port: PORTB,
            },
            Port::C => Self {
                pin: PINC,
                ddr: DDRC,
                port: PORTC,
            },
            Port::D => Self {
                pin: PIND,
                ddr: DDRD,
                port: PORTD,
            },
        }
    }
}

/// TWCR bit positions
pub mod twcr {
    pub const TWINT: u8 = 7;
    pub const TWEA: u8 = 6;
    pub const TWSTA: u8 = 5;
    pub const TWSTO: u8 = 4;
    pub const TWWC: u8 = 3;
    pub const TWEN: u8 = 2;
    pub const TWIE: u8 = 0;
}

/// TWSR bit positions
pub mod twsr {
    /// Status code occupies bits 7:3
    pub const STATUS_MASK: u8 = 0xF8;
    pub const TWPS1: u8 = 1;
    pub const TWPS0: u8 = 0;
}

/// TWAR bit positions
pub mod twar {
    pub const TWGCE: u8 = 0;
}

/// TCCR0 bit positions
pub mod tccr0 {
    pub const FOC0: u8 = 7;
    pub const WGM00: u8 = 6;
    pub const COM01: u8 = 5;
    pub const COM00: u8 = 4;
    pub const WGM01: u8 = 3;
    pub const CS_MASK: u8 = 0b0000_0111;
    pub const COM_MASK: u8 = 0b0011_0000;
}

/// TCCR1A bit positions
pub mod tccr1a {
    pub const COM1A1: u8 = 7;
    pub const COM1A0: u8 = 6;
    pub const COM1B1: u8 = 5;
    pub const COM1B0: u8 = 4;
    pub const FOC1A: u8 = 3;
    pub const FOC1B: u8 = 2;
    pub const WGM11: u8 = 1;
    pub const WGM10: u8 = 0;
    pub const COM1A_MASK: u8 = 0b1100_0000;
    pub const COM1B_MASK: u8 = 0b0011_0000;
    pub const WGM_MASK: u8 = 0b0000_0011;
}

/// TCCR1B bit positions
pub mod tccr1b {
    pub const WGM13: u8 = 4;
    pub const WGM12: u8 = 3;
    pub const CS_MASK: u8 = 0b0000_0111;
    pub const WGM_MASK: u8 = 0b0001_1000;
}

/// TIMSK bit positions
pub mod timsk {
    pub const OCIE1A: u8 = 4;
    pub const OCIE1B: u8 = 3;
    pub const TOIE1: u8 = 2;
    pub const OCIE0: u8 = 1;
    pub const TOIE0: u8 = 0;
}

/// TIFR bit positions
pub mod tifr {
    pub const OCF1A: u8 = 4;
    pub const OCF1B: u8 = 3;
    pub const TOV1: u8 = 2;
    pub const OCF0: u8 = 1;
    pub const TOV0: u8 = 0;
}

/// SPCR bit positions
pub mod spcr {
    pub const SPIE: u8 = 7;
    pub const SPE: u8 = 6;
    pub const DORD: u8 = 5;
    pub const MSTR: u8 = 4;
    pub const CPOL: u8 = 3;
    pub const CPHA: u8 = 2;
    pub const SPR1: u8 = 1;
    pub const SPR0: u8 = 0;
}

/// SPSR bit positions
pub mod spsr {
    pub const SPIF: u8 = 7;
    pub const WCOL: u8 = 6;
    pub const SPI2X: u8 = 0;
}

/// UCSRA bit positions
pub mod ucsra {
    pub const RXC: u8 = 7;
    pub const TXC: u8 = 6;
    pub const UDRE: u8 = 5;
    pub const U2X: u8 = 1;
}

/// UCSRB bit positions
pub mod ucsrb {
    pub const RXEN: u8 = 4;
    pub const TXEN: u8 = 3;
    pub const UCSZ2: u8 = 2;
}

/// UCSRC bit positions
pub mod ucsrc {
    pub const URSEL: u8 = 7;
    pub const UPM1: u8 = 5;
    pub const UPM0: u8 = 4;
    pub const USBS: u8 = 3;
    pub const UCSZ1: u8 = 2;
    pub const UCSZ0: u8 = 1;
}
