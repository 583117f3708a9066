//! Interrupt callback registry
//!
//! The timer drivers do not own the interrupt vectors. Instead they
//! register plain function handlers here, one slot per interrupt source,
//! and the board's vector shims call [`SharedRegistry::dispatch`]:
//!
//! ```ignore
//! #[avr_device::interrupt(atmega32)]
//! fn TIMER0_OVF() {
//!     VECTORS.dispatch(InterruptSource::Timer0Overflow);
//! }
//! ```
//!
//! Registration is last-write-wins. A source with no handler is ignored.

use core::cell::RefCell;

use critical_section::Mutex;

/// Interrupt handler called from the vector shim
pub type Handler = fn();

/// Timer interrupt sources with a callback slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptSource {
    Timer0Overflow,
    Timer0Compare,
    Timer1Overflow,
    Timer1CompareA,
    Timer1CompareB,
}

impl InterruptSource {
    /// Number of sources
    pub const COUNT: usize = 5;

    /// All sources in slot order
    pub const ALL: [InterruptSource; Self::COUNT] = [
        InterruptSource::Timer0Overflow,
        InterruptSource::Timer0Compare,
        InterruptSource::Timer1Overflow,
        InterruptSource::Timer1CompareA,
        InterruptSource::Timer1CompareB,
    ];

    const fn slot(self) -> usize {
        match self {
            InterruptSource::Timer0Overflow => 0,
            InterruptSource::Timer0Compare => 1,
            InterruptSource::Timer1Overflow => 2,
            InterruptSource::Timer1CompareA => 3,
            InterruptSource::Timer1CompareB => 4,
        }
    }
}

/// Fixed table of handlers, one per [`InterruptSource`]
#[derive(Debug, Clone, Copy, Default)]
pub struct InterruptRegistry {
    handlers: [Option<Handler>; InterruptSource::COUNT],
}

impl InterruptRegistry {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self {
            handlers: [None; InterruptSource::COUNT],
        }
    }

    /// Install a handler, returning the one it replaced
    pub fn register(&mut self, source: InterruptSource, handler: Handler) -> Option<Handler> {
        let previous = self.handlers[source.slot()].replace(handler);

        #[cfg(feature = "defmt")]
        if previous.is_some() {
            defmt::trace!("interrupt: replaced handler for {}", source);
        }

        previous
    }

    /// Remove the handler for a source
    pub fn unregister(&mut self, source: InterruptSource) -> Option<Handler> {
        self.handlers[source.slot()].take()
    }

    /// Current handler for a source
    pub fn handler(&self, source: InterruptSource) -> Option<Handler> {
        self.handlers[source.slot()]
    }

    /// Call the handler for a source
    ///
    /// Returns false if none is registered.
    pub fn dispatch(&self, source: InterruptSource) -> bool {
        match self.handler(source) {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }
}

/// [`InterruptRegistry`] that can live in a `static`
///
/// Every access runs inside a critical section, so registration from the
/// main loop cannot tear against a dispatch from an interrupt.
pub struct SharedRegistry(Mutex<RefCell<InterruptRegistry>>);

impl Default for SharedRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedRegistry {
    /// Create an empty shared registry
    pub const fn new() -> Self {
        Self(Mutex::new(RefCell::new(InterruptRegistry::new())))
    }

    /// Install a handler, returning the one it replaced
    pub fn register(&self, source: InterruptSource, handler: Handler) -> Option<Handler> {
        critical_section::with(|cs| self.0.borrow_ref_mut(cs).register(source, handler))
    }

    /// Remove the handler for a source
    pub fn unregister(&self, source: InterruptSource) -> Option<Handler> {
        critical_section::with(|cs| self.0.borrow_ref_mut(cs).unregister(source))
    }

    /// Current handler for a source
    pub fn handler(&self, source: InterruptSource) -> Option<Handler> {
        critical_section::with(|cs| self.0.borrow_ref(cs).handler(source))
    }

    /// Call the handler for a source
    ///
    /// The handler runs outside the critical section, so it may register
    /// or unregister handlers itself.
    pub fn dispatch(&self, source: InterruptSource) -> bool {
        match self.handler(source) {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }
}

/// Registry used by the timer drivers and the vector shims
pub static VECTORS: SharedRegistry = SharedRegistry::new();
