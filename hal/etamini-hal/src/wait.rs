//! Completion-flag polling
//!
//! Every blocking peripheral operation on the ATmega32 ends with "spin until
//! the hardware sets a flag". Drivers hand that loop to a [`Wait`] strategy
//! instead of writing it inline, so the host tests can bound it.

use core::convert::Infallible;

/// Strategy for waiting on a hardware completion flag
pub trait Wait {
    /// Error returned when the strategy gives up
    type Error;

    /// Block until `ready` returns true
    fn wait_until<F>(&mut self, ready: F) -> Result<(), Self::Error>
    where
        F: FnMut() -> bool;
}

/// Spin forever until the condition holds
///
/// This is the hardware behaviour: there is no timeout, and a peripheral
/// that never completes hangs the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Spin;

impl Wait for Spin {
    type Error = Infallible;

    fn wait_until<F>(&mut self, mut ready: F) -> Result<(), Self::Error>
    where
        F: FnMut() -> bool,
    {
        while !ready() {
            core::hint::spin_loop();
        }
        Ok(())
    }
}

/// The poll budget of a [`BoundedSpin`] ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimedOut;

/// Spin until the condition holds or the poll budget is exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoundedSpin {
    max_polls: u32,
}

impl BoundedSpin {
    /// Create a strategy that polls at most `max_polls` times per wait
    pub const fn new(max_polls: u32) -> Self {
        Self { max_polls }
    }

    /// Poll budget per wait
    pub const fn max_polls(&self) -> u32 {
        self.max_polls
    }
}

impl Wait for BoundedSpin {
    type Error = TimedOut;

    fn wait_until<F>(&mut self, mut ready: F) -> Result<(), Self::Error>
    where
        F: FnMut() -> bool,
    {
        for _ in 0..self.max_polls {
            if ready() {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(TimedOut)
    }
}

impl<T: Wait + ?Sized> Wait for &mut T {
    type Error = T::Error;

    fn wait_until<F>(&mut self, ready: F) -> Result<(), Self::Error>
    where
        F: FnMut() -> bool,
    {
        (**self).wait_until(ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spin_returns_once_ready() {
        let mut polls = 0;
        let result = Spin.wait_until(|| {
            polls += 1;
            polls == 5
        });

        assert_eq!(result, Ok(()));
        assert_eq!(polls, 5);
    }

    #[test]
    fn test_bounded_spin_ready_immediately() {
        let mut wait = BoundedSpin::new(1);
        assert_eq!(wait.wait_until(|| true), Ok(()));
    }

    #[test]
    fn test_bounded_spin_times_out() {
        let mut polls = 0;
        let mut wait = BoundedSpin::new(10);
        let result = wait.wait_until(|| {
            polls += 1;
            false
        });

        assert_eq!(result, Err(TimedOut));
        assert_eq!(polls, 10);
    }

    #[test]
    fn test_zero_budget_never_polls() {
        let mut polls = 0;
        let mut wait = BoundedSpin::new(0);
        let result = wait.wait_until(|| {
            polls += 1;
            true
        });

        assert_eq!(result, Err(TimedOut));
        assert_eq!(polls, 0);
    }
}
