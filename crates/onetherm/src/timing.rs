//! Line-level primitives.
//!
//! A [`BusLine`] owns the open-drain pin and the delay provider. It knows
//! nothing about the protocol: it only drives the line low, releases it to the
//! external pull-up, samples it and waits. Every wait is a busy-wait through
//! [`DelayNs`], so the accuracy of the bus depends entirely on the accuracy of
//! the delay provider.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// The single shared 1-Wire line.
pub struct BusLine<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pin: P,
    delay: D,
}

impl<P, D> BusLine<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Creates a [`BusLine`] from an open-drain pin and a delay provider.
    #[must_use]
    #[inline]
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Drives the line low and keeps it there for `us` microseconds.
    ///
    /// # Errors
    ///
    /// Returns the pin error if the line cannot be driven low.
    #[inline]
    pub fn hold_low(&mut self, us: u32) -> Result<(), P::Error> {
        self.pin.set_low()?;
        self.delay.delay_us(us);
        Ok(())
    }

    /// Stops driving the line, letting the pull-up (or a device) set its level.
    ///
    /// # Errors
    ///
    /// Returns the pin error if the line cannot be released.
    #[inline]
    pub fn release(&mut self) -> Result<(), P::Error> {
        self.pin.set_high()
    }

    /// Samples the line, returning `true` if it is high.
    ///
    /// # Errors
    ///
    /// Returns the pin error if the line cannot be read.
    #[inline]
    pub fn sample(&mut self) -> Result<bool, P::Error> {
        self.pin.is_high()
    }

    /// Busy-waits for `us` microseconds without touching the line.
    #[inline]
    pub fn wait(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    /// Returns the pin and the delay provider.
    #[must_use]
    #[inline]
    pub fn into_inner(self) -> (P, D) {
        (self.pin, self.delay)
    }
}
