//! Errors raised by the driver.

use core::fmt;

/// Errors that may occur when talking to a sensor on the 1-Wire bus.
///
/// Two failure modes of the bus are not represented here because the
/// protocol gives no way to observe them without a CRC check: responses from
/// several devices colliding after a broadcast, and bit errors corrupting the
/// temperature register. Both produce a wrong but well-formed reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Error related to GPIO pin I/O operations.
    Pin(E),
    /// No presence pulse detected after a reset, no sensor on the bus.
    NoPresence,
    /// The sensor did not report the end of a conversion within the
    /// configured bound.
    ConversionTimeout,
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Pin(e)
    }
}

impl<E> Error<E> {
    pub(crate) const fn description(&self) -> &'static str {
        match self {
            Self::Pin(_) => "Pin",
            Self::NoPresence => "No Presence",
            Self::ConversionTimeout => "Conversion Timeout",
        }
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin(e) => write!(f, "{}: {e:?}", self.description()),
            Self::NoPresence => write!(f, "{}: no device answered the reset pulse", self.description()),
            Self::ConversionTimeout => write!(
                f,
                "{}: the sensor is still converting after the configured bound",
                self.description()
            ),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}
