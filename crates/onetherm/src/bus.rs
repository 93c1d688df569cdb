//! 1-Wire framing.
//!
//! [`OneWire`] builds the protocol's time slots on top of a [`BusLine`]:
//! the reset/presence handshake, single-bit write and read slots, and bytes
//! made of eight slots sent and received least significant bit first.
//!
//! A byte operation always runs all eight slots. Nothing is recovered from a
//! slot whose timing was disturbed: the bus has to be reset before the next
//! transaction.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::Error;
use crate::timing::BusLine;

/// Duration the master holds the line low to reset the bus.
pub const RESET_LOW_US: u32 = 480;
/// Delay between releasing the reset pulse and sampling the presence pulse.
pub const PRESENCE_SAMPLE_US: u32 = 60;
/// Remainder of the 480 µs presence window after the sample.
pub const PRESENCE_RELEASE_US: u32 = 420;

/// Low pulse opening every read or write slot.
pub const SLOT_INIT_LOW_US: u32 = 1;
/// Duration of a write slot after its opening pulse.
pub const WRITE_SLOT_US: u32 = 60;
/// Delay between the end of the opening pulse and the sample of a read slot.
pub const READ_SAMPLE_US: u32 = 14;
/// Remainder of a read slot after the sample.
pub const READ_RECOVERY_US: u32 = 45;
/// Total duration of a read slot.
pub const READ_SLOT_US: u32 = SLOT_INIT_LOW_US + READ_SAMPLE_US + READ_RECOVERY_US;

/// A bit-banged 1-Wire bus master.
pub struct OneWire<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    line: BusLine<P, D>,
}

impl<P, D> OneWire<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Creates a [`OneWire`] master for the given open-drain pin and delay
    /// provider.
    #[must_use]
    #[inline]
    pub fn new(pin: P, delay: D) -> Self {
        Self {
            line: BusLine::new(pin, delay),
        }
    }

    /// Performs a bus reset and checks for a presence pulse.
    ///
    /// Returns `true` if at least one device pulled the line low during the
    /// presence window. Absence is not an error at this level.
    ///
    /// # Errors
    ///
    /// Returns an error if accessing the GPIO pin fails.
    pub fn reset(&mut self) -> Result<bool, Error<P::Error>> {
        self.line.hold_low(RESET_LOW_US)?;
        self.line.release()?;
        self.line.wait(PRESENCE_SAMPLE_US);

        // Devices answer by pulling the line low.
        let present = !self.line.sample()?;
        self.line.wait(PRESENCE_RELEASE_US);

        Ok(present)
    }

    /// Writes a single bit in one write slot.
    ///
    /// # Errors
    ///
    /// Returns an error if accessing the GPIO pin fails.
    pub fn write_bit(&mut self, bit: bool) -> Result<(), Error<P::Error>> {
        self.line.hold_low(SLOT_INIT_LOW_US)?;
        if bit {
            self.line.release()?;
        }
        self.line.wait(WRITE_SLOT_US);
        self.line.release()?;

        Ok(())
    }

    /// Reads a single bit in one read slot.
    ///
    /// # Errors
    ///
    /// Returns an error if accessing the GPIO pin fails.
    pub fn read_bit(&mut self) -> Result<bool, Error<P::Error>> {
        self.line.hold_low(SLOT_INIT_LOW_US)?;
        self.line.release()?;
        self.line.wait(READ_SAMPLE_US);

        let bit = self.line.sample()?;
        self.line.wait(READ_RECOVERY_US);

        Ok(bit)
    }

    /// Writes a byte, least significant bit first.
    ///
    /// # Errors
    ///
    /// Returns an error if accessing the GPIO pin fails.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), Error<P::Error>> {
        for i in 0..8 {
            self.write_bit((byte >> i) & 1 != 0)?;
        }

        Ok(())
    }

    /// Reads a byte, least significant bit first.
    ///
    /// # Errors
    ///
    /// Returns an error if accessing the GPIO pin fails.
    pub fn read_byte(&mut self) -> Result<u8, Error<P::Error>> {
        let mut byte = 0;

        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }

        Ok(byte)
    }

    /// Writes every byte of `bytes` in order.
    ///
    /// # Errors
    ///
    /// Returns an error if accessing the GPIO pin fails.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error<P::Error>> {
        for &byte in bytes {
            self.write_byte(byte)?;
        }

        Ok(())
    }

    /// Fills `bytes` with bytes read from the bus.
    ///
    /// # Errors
    ///
    /// Returns an error if accessing the GPIO pin fails.
    pub fn read_bytes(&mut self, bytes: &mut [u8]) -> Result<(), Error<P::Error>> {
        for byte in bytes {
            *byte = self.read_byte()?;
        }

        Ok(())
    }

    /// Busy-waits on the bus clock without touching the line.
    #[inline]
    pub fn wait(&mut self, us: u32) {
        self.line.wait(us);
    }

    /// Returns the pin and the delay provider.
    #[must_use]
    #[inline]
    pub fn into_inner(self) -> (P, D) {
        self.line.into_inner()
    }
}
