//! # DS18B20 conversion protocol
//!
//! A temperature read is made of two transactions, each opened by its own
//! reset and ROM command since the sensor forgets the selection between them:
//!
//! 1. `Convert T`: the sensor starts a conversion and keeps answering read
//!    slots with `0` until it is done. The driver polls those slots up to a
//!    configurable bound.
//! 2. `Read Scratchpad`: the driver reads the two temperature bytes and stops
//!    there. The remaining scratchpad bytes, CRC included, are never read;
//!    the next reset terminates the transfer.
//!
//! Pass `None` as address when exactly one sensor is on the bus, or the
//! sensor's [`DeviceAddress`] to talk to one sensor among several.
//!
//! For detailed specifications, refer to the
//! [datasheet](https://www.alldatasheet.com/datasheet-pdf/pdf/58557/DALLAS/DS18B20.html).

use core::result::Result;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use log::{debug, warn};

use crate::bus::{OneWire, READ_SLOT_US};
use crate::error::Error;
use crate::rom::DeviceAddress;
use crate::temperature::{ScratchBytes, TemperatureReading, Unit};

// Maximum conversion time at 12-bit resolution.
const CONVERSION_TIMEOUT_US: u32 = 750_000;

// Time between the starts of two completion polls.
const POLL_PERIOD_US: u32 = 1_000;

/// Commands addressed to the selected sensor after a ROM command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FunctionCommand {
    /// Starts a temperature conversion. The sensor answers read slots with
    /// `0` while converting and `1` once done.
    ConvertT = 0x44,
    /// Reads the scratchpad, starting from the temperature LSB. The master
    /// may stop after any byte by issuing a reset.
    ReadScratchpad = 0xBE,
    /// Writes the alarm thresholds and the configuration register.
    ///
    /// Part of the command set, never issued by this driver.
    WriteScratchpad = 0x4E,
    /// Copies the alarm thresholds and configuration to EEPROM.
    ///
    /// Part of the command set, never issued by this driver.
    CopyScratchpad = 0x48,
    /// Asks whether any sensor runs on parasite power.
    ///
    /// Part of the command set, never issued by this driver.
    ReadPowerSupply = 0xB4,
}

impl From<FunctionCommand> for u8 {
    fn from(command: FunctionCommand) -> Self {
        command as u8
    }
}

/// Bounds of the conversion completion poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ConversionConfig {
    timeout_us: u32,
    poll_period_us: u32,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionConfig {
    /// Creates a [`ConversionConfig`] polling every millisecond for at most
    /// 750 ms, the 12-bit conversion time.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout_us: CONVERSION_TIMEOUT_US,
            poll_period_us: POLL_PERIOD_US,
        }
    }

    /// Sets the poll bound in microseconds.
    #[must_use]
    pub const fn timeout_us(mut self, timeout_us: u32) -> Self {
        self.timeout_us = timeout_us;
        self
    }

    /// Sets the time between the starts of two polls in microseconds.
    ///
    /// A poll is one read slot, so the period is never shorter than
    /// [`READ_SLOT_US`].
    #[must_use]
    pub const fn poll_period_us(mut self, poll_period_us: u32) -> Self {
        self.poll_period_us = poll_period_us;
        self
    }

    /// The poll bound in microseconds.
    #[must_use]
    pub const fn timeout(&self) -> u32 {
        self.timeout_us
    }

    /// The effective poll period in microseconds.
    #[must_use]
    pub const fn period(&self) -> u32 {
        if self.poll_period_us < READ_SLOT_US {
            READ_SLOT_US
        } else {
            self.poll_period_us
        }
    }
}

/// The `DS18B20` driver.
pub struct Thermometer<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    bus: OneWire<P, D>,
    config: ConversionConfig,
}

impl<P, D> Thermometer<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Creates a [`Thermometer`] driver for the given pin and delay provider.
    #[must_use]
    pub fn new(pin: P, delay: D) -> Self {
        Self {
            bus: OneWire::new(pin, delay),
            config: ConversionConfig::new(),
        }
    }

    /// Sets the conversion poll bounds.
    #[must_use]
    pub fn config(mut self, config: ConversionConfig) -> Self {
        self.config = config;
        self
    }

    /// Performs a full temperature measurement and decodes it into `unit`.
    ///
    /// # Notes
    ///
    /// After a power-on reset the temperature register holds **85.0 °C**
    /// until the first conversion completes.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    ///
    /// - Communication with the sensor fails
    /// - No device responds on the bus
    /// - The conversion does not complete within the configured bound
    pub fn read_temperature(
        &mut self,
        address: Option<&DeviceAddress>,
        unit: Unit,
    ) -> Result<TemperatureReading, Error<P::Error>> {
        let bytes = self.read_raw(address)?;
        Ok(TemperatureReading::decode(bytes, unit))
    }

    /// Performs a full temperature measurement and returns the raw register.
    ///
    /// # Errors
    ///
    /// Same as [`Thermometer::read_temperature`].
    pub fn read_raw(
        &mut self,
        address: Option<&DeviceAddress>,
    ) -> Result<ScratchBytes, Error<P::Error>> {
        self.start_conversion(address)?;
        self.wait_for_conversion()?;
        let bytes = self.read_temperature_register(address)?;

        debug!(
            "Temperature register: [{:#04x}, {:#04x}]",
            bytes.lsb(),
            bytes.msb()
        );

        Ok(bytes)
    }

    /// Resets the bus, selects the sensor and starts a conversion.
    ///
    /// # Errors
    ///
    /// Returns an error if accessing the GPIO pin fails or no device answers
    /// the reset.
    pub fn start_conversion(
        &mut self,
        address: Option<&DeviceAddress>,
    ) -> Result<(), Error<P::Error>> {
        self.select(address)?;
        self.bus.write_byte(FunctionCommand::ConvertT.into())
    }

    /// Polls read slots until the sensor reports the end of the conversion.
    ///
    /// Polls start one period apart. The wait after the last poll is
    /// shortened so the call never outlasts the configured bound, and no
    /// poll is started if its read slot would cross it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConversionTimeout`] once the configured bound has
    /// elapsed, or an error if accessing the GPIO pin fails.
    pub fn wait_for_conversion(&mut self) -> Result<(), Error<P::Error>> {
        let timeout = self.config.timeout();
        let pause = self.config.period() - READ_SLOT_US;
        let mut waited = 0u32;

        // waited <= timeout
        loop {
            let remaining = timeout - waited;
            if remaining < READ_SLOT_US {
                self.bus.wait(remaining);
                warn!("Conversion still running after {timeout} us");
                return Err(Error::ConversionTimeout);
            }

            if self.bus.read_bit()? {
                return Ok(());
            }
            waited += READ_SLOT_US;

            let wait = pause.min(timeout - waited);
            self.bus.wait(wait);
            waited += wait;
        }
    }

    /// Resets the bus, selects the sensor and reads the two temperature
    /// bytes of its scratchpad.
    ///
    /// # Errors
    ///
    /// Returns an error if accessing the GPIO pin fails or no device answers
    /// the reset.
    pub fn read_temperature_register(
        &mut self,
        address: Option<&DeviceAddress>,
    ) -> Result<ScratchBytes, Error<P::Error>> {
        self.select(address)?;
        self.bus.write_byte(FunctionCommand::ReadScratchpad.into())?;

        let lsb = self.bus.read_byte()?;
        let msb = self.bus.read_byte()?;

        Ok(ScratchBytes::new(lsb, msb))
    }

    /// Reads the address of the only sensor on the bus.
    ///
    /// # Errors
    ///
    /// Returns an error if accessing the GPIO pin fails or no device answers
    /// the reset.
    pub fn read_address(&mut self) -> Result<DeviceAddress, Error<P::Error>> {
        self.bus.read_rom()?.ok_or(Error::NoPresence)
    }

    /// Returns the pin and the delay provider.
    #[must_use]
    #[inline]
    pub fn into_inner(self) -> (P, D) {
        self.bus.into_inner()
    }

    fn select(&mut self, address: Option<&DeviceAddress>) -> Result<(), Error<P::Error>> {
        if !self.bus.reset()? {
            debug!("No presence pulse after reset");
            return Err(Error::NoPresence);
        }
        self.bus.select(address)
    }
}
