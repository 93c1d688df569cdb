//! Device addresses and ROM commands.
//!
//! Every transaction starts with a ROM command right after the reset pulse.
//! It either addresses every device on the bus at once
//! ([`RomCommand::SkipRom`]), one device by its 64-bit address
//! ([`RomCommand::MatchRom`]), or asks the only device on the bus for its
//! address ([`RomCommand::ReadRom`]).

use core::fmt;
use core::str::FromStr;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::bus::OneWire;
use crate::error::Error;

/// Number of bytes in a device address.
pub const ADDRESS_LEN: usize = 8;

/// Administrative commands selecting which devices answer the next
/// function command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RomCommand {
    /// Walks the address space of every device on the bus.
    ///
    /// Part of the command set, never issued by this driver.
    SearchRom = 0xF0,
    /// Reads the 64-bit address of the device.
    ///
    /// Only possible when there is a single device on the bus.
    ReadRom = 0x33,
    /// Selects a specific device by its 64-bit address.
    ///
    /// Only the selected device answers the subsequent function command.
    MatchRom = 0x55,
    /// Addresses all devices simultaneously.
    ///
    /// Reading data back after this command is only meaningful when exactly
    /// one device is on the bus: answers from several devices collide without
    /// any way to detect it.
    SkipRom = 0xCC,
    /// Like [`RomCommand::SearchRom`], restricted to devices in alarm.
    ///
    /// Part of the command set, never issued by this driver.
    AlarmSearch = 0xEC,
}

impl From<RomCommand> for u8 {
    fn from(command: RomCommand) -> Self {
        command as u8
    }
}

/// The 64-bit address of a device.
///
/// Byte 0 is the family code, bytes 1 to 6 the serial number, byte 7 a check
/// byte. The address is sent on the bus byte by byte in this order. The check
/// byte is carried as is and never validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceAddress([u8; ADDRESS_LEN]);

impl DeviceAddress {
    /// Creates a [`DeviceAddress`] from its bytes in bus order.
    #[must_use]
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the address bytes in bus order.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Returns the family code, `0x28` for a `DS18B20`.
    #[must_use]
    pub const fn family_code(&self) -> u8 {
        self.0[0]
    }

    /// Returns the 48-bit serial number.
    #[must_use]
    pub const fn serial_number(&self) -> u64 {
        let b = &self.0;
        u64::from_le_bytes([b[1], b[2], b[3], b[4], b[5], b[6], 0, 0])
    }

    /// Returns the check byte.
    #[must_use]
    pub const fn check_byte(&self) -> u8 {
        self.0[7]
    }
}

impl From<[u8; ADDRESS_LEN]> for DeviceAddress {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// Errors raised while parsing a [`DeviceAddress`] from text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressParseError {
    /// The text does not hold exactly 16 hexadecimal digits.
    InvalidLength,
    /// The text holds a character that is neither a hexadecimal digit nor a
    /// separator.
    InvalidDigit(char),
}

impl fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength => f.write_str("an address needs exactly 16 hexadecimal digits"),
            Self::InvalidDigit(c) => write!(f, "invalid character `{c}` in address"),
        }
    }
}

impl core::error::Error for AddressParseError {}

impl FromStr for DeviceAddress {
    type Err = AddressParseError;

    /// Parses 16 hexadecimal digits in bus order, e.g. `28E121A30200005B`.
    ///
    /// `:`, `-`, `_` and spaces between digits are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; ADDRESS_LEN];
        let mut digits = 0;

        for c in s.trim().chars() {
            if matches!(c, ':' | '-' | '_' | ' ') {
                continue;
            }
            let nibble = c
                .to_digit(16)
                .ok_or(AddressParseError::InvalidDigit(c))? as u8;
            if digits == ADDRESS_LEN * 2 {
                return Err(AddressParseError::InvalidLength);
            }
            bytes[digits / 2] = (bytes[digits / 2] << 4) | nibble;
            digits += 1;
        }

        if digits != ADDRESS_LEN * 2 {
            return Err(AddressParseError::InvalidLength);
        }

        Ok(Self(bytes))
    }
}

impl<P, D> OneWire<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Addresses every device on the bus.
    ///
    /// Must directly follow a reset.
    ///
    /// # Errors
    ///
    /// Returns an error if accessing the GPIO pin fails.
    #[inline]
    pub fn skip_rom(&mut self) -> Result<(), Error<P::Error>> {
        self.write_byte(RomCommand::SkipRom.into())
    }

    /// Addresses the device with the given address. All others wait for the
    /// next reset.
    ///
    /// Must directly follow a reset.
    ///
    /// # Errors
    ///
    /// Returns an error if accessing the GPIO pin fails.
    pub fn match_rom(&mut self, address: &DeviceAddress) -> Result<(), Error<P::Error>> {
        self.write_byte(RomCommand::MatchRom.into())?;
        self.write_bytes(address.as_bytes())
    }

    /// Addresses one device when `address` is given, every device otherwise.
    ///
    /// Must directly follow a reset.
    ///
    /// # Errors
    ///
    /// Returns an error if accessing the GPIO pin fails.
    pub fn select(&mut self, address: Option<&DeviceAddress>) -> Result<(), Error<P::Error>> {
        match address {
            Some(address) => self.match_rom(address),
            None => self.skip_rom(),
        }
    }

    /// Resets the bus and reads the address of the only device on it.
    ///
    /// Returns `None` if no device answered the reset. With more than one
    /// device on the bus the answer is the bitwise AND of all addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if accessing the GPIO pin fails.
    pub fn read_rom(&mut self) -> Result<Option<DeviceAddress>, Error<P::Error>> {
        if !self.reset()? {
            return Ok(None);
        }

        self.write_byte(RomCommand::ReadRom.into())?;
        let mut bytes = [0u8; ADDRESS_LEN];
        self.read_bytes(&mut bytes)?;

        Ok(Some(DeviceAddress(bytes)))
    }
}
