//! # onetherm
//!
//! A synchronous, architecture-agnostic driver for `DS18B20`-style digital
//! temperature sensors attached to a single shared 1-Wire line.
//!
//! The driver bit-bangs the bus through one open-drain pin implementing both
//! [`InputPin`](embedded_hal::digital::InputPin) and
//! [`OutputPin`](embedded_hal::digital::OutputPin), and a
//! [`DelayNs`](embedded_hal::delay::DelayNs) provider. It is synchronous to
//! meet the bus's strict timing requirements: interrupts should be masked by
//! the caller for the duration of a transaction.
//!
//! The crate is layered leaf-first:
//!
//! - [`timing`]: drive-low, release and sample primitives on the line.
//! - [`bus`]: reset/presence handshake and bit/byte time slots.
//! - [`rom`]: device addresses and the broadcast/unicast ROM commands.
//! - [`thermometer`]: the two-phase conversion and scratchpad exchange.
//! - [`temperature`]: decoding of the raw register into whole and fractional
//!   parts in Celsius or Fahrenheit.
//!
//! ```ignore
//! let mut thermometer = Thermometer::new(pin, delay);
//! let reading = thermometer.read_temperature(None, Unit::Celsius)?;
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub mod bus;
pub mod error;
pub mod rom;
pub mod temperature;
pub mod thermometer;
pub mod timing;

#[cfg(test)]
pub(crate) mod sim;

pub use bus::OneWire;
pub use error::Error;
pub use rom::{AddressParseError, DeviceAddress, RomCommand};
pub use temperature::{ScratchBytes, TemperatureReading, Unit};
pub use thermometer::{ConversionConfig, FunctionCommand, Thermometer};
