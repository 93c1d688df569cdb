//! Host-side monitor for DS18B20 sensors on a bit-banged Linux GPIO line.
//!
//! The monitor reads its sensors from a JSON [`Config`], polls them through
//! an [`onetherm::Thermometer`] at a fixed interval and shows each reading on
//! a row of a [`Display`].
//!
//! A failed read is logged and shown in place of the reading, then the next
//! sensor is read. Nothing is retried until the next round.

#![deny(unsafe_code)]
#![deny(missing_docs)]

/// Monitor configuration.
pub mod config;
pub mod display;
/// Error management.
pub mod error;
/// The polling loop and the sources it reads from.
pub mod monitor;
pub mod platform;

pub use config::{Config, GpioConfig, SensorConfig};
pub use display::{Display, TextDisplay};
pub use error::{Error, ErrorKind, Result};
pub use monitor::{Monitor, TemperatureSource};
pub use platform::{SpinDelay, open_pin};
