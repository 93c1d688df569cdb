use std::path::{Path, PathBuf};
use std::time::Duration;

use onetherm::{ConversionConfig, DeviceAddress, Unit};

use serde::Deserialize;

use tracing::info;

use crate::error::{Error, ErrorKind, Result};

// Interval between two polling rounds, in milliseconds.
const DEFAULT_INTERVAL_MS: u64 = 1000;

// Label of the sensor used when none is configured.
const DEFAULT_SENSOR_NAME: &str = "Temp";

/// Maximum number of sensors, one display row each.
pub const MAX_SENSORS: usize = u8::MAX as usize + 1;

/// GPIO line driving the bus.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GpioConfig {
    /// Path of the GPIO character device, e.g. `/dev/gpiochip0`.
    pub chip: PathBuf,
    /// Line offset on the chip.
    pub line: u32,
}

/// A sensor to poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorConfig {
    name: String,
    address: Option<DeviceAddress>,
}

impl SensorConfig {
    /// Creates a [`SensorConfig`].
    ///
    /// A sensor without address is read with a broadcast.
    #[must_use]
    pub fn new(name: impl Into<String>, address: Option<DeviceAddress>) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }

    /// The label shown next to the sensor readings.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The sensor address, `None` for broadcast.
    #[must_use]
    pub const fn address(&self) -> Option<&DeviceAddress> {
        self.address.as_ref()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSensor {
    name: String,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    gpio: GpioConfig,
    #[serde(default)]
    unit: Unit,
    #[serde(default = "default_interval_ms")]
    interval_ms: u64,
    #[serde(default)]
    conversion: ConversionConfig,
    #[serde(default)]
    sensors: Vec<RawSensor>,
}

const fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

/// Monitor configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    gpio: GpioConfig,
    unit: Unit,
    interval: Duration,
    conversion: ConversionConfig,
    sensors: Vec<SensorConfig>,
}

impl Config {
    /// Loads the configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not valid JSON or holds an
    /// invalid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::new(
                ErrorKind::Config,
                format!("Impossible to read `{}`: {e}", path.display()),
            )
        })?;

        let config = Self::from_json(&content)?;
        info!("Configuration loaded from `{}`", path.display());

        Ok(config)
    }

    /// Parses the configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Fails if the string is not valid JSON, a sensor address is malformed,
    /// more than one sensor has no address, more than [`MAX_SENSORS`] sensors
    /// are listed or the interval is zero.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(json)?;

        if raw.interval_ms == 0 {
            return Err(Error::new(
                ErrorKind::Config,
                "The polling interval must be greater than zero",
            ));
        }

        if raw.sensors.len() > MAX_SENSORS {
            return Err(Error::new(
                ErrorKind::Config,
                format!("At most {MAX_SENSORS} sensors can be polled"),
            ));
        }

        let mut sensors = Vec::with_capacity(raw.sensors.len().max(1));
        for sensor in raw.sensors {
            let address = sensor
                .address
                .as_deref()
                .map(str::parse::<DeviceAddress>)
                .transpose()?;
            sensors.push(SensorConfig::new(sensor.name, address));
        }

        // A broadcast read only makes sense with a single device answering.
        if sensors.iter().filter(|s| s.address.is_none()).count() > 1 {
            return Err(Error::new(
                ErrorKind::Config,
                "At most one sensor can be read without an address",
            ));
        }

        if sensors.is_empty() {
            sensors.push(SensorConfig::new(DEFAULT_SENSOR_NAME, None));
        }

        Ok(Self {
            gpio: raw.gpio,
            unit: raw.unit,
            interval: Duration::from_millis(raw.interval_ms),
            conversion: raw.conversion,
            sensors,
        })
    }

    /// The GPIO line driving the bus.
    #[must_use]
    pub const fn gpio(&self) -> &GpioConfig {
        &self.gpio
    }

    /// The unit readings are decoded into.
    #[must_use]
    pub const fn unit(&self) -> Unit {
        self.unit
    }

    /// Time between two polling rounds.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Conversion poll bounds.
    #[must_use]
    pub const fn conversion(&self) -> ConversionConfig {
        self.conversion
    }

    /// Sensors to poll, in display order.
    #[must_use]
    pub fn sensors(&self) -> &[SensorConfig] {
        &self.sensors
    }
}
