use std::future::Future;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use onetherm::{DeviceAddress, TemperatureReading, Thermometer, Unit};

use tracing::{info, warn};

use crate::config::{Config, SensorConfig};
use crate::display::Display;
use crate::error::{Error, ErrorKind, Result};

/// A source of temperature readings.
pub trait TemperatureSource {
    /// Error raised by a failed read.
    type Error: std::fmt::Display;

    /// Performs a measurement on the sensor at `address`, or on the only
    /// sensor of the bus when `address` is `None`.
    ///
    /// # Errors
    ///
    /// Fails when the sensor cannot be read.
    fn read(
        &mut self,
        address: Option<&DeviceAddress>,
        unit: Unit,
    ) -> std::result::Result<TemperatureReading, Self::Error>;

    /// Reads the address of the only sensor of the bus.
    ///
    /// # Errors
    ///
    /// Fails when the sensor cannot be read.
    fn read_address(&mut self) -> std::result::Result<DeviceAddress, Self::Error>;
}

impl<P, D> TemperatureSource for Thermometer<P, D>
where
    P: InputPin + OutputPin,
    P::Error: std::fmt::Debug,
    D: DelayNs,
{
    type Error = onetherm::Error<P::Error>;

    fn read(
        &mut self,
        address: Option<&DeviceAddress>,
        unit: Unit,
    ) -> std::result::Result<TemperatureReading, Self::Error> {
        self.read_temperature(address, unit)
    }

    fn read_address(&mut self) -> std::result::Result<DeviceAddress, Self::Error> {
        Thermometer::read_address(self)
    }
}

/// Polls the configured sensors and forwards their readings to a display.
pub struct Monitor<S, D>
where
    S: TemperatureSource,
    D: Display,
{
    source: S,
    display: D,
    unit: Unit,
    interval: Duration,
    sensors: Vec<SensorConfig>,
}

impl<S, D> Monitor<S, D>
where
    S: TemperatureSource,
    D: Display,
{
    /// Creates a [`Monitor`] for the sensors of the given configuration.
    #[must_use]
    pub fn new(source: S, display: D, config: &Config) -> Self {
        Self {
            source,
            display,
            unit: config.unit(),
            interval: config.interval(),
            sensors: config.sensors().to_vec(),
        }
    }

    /// Reads every sensor once, in order, one display row each.
    ///
    /// A failed read is logged, shown on its row and skipped. It is never
    /// retried within the round.
    ///
    /// # Errors
    ///
    /// Fails only if the display cannot be written.
    pub fn poll_once(&mut self) -> Result<Vec<Option<TemperatureReading>>> {
        let mut readings = Vec::with_capacity(self.sensors.len());

        for (sensor, row) in self.sensors.iter().zip(0..=u8::MAX) {
            match self.source.read(sensor.address(), self.unit) {
                Ok(reading) => {
                    self.display.show_reading(row, sensor.name(), &reading)?;
                    readings.push(Some(reading));
                }
                Err(e) => {
                    warn!("Impossible to read `{}`: {e}", sensor.name());
                    self.display
                        .show_error(row, sensor.name(), &e.to_string())?;
                    readings.push(None);
                }
            }
        }

        Ok(readings)
    }

    /// Reads the address of the only sensor of the bus and shows it on the
    /// first row.
    ///
    /// # Errors
    ///
    /// Fails if the sensor cannot be read or the display cannot be written.
    pub fn read_rom(&mut self) -> Result<DeviceAddress> {
        let address = self
            .source
            .read_address()
            .map_err(|e| Error::new(ErrorKind::Sensor, e.to_string()))?;

        info!("Sensor address: {address}");
        self.display.show_address(0, &address)?;

        Ok(address)
    }

    /// Polls the sensors at the configured interval until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Fails if the display cannot be written.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Impossible to listen for Ctrl-C: {e}");
            }
        })
        .await
    }

    /// Polls the sensors at the configured interval until `shutdown`
    /// completes.
    ///
    /// A round is never interrupted: `shutdown` is only observed between
    /// rounds.
    ///
    /// # Errors
    ///
    /// Fails if the display cannot be written.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tokio::pin!(shutdown);

        info!(
            "Polling {} sensor(s) every {} ms",
            self.sensors.len(),
            self.interval.as_millis()
        );

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Monitor stopped");
                    return Ok(());
                }
                _ = interval.tick() => {
                    self.poll_once()?;
                }
            }
        }
    }

    /// Returns the source and the display.
    pub fn into_parts(self) -> (S, D) {
        (self.source, self.display)
    }
}
