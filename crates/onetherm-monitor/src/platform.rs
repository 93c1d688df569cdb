//! Linux GPIO and timing.

use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

use gpio_cdev::{Chip, LineRequestFlags};

use linux_embedded_hal::CdevPin;

use tracing::info;

use crate::config::GpioConfig;
use crate::error::{Error, ErrorKind, Result};

// Label attached to the requested GPIO line.
const CONSUMER: &str = "onetherm";

/// A [`DelayNs`] busy-waiting on the monotonic clock.
///
/// Sleeping gives no guarantee below the scheduler granularity, far coarser
/// than the microsecond slots of the bus.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinDelay;

impl DelayNs for SpinDelay {
    fn delay_ns(&mut self, ns: u32) {
        let deadline = Instant::now() + Duration::from_nanos(u64::from(ns));
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
    }
}

/// Requests the configured line as an open-drain output, released high.
///
/// # Errors
///
/// Fails if the chip cannot be opened or the line cannot be requested.
pub fn open_pin(config: &GpioConfig) -> Result<CdevPin> {
    let mut chip = Chip::new(&config.chip)?;
    let handle = chip.get_line(config.line)?.request(
        LineRequestFlags::OUTPUT | LineRequestFlags::OPEN_DRAIN,
        1,
        CONSUMER,
    )?;

    let pin = CdevPin::new(handle).map_err(|e| {
        Error::new(
            ErrorKind::Gpio,
            format!("Impossible to use line {}: {e}", config.line),
        )
    })?;

    info!(
        "Bus on line {} of `{}`",
        config.line,
        config.chip.display()
    );

    Ok(pin)
}
