//! Output of the monitor readings.
//!
//! A [`Display`] receives one update per call, tagged with the row of a
//! small character screen it belongs to. A screen-backed implementation
//! overwrites that row; [`TextDisplay`] appends one line per update and
//! only logs the row. A display never talks back to the sensors.

use std::io::Write;

use onetherm::{DeviceAddress, TemperatureReading};

use tracing::debug;

use crate::error::Result;

/// A row-addressed output for readings and addresses.
pub trait Display {
    /// Shows a reading, e.g. `Temp1 = 77.0 F`.
    ///
    /// # Errors
    ///
    /// Fails if the output cannot be written.
    fn show_reading(&mut self, row: u8, label: &str, reading: &TemperatureReading) -> Result<()>;

    /// Shows a sensor address, e.g. `ID (ROM): 28E121A30200005B`.
    ///
    /// # Errors
    ///
    /// Fails if the output cannot be written.
    fn show_address(&mut self, row: u8, address: &DeviceAddress) -> Result<()>;

    /// Shows a failed read.
    ///
    /// # Errors
    ///
    /// Fails if the output cannot be written.
    fn show_error(&mut self, row: u8, label: &str, error: &str) -> Result<()>;
}

/// A [`Display`] appending one line of text per call.
///
/// Rows are not addressed: two updates of the same row produce two lines.
pub struct TextDisplay<W: Write> {
    writer: W,
}

impl<W: Write> TextDisplay<W> {
    /// Creates a [`TextDisplay`] on top of a writer.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn line(&mut self, row: u8, args: std::fmt::Arguments<'_>) -> Result<()> {
        debug!(row, "Display update");
        self.writer.write_fmt(args)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> Display for TextDisplay<W> {
    fn show_reading(&mut self, row: u8, label: &str, reading: &TemperatureReading) -> Result<()> {
        self.line(
            row,
            format_args!("{label} = {reading} {}", reading.unit().symbol()),
        )
    }

    fn show_address(&mut self, row: u8, address: &DeviceAddress) -> Result<()> {
        self.line(row, format_args!("ID (ROM): {address}"))
    }

    fn show_error(&mut self, row: u8, label: &str, error: &str) -> Result<()> {
        self.line(row, format_args!("{label} = -- ({error})"))
    }
}
