use std::path::PathBuf;

use clap::Parser;

use onetherm::Thermometer;

use onetherm_monitor::{Config, Monitor, Result, SpinDelay, TextDisplay, open_pin};

use tracing::Level;

/// Polls DS18B20 sensors on a Linux GPIO line.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path of the JSON configuration file.
    config: PathBuf,
    /// Read the address of the only sensor on the bus and exit.
    #[arg(long, default_value_t = false)]
    rom: bool,
    /// Log level.
    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber. Records of the `log` facade are
    // forwarded to it.
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let config = Config::load(&args.config)?;

    let pin = open_pin(config.gpio())?;
    let thermometer = Thermometer::new(pin, SpinDelay).config(config.conversion());

    let mut monitor = Monitor::new(thermometer, TextDisplay::new(std::io::stdout()), &config);

    if args.rom {
        monitor.read_rom()?;
        return Ok(());
    }

    monitor.run().await
}
