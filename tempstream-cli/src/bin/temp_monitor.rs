use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tempstream_lib::acquisition::Acquisition;
use tempstream_lib::config::StreamConfig;
use tempstream_lib::sensor::SensorFamily;
use tempstream_lib::sim::{FaultMode, SimulatedSensor};
use tokio::time::interval;
use tracing::{info, warn};
use uom::si::thermodynamic_temperature::degree_fahrenheit;

#[derive(Parser, Debug)]
#[command(author, version, about = "Log temperature readings from a sensor at a fixed interval")]
struct Args {
    /// Sensor family: max30205 or ad5933
    #[arg(short, long)]
    family: Option<SensorFamily>,

    /// Number of readings to take (default: until interrupted)
    #[arg(short, long)]
    samples: Option<u64>,

    /// Interval between readings in milliseconds (default: the configured period)
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Temperature the simulated sensor reports
    #[arg(short, long, default_value_t = 36.6)]
    celsius: f32,

    /// Make the simulated conversion never finish, to exercise the poll timeout
    #[arg(long)]
    never_ready: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    let mut config = match &args.config {
        Some(path) => StreamConfig::load(path).with_context(|| format!("Failed to load config from {path:?}"))?,
        None => StreamConfig::default(),
    };
    if let Some(family) = args.family {
        config.family = family;
    }
    let period = args.interval_ms.map(Duration::from_millis).unwrap_or(config.period());
    anyhow::ensure!(!period.is_zero(), "Interval must be greater than zero");

    let sensor = SimulatedSensor::with_temperature(config.family, args.celsius);
    if args.never_ready {
        sensor.set_fault(FaultMode::NeverReady);
    }
    let mut acquisition = Acquisition::new(sensor, config.family, config.poll);

    info!(family = %config.family, period_ms = period.as_millis() as u64, "Starting temperature monitor");
    match args.samples {
        Some(n) => info!("Will take {} readings", n),
        None => info!("Reading until interrupted (Ctrl+C)"),
    }

    let mut timer = interval(period);
    let mut taken = 0u64;
    let mut failures = 0u64;

    loop {
        tokio::select! {
            _ = timer.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }

        match acquisition.acquire().await {
            Ok(raw) => {
                let measurement = config.family.decode(raw);
                let fahrenheit = measurement.as_temperature().get::<degree_fahrenheit>();
                println!("{:>5}  raw {}  {}  ({:.2} °F)", taken + 1, raw, measurement, fahrenheit);
            }
            Err(e) => {
                failures += 1;
                warn!("Failed to read temperature: {}", e);
            }
        }

        taken += 1;
        if args.samples.is_some_and(|n| taken >= n) {
            break;
        }
    }

    info!(taken, failures, "Monitor finished");
    Ok(())
}
