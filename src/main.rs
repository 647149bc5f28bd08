use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tempstream_lib::RegisterBus;
use tempstream_lib::constants::*;
use tempstream_lib::probe::{ReadbackOutcome, read_register, readback_test, reset_device};
use tempstream_lib::sensor::SensorFamily;
use tempstream_lib::sim::SimulatedSensor;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Register-level bring-up probe for the temperature sensors.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Sensor on the bus: max30205 or ad5933
    #[arg(short, long, default_value = "ad5933")]
    family: SensorFamily,
    /// Temperature the simulated sensor reports
    #[arg(short, long, default_value_t = 25.0)]
    celsius: f32,
    #[command(subcommand)]
    command: Option<Command>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Software reset through the control-low register
    Reset,
    /// Read one register
    Read {
        /// Register address, e.g. 0x8f
        #[arg(value_parser = parse_reg)]
        reg: u8,
    },
    /// Read `len` consecutive registers in one transaction
    Dump {
        #[arg(value_parser = parse_reg)]
        reg: u8,
        #[arg(default_value_t = 2)]
        len: usize,
    },
    /// Write a pattern to the start-frequency register and read it back
    Readback {
        #[arg(value_parser = parse_reg, default_value = "0x55")]
        value: u8,
    },
    /// Reset, then read the status and temperature registers
    All,
}

fn parse_reg(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid register value '{s}': {e}"))
}

fn setup_logging(verbosity: &Verbosity<InfoLevel>) {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .without_time();

    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry().with(filter).with(console_layer).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.verbose);

    let family = cli.family;
    let mut bus = SimulatedSensor::with_temperature(family, cli.celsius);
    info!(%family, "Starting register probe");

    if let Err(e) = run(&mut bus, family, cli.command.unwrap_or(Command::All)).await {
        error!("Probe failed: {:?}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(bus: &mut SimulatedSensor, family: SensorFamily, command: Command) -> Result<()> {
    match command {
        Command::Reset => {
            require_ad5933(family, "reset")?;
            reset_device(bus).await.context("Failed to write reset command")?;
        }
        Command::Read { reg } => {
            let value = read_register(bus, reg)
                .await
                .with_context(|| format!("Failed to read register {reg:#04x}"))?;
            println!("Register {reg:#04x}: {value:#04x}");
        }
        Command::Dump { reg, len } => {
            let data = bus
                .read_after_write(reg, len)
                .await
                .with_context(|| format!("Failed to read {len} bytes from {reg:#04x}"))?;
            println!("{reg:#04x}: {}", hex::encode(&data));
        }
        Command::Readback { value } => {
            require_ad5933(family, "readback")?;
            match readback_test(bus, value).await.context("Read-back test failed")? {
                ReadbackOutcome::Passed => println!("Write/read test passed: wrote {value:#04x}"),
                ReadbackOutcome::Mismatch { wrote, read } => {
                    bail!("Values don't match: wrote {wrote:#04x}, read back {read:#04x}")
                }
            }
        }
        Command::All => match family {
            SensorFamily::Ad5933 => {
                reset_device(bus).await.context("Failed to write reset command")?;
                let status = read_register(bus, AD5933_STATUS_REG)
                    .await
                    .context("Failed to read status register")?;
                println!("Status register: {status:#04x}");
                let temp = read_register(bus, AD5933_TEMP_HIGH_REG)
                    .await
                    .context("Failed to read temperature register")?;
                println!("Temperature register: {temp:#04x}");
            }
            SensorFamily::Max30205 => {
                let data = bus
                    .read_after_write(MAX30205_TEMP_REG, 2)
                    .await
                    .context("Failed to read temperature register")?;
                println!("Temperature registers: {}", hex::encode(&data));
                let config = read_register(bus, MAX30205_CONFIG_REG)
                    .await
                    .context("Failed to read configuration register")?;
                println!("Configuration register: {config:#04x}");
            }
        },
    }
    Ok(())
}

fn require_ad5933(family: SensorFamily, what: &str) -> Result<()> {
    if family != SensorFamily::Ad5933 {
        bail!("{what} is only supported on the AD5933");
    }
    Ok(())
}
