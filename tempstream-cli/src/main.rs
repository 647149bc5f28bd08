use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tempstream_lib::codec::NotificationPayload;
use tempstream_lib::config::StreamConfig;
use tempstream_lib::connection::{DisconnectReason, PeerHandle};
use tempstream_lib::constants::{ADVERTISING_UUID, CCC_NOTIFY, SERVICE_UUID};
use tempstream_lib::gatt::{format_uuid, temperature_service};
use tempstream_lib::sensor::SensorFamily;
use tempstream_lib::sim::SimulatedSensor;
use tempstream_lib::{ChannelNotifier, EventSink, PeripheralEvent, Streamer};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Run a temperature streaming session against a simulated sensor, with a
/// scripted BLE peer subscribing and toggling the stream.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Sensor family: max30205 or ad5933
    #[arg(short, long)]
    family: Option<SensorFamily>,

    /// How long the peer keeps streaming, in seconds
    #[arg(short, long, default_value_t = 5)]
    duration: u64,

    /// Starting temperature of the simulated sensor
    #[arg(short, long, default_value_t = 25.0)]
    celsius: f32,

    /// Temperature change per streamed second
    #[arg(long, default_value_t = 0.25)]
    drift: f32,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Args) -> Result<StreamConfig> {
    let mut config = match &args.config {
        Some(path) => StreamConfig::load(path).with_context(|| format!("Failed to load config from {path:?}"))?,
        None => StreamConfig::default(),
    };
    if let Some(family) = args.family {
        config.family = family;
    }
    Ok(config)
}

/// What a phone app would do: connect, subscribe, start, stop, leave.
async fn scripted_peer(tx: mpsc::UnboundedSender<PeripheralEvent>, duration: Duration) {
    let peer = PeerHandle(1);
    let script = [
        (Duration::from_millis(200), PeripheralEvent::Connected { peer }),
        (Duration::from_millis(100), PeripheralEvent::Connected { peer: PeerHandle(2) }),
        (Duration::from_millis(100), PeripheralEvent::DescriptorWrite { value: CCC_NOTIFY }),
        (Duration::from_millis(100), PeripheralEvent::ControlWrite { data: Bytes::from_static(b"1") }),
        (duration / 2, PeripheralEvent::ControlWrite { data: Bytes::from_static(b"11") }),
        (duration / 2, PeripheralEvent::ControlWrite { data: Bytes::from_static(b"0") }),
        (Duration::from_millis(500), PeripheralEvent::Disconnected {
            peer,
            reason: DisconnectReason::RemoteUserTerminated,
        }),
    ];

    for (delay, event) in script {
        sleep(delay).await;
        if tx.send(event).is_err() {
            return;
        }
    }
}

fn print_notification(payload: &NotificationPayload) {
    // Both bytes carry the sign for readings below zero
    let centi = payload.whole() as i8 as i32 * 100 + payload.hundredths() as i8 as i32;
    let sign = if centi < 0 { "-" } else { "" };
    println!(
        "  notification {}  ->  {}{}.{:02} °C",
        hex::encode(payload.as_bytes()),
        sign,
        centi.abs() / 100,
        centi.abs() % 100
    );
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

    let config = load_config(&args)?;
    let service = temperature_service();
    info!(
        advertising = %format_uuid(ADVERTISING_UUID),
        service = %format_uuid(SERVICE_UUID),
        control = %format_uuid(service.control.uuid),
        data = %format_uuid(service.temperature.uuid),
        "Temperature service ready"
    );

    let sensor = SimulatedSensor::with_temperature(config.family, args.celsius);
    let (notifier, mut notifications) = ChannelNotifier::channel();
    let streamer = Streamer::spawn(sensor.clone(), notifier, &config).context("Invalid streaming config")?;

    let (event_tx, mut events) = mpsc::unbounded_channel();
    let peer = tokio::spawn(scripted_peer(event_tx, Duration::from_secs(args.duration)));

    let mut drift = tokio::time::interval(Duration::from_secs(1));
    let mut celsius = args.celsius;
    let mut received = 0usize;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    info!("Peer script finished");
                    break;
                };
                info!(%event, "Peer event");
                if let Err(e) = streamer.handle(event).await {
                    warn!("Event rejected: {}", e);
                }
            }
            Some(payload) = notifications.recv() => {
                received += 1;
                print_notification(&payload);
            }
            _ = drift.tick() => {
                if streamer.is_active().await {
                    celsius += args.drift;
                    sensor.set_temperature(celsius);
                    debug!(celsius, "Simulated temperature updated");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    peer.abort();
    let last = streamer.read_value().await;
    println!(
        "Received {} notifications, last value {} ({} bus reads)",
        received,
        last,
        sensor.read_count()
    );
    if matches!(config.family, SensorFamily::Ad5933) {
        println!("  AD5933 conversions started: {}", sensor.write_count());
    }
    Ok(())
}
