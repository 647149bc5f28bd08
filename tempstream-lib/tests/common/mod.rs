//! Common test utilities and shared imports

// Shared across several test files; not every item is used in each one
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use std::time::Duration;
#[allow(unused_imports)]
pub use tempstream_lib::codec::NotificationPayload;
#[allow(unused_imports)]
pub use tempstream_lib::config::{PollConfig, StreamConfig};
#[allow(unused_imports)]
pub use tempstream_lib::connection::{DisconnectReason, PeerHandle};
#[allow(unused_imports)]
pub use tempstream_lib::constants::{CCC_NOTIFY, PROBE_PAYLOAD};
#[allow(unused_imports)]
pub use tempstream_lib::control::ControlTransition;
#[allow(unused_imports)]
pub use tempstream_lib::error::{ConnectionError, ProtocolError, StreamError, TransportError};
#[allow(unused_imports)]
pub use tempstream_lib::sensor::SensorFamily;
#[allow(unused_imports)]
pub use tempstream_lib::sim::{FaultMode, SimulatedSensor};
#[allow(unused_imports)]
pub use tempstream_lib::{ChannelNotifier, EventSink, PeripheralEvent, Streamer};
#[allow(unused_imports)]
pub use tokio::sync::mpsc::UnboundedReceiver;

#[allow(dead_code)]
pub const PEER: PeerHandle = PeerHandle(1);

/// Route library logs to the test harness. Filter with RUST_LOG.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Streamer over a simulated sensor, plus a handle on that sensor and the
/// notification receiver
#[allow(dead_code)]
pub fn spawn_streamer(
    family: SensorFamily,
    celsius: f32,
) -> (Streamer<ChannelNotifier>, SimulatedSensor, UnboundedReceiver<NotificationPayload>) {
    init_tracing();
    let sensor = SimulatedSensor::with_temperature(family, celsius);
    let (notifier, rx) = ChannelNotifier::channel();
    let streamer = Streamer::spawn(sensor.clone(), notifier, &StreamConfig::new(family)).expect("Invalid config");
    (streamer, sensor, rx)
}

#[allow(dead_code)]
pub fn control(data: &[u8]) -> PeripheralEvent {
    PeripheralEvent::ControlWrite {
        data: Bytes::copy_from_slice(data),
    }
}

#[allow(dead_code)]
pub fn subscribe() -> PeripheralEvent {
    PeripheralEvent::DescriptorWrite { value: CCC_NOTIFY }
}

/// Connect, subscribe and start streaming. The probe payload is consumed.
#[allow(dead_code)]
pub async fn connect_and_start(streamer: &Streamer<ChannelNotifier>, rx: &mut UnboundedReceiver<NotificationPayload>) {
    streamer
        .handle(PeripheralEvent::Connected { peer: PEER })
        .await
        .expect("Failed to connect");
    streamer.handle(subscribe()).await.expect("Failed to subscribe");
    streamer.handle(control(b"1")).await.expect("Failed to start");
    assert_eq!(rx.try_recv().expect("No probe").as_bytes(), &PROBE_PAYLOAD);
}

/// Everything delivered so far
#[allow(dead_code)]
pub fn drain(rx: &mut UnboundedReceiver<NotificationPayload>) -> Vec<NotificationPayload> {
    let mut out = Vec::new();
    while let Ok(payload) = rx.try_recv() {
        out.push(payload);
    }
    out
}
