//! Periodic acquire → encode → notify pipeline.
//!
//! A single driver task owns the sensor bus and runs one acquisition cycle
//! whenever the session's work slot comes due. Event handlers only touch the
//! session under its lock and then wake the driver, so at most one cycle is
//! ever in flight and cancelling never interrupts a bus transaction.

use crate::acquisition::Acquisition;
use crate::codec::{Measurement, NotificationPayload};
use crate::config::StreamConfig;
use crate::connection::{DisconnectReason, PeerHandle};
use crate::control::ControlTransition;
use crate::error::{AcquisitionError, ConfigError, ConnectionError, ProtocolError, StreamError};
use crate::event::{EventSink, PeripheralEvent};
use crate::gatt::Notifier;
use crate::scheduler::CycleToken;
use crate::session::StreamingSession;
use crate::subscription::SubscriptionChange;
use crate::transport::RegisterBus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

struct Shared<N> {
    session: Mutex<StreamingSession>,
    /// Signalled whenever the work slot is armed or cancelled
    wake: Notify,
    notifier: N,
    period: Duration,
}

impl<N: Notifier> Shared<N> {
    async fn finish_cycle(&self, token: CycleToken, outcome: Result<Measurement, AcquisitionError>) {
        let mut session = self.session.lock().await;
        if !session.is_current(token) {
            debug!(token, "Streaming stopped during acquisition, dropping result");
            return;
        }

        match outcome {
            Ok(measurement) => {
                let payload = NotificationPayload::from(measurement);
                session.record(payload);
                info!(temperature = %measurement, %payload, "Temperature reading");

                if session.should_notify() {
                    if let Err(e) = session.notify(&self.notifier, &payload) {
                        warn!("Failed to send notification: {}", e);
                    }
                }
            }
            Err(AcquisitionError::Timeout { attempts }) => {
                warn!(attempts, "Temperature result not ready, skipping cycle");
            }
            Err(e) => warn!("Temperature acquisition failed: {}", e),
        }

        if let Some(next) = session.rearm(token, self.period) {
            debug!(token = next, period_ms = self.period.as_millis() as u64, "Next acquisition armed");
        }
    }
}

async fn drive<B: RegisterBus, N: Notifier>(shared: Arc<Shared<N>>, mut acquisition: Acquisition<B>) {
    loop {
        let pending = shared.session.lock().await.pending_work();
        let Some(work) = pending else {
            shared.wake.notified().await;
            continue;
        };

        tokio::select! {
            _ = time::sleep_until(work.deadline) => {}
            // Slot changed under us; re-read it
            _ = shared.wake.notified() => continue,
        }

        if !shared.session.lock().await.begin_cycle(work.token) {
            debug!(token = work.token, "Acquisition cancelled before start");
            continue;
        }

        let outcome = acquisition.read_measurement().await;
        shared.finish_cycle(work.token, outcome).await;
    }
}

/// Streaming engine for one peripheral.
///
/// Must be created inside a tokio runtime. Dropping it stops the driver task;
/// a cycle that is mid-transaction is abandoned along with it.
pub struct Streamer<N: Notifier> {
    shared: Arc<Shared<N>>,
    driver: JoinHandle<()>,
}

impl<N: Notifier> Streamer<N> {
    pub fn spawn<B: RegisterBus + 'static>(bus: B, notifier: N, config: &StreamConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let shared = Arc::new(Shared {
            session: Mutex::new(StreamingSession::new()),
            wake: Notify::new(),
            notifier,
            period: config.period(),
        });
        let acquisition = Acquisition::new(bus, config.family, config.poll);
        info!(family = %config.family, period_ms = config.period_ms, "Streaming engine started");
        let driver = tokio::spawn(drive(shared.clone(), acquisition));
        Ok(Self { shared, driver })
    }

    pub async fn on_connect(&self, peer: PeerHandle) -> Result<(), ConnectionError> {
        self.shared.session.lock().await.on_connect(peer)
    }

    pub async fn on_disconnect(&self, peer: PeerHandle, reason: DisconnectReason) {
        if self.shared.session.lock().await.on_disconnect(peer, reason) {
            self.shared.wake.notify_one();
        }
    }

    pub async fn on_control_write(&self, data: &[u8]) -> Result<ControlTransition, ProtocolError> {
        let transition = self.shared.session.lock().await.on_control_write(data);
        match transition {
            Ok(ControlTransition::Started | ControlTransition::Stopped) => self.shared.wake.notify_one(),
            Ok(ControlTransition::Unchanged) => {}
            Err(e) => warn!(att_err = e.att_code(), "Rejected control write: {}", e),
        }
        transition
    }

    pub async fn on_descriptor_write(&self, value: u16) -> SubscriptionChange {
        self.shared
            .session
            .lock()
            .await
            .on_descriptor_write(value, &self.shared.notifier)
    }

    pub async fn is_active(&self) -> bool {
        self.shared.session.lock().await.is_active()
    }

    pub async fn notifications_enabled(&self) -> bool {
        self.shared.session.lock().await.notifications_enabled()
    }

    pub async fn connected_peer(&self) -> Option<PeerHandle> {
        self.shared.session.lock().await.connection().map(|c| c.peer)
    }

    /// GATT read of the data characteristic
    pub async fn read_value(&self) -> NotificationPayload {
        self.shared.session.lock().await.read_value()
    }
}

impl<N: Notifier> EventSink for Streamer<N> {
    async fn handle(&self, event: PeripheralEvent) -> Result<(), StreamError> {
        debug!(%event, "Peripheral event");
        match event {
            PeripheralEvent::Connected { peer } => self.on_connect(peer).await?,
            PeripheralEvent::ConnectFailed { code } => warn!(code, "Connection failed"),
            PeripheralEvent::Disconnected { peer, reason } => self.on_disconnect(peer, reason).await,
            PeripheralEvent::ControlWrite { data } => {
                self.on_control_write(&data).await?;
            }
            PeripheralEvent::DescriptorWrite { value } => {
                self.on_descriptor_write(value).await;
            }
        }
        Ok(())
    }
}

impl<N: Notifier> Drop for Streamer<N> {
    fn drop(&mut self) {
        self.driver.abort();
    }
}
