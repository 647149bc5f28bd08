//! State owned by one streaming session.
//!
//! Every mutation goes through `&mut StreamingSession`, so whoever holds the
//! session lock is the only writer. The work slot is armed exactly when
//! `active` is set.

use crate::codec::NotificationPayload;
use crate::connection::{Connection, ConnectionManager, DisconnectReason, PeerHandle};
use crate::control::{ControlCommand, ControlTransition, parse_control_write};
use crate::constants::PROBE_PAYLOAD;
use crate::error::{ConnectionError, NotifyError, ProtocolError};
use crate::gatt::Notifier;
use crate::scheduler::{CycleToken, DelayedWork, WorkSlot};
use crate::subscription::{SubscriptionChange, SubscriptionGate};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct StreamingSession {
    connection: ConnectionManager,
    gate: SubscriptionGate,
    active: bool,
    work: WorkSlot,
    last_payload: Option<NotificationPayload>,
}

impl StreamingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn notifications_enabled(&self) -> bool {
        self.gate.is_enabled()
    }

    pub fn should_notify(&self) -> bool {
        self.gate.should_notify(self.active)
    }

    pub fn connection(&self) -> Option<Connection> {
        self.connection.current()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn pending_work(&self) -> Option<DelayedWork> {
        self.work.pending()
    }

    /// Value served on a GATT read of the data characteristic
    pub fn read_value(&self) -> NotificationPayload {
        self.last_payload.unwrap_or_default()
    }

    pub fn on_connect(&mut self, peer: PeerHandle) -> Result<(), ConnectionError> {
        self.connection.on_connect(peer)
    }

    /// Tear down the connection, force streaming off and drop the peer's
    /// subscription. Returns true if the current peer was dropped.
    pub fn on_disconnect(&mut self, peer: PeerHandle, reason: DisconnectReason) -> bool {
        if self.connection.on_disconnect(peer, reason).is_none() {
            return false;
        }
        if self.active {
            info!("Temperature reading stopped on disconnect");
        }
        self.stop();
        self.gate.clear();
        true
    }

    pub fn on_control_write(&mut self, data: &[u8]) -> Result<ControlTransition, ProtocolError> {
        let transition = match parse_control_write(data)? {
            Some(ControlCommand::Start) if !self.active => {
                self.active = true;
                let token = self.work.schedule(Duration::ZERO);
                info!(token, "Temperature reading started");
                ControlTransition::Started
            }
            Some(ControlCommand::Stop) if self.active => {
                self.stop();
                info!("Temperature reading stopped");
                ControlTransition::Stopped
            }
            Some(cmd) => {
                debug!(%cmd, active = self.active, "Control command has no effect");
                ControlTransition::Unchanged
            }
            None => {
                debug!(byte = data[0], "Ignoring unknown control byte");
                ControlTransition::Unchanged
            }
        };
        Ok(transition)
    }

    /// Apply a CCC write. Enabling sends one test payload straight away,
    /// whether or not streaming is active.
    pub fn on_descriptor_write<N: Notifier>(&mut self, value: u16, notifier: &N) -> SubscriptionChange {
        let change = self.gate.on_descriptor_write(value);
        if change == SubscriptionChange::Enabled {
            let probe = NotificationPayload::from_bytes(PROBE_PAYLOAD);
            match self.notify(notifier, &probe) {
                Ok(()) => info!(payload = %probe, "Initial test notification sent"),
                Err(e) => warn!("Initial test notification failed: {}", e),
            }
        }
        change
    }

    /// Send a notification to the connected peer
    pub fn notify<N: Notifier>(&self, notifier: &N, payload: &NotificationPayload) -> Result<(), NotifyError> {
        if !self.is_connected() {
            return Err(NotifyError::NotConnected);
        }
        notifier.notify(payload)
    }

    /// Called when the work deadline passes. False means the work was cancelled
    /// or replaced and the activation must do nothing.
    pub fn begin_cycle(&mut self, token: CycleToken) -> bool {
        self.active && self.work.begin(token)
    }

    /// Whether a cycle that began with `token` may still publish and re-arm
    pub fn is_current(&self, token: CycleToken) -> bool {
        self.active && self.work.is_current(token)
    }

    pub fn record(&mut self, payload: NotificationPayload) {
        self.last_payload = Some(payload);
    }

    /// Re-arm after a finished cycle. Only valid while `token` is current.
    pub fn rearm(&mut self, token: CycleToken, period: Duration) -> Option<CycleToken> {
        if !self.is_current(token) {
            return None;
        }
        Some(self.work.schedule(period))
    }

    fn stop(&mut self) {
        self.active = false;
        if self.work.cancel() {
            debug!("Pending acquisition cancelled");
        }
    }
}
