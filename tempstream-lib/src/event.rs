//! Peripheral-side events delivered by the platform BLE stack.

use crate::connection::{DisconnectReason, PeerHandle};
use crate::error::StreamError;
use bytes::Bytes;
use std::fmt;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeripheralEvent {
    Connected { peer: PeerHandle },
    /// The stack failed to establish a connection (HCI error code)
    ConnectFailed { code: u8 },
    Disconnected { peer: PeerHandle, reason: DisconnectReason },
    /// Write to the control characteristic
    ControlWrite { data: Bytes },
    /// Write to the CCC descriptor of the data characteristic
    DescriptorWrite { value: u16 },
}

impl fmt::Display for PeripheralEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeripheralEvent::Connected { peer } => write!(f, "connected {peer}"),
            PeripheralEvent::ConnectFailed { code } => write!(f, "connect failed (err {code:#04x})"),
            PeripheralEvent::Disconnected { peer, reason } => write!(f, "disconnected {peer} ({reason})"),
            PeripheralEvent::ControlWrite { data } => write!(f, "control write {}", hex::encode(data)),
            PeripheralEvent::DescriptorWrite { value } => write!(f, "ccc write {value:#06x}"),
        }
    }
}

/// Consumer of peripheral events. Errors are reported back to the stack, which
/// turns them into ATT or connection-level rejections.
pub trait EventSink: Send + Sync {
    fn handle(&self, event: PeripheralEvent) -> impl Future<Output = Result<(), StreamError>> + Send;
}
