use crate::error::ConnectionError;
use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt;
use tracing::{info, warn};

/// Opaque connection handle assigned by the BLE stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerHandle(pub u16);

impl fmt::Display for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// HCI disconnect reason codes seen on a peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum DisconnectReason {
    AuthenticationFailure = 0x05,
    ConnectionTimeout = 0x08,
    RemoteUserTerminated = 0x13,
    RemotePowerOff = 0x15,
    LocalHostTerminated = 0x16,
    FailedToEstablish = 0x3E,

    #[num_enum(catch_all)]
    Unknown(u8),
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::AuthenticationFailure => write!(f, "authentication failure"),
            DisconnectReason::ConnectionTimeout => write!(f, "supervision timeout"),
            DisconnectReason::RemoteUserTerminated => write!(f, "remote user terminated"),
            DisconnectReason::RemotePowerOff => write!(f, "remote device powered off"),
            DisconnectReason::LocalHostTerminated => write!(f, "local host terminated"),
            DisconnectReason::FailedToEstablish => write!(f, "connection failed to be established"),
            DisconnectReason::Unknown(code) => write!(f, "unknown ({code:#04x})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub peer: PeerHandle,
    pub alive: bool,
}

/// Holds the single permitted peer connection.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    current: Option<Connection>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Connection> {
        self.current
    }

    pub fn is_connected(&self) -> bool {
        self.current.is_some_and(|c| c.alive)
    }

    pub fn on_connect(&mut self, peer: PeerHandle) -> Result<(), ConnectionError> {
        if let Some(existing) = self.current {
            warn!(current = %existing.peer, rejected = %peer, "Rejecting second connection");
            return Err(ConnectionError::AlreadyConnected {
                current: existing.peer,
                rejected: peer,
            });
        }
        info!(peer = %peer, "Connected");
        self.current = Some(Connection { peer, alive: true });
        Ok(())
    }

    /// Clear the slot if `peer` is the current connection; returns the dropped connection.
    pub fn on_disconnect(&mut self, peer: PeerHandle, reason: DisconnectReason) -> Option<Connection> {
        match self.current {
            Some(conn) if conn.peer == peer => {
                info!(peer = %peer, %reason, "Disconnected");
                self.current = None;
                Some(Connection { alive: false, ..conn })
            }
            _ => {
                warn!(peer = %peer, %reason, "Disconnect for unknown peer ignored");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_connection_rejected() {
        let mut mgr = ConnectionManager::new();
        mgr.on_connect(PeerHandle(1)).unwrap();

        let err = mgr.on_connect(PeerHandle(2)).unwrap_err();
        assert_eq!(
            err,
            ConnectionError::AlreadyConnected {
                current: PeerHandle(1),
                rejected: PeerHandle(2)
            }
        );
        assert_eq!(mgr.current().unwrap().peer, PeerHandle(1));
    }

    #[test]
    fn test_disconnect_of_other_peer_keeps_connection() {
        let mut mgr = ConnectionManager::new();
        mgr.on_connect(PeerHandle(1)).unwrap();

        assert!(mgr.on_disconnect(PeerHandle(2), DisconnectReason::RemoteUserTerminated).is_none());
        assert!(mgr.is_connected());

        let dropped = mgr.on_disconnect(PeerHandle(1), DisconnectReason::ConnectionTimeout).unwrap();
        assert!(!dropped.alive);
        assert!(!mgr.is_connected());
        assert!(mgr.on_connect(PeerHandle(3)).is_ok());
    }

    #[test]
    fn test_disconnect_reason_codes() {
        assert_eq!(DisconnectReason::from_primitive(0x13), DisconnectReason::RemoteUserTerminated);
        assert_eq!(DisconnectReason::from_primitive(0x99), DisconnectReason::Unknown(0x99));
        assert_eq!(u8::from(DisconnectReason::LocalHostTerminated), 0x16);
    }
}
