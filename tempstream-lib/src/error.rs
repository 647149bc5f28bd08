use crate::connection::PeerHandle;
use std::io;
use thiserror::Error;

/// Failure reported by the underlying register bus. Never retried by the bus itself.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    #[error("Bus not ready")]
    BusNotReady,

    #[error("Address {address:#04x} not acknowledged")]
    AddressNack { address: u8 },

    #[error("Bus transaction timed out")]
    Timeout,

    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },
}

/// Why an acquisition cycle ended in `Failed`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("Transport failure: {0}")]
    TransportFailure(#[from] TransportError),

    #[error("Result not ready after {attempts} status polls")]
    Timeout { attempts: u32 },
}

/// Malformed write to the control characteristic.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid control write length: expected 1 byte, got {len}")]
    InvalidLength { len: usize },
}

impl ProtocolError {
    /// ATT error code returned to the peer
    pub fn att_code(&self) -> u8 {
        match self {
            // BT_ATT_ERR_INVALID_ATTRIBUTE_LEN
            ProtocolError::InvalidLength { .. } => 0x0D,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Peer {current} already connected, rejecting {rejected}")]
    AlreadyConnected { current: PeerHandle, rejected: PeerHandle },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyError {
    #[error("No peer connected")]
    NotConnected,

    #[error("Notification channel closed")]
    Closed,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Error surfaced to the platform stack when it delivers a peripheral event.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
