//! GATT surface of the temperature service and the notification sink.

use crate::codec::NotificationPayload;
use crate::constants::*;
use crate::error::NotifyError;
use modular_bitfield::prelude::*;
use tokio::sync::mpsc;

/// Characteristic properties byte as carried in the characteristic declaration
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharProperties {
    pub broadcast: bool,
    pub read: bool,
    pub write_without_response: bool,
    pub write: bool,
    pub notify: bool,
    pub indicate: bool,
    pub authenticated_signed_writes: bool,
    pub extended_properties: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Characteristic {
    pub uuid: u128,
    pub properties: CharProperties,
    /// Carries a client characteristic configuration descriptor
    pub has_ccc: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Service {
    pub uuid: u128,
    pub control: Characteristic,
    pub temperature: Characteristic,
}

/// The one primary service exposed by the peripheral
pub fn temperature_service() -> Service {
    Service {
        uuid: SERVICE_UUID,
        control: Characteristic {
            uuid: CONTROL_CHAR_UUID,
            properties: CharProperties::new().with_write(true),
            has_ccc: false,
        },
        temperature: Characteristic {
            uuid: TEMP_CHAR_UUID,
            properties: CharProperties::new().with_read(true).with_notify(true),
            has_ccc: true,
        },
    }
}

/// Hyphenated textual form of a 128-bit UUID
pub fn format_uuid(uuid: u128) -> String {
    let hex = format!("{uuid:032x}");
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Pushes characteristic values to the subscribed peer.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, payload: &NotificationPayload) -> Result<(), NotifyError>;
}

/// Notifier that forwards payloads over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<NotificationPayload>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::UnboundedSender<NotificationPayload>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NotificationPayload>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, payload: &NotificationPayload) -> Result<(), NotifyError> {
        self.tx.send(*payload).map_err(|_| NotifyError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_bytes() {
        let service = temperature_service();
        assert_eq!(service.control.properties.into_bytes(), [0x08]);
        assert_eq!(service.temperature.properties.into_bytes(), [0x12]);
    }

    #[test]
    fn test_format_uuid() {
        assert_eq!(format_uuid(SERVICE_UUID), "938a803f-f6b3-420b-a95a-10cc7b32b6db");
        assert_eq!(format_uuid(ADVERTISING_UUID), "038a803f-f6b3-420b-a95a-10cc7b32b6db");
    }

    #[test]
    fn test_channel_notifier_reports_closed() {
        let (notifier, rx) = ChannelNotifier::channel();
        let payload = NotificationPayload::from_bytes(PROBE_PAYLOAD);
        assert!(notifier.notify(&payload).is_ok());
        drop(rx);
        assert_eq!(notifier.notify(&payload), Err(NotifyError::Closed));
    }
}
