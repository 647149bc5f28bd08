use crate::constants::CCC_NOTIFY;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionChange {
    Enabled,
    Disabled,
    Unchanged,
}

/// Tracks whether the peer has enabled notifications on the data characteristic.
#[derive(Debug, Default)]
pub struct SubscriptionGate {
    notify_enabled: bool,
}

impl SubscriptionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.notify_enabled
    }

    /// Apply a write to the client characteristic configuration descriptor.
    ///
    /// The caller sends the test payload when this returns `Enabled`.
    pub fn on_descriptor_write(&mut self, value: u16) -> SubscriptionChange {
        let enabled = value == CCC_NOTIFY;
        let change = Self::transition(self.notify_enabled, enabled);
        self.notify_enabled = enabled;
        info!(ccc = value, enabled, "Temperature notifications updated");
        change
    }

    /// Forget the subscription when its peer goes away, as if it had written 0.
    pub fn clear(&mut self) -> SubscriptionChange {
        let change = Self::transition(self.notify_enabled, false);
        if change == SubscriptionChange::Disabled {
            debug!("Temperature notifications disabled on disconnect");
        }
        self.notify_enabled = false;
        change
    }

    pub fn should_notify(&self, active: bool) -> bool {
        self.notify_enabled && active
    }

    fn transition(was: bool, now: bool) -> SubscriptionChange {
        match (was, now) {
            (false, true) => SubscriptionChange::Enabled,
            (true, false) => SubscriptionChange::Disabled,
            _ => SubscriptionChange::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CCC_INDICATE;

    #[test]
    fn test_enable_reported_once_per_edge() {
        let mut gate = SubscriptionGate::new();

        assert_eq!(gate.on_descriptor_write(CCC_NOTIFY), SubscriptionChange::Enabled);
        assert_eq!(gate.on_descriptor_write(CCC_NOTIFY), SubscriptionChange::Unchanged);
        assert_eq!(gate.on_descriptor_write(0x0000), SubscriptionChange::Disabled);
        assert_eq!(gate.on_descriptor_write(CCC_NOTIFY), SubscriptionChange::Enabled);
    }

    #[test]
    fn test_indicate_does_not_enable_notifications() {
        let mut gate = SubscriptionGate::new();

        assert_eq!(gate.on_descriptor_write(CCC_INDICATE), SubscriptionChange::Unchanged);
        assert!(!gate.is_enabled());
    }

    #[test]
    fn test_should_notify_requires_both_flags() {
        let mut gate = SubscriptionGate::new();
        assert!(!gate.should_notify(true));

        gate.on_descriptor_write(CCC_NOTIFY);
        assert!(gate.should_notify(true));
        assert!(!gate.should_notify(false));

        assert_eq!(gate.on_descriptor_write(0x0000), SubscriptionChange::Disabled);
        assert!(!gate.should_notify(true));
    }

    #[test]
    fn test_clear_acts_like_writing_zero() {
        let mut gate = SubscriptionGate::new();
        assert_eq!(gate.clear(), SubscriptionChange::Unchanged);

        gate.on_descriptor_write(CCC_NOTIFY);
        assert_eq!(gate.clear(), SubscriptionChange::Disabled);
        assert!(!gate.is_enabled());
        assert_eq!(gate.on_descriptor_write(CCC_NOTIFY), SubscriptionChange::Enabled);
    }
}
