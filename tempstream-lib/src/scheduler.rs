//! One-shot delayed work slot with explicit re-arm and cancellation.

use std::time::Duration;
use tokio::time::Instant;

/// Identifies one arming of the slot. A cycle holding a stale token must not act.
pub type CycleToken = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayedWork {
    pub token: CycleToken,
    pub deadline: Instant,
    /// The cycle has passed its start check and owns the bus
    pub running: bool,
}

#[derive(Debug, Default)]
pub struct WorkSlot {
    pending: Option<DelayedWork>,
    next_token: CycleToken,
}

impl WorkSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot, replacing any previous work
    pub fn schedule(&mut self, delay: Duration) -> CycleToken {
        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);
        self.pending = Some(DelayedWork {
            token,
            deadline: Instant::now() + delay,
            running: false,
        });
        token
    }

    /// Drop the pending work. Returns true if something was armed.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn pending(&self) -> Option<DelayedWork> {
        self.pending
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_current(&self, token: CycleToken) -> bool {
        self.pending.is_some_and(|w| w.token == token)
    }

    /// Mark `token` as running if it is still the armed work
    pub fn begin(&mut self, token: CycleToken) -> bool {
        match self.pending.as_mut() {
            Some(work) if work.token == token && !work.running => {
                work.running = true;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_stale_token_cannot_begin() {
        let mut slot = WorkSlot::new();
        let first = slot.schedule(Duration::ZERO);
        assert!(slot.cancel());
        let second = slot.schedule(Duration::from_secs(1));

        assert_ne!(first, second);
        assert!(!slot.begin(first));
        assert!(slot.begin(second));
        assert!(!slot.begin(second));
        assert!(slot.is_current(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_sets_deadline() {
        let mut slot = WorkSlot::new();
        let now = Instant::now();
        slot.schedule(Duration::from_secs(1));
        assert_eq!(slot.pending().unwrap().deadline, now + Duration::from_secs(1));
        assert!(slot.cancel());
        assert!(!slot.is_armed());
        assert!(!slot.cancel());
    }
}
