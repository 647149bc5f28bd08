//! Command → poll → read state machine that produces one raw reading per cycle.

use crate::codec::{Measurement, RawReading};
use crate::config::PollConfig;
use crate::error::{AcquisitionError, TransportError};
use crate::sensor::{RegisterMap, ResultLayout, SensorFamily};
use crate::transport::RegisterBus;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Idle,
    CommandSent,
    Polling { attempts_left: u32 },
    ResultReady,
    Failed(AcquisitionError),
}

impl AcquisitionState {
    pub fn is_failed(&self) -> bool {
        matches!(self, AcquisitionState::Failed(_))
    }
}

/// Drives one sensor through an acquisition cycle.
///
/// Owns the bus exclusively. Nothing survives between cycles except the poll
/// budget, which is reset every time [`Acquisition::acquire`] is entered.
#[derive(Debug)]
pub struct Acquisition<B> {
    bus: B,
    family: SensorFamily,
    map: RegisterMap,
    poll: PollConfig,
    state: AcquisitionState,
}

impl<B: RegisterBus> Acquisition<B> {
    pub fn new(bus: B, family: SensorFamily, poll: PollConfig) -> Self {
        Self {
            bus,
            family,
            map: family.register_map(),
            poll,
            state: AcquisitionState::Idle,
        }
    }

    pub fn family(&self) -> SensorFamily {
        self.family
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    /// Run a full cycle and return the assembled reading.
    pub async fn acquire(&mut self) -> Result<RawReading, AcquisitionError> {
        self.state = AcquisitionState::Idle;
        loop {
            if let Some(result) = self.advance().await {
                return result;
            }
        }
    }

    /// Run a full cycle and decode the reading for this sensor family.
    pub async fn read_measurement(&mut self) -> Result<Measurement, AcquisitionError> {
        let raw = self.acquire().await?;
        Ok(self.family.decode(raw))
    }

    /// Perform one transition. Returns the outcome once the cycle ends.
    pub async fn advance(&mut self) -> Option<Result<RawReading, AcquisitionError>> {
        let next = match self.state {
            AcquisitionState::Idle => match self.map.conversion {
                Some(cmd) => match self.bus.write(cmd.reg, cmd.value).await {
                    Ok(()) => AcquisitionState::CommandSent,
                    Err(e) => AcquisitionState::Failed(e.into()),
                },
                None => AcquisitionState::CommandSent,
            },
            AcquisitionState::CommandSent => AcquisitionState::Polling {
                attempts_left: self.poll.max_attempts.max(1),
            },
            AcquisitionState::Polling { attempts_left } => self.poll_status(attempts_left).await,
            AcquisitionState::ResultReady => {
                let result = self.read_result().await;
                self.state = match result {
                    Ok(raw) => {
                        trace!(raw = %raw, "ResultReady -> Idle");
                        AcquisitionState::Idle
                    }
                    Err(e) => AcquisitionState::Failed(e),
                };
                return Some(result);
            }
            AcquisitionState::Failed(e) => return Some(Err(e)),
        };

        trace!(from = ?self.state, to = ?next, "acquisition transition");
        self.state = next;
        match next {
            AcquisitionState::Failed(e) => Some(Err(e)),
            _ => None,
        }
    }

    async fn poll_status(&mut self, attempts_left: u32) -> AcquisitionState {
        let Some(status) = self.map.status else {
            return AcquisitionState::ResultReady;
        };

        tokio::time::sleep(self.poll.interval()).await;
        match self.bus.read_register(status.reg).await {
            Ok(value) if status.is_ready(value) => AcquisitionState::ResultReady,
            Ok(_) if attempts_left <= 1 => AcquisitionState::Failed(AcquisitionError::Timeout {
                attempts: self.poll.max_attempts.max(1),
            }),
            Ok(_) => AcquisitionState::Polling {
                attempts_left: attempts_left - 1,
            },
            Err(e) => AcquisitionState::Failed(e.into()),
        }
    }

    async fn read_result(&mut self) -> Result<RawReading, AcquisitionError> {
        match self.map.result {
            ResultLayout::Burst { reg } => {
                let bytes = self.bus.read_after_write(reg, 2).await?;
                if bytes.len() < 2 {
                    return Err(TransportError::ShortRead {
                        expected: 2,
                        actual: bytes.len(),
                    }
                    .into());
                }
                Ok(RawReading::from_be_bytes(bytes[0], bytes[1]))
            }
            ResultLayout::Split { high, low } => {
                let high = self.bus.read_register(high).await?;
                let low = self.bus.read_register(low).await?;
                Ok(RawReading::from_be_bytes(high, low))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{FaultMode, SimulatedSensor};

    #[tokio::test(start_paused = true)]
    async fn test_ad5933_walks_every_state() {
        let sensor = SimulatedSensor::with_temperature(SensorFamily::Ad5933, 24.5);
        sensor.set_conversion_polls(2);
        let mut acq = Acquisition::new(sensor, SensorFamily::Ad5933, PollConfig::default());

        assert_eq!(acq.advance().await, None);
        assert_eq!(acq.state(), AcquisitionState::CommandSent);
        assert_eq!(acq.advance().await, None);
        assert_eq!(acq.state(), AcquisitionState::Polling { attempts_left: 100 });
        assert_eq!(acq.advance().await, None);
        assert_eq!(acq.state(), AcquisitionState::Polling { attempts_left: 99 });
        assert_eq!(acq.advance().await, None);
        assert_eq!(acq.state(), AcquisitionState::ResultReady);
        assert!(!acq.state().is_failed());

        let raw = acq.advance().await.unwrap().unwrap();
        assert_eq!(raw.bits(), 784); // 24.5 * 32
        assert_eq!(acq.state(), AcquisitionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max30205_skips_command_and_poll() {
        let sensor = SimulatedSensor::with_temperature(SensorFamily::Max30205, 10.0);
        let mut acq = Acquisition::new(sensor.clone(), SensorFamily::Max30205, PollConfig::default());

        let raw = acq.acquire().await.unwrap();
        assert_eq!(raw.bits(), 0x0A00);
        assert_eq!(sensor.write_count(), 0);
        assert_eq!(sensor.read_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_state_is_sticky_until_reentry() {
        let sensor = SimulatedSensor::new(SensorFamily::Ad5933);
        sensor.set_fault(FaultMode::FailNext(1, TransportError::BusNotReady));
        let mut acq = Acquisition::new(sensor, SensorFamily::Ad5933, PollConfig::default());

        let err = acq.acquire().await.unwrap_err();
        assert_eq!(err, AcquisitionError::TransportFailure(TransportError::BusNotReady));
        assert!(acq.state().is_failed());
        assert_eq!(acq.advance().await, Some(Err(err)));

        // Re-entry resets the machine
        assert!(acq.acquire().await.is_ok());
    }
}
