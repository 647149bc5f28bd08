//! One-shot register probes for bring-up of a sensor on the bus.

use crate::constants::{AD5933_CTRL_LOW_REG, AD5933_RESET, AD5933_START_FREQ_REG, RESET_SETTLE};
use crate::error::TransportError;
use crate::transport::RegisterBus;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadbackOutcome {
    Passed,
    Mismatch { wrote: u8, read: u8 },
}

impl ReadbackOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, ReadbackOutcome::Passed)
    }
}

/// Issue a software reset through the control-low register and wait for the
/// device to settle.
pub async fn reset_device<B: RegisterBus>(bus: &mut B) -> Result<(), TransportError> {
    bus.write(AD5933_CTRL_LOW_REG, AD5933_RESET).await?;
    info!("Reset command sent");
    tokio::time::sleep(RESET_SETTLE).await;
    Ok(())
}

pub async fn read_register<B: RegisterBus>(bus: &mut B, reg: u8) -> Result<u8, TransportError> {
    let value = bus.read_register(reg).await?;
    debug!(reg, value, "Register read");
    Ok(value)
}

/// Write `value` to the start-frequency register and read it back.
pub async fn readback_test<B: RegisterBus>(bus: &mut B, value: u8) -> Result<ReadbackOutcome, TransportError> {
    bus.write(AD5933_START_FREQ_REG, value).await?;
    let read = bus.read_register(AD5933_START_FREQ_REG).await?;
    if read == value {
        info!(value, "Write/read-back test passed");
        Ok(ReadbackOutcome::Passed)
    } else {
        warn!(wrote = value, read, "Write/read-back mismatch");
        Ok(ReadbackOutcome::Mismatch { wrote: value, read })
    }
}
