//! In-memory register model of the supported sensors.
//!
//! Stands in for the I2C bus on hosts without hardware. Clones share state, so
//! a test can keep one handle while the streaming engine owns another.

use crate::constants::*;
use crate::error::TransportError;
use crate::sensor::{ControlFunction, ControlHigh, SensorFamily, Status};
use crate::transport::RegisterBus;
use bytes::Bytes;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

/// How the simulated bus misbehaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultMode {
    #[default]
    None,
    /// Every transaction fails with the given error
    AlwaysFail(TransportError),
    /// The next `n` transactions fail, then the bus recovers
    FailNext(u32, TransportError),
    /// Conversions never finish; the status register stays clear
    NeverReady,
}

#[derive(Debug)]
struct SimState {
    family: SensorFamily,
    registers: [u8; 256],
    raw_temperature: u16,
    /// Status polls a conversion takes before the result is valid
    conversion_polls: u32,
    polls_remaining: Option<u32>,
    fault: FaultMode,
    writes: u32,
    reads: u32,
}

#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedSensor {
    pub fn new(family: SensorFamily) -> Self {
        SimulatedSensor {
            state: Arc::new(Mutex::new(SimState {
                family,
                registers: [0; 256],
                raw_temperature: 0,
                conversion_polls: 1,
                polls_remaining: None,
                fault: FaultMode::None,
                writes: 0,
                reads: 0,
            })),
        }
    }

    /// Sensor reporting `celsius`, quantised to the family's resolution
    pub fn with_temperature(family: SensorFamily, celsius: f32) -> Self {
        let sensor = SimulatedSensor::new(family);
        sensor.set_temperature(celsius);
        sensor
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn family(&self) -> SensorFamily {
        self.state().family
    }

    /// Set the raw register value the next conversion will produce
    pub fn set_raw_temperature(&self, raw: u16) {
        self.state().raw_temperature = raw;
    }

    pub fn set_temperature(&self, celsius: f32) {
        let raw = match self.family() {
            SensorFamily::Max30205 => (celsius * 256.0).round() as i16 as u16,
            SensorFamily::Ad5933 => ((celsius * 32.0).round() as i16 as u16) & 0x3FFF,
        };
        self.set_raw_temperature(raw);
    }

    /// Number of status polls before a started conversion reports ready (minimum 1)
    pub fn set_conversion_polls(&self, polls: u32) {
        self.state().conversion_polls = polls.max(1);
    }

    pub fn set_fault(&self, fault: FaultMode) {
        self.state().fault = fault;
    }

    pub fn write_count(&self) -> u32 {
        self.state().writes
    }

    pub fn read_count(&self) -> u32 {
        self.state().reads
    }

    /// Current content of a register, bypassing the bus
    pub fn peek(&self, reg: u8) -> u8 {
        self.state().registers[reg as usize]
    }
}

impl SimState {
    fn check_fault(&mut self) -> Result<(), TransportError> {
        match self.fault {
            FaultMode::AlwaysFail(err) => Err(err),
            FaultMode::FailNext(n, err) if n > 0 => {
                self.fault = if n == 1 {
                    FaultMode::None
                } else {
                    FaultMode::FailNext(n - 1, err)
                };
                Err(err)
            }
            _ => Ok(()),
        }
    }

    fn write(&mut self, reg: u8, value: u8) {
        self.registers[reg as usize] = value;
        if self.family != SensorFamily::Ad5933 {
            return;
        }
        match reg {
            AD5933_CTRL_HIGH_REG => {
                let control = ControlHigh::from_bytes([value]);
                if control.control_function() == ControlFunction::MeasureTemperature {
                    trace!("simulated conversion started");
                    self.registers[AD5933_STATUS_REG as usize] &= !AD5933_STATUS_TEMP_VALID;
                    self.polls_remaining = Some(self.conversion_polls);
                }
            }
            AD5933_CTRL_LOW_REG if value & AD5933_RESET != 0 => {
                trace!("simulated reset");
                self.registers[AD5933_STATUS_REG as usize] = 0;
                self.polls_remaining = None;
            }
            _ => {}
        }
    }

    fn read_status(&mut self) -> u8 {
        if self.fault == FaultMode::NeverReady {
            return self.registers[AD5933_STATUS_REG as usize];
        }
        if let Some(remaining) = self.polls_remaining {
            if remaining <= 1 {
                self.polls_remaining = None;
                let [high, low] = self.raw_temperature.to_be_bytes();
                self.registers[AD5933_TEMP_HIGH_REG as usize] = high;
                self.registers[AD5933_TEMP_LOW_REG as usize] = low;
                let status = Status::from_bytes([self.registers[AD5933_STATUS_REG as usize]])
                    .with_temperature_valid(true);
                self.registers[AD5933_STATUS_REG as usize] = status.into_bytes()[0];
            } else {
                self.polls_remaining = Some(remaining - 1);
            }
        }
        self.registers[AD5933_STATUS_REG as usize]
    }

    fn read(&mut self, reg: u8, len: usize) -> Bytes {
        if self.family == SensorFamily::Max30205 && reg == MAX30205_TEMP_REG {
            // 16-bit register, MSB first
            let bytes = self.raw_temperature.to_be_bytes();
            return Bytes::copy_from_slice(&bytes[..len.min(bytes.len())]);
        }
        let mut out = Vec::with_capacity(len);
        for offset in 0..len {
            let addr = reg.wrapping_add(offset as u8);
            let value = if self.family == SensorFamily::Ad5933 && addr == AD5933_STATUS_REG {
                self.read_status()
            } else {
                self.registers[addr as usize]
            };
            out.push(value);
        }
        Bytes::from(out)
    }
}

impl RegisterBus for SimulatedSensor {
    async fn write(&mut self, reg: u8, value: u8) -> Result<(), TransportError> {
        let mut state = self.state();
        state.writes += 1;
        state.check_fault()?;
        trace!(reg, value, "sim write");
        state.write(reg, value);
        Ok(())
    }

    async fn read_after_write(&mut self, reg: u8, len: usize) -> Result<Bytes, TransportError> {
        let mut state = self.state();
        state.reads += 1;
        state.check_fault()?;
        let bytes = state.read(reg, len);
        trace!(reg, data = ?bytes.as_ref(), "sim read");
        Ok(bytes)
    }
}
