use crate::codec::{Measurement, RawReading};
use crate::constants::*;
use crate::error::ConfigError;
use modular_bitfield::prelude::*;
use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::Display;

/// Supported temperature sensors, each with its own register protocol and scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorFamily {
    /// Dedicated temperature IC: 16-bit signed, 1/256 °C per LSB, continuous conversion
    #[default]
    #[strum(to_string = "MAX30205")]
    Max30205,
    /// Impedance analyzer's internal sensor: 14-bit signed, 1/32 °C per LSB, on-demand conversion
    #[strum(to_string = "AD5933")]
    Ad5933,
}

impl SensorFamily {
    /// Register protocol used to obtain one reading
    pub fn register_map(&self) -> RegisterMap {
        match self {
            SensorFamily::Max30205 => RegisterMap {
                conversion: None,
                status: None,
                result: ResultLayout::Burst { reg: MAX30205_TEMP_REG },
            },
            SensorFamily::Ad5933 => RegisterMap {
                conversion: Some(RegisterWrite {
                    reg: AD5933_CTRL_HIGH_REG,
                    value: ControlHigh::measure_temperature().into_bytes()[0],
                }),
                status: Some(StatusPoll {
                    reg: AD5933_STATUS_REG,
                    ready_mask: AD5933_STATUS_TEMP_VALID,
                }),
                result: ResultLayout::Split {
                    high: AD5933_TEMP_HIGH_REG,
                    low: AD5933_TEMP_LOW_REG,
                },
            },
        }
    }

    /// Convert a raw register reading to degrees Celsius
    pub fn decode(&self, raw: RawReading) -> Measurement {
        match self {
            SensorFamily::Max30205 => Measurement::from_celsius(raw.as_i16() as f32 / 256.0),
            SensorFamily::Ad5933 => {
                let mut bits = raw.bits() & 0x3FFF;
                if bits & 0x2000 != 0 {
                    bits |= 0xC000;
                }
                Measurement::from_celsius(bits as i16 as f32 / 32.0)
            }
        }
    }
}

impl FromStr for SensorFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "max30205" => Ok(SensorFamily::Max30205),
            "ad5933" => Ok(SensorFamily::Ad5933),
            _ => Err(ConfigError::Invalid(format!("unknown sensor family '{s}'"))),
        }
    }
}

/// A single register write that starts a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    pub reg: u8,
    pub value: u8,
}

/// Status register and the bit that signals a finished conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPoll {
    pub reg: u8,
    pub ready_mask: u8,
}

impl StatusPoll {
    pub fn is_ready(&self, status: u8) -> bool {
        status & self.ready_mask != 0
    }
}

/// Where the two result bytes live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultLayout {
    /// One 2-byte big-endian transaction starting at `reg`
    Burst { reg: u8 },
    /// Two single-byte reads, high byte first
    Split { high: u8, low: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterMap {
    pub conversion: Option<RegisterWrite>,
    pub status: Option<StatusPoll>,
    pub result: ResultLayout,
}

/// AD5933 control function (upper nibble of the control-high byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum ControlFunction {
    NoOperation = 0x0,
    InitializeWithStartFrequency = 0x1,
    StartFrequencySweep = 0x2,
    IncrementFrequency = 0x3,
    RepeatFrequency = 0x4,
    MeasureTemperature = 0x9,
    PowerDown = 0xA,
    Standby = 0xB,

    #[num_enum(catch_all)]
    Unknown(u8),
}

/// AD5933 control register, high byte
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlHigh {
    /// PGA gain: false = x5, true = x1
    pub pga_x1: bool,
    pub output_range: B2,
    #[skip]
    unused: B1,
    pub function: B4,
}

impl ControlHigh {
    /// Command that triggers a single temperature conversion (0x90)
    pub fn measure_temperature() -> Self {
        ControlHigh::new().with_function(ControlFunction::MeasureTemperature.into())
    }

    pub fn control_function(&self) -> ControlFunction {
        ControlFunction::from_primitive(self.function())
    }
}

/// AD5933 status register
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Status {
    pub temperature_valid: bool,
    pub impedance_valid: bool,
    pub sweep_complete: bool,
    #[skip]
    unused: B5,
}
