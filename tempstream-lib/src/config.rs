use crate::constants::{MAX_POLL_ATTEMPTS, POLL_INTERVAL, STREAM_PERIOD};
use crate::error::ConfigError;
use crate::sensor::SensorFamily;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Status-register polling budget for one acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: POLL_INTERVAL.as_millis() as u64,
            max_attempts: MAX_POLL_ATTEMPTS,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Streaming engine settings
///
/// ```json
/// { "family": "ad5933", "period_ms": 500, "poll": { "max_attempts": 20 } }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub family: SensorFamily,
    pub period_ms: u64,
    pub poll: PollConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            family: SensorFamily::default(),
            period_ms: STREAM_PERIOD.as_millis() as u64,
            poll: PollConfig::default(),
        }
    }
}

impl StreamConfig {
    pub fn new(family: SensorFamily) -> Self {
        Self {
            family,
            ..Self::default()
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period_ms = period.as_millis() as u64;
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_ms == 0 {
            return Err(ConfigError::Invalid("period_ms must be greater than zero".to_string()));
        }
        if self.poll.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "poll.max_attempts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: StreamConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
