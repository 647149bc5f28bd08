use crate::constants::PAYLOAD_LEN;
use std::fmt;
use uom::si::f32::ThermodynamicTemperature;
use uom::si::thermodynamic_temperature::degree_celsius;

/// Two result bytes as read from the sensor, high byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawReading(u16);

impl RawReading {
    pub fn new(bits: u16) -> Self {
        RawReading(bits)
    }

    pub fn from_be_bytes(high: u8, low: u8) -> Self {
        RawReading(u16::from_be_bytes([high, low]))
    }

    /// The assembled 16 bits
    pub fn bits(&self) -> u16 {
        self.0
    }

    /// The assembled bits as a signed two's-complement value
    pub fn as_i16(&self) -> i16 {
        self.0 as i16
    }
}

impl fmt::Display for RawReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// A temperature in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Measurement {
    celsius: f32,
}

impl Measurement {
    pub fn from_celsius(celsius: f32) -> Self {
        Measurement { celsius }
    }

    pub fn celsius(&self) -> f32 {
        self.celsius
    }

    pub fn as_temperature(&self) -> ThermodynamicTemperature {
        ThermodynamicTemperature::new::<degree_celsius>(self.celsius)
    }

    /// Hundredths of a degree, rounded to nearest
    pub fn centi(&self) -> i32 {
        (self.celsius * 100.0).round() as i32
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} °C", self.celsius)
    }
}

/// Value of the data characteristic: whole degrees, then hundredths.
///
/// Both bytes are truncated to 8 bits. Negative temperatures produce
/// two's-complement bytes and magnitudes of 256 °C or more wrap; peers are
/// expected to interpret the bytes themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotificationPayload([u8; PAYLOAD_LEN]);

impl NotificationPayload {
    pub const fn from_bytes(bytes: [u8; PAYLOAD_LEN]) -> Self {
        NotificationPayload(bytes)
    }

    pub fn encode(measurement: Measurement) -> Self {
        let centi = measurement.centi();
        NotificationPayload([(centi / 100) as u8, (centi % 100) as u8])
    }

    pub fn as_bytes(&self) -> &[u8; PAYLOAD_LEN] {
        &self.0
    }

    pub fn whole(&self) -> u8 {
        self.0[0]
    }

    pub fn hundredths(&self) -> u8 {
        self.0[1]
    }
}

impl From<Measurement> for NotificationPayload {
    fn from(measurement: Measurement) -> Self {
        NotificationPayload::encode(measurement)
    }
}

impl fmt::Display for NotificationPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:02X} {:02X}]", self.0[0], self.0[1])
    }
}
