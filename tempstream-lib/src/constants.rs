// Register map, GATT identifiers and timing constants

use std::time::Duration;

/// MAX30205 temperature register (16-bit, two's complement, 1/256 °C per LSB)
pub const MAX30205_TEMP_REG: u8 = 0x00;

/// MAX30205 configuration register
pub const MAX30205_CONFIG_REG: u8 = 0x01;

/// AD5933 control register, high byte (function select, range, PGA)
pub const AD5933_CTRL_HIGH_REG: u8 = 0x80;

/// AD5933 control register, low byte (reset, clock source)
pub const AD5933_CTRL_LOW_REG: u8 = 0x81;

/// AD5933 start frequency register (first of three bytes, fully writable)
pub const AD5933_START_FREQ_REG: u8 = 0x82;

/// AD5933 status register
pub const AD5933_STATUS_REG: u8 = 0x8F;

/// AD5933 temperature data, high byte
pub const AD5933_TEMP_HIGH_REG: u8 = 0x92;

/// AD5933 temperature data, low byte
pub const AD5933_TEMP_LOW_REG: u8 = 0x93;

/// Reset bit in the AD5933 control-low register
pub const AD5933_RESET: u8 = 0x10;

/// Status bit: valid temperature measurement
pub const AD5933_STATUS_TEMP_VALID: u8 = 0x01;

/// Interval between status register polls
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Status polls before an acquisition is abandoned (~100 ms worst case)
pub const MAX_POLL_ATTEMPTS: u32 = 100;

/// Period between acquisition cycles while streaming
pub const STREAM_PERIOD: Duration = Duration::from_secs(1);

/// Length of a control characteristic write
pub const CONTROL_WRITE_LEN: usize = 1;

/// Length of the data characteristic value
pub const PAYLOAD_LEN: usize = 2;

/// Client characteristic configuration: notifications enabled
pub const CCC_NOTIFY: u16 = 0x0001;

/// Client characteristic configuration: indications enabled
pub const CCC_INDICATE: u16 = 0x0002;

/// Payload pushed once when a peer subscribes (25.39 °C)
pub const PROBE_PAYLOAD: [u8; PAYLOAD_LEN] = [0x19, 0x27];

/// 128-bit UUID carried in the advertising data
pub const ADVERTISING_UUID: u128 = 0x038a803f_f6b3_420b_a95a_10cc7b32b6db;

/// Primary service UUID
pub const SERVICE_UUID: u128 = 0x938a803f_f6b3_420b_a95a_10cc7b32b6db;

/// Write-only control characteristic UUID
pub const CONTROL_CHAR_UUID: u128 = 0xa38a803f_f6b3_420b_a95a_10cc7b32b6db;

/// Read + notify temperature characteristic UUID
pub const TEMP_CHAR_UUID: u128 = 0xb38a803f_f6b3_420b_a95a_10cc7b32b6db;

/// Settling time after a device reset
pub const RESET_SETTLE: Duration = Duration::from_millis(100);

/// Pattern used by the write/read-back probe
pub const READBACK_TEST_VALUE: u8 = 0x55;
