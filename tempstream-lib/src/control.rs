use crate::constants::CONTROL_WRITE_LEN;
use crate::error::ProtocolError;
use num_enum::TryFromPrimitive;
use strum_macros::Display;

/// Single-byte commands accepted on the control characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, TryFromPrimitive)]
#[repr(u8)]
pub enum ControlCommand {
    #[strum(to_string = "stop")]
    Stop = 0x30, // '0'
    #[strum(to_string = "start")]
    Start = 0x31, // '1'
}

/// Parse a control write.
///
/// Anything but a single byte is rejected. Unrecognised byte values are
/// accepted and yield `None`.
pub fn parse_control_write(data: &[u8]) -> Result<Option<ControlCommand>, ProtocolError> {
    if data.len() != CONTROL_WRITE_LEN {
        return Err(ProtocolError::InvalidLength { len: data.len() });
    }
    Ok(ControlCommand::try_from(data[0]).ok())
}

/// Effect of a control write on the streaming flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlTransition {
    Started,
    Stopped,
    Unchanged,
}
