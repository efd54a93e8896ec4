use thiserror::Error;

/// Errors raised while encoding or decoding a motor protocol frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid payload offset: {offset} + {width} exceeds frame length {len}")]
    OffsetOutOfRange {
        offset: usize,
        width: usize,
        len: usize,
    },

    #[error("motor id {0} out of range [1, 7]")]
    MotorIdOutOfRange(u8),

    #[error("unrecognized command byte 0x{0:02X}")]
    UnknownCommand(u8),
}
