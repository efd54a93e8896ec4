use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("CAN bus error: {0}")]
    Bus(#[from] arm_can::CanError),

    #[error("protocol error: {0}")]
    Protocol(#[from] arm_protocol::ProtocolError),

    /// Not fatal: the current tick continues with stale motor state.
    #[error("transaction with motor {motor_id} exceeded the {ceiling_ms}ms ceiling")]
    TransactionOverrun { motor_id: u8, ceiling_ms: u64 },
}
