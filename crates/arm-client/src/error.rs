use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("motor driver error: {0}")]
    Driver(#[from] arm_driver::DriverError),

    /// Kind (c): command targeted a motor id outside [1,7].
    #[error("motor id {0} is out of range")]
    MotorIdOutOfRange(u8),

    /// Kind (b): malformed command: missing field, wrong shape, unknown cmd.
    #[error("malformed command: {0}")]
    MalformedCommand(String),

    /// Kind (d): the trajectory generator reported a non-Working,
    /// non-Finished status.
    #[error("trajectory solver error: {0}")]
    Trajectory(String),
}

/// Kind (c): reject a motor id outside `[1,7]` before it reaches a driver.
pub fn check_motor_id(id: u8) -> Result<(), ClientError> {
    if arm_protocol::MIN_MOTOR_ID <= id && id <= arm_protocol::MAX_MOTOR_ID {
        Ok(())
    } else {
        Err(ClientError::MotorIdOutOfRange(id))
    }
}
