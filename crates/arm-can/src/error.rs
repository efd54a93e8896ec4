use thiserror::Error;

/// CAN adapter layer errors.
#[derive(Error, Debug)]
pub enum CanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("device error: {0}")]
    Device(String),

    /// Transaction deadline elapsed before a matching response arrived.
    #[error("read timeout")]
    Timeout,

    #[error("bus not started")]
    NotStarted,
}
