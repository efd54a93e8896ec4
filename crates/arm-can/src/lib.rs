//! Blocking CAN bus abstraction.
//!
//! The physical CAN transport is treated as an external collaborator,
//! assumed to expose blocking send/receive of 8-byte frames. This crate
//! gives that collaborator a concrete trait (`CanBus`) plus two
//! implementations — an in-memory `mock` used by the rest of the workspace's
//! test suites, and a real `SocketCanBus` for Linux hardware.

pub mod error;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(target_os = "linux")]
pub mod socketcan_bus;

pub use error::CanError;

#[cfg(feature = "mock")]
pub use mock::MockCanBus;

#[cfg(target_os = "linux")]
pub use socketcan_bus::SocketCanBus;

use arm_protocol::CanFrame;
use std::time::Duration;

/// A blocking CAN 2.0 transport.
///
/// `send` and `receive` are the only suspension points the control thread is
/// allowed to block on, and both are bounded by the caller-supplied timeout.
pub trait CanBus {
    /// Send one frame. Blocks at most `timeout`.
    fn send(&mut self, frame: CanFrame, timeout: Duration) -> Result<(), CanError>;

    /// Block until one frame arrives or `timeout` elapses.
    fn receive(&mut self, timeout: Duration) -> Result<CanFrame, CanError>;
}
