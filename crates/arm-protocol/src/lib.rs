//! Armatron motor protocol.
//!
//! Defines the CAN frame codec, the command byte vocabulary, and the unit
//! conversion helpers shared by every motor driver instance. Stateless: this
//! crate knows nothing about any particular motor or bus.

pub mod commands;
pub mod error;
pub mod frame;
pub mod units;

pub use commands::*;
pub use error::ProtocolError;
pub use frame::CanFrame;
