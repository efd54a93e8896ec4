//! Per-motor command surface and state.
//!
//! One [`MotorDriver`] per physical motor. All seven share a single
//! [`arm_can::CanBus`] owned by the caller; nothing in this crate spawns
//! threads or holds a lock, since the control thread is the only caller.

pub mod config;
pub mod driver;
pub mod error;
pub mod response;
pub mod state;

pub use config::{default_motor_configs, MotorConfig};
pub use driver::{MotorDriver, TRANSACTION_CEILING};
pub use error::DriverError;
pub use state::{MotorState, PidGains};
