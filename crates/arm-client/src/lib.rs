//! High-level robot control: differential kinematics, joint-state
//! tracking, trajectory generation and the robot state machine. Sits on
//! top of `arm-driver`'s per-motor command surface.

pub mod command;
pub mod differential;
pub mod error;
pub mod joint_state;
pub mod robot_state;
pub mod state_machine;
pub mod trajectory;

pub use command::Command;
pub use error::{check_motor_id, ClientError};
pub use joint_state::{JointLimitOverride, JointTracker};
pub use robot_state::{PiSubState, RobotState, NUM_JOINTS};
pub use state_machine::{RobotMode, StateMachine};
pub use trajectory::otg::OtgStatus;
pub use trajectory::TrajectoryEngine;
