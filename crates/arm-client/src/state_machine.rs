//! Robot state machine: Idle / TrajectoryActive / Hold / Estop.
//!
//! Modeled as a runtime tagged enum rather than a typestate, per the design
//! note calling for an explicitly dispatched tagged variant here.

use arm_can::CanBus;

use crate::joint_state::JointTracker;
use crate::robot_state::{RobotState, NUM_JOINTS};
use crate::trajectory::otg::OtgStatus;
use crate::trajectory::TrajectoryEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotMode {
    Idle,
    TrajectoryActive,
    Hold,
    Estop,
}

pub struct StateMachine {
    pub mode: RobotMode,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            mode: RobotMode::Idle,
        }
    }

    /// `moveToJointPosition`: any mode transitions to `TrajectoryActive`. If
    /// a trajectory is already active it is reset first (handled inside
    /// `TrajectoryEngine::trigger`).
    pub fn move_to_joint_position(
        &mut self,
        engine: &mut TrajectoryEngine,
        state: &mut RobotState,
        target: [f64; NUM_JOINTS],
        pitch_limit_low_rad: f64,
        pitch_limit_high_rad: f64,
    ) {
        engine.trigger(state, target, pitch_limit_low_rad, pitch_limit_high_rad);
        self.mode = RobotMode::TrajectoryActive;
    }

    /// `setHold`: reset the trajectory, then command every motor to zero
    /// speed.
    pub fn set_hold(
        &mut self,
        bus: &mut dyn CanBus,
        tracker: &mut JointTracker,
        engine: &mut TrajectoryEngine,
        state: &mut RobotState,
    ) {
        engine.reset(state);
        for driver in tracker.drivers.iter_mut() {
            if let Err(e) = driver.closed_speed(bus, 0.0) {
                tracing::warn!(motor_id = driver.config.id, error = %e, "zero-speed command failed on hold");
            }
        }
        self.mode = RobotMode::Hold;
    }

    /// `setEstop`: reset the trajectory, then command every motor to stop.
    pub fn set_estop(
        &mut self,
        bus: &mut dyn CanBus,
        tracker: &mut JointTracker,
        engine: &mut TrajectoryEngine,
        state: &mut RobotState,
    ) {
        engine.reset(state);
        for driver in tracker.drivers.iter_mut() {
            if let Err(e) = driver.motor_stop(bus) {
                tracing::warn!(motor_id = driver.config.id, error = %e, "motor stop failed on estop");
            }
        }
        self.mode = RobotMode::Estop;
    }

    /// Fold the trajectory engine's per-tick status into the state machine:
    /// `Finished` or `Error` both end the move and enter `Hold`.
    pub fn on_trajectory_status(
        &mut self,
        status: OtgStatus,
        bus: &mut dyn CanBus,
        tracker: &mut JointTracker,
        engine: &mut TrajectoryEngine,
        state: &mut RobotState,
    ) -> Option<String> {
        match status {
            OtgStatus::Working => None,
            OtgStatus::Finished => {
                self.set_hold(bus, tracker, engine, state);
                tracing::info!("trajectory finished, entering hold");
                None
            }
            OtgStatus::Error => {
                self.set_hold(bus, tracker, engine, state);
                let msg = "trajectory generator reported an error".to_string();
                tracing::warn!("{msg}");
                Some(msg)
            }
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot_state::RobotState;
    use arm_can::MockCanBus;
    use arm_protocol::commands::CMD_MOTOR_STOP;
    use std::time::Duration;

    #[test]
    fn estop_sends_motor_stop_to_every_motor() {
        let (mut bus, handle) = MockCanBus::new();
        let mut tracker = JointTracker::new(200.0);
        let mut state = RobotState::new(tracker.configs(), 1.0);
        let mut engine = TrajectoryEngine::new();
        let mut sm = StateMachine::new();

        sm.set_estop(&mut bus, &mut tracker, &mut engine, &mut state);

        let mut seen_ids = Vec::new();
        while let Some(frame) = handle.recv_sent(Duration::from_millis(5)) {
            assert_eq!(frame.command(), CMD_MOTOR_STOP);
            seen_ids.push(frame.id);
        }
        assert_eq!(seen_ids.len(), NUM_JOINTS);
        assert_eq!(sm.mode, RobotMode::Estop);
    }

    #[test]
    fn hold_after_move_zeroes_trajectory_active_flag() {
        let (mut bus, _handle) = MockCanBus::new();
        let mut tracker = JointTracker::new(200.0);
        let mut state = RobotState::new(tracker.configs(), 1.0);
        let mut engine = TrajectoryEngine::new();
        let mut sm = StateMachine::new();

        sm.move_to_joint_position(&mut engine, &mut state, [10.0; 7], -100f64.to_radians(), 90f64.to_radians());
        assert_eq!(sm.mode, RobotMode::TrajectoryActive);
        assert!(state.trajectory.active);

        sm.set_hold(&mut bus, &mut tracker, &mut engine, &mut state);
        assert_eq!(sm.mode, RobotMode::Hold);
        assert!(!state.trajectory.active);
    }
}
