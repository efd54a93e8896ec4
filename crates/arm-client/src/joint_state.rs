//! Joint state tracker: per-cycle read-back, numerical differentiation,
//! limit refresh, and differential forward recompute.

use std::collections::BTreeMap;

use arm_can::CanBus;
use arm_driver::{default_motor_configs, MotorConfig, MotorDriver};
use serde::Deserialize;

use crate::differential::forward;
use crate::error::ClientError;
use crate::robot_state::{RobotState, NUM_JOINTS};

/// Index 5 carries the right wrist motor, index 6 the left.
pub const RIGHT_WRIST_JOINT: usize = 5;
pub const LEFT_WRIST_JOINT: usize = 6;

/// Per-joint soft-limit override, folded onto the compiled-in motor config
/// by id. Either field left absent keeps the compiled-in default.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct JointLimitOverride {
    pub limit_low: Option<f64>,
    pub limit_high: Option<f64>,
}

pub struct JointTracker {
    pub drivers: [MotorDriver; NUM_JOINTS],
    configs: [MotorConfig; NUM_JOINTS],
    dt: f64,
}

impl JointTracker {
    pub fn new(control_rate_hz: f64) -> Self {
        let configs = default_motor_configs();
        let drivers = configs.map(MotorDriver::new);
        Self {
            drivers,
            configs,
            dt: 1.0 / control_rate_hz,
        }
    }

    pub fn configs(&self) -> &[MotorConfig; NUM_JOINTS] {
        &self.configs
    }

    /// Fold per-joint limit overrides (keyed by motor id) onto both the
    /// tracker's own config table and each driver's copy.
    pub fn apply_limit_overrides(&mut self, overrides: &BTreeMap<u8, JointLimitOverride>) {
        for (cfg, driver) in self.configs.iter_mut().zip(self.drivers.iter_mut()) {
            let Some(o) = overrides.get(&cfg.id) else {
                continue;
            };
            if let Some(low) = o.limit_low {
                cfg.limit_low = low;
                driver.config.limit_low = low;
            }
            if let Some(high) = o.limit_high {
                cfg.limit_high = high;
                driver.config.limit_high = high;
            }
        }
    }

    /// One control-tick read-back. Errors from individual motor
    /// transactions are per-tick transient (kind (a)); they don't abort the
    /// rest of the read-back, matching the "logged, tick continues" policy.
    pub fn tick(&mut self, bus: &mut dyn CanBus, state: &mut RobotState) -> Result<(), ClientError> {
        state.refresh_limits(&self.configs);

        for (i, driver) in self.drivers.iter_mut().enumerate() {
            let joint = &mut state.joints[i];
            joint.prev_position_deg = joint.position_deg;
            joint.prev_speed_deg = joint.speed_deg;

            if let Err(e) = driver.read_state2(bus) {
                tracing::warn!(motor_id = driver.config.id, error = %e, "state2 read failed");
            }
            if let Err(e) = driver.read_single_angle(bus) {
                tracing::warn!(motor_id = driver.config.id, error = %e, "single-angle read failed");
            }
            if let Err(e) = driver.read_multi_angle(bus) {
                tracing::warn!(motor_id = driver.config.id, error = %e, "multi-angle read failed");
            }

            let new_position = if driver.config.is_differential {
                driver.state.multi_turn_raw as f64 / 100.0
            } else {
                driver.state.multi_turn_deg_wrapped
            };
            joint.position_deg = new_position;
            joint.position_rad = new_position.to_radians();
            joint.speed_deg = (joint.position_deg - joint.prev_position_deg) / self.dt;
            joint.speed_rad = joint.speed_deg.to_radians();
            joint.accel_deg = (joint.speed_deg - joint.prev_speed_deg) / self.dt;
            joint.accel_rad = joint.accel_deg.to_radians();
        }

        state.differential.left_raw = state.joints[LEFT_WRIST_JOINT].position_deg;
        state.differential.right_raw = state.joints[RIGHT_WRIST_JOINT].position_deg;
        let a_l = (state.differential.left_raw / 10.0).to_radians();
        let a_r = (state.differential.right_raw / 10.0).to_radians();
        state.differential.apply_forward(forward(a_l, a_r));

        // Twin's differential mirror, driven by the twin's own joint vector
        // rather than sensor feedback.
        let twin_a_l = (state.twin.joint_angles_deg[LEFT_WRIST_JOINT] / 10.0).to_radians();
        let twin_a_r = (state.twin.joint_angles_deg[RIGHT_WRIST_JOINT] / 10.0).to_radians();
        let twin_rp = forward(twin_a_l, twin_a_r);
        state.twin.joint_angles_deg[5] = twin_rp.pitch_rad;
        state.twin.joint_angles_deg[6] = twin_rp.roll_rad;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arm_can::MockCanBus;

    #[test]
    fn limit_override_only_touches_the_targeted_joint() {
        let mut tracker = JointTracker::new(200.0);
        let mut overrides = BTreeMap::new();
        overrides.insert(
            3,
            JointLimitOverride {
                limit_low: Some(-10.0),
                limit_high: None,
            },
        );
        tracker.apply_limit_overrides(&overrides);

        let joint3 = tracker.configs().iter().find(|c| c.id == 3).unwrap();
        assert_eq!(joint3.limit_low, -10.0);
        assert_eq!(joint3.limit_high, 225.0);
        assert_eq!(tracker.drivers[2].config.limit_low, -10.0);

        let joint1 = tracker.configs().iter().find(|c| c.id == 1).unwrap();
        assert_eq!(joint1.limit_low, 0.0);
    }

    #[test]
    fn tick_updates_prev_before_overwriting_position() {
        let (mut bus, _handle) = MockCanBus::new();
        let mut tracker = JointTracker::new(200.0);
        let mut state = RobotState::new(tracker.configs(), 1.0);
        state.joints[0].position_deg = 10.0;
        tracker.tick(&mut bus, &mut state).unwrap();
        assert_eq!(state.joints[0].prev_position_deg, 10.0);
    }

    #[test]
    fn speed_is_finite_difference_of_position() {
        let (mut bus, _handle) = MockCanBus::new();
        let mut tracker = JointTracker::new(200.0);
        let mut state = RobotState::new(tracker.configs(), 1.0);
        state.joints[0].position_deg = 0.0;

        // No responses queued: all reads time out, position stays at its
        // default (0.0) and speed is the finite difference against that.
        tracker.tick(&mut bus, &mut state).unwrap();
        assert_eq!(state.joints[0].speed_deg, 0.0);
    }
}
