//! Trajectory engine: trigger, per-tick stepping, and PI velocity
//! correction on top of the jerk-limited generator in [`otg`].

pub mod otg;

use crate::differential::inverse;
use crate::joint_state::{LEFT_WRIST_JOINT, RIGHT_WRIST_JOINT};
use crate::robot_state::{RobotState, NUM_JOINTS};
use otg::{AxisInput, Otg, OtgStatus};

pub struct TrajectoryEngine {
    otg: Otg,
}

impl TrajectoryEngine {
    pub fn new() -> Self {
        Self { otg: Otg::new() }
    }

    /// `moveToJointPosition`: joints 0..4 take `target[0..4]` directly in
    /// joint degrees; `target[5]` (roll) and `target[6]` (pitch) go through
    /// the differential inverse solver, whose outputs land swapped — index 6
    /// (left) into axis 6, index 5 (right) into axis 5 — already matching
    /// this module's axis layout, so no further swap is needed here.
    pub fn trigger(
        &mut self,
        state: &mut RobotState,
        target: [f64; NUM_JOINTS],
        pitch_limit_low_rad: f64,
        pitch_limit_high_rad: f64,
    ) {
        if state.trajectory.active {
            self.reset(state);
        }

        let mut inputs = [AxisInput::default(); NUM_JOINTS];
        for i in 0..5 {
            inputs[i] = axis_input_from_state(state, i, target[i]);
        }

        let roll_rad = target[5].to_radians();
        let pitch_rad = target[6].to_radians();
        let wrist = inverse(roll_rad, pitch_rad, pitch_limit_low_rad, pitch_limit_high_rad);
        inputs[RIGHT_WRIST_JOINT] = axis_input_from_state(state, RIGHT_WRIST_JOINT, wrist.right_raw);
        inputs[LEFT_WRIST_JOINT] = axis_input_from_state(state, LEFT_WRIST_JOINT, wrist.left_raw);

        for (i, input) in inputs.iter().enumerate() {
            state.trajectory.target_position_deg[i] = input.target_position;
        }
        self.otg.seed(inputs);
        state.trajectory.active = true;
    }

    /// Reset: trajectory marked inactive, OTG re-seeded to the
    /// current position with zero velocity/acceleration and a target equal
    /// to current position.
    pub fn reset(&mut self, state: &mut RobotState) {
        let mut inputs = [AxisInput::default(); NUM_JOINTS];
        for i in 0..NUM_JOINTS {
            let p = state.joints[i].position_deg;
            inputs[i] = AxisInput {
                position: p,
                velocity: 0.0,
                acceleration: 0.0,
                target_position: p,
                target_velocity: 0.0,
                max_velocity: state.joints[i].max_speed,
                max_acceleration: state.joints[i].max_accel,
                max_jerk: state.joints[i].max_jerk,
            };
            state.trajectory.target_position_deg[i] = p;
        }
        self.otg.seed(inputs);
        state.trajectory.active = false;
    }

    /// Advance one tick: step the OTG, mirror the output into the twin,
    /// apply PI correction, and return the per-joint speed-command values
    /// (already in each motor's native deg/s, joints 5/6 divided by 10 to
    /// undo the OTG's raw-unit scale).
    pub fn step(&mut self, state: &mut RobotState, dt: f64) -> ([f64; NUM_JOINTS], OtgStatus) {
        let (outputs, status) = self.otg.step(dt);

        for i in 0..NUM_JOINTS {
            state.twin.joint_angles_deg[i] = outputs[i].position;
        }

        let mut corrected = [0.0; NUM_JOINTS];
        for i in 0..NUM_JOINTS {
            let measured = state.joints[i].position_deg;
            let error = outputs[i].position - measured;
            state.pi.error[i] = error;
            state.pi.integral[i] =
                (state.pi.integral[i] + error * dt).clamp(-state.pi.max_integral, state.pi.max_integral);

            let mut velocity = outputs[i].velocity;
            if i == RIGHT_WRIST_JOINT || i == LEFT_WRIST_JOINT {
                velocity /= 10.0;
            }
            corrected[i] = velocity + state.pi.kp * error + state.pi.ki * state.pi.integral[i];
        }

        (corrected, status)
    }
}

impl Default for TrajectoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn axis_input_from_state(state: &RobotState, i: usize, target_position: f64) -> AxisInput {
    let joint = &state.joints[i];
    AxisInput {
        position: joint.position_deg,
        velocity: joint.speed_deg,
        acceleration: joint.accel_deg,
        target_position,
        target_velocity: 0.0,
        max_velocity: joint.max_speed,
        max_acceleration: joint.max_accel,
        max_jerk: joint.max_jerk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arm_driver::default_motor_configs;

    #[test]
    fn pi_integral_stays_clamped() {
        let configs = default_motor_configs();
        let mut state = RobotState::new(&configs, 1.0);
        let mut engine = TrajectoryEngine::new();
        engine.trigger(&mut state, [146.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], -100f64.to_radians(), 90f64.to_radians());

        let dt = 1.0 / 200.0;
        for _ in 0..5000 {
            engine.step(&mut state, dt);
            for e in state.pi.integral {
                assert!(e.abs() <= state.pi.max_integral + 1e-9);
            }
        }
    }

    #[test]
    fn trigger_swaps_roll_pitch_into_right_left_axes() {
        let configs = default_motor_configs();
        let mut state = RobotState::new(&configs, 1.0);
        let mut engine = TrajectoryEngine::new();
        // roll=0, pitch=90deg -> left ~ +900 raw, right ~ -900 raw.
        engine.trigger(
            &mut state,
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 90.0],
            -100f64.to_radians(),
            90f64.to_radians(),
        );
        assert!((state.trajectory.target_position_deg[LEFT_WRIST_JOINT] - 900.0).abs() < 1.0);
        assert!((state.trajectory.target_position_deg[RIGHT_WRIST_JOINT] - (-900.0)).abs() < 1.0);
    }

    #[test]
    fn reset_seeds_target_to_current_position() {
        let configs = default_motor_configs();
        let mut state = RobotState::new(&configs, 1.0);
        state.joints[0].position_deg = 42.0;
        let mut engine = TrajectoryEngine::new();
        engine.trigger(&mut state, [146.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], -100f64.to_radians(), 90f64.to_radians());
        engine.reset(&mut state);
        assert!(!state.trajectory.active);
        assert_eq!(state.trajectory.target_position_deg[0], 42.0);
    }
}
