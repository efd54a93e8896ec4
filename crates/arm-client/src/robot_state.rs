//! Robot state: the single mutable object the control thread owns.

use arm_driver::MotorConfig;
use serde::Serialize;

use crate::differential::RollPitch;

pub const NUM_JOINTS: usize = 7;

/// Per-joint kinematic state, degrees and radians kept side by side because
/// the IPC wire format reports both.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JointKinematics {
    pub position_deg: f64,
    pub position_rad: f64,
    pub speed_deg: f64,
    pub speed_rad: f64,
    pub accel_deg: f64,
    pub accel_rad: f64,
    pub prev_position_deg: f64,
    pub prev_speed_deg: f64,
    /// Active limits, already scaled by the speed modifier.
    pub limit_low: f64,
    pub limit_high: f64,
    pub max_speed: f64,
    pub max_accel: f64,
    pub max_jerk: f64,
}

/// Trajectory sub-state: the OTG's input/output blocks plus progress.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrajectorySubState {
    pub active: bool,
    pub target_position_deg: [f64; NUM_JOINTS],
    pub target_velocity_deg: [f64; NUM_JOINTS],
    pub target_accel_deg: [f64; NUM_JOINTS],
}

/// PI sub-state: per-joint error accumulation, shared gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiSubState {
    pub error: [f64; NUM_JOINTS],
    pub integral: [f64; NUM_JOINTS],
    pub kp: f64,
    pub ki: f64,
    pub max_integral: f64,
}

impl Default for PiSubState {
    fn default() -> Self {
        Self {
            error: [0.0; NUM_JOINTS],
            integral: [0.0; NUM_JOINTS],
            kp: 8.0,
            ki: 0.0,
            max_integral: 10.0,
        }
    }
}

/// Twin sub-state: non-physical mirror used by clients for visualization,
/// independent of sensor feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Twin {
    pub active: bool,
    /// Five joint degrees, then pitch (rad), then roll (rad).
    pub joint_angles_deg: [f64; NUM_JOINTS],
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DifferentialSubState {
    pub left_raw: f64,
    pub right_raw: f64,
    pub roll_rad: f64,
    pub pitch_rad: f64,
}

impl DifferentialSubState {
    pub fn apply_forward(&mut self, rp: RollPitch) {
        self.roll_rad = rp.roll_rad;
        self.pitch_rad = rp.pitch_rad;
    }

    pub fn roll_deg(&self) -> f64 {
        self.roll_rad.to_degrees()
    }

    pub fn pitch_deg(&self) -> f64 {
        self.pitch_rad.to_degrees()
    }
}

/// The full robot state singleton. Constructed once at startup with all
/// motors enumerated and limits populated; lives until shutdown.
pub struct RobotState {
    pub joints: [JointKinematics; NUM_JOINTS],
    pub differential: DifferentialSubState,
    pub trajectory: TrajectorySubState,
    pub twin: Twin,
    pub pi: PiSubState,
    pub speed_modifier: f64,
}

impl RobotState {
    pub fn new(configs: &[MotorConfig; NUM_JOINTS], speed_modifier: f64) -> Self {
        let mut joints = [JointKinematics::default(); NUM_JOINTS];
        for (j, cfg) in joints.iter_mut().zip(configs.iter()) {
            apply_limits(j, cfg, speed_modifier);
        }
        Self {
            joints,
            differential: DifferentialSubState::default(),
            trajectory: TrajectorySubState::default(),
            twin: Twin::default(),
            pi: PiSubState::default(),
            speed_modifier,
        }
    }

    /// Refresh every joint's active limits from its static config and the
    /// current speed modifier ("limit * speed_modifier", x10 more for
    /// differentials).
    pub fn refresh_limits(&mut self, configs: &[MotorConfig; NUM_JOINTS]) {
        for (j, cfg) in self.joints.iter_mut().zip(configs.iter()) {
            apply_limits(j, cfg, self.speed_modifier);
        }
    }
}

fn apply_limits(joint: &mut JointKinematics, cfg: &MotorConfig, speed_modifier: f64) {
    let diff_scale = if cfg.is_differential { 10.0 } else { 1.0 };
    joint.limit_low = cfg.limit_low;
    joint.limit_high = cfg.limit_high;
    joint.max_speed = cfg.max_speed * speed_modifier * diff_scale;
    joint.max_accel = cfg.max_accel * speed_modifier * diff_scale;
    joint.max_jerk = cfg.max_jerk * speed_modifier * diff_scale;
}

#[cfg(test)]
mod tests {
    use super::*;
    use arm_driver::default_motor_configs;

    #[test]
    fn limits_scale_by_speed_modifier() {
        let configs = default_motor_configs();
        let state = RobotState::new(&configs, 0.5);
        assert!((state.joints[0].max_speed - 90.0).abs() < 1e-9);
        // differential joint: x10 extra scale
        assert!((state.joints[5].max_speed - 1800.0).abs() < 1e-9);
    }

    #[test]
    fn pi_defaults_match_spec() {
        let pi = PiSubState::default();
        assert_eq!(pi.kp, 8.0);
        assert_eq!(pi.ki, 0.0);
        assert_eq!(pi.max_integral, 10.0);
    }
}
