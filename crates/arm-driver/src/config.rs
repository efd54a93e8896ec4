//! Immutable per-motor configuration.

/// Single-turn raw-angle span: raw counts per 360 deg at the motor shaft
/// (0.01 deg resolution, matching the single-turn position field's units).
pub const SINGLE_TURN_SPAN: f64 = 36_000.0;

/// Configuration for one motor, fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorConfig {
    pub id: u8,
    /// Reduction ratio between motor shaft and joint output.
    pub reduction_ratio: f64,
    /// Raw counts per 360 deg at the motor shaft.
    pub single_turn_span: f64,
    /// Soft angle limits: joint degrees for non-differential motors, raw
    /// 0.01-deg motor-shaft units for differential motors (ids 6, 7).
    pub limit_low: f64,
    pub limit_high: f64,
    /// Max speed (deg/s at joint output).
    pub max_speed: f64,
    /// Max acceleration (deg/s^2).
    pub max_accel: f64,
    /// Max jerk (deg/s^3).
    pub max_jerk: f64,
    pub is_differential: bool,
}

impl MotorConfig {
    pub const fn is_valid_id(id: u8) -> bool {
        id >= 1 && id <= 7
    }

    /// Clamp a value into this motor's soft limits.
    pub fn clamp_angle(&self, value: f64) -> f64 {
        value.clamp(self.limit_low, self.limit_high)
    }
}

/// Default configuration for all 7 motors, ported from the original
/// per-joint parameter header (see DESIGN.md for the motor-to-joint
/// assignment rationale). Motors 1-5 are the non-differential arm joints;
/// motors 6 (left) and 7 (right) drive the coupled wrist differential.
pub fn default_motor_configs() -> [MotorConfig; 7] {
    [
        MotorConfig {
            id: 1,
            reduction_ratio: 9.0,
            single_turn_span: SINGLE_TURN_SPAN,
            limit_low: 0.0,
            limit_high: 210.0,
            max_speed: 180.0,
            max_accel: 360.0,
            max_jerk: 1800.0,
            is_differential: false,
        },
        MotorConfig {
            id: 2,
            reduction_ratio: 9.0,
            single_turn_span: SINGLE_TURN_SPAN,
            limit_low: 5.0,
            limit_high: 215.0,
            max_speed: 180.0,
            max_accel: 360.0,
            max_jerk: 1800.0,
            is_differential: false,
        },
        MotorConfig {
            id: 3,
            reduction_ratio: 9.0,
            single_turn_span: SINGLE_TURN_SPAN,
            limit_low: -30.0,
            limit_high: 225.0,
            max_speed: 180.0,
            max_accel: 360.0,
            max_jerk: 1800.0,
            is_differential: false,
        },
        MotorConfig {
            id: 4,
            reduction_ratio: 10.0,
            single_turn_span: SINGLE_TURN_SPAN,
            limit_low: 2.5,
            limit_high: 245.0,
            max_speed: 180.0,
            max_accel: 360.0,
            max_jerk: 1800.0,
            is_differential: false,
        },
        MotorConfig {
            id: 5,
            reduction_ratio: 10.0,
            single_turn_span: SINGLE_TURN_SPAN,
            limit_low: -30.0,
            limit_high: 210.0,
            max_speed: 180.0,
            max_accel: 360.0,
            max_jerk: 1800.0,
            is_differential: false,
        },
        MotorConfig {
            id: 6,
            reduction_ratio: 1.0,
            single_turn_span: SINGLE_TURN_SPAN,
            limit_low: -36_000.0,
            limit_high: 36_000.0,
            max_speed: 360.0,
            max_accel: 720.0,
            max_jerk: 3600.0,
            is_differential: true,
        },
        MotorConfig {
            id: 7,
            reduction_ratio: 1.0,
            single_turn_span: SINGLE_TURN_SPAN,
            limit_low: -36_000.0,
            limit_high: 36_000.0,
            max_speed: 360.0,
            max_accel: 720.0,
            max_jerk: 3600.0,
            is_differential: true,
        },
    ]
}

/// Default wrist pitch hardware limits, in degrees.
pub const DIFF_PITCH_LIMIT_LOW_DEG: f64 = -100.0;
pub const DIFF_PITCH_LIMIT_HIGH_DEG: f64 = 90.0;

/// Default speed modifier applied to every per-joint max speed/accel/jerk.
pub const DEFAULT_SPEED_MODIFIER: f64 = 1.0 / 6.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_is_idempotent() {
        let cfg = default_motor_configs()[0];
        for x in [-500.0, 0.0, 100.0, 210.0, 9000.0] {
            let once = cfg.clamp_angle(x);
            let twice = cfg.clamp_angle(once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn differential_motors_are_flagged() {
        let configs = default_motor_configs();
        assert!(!configs[0].is_differential);
        assert!(configs[5].is_differential);
        assert!(configs[6].is_differential);
    }
}
