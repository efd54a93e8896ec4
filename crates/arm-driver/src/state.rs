//! Mutable per-motor live state, written only by response parsing.

use arm_protocol::units::wrap360;

/// Six 8-bit PID gain values, in the order the motor reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PidGains {
    pub angle_kp: u8,
    pub angle_ki: u8,
    pub speed_kp: u8,
    pub speed_ki: u8,
    pub iq_kp: u8,
    pub iq_ki: u8,
}

/// Everything C2 learns about a motor from its responses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorState {
    pub temperature_c: i8,
    pub bus_voltage_v: f64,
    pub torque_current_raw: i16,
    /// Single-turn position, joint degrees, wrapped to [0, 360).
    pub single_turn_deg: f64,
    /// Multi-turn position, joint degrees, wrapped to [0, 360) for display.
    pub multi_turn_deg_wrapped: f64,
    /// Multi-turn position, raw 0.01-deg units, unwrapped (needed by the
    /// differential solver, which works in continuous motor-shaft angle).
    pub multi_turn_raw: i64,
    /// Joint-output speed: deg/s for non-differential motors, raw/10 units
    /// for differential motors.
    pub speed: f64,
    pub encoder_raw: i32,
    pub error: bool,
    pub error_code: u8,
    pub pid_gains: PidGains,
}

impl Default for MotorState {
    fn default() -> Self {
        Self {
            temperature_c: 0,
            bus_voltage_v: 0.0,
            torque_current_raw: 0,
            single_turn_deg: 0.0,
            multi_turn_deg_wrapped: 0.0,
            multi_turn_raw: 0,
            speed: 0.0,
            encoder_raw: 0,
            error: false,
            error_code: 0,
            pid_gains: PidGains::default(),
        }
    }
}

impl MotorState {
    /// Single-turn and wrapped multi-turn angle must agree within 1 deg
    /// whenever the single-turn angle is strictly inside (0, 180) degrees.
    /// Only meaningful for non-differential motors.
    pub fn needs_resync(&self) -> bool {
        let single = self.single_turn_deg;
        if !(single > 0.0 && single < 180.0) {
            return false;
        }
        let multi = wrap360(self.multi_turn_deg_wrapped);
        (single - multi).abs() >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resync_not_needed_when_angles_agree() {
        let st = MotorState {
            single_turn_deg: 45.0,
            multi_turn_deg_wrapped: 45.4,
            ..Default::default()
        };
        assert!(!st.needs_resync());
    }

    #[test]
    fn resync_needed_on_divergence_inside_sync_window() {
        // Scenario 6: single-turn 45, multi-turn 47 -> diverge by 2deg.
        let st = MotorState {
            single_turn_deg: 45.0,
            multi_turn_deg_wrapped: 47.0,
            ..Default::default()
        };
        assert!(st.needs_resync());
    }

    #[test]
    fn resync_never_triggers_outside_0_180_window() {
        let st = MotorState {
            single_turn_deg: 270.0,
            multi_turn_deg_wrapped: 10.0,
            ..Default::default()
        };
        assert!(!st.needs_resync());
    }
}
