//! Differential wrist kinematic coupling.
//!
//! Left motor angle `a_l` and right motor angle `a_r` are radians at the
//! motor shaft. Array index 5 always carries the *right* motor, index 6 the
//! *left* motor. This module itself only deals in named `a_l`/`a_r`; the
//! index swap lives at the trajectory trigger boundary.

use arm_protocol::units::wrap_pi;

/// Raw motor-shaft units per 0.1 degree, used to rescale inverse-solver
/// output to the wire's native raw unit.
pub const RAW_UNITS_PER_DEG: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollPitch {
    pub roll_rad: f64,
    pub pitch_rad: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WristTargets {
    pub left_raw: f64,
    pub right_raw: f64,
}

/// Forward: roll = -1/2(a_l + a_r); pitch = wrap(1/2(a_l - a_r)).
pub fn forward(a_l: f64, a_r: f64) -> RollPitch {
    RollPitch {
        roll_rad: -0.5 * (a_l + a_r),
        pitch_rad: wrap_pi(0.5 * (a_l - a_r)),
    }
}

/// Inverse: clamp pitch to the hardware limits (radians), wrap to (-pi,pi],
/// then a_l = -roll + pitch, a_r = -roll - pitch. Output is rescaled from
/// radians to the motor's native raw unit (0.1 deg per LSB).
pub fn inverse(roll_rad: f64, pitch_rad: f64, pitch_limit_low_rad: f64, pitch_limit_high_rad: f64) -> WristTargets {
    let clamped_pitch = wrap_pi(pitch_rad.clamp(pitch_limit_low_rad, pitch_limit_high_rad));
    let a_l = -roll_rad + clamped_pitch;
    let a_r = -roll_rad - clamped_pitch;
    WristTargets {
        left_raw: a_l.to_degrees() * RAW_UNITS_PER_DEG,
        right_raw: a_r.to_degrees() * RAW_UNITS_PER_DEG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const PITCH_LOW: f64 = -100.0_f64.to_radians();
    const PITCH_HIGH: f64 = 90.0_f64.to_radians();

    #[test]
    fn scenario_4_differential_inverse() {
        // roll=0, pitch=1.5708 rad (~90deg) -> left ~= +900 raw, right ~= -900.
        let targets = inverse(0.0, 1.5708, PITCH_LOW, PITCH_HIGH);
        assert!((targets.left_raw - 900.0).abs() < 1.0);
        assert!((targets.right_raw - (-900.0)).abs() < 1.0);
    }

    #[test]
    fn pitch_outside_hardware_limits_clamps() {
        let over = inverse(0.0, PI, PITCH_LOW, PITCH_HIGH);
        let at_limit = inverse(0.0, PITCH_HIGH, PITCH_LOW, PITCH_HIGH);
        assert!((over.left_raw - at_limit.left_raw).abs() < 1e-6);
        assert!((over.right_raw - at_limit.right_raw).abs() < 1e-6);
    }

    proptest::proptest! {
        #[test]
        fn forward_inverse_round_trip(
            roll in -PI..PI,
            pitch in PITCH_LOW..PITCH_HIGH,
        ) {
            let targets = inverse(roll, pitch, PITCH_LOW, PITCH_HIGH);
            let a_l = (targets.left_raw / RAW_UNITS_PER_DEG).to_radians();
            let a_r = (targets.right_raw / RAW_UNITS_PER_DEG).to_radians();
            let rp = forward(a_l, a_r);
            proptest::prop_assert!((rp.roll_rad - roll).abs() < 1e-6);
            proptest::prop_assert!((rp.pitch_rad - pitch).abs() < 1e-6);
        }
    }
}
