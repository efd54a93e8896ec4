//! Unit conversion helpers shared by the motor driver.

use std::f64::consts::PI;

/// `raw_to_radians(x) = (x / S) * 2π`, where `S` is the motor's single-turn
/// raw-angle span.
pub fn raw_to_radians(raw: f64, span: f64) -> f64 {
    (raw / span) * 2.0 * PI
}

/// `radians_to_raw(θ) = clamp((θ / 2π) * S, lo, hi)`.
pub fn radians_to_raw(theta: f64, span: f64, lo: f64, hi: f64) -> f64 {
    let raw = (theta / (2.0 * PI)) * span;
    raw.clamp(lo, hi)
}

/// Wrap a degree value into `[0, 360)`.
pub fn wrap360(deg: f64) -> f64 {
    let wrapped = deg % 360.0;
    if wrapped < 0.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Wrap a radian value into `(-π, π]`.
pub fn wrap_pi(rad: f64) -> f64 {
    let mut wrapped = rad % (2.0 * PI);
    if wrapped <= -PI {
        wrapped += 2.0 * PI;
    } else if wrapped > PI {
        wrapped -= 2.0 * PI;
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn wrap360_handles_negative() {
        assert!((wrap360(-10.0) - 350.0).abs() < 1e-9);
        assert!((wrap360(370.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn wrap_pi_keeps_range() {
        let w = wrap_pi(4.0);
        assert!(w > -PI && w <= PI);
    }

    proptest! {
        #[test]
        fn raw_radians_round_trip_inside_span(span in 100.0f64..40000.0) {
            // theta chosen so its raw form lies inside [0, span] (no clamping).
            let raw_in = span * 0.3;
            let theta = raw_to_radians(raw_in, span);
            let raw_out = radians_to_raw(theta, span, 0.0, span);
            prop_assert!((raw_out - raw_in).abs() < 1e-6);
        }
    }
}
