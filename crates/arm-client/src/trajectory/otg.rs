//! Jerk-limited online trajectory generator, one instance driving all
//! 7 joints in lock-step: each tick every axis is advanced independently,
//! and overall status is the worst of the per-axis statuses.

use crate::robot_state::NUM_JOINTS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtgStatus {
    Working,
    Finished,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisInput {
    pub position: f64,
    pub velocity: f64,
    pub acceleration: f64,
    pub target_position: f64,
    pub target_velocity: f64,
    pub max_velocity: f64,
    pub max_acceleration: f64,
    pub max_jerk: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisOutput {
    pub position: f64,
    pub velocity: f64,
    pub acceleration: f64,
}

const POSITION_EPSILON: f64 = 1e-3;
const VELOCITY_EPSILON: f64 = 1e-3;

/// Advance one axis by `dt`, using a velocity-ramp strategy: the target
/// velocity is the smaller of `max_velocity` and the velocity that lets the
/// axis decelerate to rest exactly at the target under `max_acceleration`,
/// and acceleration changes are rate-limited by `max_jerk`.
fn step_axis(input: AxisInput, dt: f64) -> (AxisOutput, bool) {
    let distance = input.target_position - input.position;
    let direction = if distance >= 0.0 { 1.0 } else { -1.0 };

    let stopping_velocity = (2.0 * input.max_acceleration * distance.abs()).sqrt();
    let cruise_velocity = direction * stopping_velocity.min(input.max_velocity);
    let target_velocity = if distance.abs() < POSITION_EPSILON {
        input.target_velocity
    } else {
        cruise_velocity
    };

    let desired_accel = ((target_velocity - input.velocity) / dt)
        .clamp(-input.max_acceleration, input.max_acceleration);
    let max_da = input.max_jerk * dt;
    let accel = (input.acceleration + (desired_accel - input.acceleration).clamp(-max_da, max_da))
        .clamp(-input.max_acceleration, input.max_acceleration);
    let velocity = (input.velocity + accel * dt).clamp(-input.max_velocity, input.max_velocity);
    let position = input.position + velocity * dt + 0.5 * accel * dt * dt;

    let finished = distance.abs() < POSITION_EPSILON && velocity.abs() < VELOCITY_EPSILON;
    (
        AxisOutput {
            position,
            velocity,
            acceleration: accel,
        },
        finished,
    )
}

pub struct Otg {
    pub inputs: [AxisInput; NUM_JOINTS],
}

impl Otg {
    pub fn new() -> Self {
        Self {
            inputs: [AxisInput::default(); NUM_JOINTS],
        }
    }

    /// Seed every axis from the caller's current state and target, resetting
    /// the generator for a fresh move.
    pub fn seed(&mut self, inputs: [AxisInput; NUM_JOINTS]) {
        self.inputs = inputs;
    }

    /// Advance every axis one tick. Returns the per-joint output and the
    /// aggregate status: `Error` if any axis has non-positive limits,
    /// `Finished` once every axis has converged, else `Working`.
    pub fn step(&mut self, dt: f64) -> ([AxisOutput; NUM_JOINTS], OtgStatus) {
        let mut outputs = [AxisOutput::default(); NUM_JOINTS];
        let mut all_finished = true;
        for (i, input) in self.inputs.iter().enumerate() {
            if input.max_velocity <= 0.0 || input.max_acceleration <= 0.0 || input.max_jerk <= 0.0 {
                return (outputs, OtgStatus::Error);
            }
            let (out, finished) = step_axis(*input, dt);
            outputs[i] = out;
            self.inputs[i].position = out.position;
            self.inputs[i].velocity = out.velocity;
            self.inputs[i].acceleration = out.acceleration;
            all_finished &= finished;
        }
        let status = if all_finished {
            OtgStatus::Finished
        } else {
            OtgStatus::Working
        };
        (outputs, status)
    }
}

impl Default for Otg {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(position: f64, target: f64) -> AxisInput {
        AxisInput {
            position,
            velocity: 0.0,
            acceleration: 0.0,
            target_position: target,
            target_velocity: 0.0,
            max_velocity: 180.0,
            max_acceleration: 360.0,
            max_jerk: 1800.0,
        }
    }

    #[test]
    fn single_axis_converges_monotonically() {
        let mut otg = Otg::new();
        let mut inputs = [AxisInput::default(); NUM_JOINTS];
        inputs[0] = axis(0.0, 146.0);
        otg.seed(inputs);

        let dt = 1.0 / 200.0;
        let max_step = inputs[0].max_velocity * dt;
        let mut last = 0.0;
        let mut status = OtgStatus::Working;
        for _ in 0..100_000 {
            let (out, s) = otg.step(dt);
            let step = out[0].position - last;
            assert!(step >= -1e-6, "position moved backward: {step}");
            assert!(step <= max_step + 1e-6, "step {step} exceeded bound {max_step}");
            last = out[0].position;
            status = s;
            if status == OtgStatus::Finished {
                break;
            }
        }
        assert_eq!(status, OtgStatus::Finished);
        assert!((last - 146.0).abs() < 1e-2);
    }

    #[test]
    fn invalid_limits_report_error() {
        let mut otg = Otg::new();
        let mut inputs = [AxisInput::default(); NUM_JOINTS];
        inputs[0] = AxisInput {
            max_velocity: 0.0,
            ..axis(0.0, 10.0)
        };
        otg.seed(inputs);
        let (_, status) = otg.step(1.0 / 200.0);
        assert_eq!(status, OtgStatus::Error);
    }
}
