//! Response frame parsing: dispatch on command byte, update state.
//!
//! Byte layout (little-endian, byte 0 is always the command echo):
//! - motion responses (0xA0-0xA8) and state2 (0x9C): temp@1, iq i16@2,
//!   speed i16@4, encoder u16@6.
//! - state1 (0x9A): temp@1, voltage u16@3 (0.1V units), error_state@5.
//! - single-turn angle (0x94) and multi-turn angle (0x92): i32 raw angle@4.
//! - PID (0x30): six gain bytes at offsets 1..7.

use crate::config::MotorConfig;
use crate::state::{MotorState, PidGains};
use arm_protocol::commands::*;
use arm_protocol::CanFrame;

/// Apply a response frame to motor state. Returns `true` if the sync check
/// fires and a clear-multi-loop-angle command should be sent.
pub fn apply_response(config: &MotorConfig, state: &mut MotorState, frame: &CanFrame) -> bool {
    match frame.command() {
        CMD_OPEN_LOOP_POWER
        | CMD_CLOSED_TORQUE
        | CMD_CLOSED_SPEED
        | CMD_MULTI_ANGLE
        | CMD_MULTI_ANGLE_WITH_SPEED
        | CMD_SINGLE_ANGLE
        | CMD_SINGLE_ANGLE_WITH_SPEED
        | CMD_INCREMENT_ANGLE
        | CMD_INCREMENT_ANGLE_WITH_SPEED
        | CMD_READ_STATE2 => {
            parse_motion(config, state, frame);
            false
        }
        CMD_READ_STATE1_ERROR => {
            parse_state1(state, frame);
            false
        }
        CMD_READ_SINGLE_ANGLE => {
            parse_single_angle(config, state, frame);
            false
        }
        CMD_READ_MULTI_ANGLE => {
            parse_multi_angle(config, state, frame);
            !config.is_differential && state.needs_resync()
        }
        CMD_READ_PID => {
            parse_pid(state, frame);
            false
        }
        _ => false,
    }
}

fn parse_motion(config: &MotorConfig, state: &mut MotorState, frame: &CanFrame) {
    state.temperature_c = frame.data[1] as i8;
    state.torque_current_raw = frame.unpack16(2).unwrap_or(0);
    let raw_speed = frame.unpack16(4).unwrap_or(0) as f64 / 100.0;
    state.speed = if config.is_differential {
        raw_speed / 10.0
    } else {
        raw_speed / config.reduction_ratio
    };
    state.encoder_raw = frame.data[6] as i32 | ((frame.data[7] as i32) << 8);
}

fn parse_state1(state: &mut MotorState, frame: &CanFrame) {
    state.temperature_c = frame.data[1] as i8;
    let voltage_raw = u16::from_le_bytes([frame.data[3], frame.data[4]]);
    state.bus_voltage_v = voltage_raw as f64 / 10.0;
    let error_byte = frame.data[5];
    state.error = error_byte != 0;
    state.error_code = error_byte;
}

fn parse_single_angle(config: &MotorConfig, state: &mut MotorState, frame: &CanFrame) {
    let raw = frame.unpack32(4).unwrap_or(0) as f64 / 100.0;
    let joint_deg = raw / config.reduction_ratio;
    state.single_turn_deg = arm_protocol::units::wrap360(joint_deg);
}

fn parse_multi_angle(config: &MotorConfig, state: &mut MotorState, frame: &CanFrame) {
    let raw = frame.unpack32(4).unwrap_or(0) as i64;
    state.multi_turn_raw = raw;
    if config.is_differential {
        // Differential motors store the raw multi-turn value directly.
        state.multi_turn_deg_wrapped = raw as f64 / 100.0;
    } else {
        let joint_deg = (raw as f64 / 100.0) / config.reduction_ratio;
        state.multi_turn_deg_wrapped = arm_protocol::units::wrap360(joint_deg);
    }
}

fn parse_pid(state: &mut MotorState, frame: &CanFrame) {
    state.pid_gains = PidGains {
        angle_kp: frame.data[1],
        angle_ki: frame.data[2],
        speed_kp: frame.data[3],
        speed_ki: frame.data[4],
        iq_kp: frame.data[5],
        iq_ki: frame.data[6],
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_motor_configs;

    #[test]
    fn state1_parses_temp_voltage_error() {
        let config = default_motor_configs()[0];
        let mut state = MotorState::default();
        let mut frame = CanFrame::new(0x141, CMD_READ_STATE1_ERROR, &[]);
        frame.data[1] = 42; // temp
        frame.data[3..5].copy_from_slice(&240u16.to_le_bytes()); // 24.0V
        frame.data[5] = 0x01; // error flag
        apply_response(&config, &mut state, &frame);
        assert_eq!(state.temperature_c, 42);
        assert!((state.bus_voltage_v - 24.0).abs() < 1e-9);
        assert!(state.error);
        assert_eq!(state.error_code, 1);
    }

    #[test]
    fn multi_angle_triggers_resync_on_divergence() {
        let config = default_motor_configs()[1]; // non-differential joint 2
        let mut state = MotorState {
            single_turn_deg: 45.0,
            ..Default::default()
        };
        // multi-turn raw (deci-milli-deg before /100) encodes 47 joint-deg
        // after dividing by reduction ratio: raw = 47 * r * 100.
        let raw = (47.0 * config.reduction_ratio * 100.0) as i32;
        let mut frame = CanFrame::new(0x142, CMD_READ_MULTI_ANGLE, &[]);
        frame.pack32(4, raw).unwrap();
        let should_resync = apply_response(&config, &mut state, &frame);
        assert!(should_resync);
    }

    #[test]
    fn differential_motor_never_flags_resync() {
        let config = default_motor_configs()[5]; // motor 6, differential
        let mut state = MotorState {
            single_turn_deg: 45.0,
            ..Default::default()
        };
        let mut frame = CanFrame::new(0x146, CMD_READ_MULTI_ANGLE, &[]);
        frame.pack32(4, 4700).unwrap();
        let should_resync = apply_response(&config, &mut state, &frame);
        assert!(!should_resync);
    }
}
