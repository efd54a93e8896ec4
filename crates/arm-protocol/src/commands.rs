//! Motor command byte constants and CAN id mapping.
//!
//! One CAN frame per transaction: arbitration id `0x140 + motor_id`, byte 0 is
//! the command code, bytes 1..7 are the little-endian payload (per-command
//! layout documented at each call site in `arm-driver`).

/// Arbitration id base. The motor's own id (1..=7) is added on top.
pub const ARBITRATION_BASE: u16 = 0x140;

/// Smallest valid motor id.
pub const MIN_MOTOR_ID: u8 = 1;
/// Largest valid motor id.
pub const MAX_MOTOR_ID: u8 = 7;

/// Compute the arbitration id for a given motor id (1..=7).
pub const fn arbitration_id(motor_id: u8) -> u16 {
    ARBITRATION_BASE + motor_id as u16
}

/// Recover the motor id encoded in an arbitration id, if it's in range.
pub fn motor_id_from_arbitration(id: u16) -> Option<u8> {
    if id < ARBITRATION_BASE {
        return None;
    }
    let candidate = (id - ARBITRATION_BASE) as u8;
    (MIN_MOTOR_ID..=MAX_MOTOR_ID).contains(&candidate).then_some(candidate)
}

// ---- Power ----
pub const CMD_POWER_OFF: u8 = 0x80;
pub const CMD_POWER_ON: u8 = 0x88;
pub const CMD_MOTOR_STOP: u8 = 0x81;

// ---- Open-loop / closed-loop drive ----
pub const CMD_OPEN_LOOP_POWER: u8 = 0xA0;
pub const CMD_CLOSED_TORQUE: u8 = 0xA1;
pub const CMD_CLOSED_SPEED: u8 = 0xA2;

// ---- Angle commands ----
pub const CMD_MULTI_ANGLE: u8 = 0xA3;
pub const CMD_MULTI_ANGLE_WITH_SPEED: u8 = 0xA4;
pub const CMD_SINGLE_ANGLE: u8 = 0xA5;
pub const CMD_SINGLE_ANGLE_WITH_SPEED: u8 = 0xA6;
pub const CMD_INCREMENT_ANGLE: u8 = 0xA7;
pub const CMD_INCREMENT_ANGLE_WITH_SPEED: u8 = 0xA8;

// ---- Reads ----
pub const CMD_READ_PID: u8 = 0x30;
pub const CMD_READ_ACCEL: u8 = 0x33;
pub const CMD_READ_ENCODER: u8 = 0x90;
pub const CMD_READ_MULTI_ANGLE: u8 = 0x92;
pub const CMD_READ_SINGLE_ANGLE: u8 = 0x94;
pub const CMD_READ_STATE1_ERROR: u8 = 0x9A;
pub const CMD_READ_STATE2: u8 = 0x9C;
pub const CMD_READ_STATE3: u8 = 0x9D;

// ---- Maintenance ----
pub const CMD_CLEAR_MULTI_LOOP_ANGLE: u8 = 0x93;
pub const CMD_CLEAR_ANGLE: u8 = 0x95;
pub const CMD_CLEAR_ERROR: u8 = 0x9B;
pub const CMD_WRITE_ENCODER_OFFSET_ROM: u8 = 0x91;
pub const CMD_WRITE_CURRENT_POS_AS_ZERO: u8 = 0x19;
pub const CMD_WRITE_PID_RAM: u8 = 0x31;
pub const CMD_WRITE_PID_ROM: u8 = 0x32;
pub const CMD_WRITE_ACCEL: u8 = 0x34;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arbitration_id_matches_spec_example() {
        // Scenario 1: motorOn on motor 1 => id 0x141.
        assert_eq!(arbitration_id(1), 0x141);
        // Scenario 2: setSpeed on motor 3 => id 0x143.
        assert_eq!(arbitration_id(3), 0x143);
    }

    #[test]
    fn motor_id_round_trip() {
        for id in MIN_MOTOR_ID..=MAX_MOTOR_ID {
            let arb = arbitration_id(id);
            assert_eq!(motor_id_from_arbitration(arb), Some(id));
        }
        assert_eq!(motor_id_from_arbitration(0x140), None);
        assert_eq!(motor_id_from_arbitration(0x148), None);
    }
}
