//! IPC command vocabulary, decoupled from its JSON wire encoding.
//! `apps/arm-server`'s IPC layer parses JSON lines into this enum; unknown
//! `cmd` values never reach it (logged and dropped at the parse boundary).

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    MotorOn { motor_id: u8 },
    MotorOff { motor_id: u8 },
    MotorStop { motor_id: u8 },
    SetHoldPosition,
    SetEstop,
    OpenLoopControl { motor_id: u8, power: i16 },
    SetTorque { motor_id: u8, iq: i16 },
    SetSpeed { motor_id: u8, deg_per_s: f64 },
    SetMultiAngle { motor_id: u8, angle_deg: f64 },
    SetMultiAngleWithSpeed { motor_id: u8, angle_deg: f64, max_speed: f64 },
    SetSingleAngle { motor_id: u8, angle_deg: f64 },
    SetSingleAngleWithSpeed { motor_id: u8, angle_deg: f64, max_speed: f64 },
    SetIncrementAngle { motor_id: u8, delta_deg: f64 },
    SetIncrementAngleWithSpeed { motor_id: u8, delta_deg: f64, max_speed: f64 },
    SetMultiJointAngles { angles: [f64; 7] },
    SetDifferentialAngles { roll_rad: f64, pitch_rad: f64, max_speed: f64 },
    MoveToJointPositionRuckig { angles: [f64; 7] },
    SetMaxSpeedModifier { modifier: f64 },
    SyncSingleAndMulti { motor_id: u8 },
    ReadPid { motor_id: u8 },
    WritePidRam { motor_id: u8, gains: [u8; 6] },
    WritePidRom { motor_id: u8, gains: [u8; 6] },
    ReadAcceleration { motor_id: u8 },
    WriteAcceleration { motor_id: u8, accel: i32 },
    ReadEncoder { motor_id: u8 },
    WriteEncoderOffset { motor_id: u8, offset: u16 },
    WriteCurrentPosAsZero { motor_id: u8 },
    ReadMultiAngle { motor_id: u8 },
    ReadSingleAngle { motor_id: u8 },
    ClearAngle { motor_id: u8 },
    ReadState1Error { motor_id: u8 },
    ClearError { motor_id: u8 },
    ReadState2 { motor_id: u8 },
    ReadState3 { motor_id: u8 },
}

impl Command {
    /// `setESTOP`/`setHoldPosition` bypass the queue under the emergency
    /// mutex; every other command is queued.
    pub fn is_priority(&self) -> bool {
        matches!(self, Command::SetEstop | Command::SetHoldPosition)
    }

    /// The single-motor target this command addresses, if any. Commands
    /// that operate on the whole arm (moves, hold, estop, speed modifier)
    /// return `None` and skip the per-motor-id range check.
    pub fn motor_id(&self) -> Option<u8> {
        use Command::*;
        match self {
            MotorOn { motor_id }
            | MotorOff { motor_id }
            | MotorStop { motor_id }
            | OpenLoopControl { motor_id, .. }
            | SetTorque { motor_id, .. }
            | SetSpeed { motor_id, .. }
            | SetMultiAngle { motor_id, .. }
            | SetMultiAngleWithSpeed { motor_id, .. }
            | SetSingleAngle { motor_id, .. }
            | SetSingleAngleWithSpeed { motor_id, .. }
            | SetIncrementAngle { motor_id, .. }
            | SetIncrementAngleWithSpeed { motor_id, .. }
            | SyncSingleAndMulti { motor_id }
            | ReadPid { motor_id }
            | WritePidRam { motor_id, .. }
            | WritePidRom { motor_id, .. }
            | ReadAcceleration { motor_id }
            | WriteAcceleration { motor_id, .. }
            | ReadEncoder { motor_id }
            | WriteEncoderOffset { motor_id, .. }
            | WriteCurrentPosAsZero { motor_id }
            | ReadMultiAngle { motor_id }
            | ReadSingleAngle { motor_id }
            | ClearAngle { motor_id }
            | ReadState1Error { motor_id }
            | ClearError { motor_id }
            | ReadState2 { motor_id }
            | ReadState3 { motor_id } => Some(*motor_id),
            SetHoldPosition
            | SetEstop
            | SetMultiJointAngles { .. }
            | SetDifferentialAngles { .. }
            | MoveToJointPositionRuckig { .. }
            | SetMaxSpeedModifier { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estop_and_hold_are_priority() {
        assert!(Command::SetEstop.is_priority());
        assert!(Command::SetHoldPosition.is_priority());
        assert!(!Command::MotorOn { motor_id: 1 }.is_priority());
    }

    #[test]
    fn whole_arm_commands_have_no_motor_id() {
        assert_eq!(Command::SetEstop.motor_id(), None);
        assert_eq!(Command::MotorOn { motor_id: 3 }.motor_id(), Some(3));
    }
}
