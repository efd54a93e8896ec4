//! Wire-level JSON shapes and the parse boundary that turns a raw line into
//! a [`Command`] or a [`ClientError::MalformedCommand`] (kind (b)).

use arm_client::{Command, RobotState};
use arm_client::{ClientError, JointTracker};
use serde::{Deserialize, Serialize};

/// The inbound envelope: `{"cmd": <string>, "motorID"?: int, ...args}`.
/// Every field beyond `cmd` is optional since its presence depends on which
/// command is named.
#[derive(Debug, Deserialize)]
struct RawCommand {
    cmd: String,
    #[serde(rename = "motorID")]
    motor_id: Option<u8>,
    value: Option<f64>,
    angles: Option<[f64; 7]>,
    roll: Option<f64>,
    pitch: Option<f64>,
    #[serde(rename = "maxSpeed")]
    max_speed: Option<f64>,
    modifier: Option<f64>,
    gains: Option<[u8; 6]>,
    offset: Option<u16>,
    accel: Option<i32>,
    power: Option<i16>,
    iq: Option<i16>,
    delta: Option<f64>,
}

fn require_motor_id(raw: &RawCommand) -> Result<u8, ClientError> {
    raw.motor_id
        .ok_or_else(|| ClientError::MalformedCommand(format!("{} requires motorID", raw.cmd)))
}

fn require_value(raw: &RawCommand) -> Result<f64, ClientError> {
    raw.value
        .ok_or_else(|| ClientError::MalformedCommand(format!("{} requires value", raw.cmd)))
}

fn require_angles(raw: &RawCommand) -> Result<[f64; 7], ClientError> {
    raw.angles
        .ok_or_else(|| ClientError::MalformedCommand(format!("{} requires angles", raw.cmd)))
}

/// Parse one newline-delimited JSON line into a [`Command`]. Non-JSON input,
/// a missing `cmd`, a missing required argument, or an unrecognized `cmd`
/// value are all kind (b) malformed-command errors -- logged and dropped,
/// never propagated.
pub fn parse_line(line: &str) -> Result<Command, ClientError> {
    let raw: RawCommand = serde_json::from_str(line)
        .map_err(|e| ClientError::MalformedCommand(format!("invalid JSON: {e}")))?;

    Ok(match raw.cmd.as_str() {
        "motorOn" => Command::MotorOn { motor_id: require_motor_id(&raw)? },
        "motorOff" => Command::MotorOff { motor_id: require_motor_id(&raw)? },
        "motorStop" => Command::MotorStop { motor_id: require_motor_id(&raw)? },
        "setHoldPosition" => Command::SetHoldPosition,
        "setESTOP" => Command::SetEstop,
        "openLoopControl" => Command::OpenLoopControl {
            motor_id: require_motor_id(&raw)?,
            power: raw.power.ok_or_else(|| ClientError::MalformedCommand("openLoopControl requires power".into()))?,
        },
        "setTorque" => Command::SetTorque {
            motor_id: require_motor_id(&raw)?,
            iq: raw.iq.ok_or_else(|| ClientError::MalformedCommand("setTorque requires iq".into()))?,
        },
        "setSpeed" => Command::SetSpeed { motor_id: require_motor_id(&raw)?, deg_per_s: require_value(&raw)? },
        "setMultiAngle" => Command::SetMultiAngle { motor_id: require_motor_id(&raw)?, angle_deg: require_value(&raw)? },
        "setMultiAngleWithSpeed" => Command::SetMultiAngleWithSpeed {
            motor_id: require_motor_id(&raw)?,
            angle_deg: require_value(&raw)?,
            max_speed: raw.max_speed.ok_or_else(|| ClientError::MalformedCommand("setMultiAngleWithSpeed requires maxSpeed".into()))?,
        },
        "setSingleAngle" => Command::SetSingleAngle { motor_id: require_motor_id(&raw)?, angle_deg: require_value(&raw)? },
        "setSingleAngleWithSpeed" => Command::SetSingleAngleWithSpeed {
            motor_id: require_motor_id(&raw)?,
            angle_deg: require_value(&raw)?,
            max_speed: raw.max_speed.ok_or_else(|| ClientError::MalformedCommand("setSingleAngleWithSpeed requires maxSpeed".into()))?,
        },
        "setIncrementAngle" => Command::SetIncrementAngle {
            motor_id: require_motor_id(&raw)?,
            delta_deg: raw.delta.ok_or_else(|| ClientError::MalformedCommand("setIncrementAngle requires delta".into()))?,
        },
        "setIncrementAngleWithSpeed" => Command::SetIncrementAngleWithSpeed {
            motor_id: require_motor_id(&raw)?,
            delta_deg: raw.delta.ok_or_else(|| ClientError::MalformedCommand("setIncrementAngleWithSpeed requires delta".into()))?,
            max_speed: raw.max_speed.ok_or_else(|| ClientError::MalformedCommand("setIncrementAngleWithSpeed requires maxSpeed".into()))?,
        },
        "setMultiJointAngles" => Command::SetMultiJointAngles { angles: require_angles(&raw)? },
        "setDifferentialAngles" => Command::SetDifferentialAngles {
            roll_rad: raw.roll.ok_or_else(|| ClientError::MalformedCommand("setDifferentialAngles requires roll".into()))?,
            pitch_rad: raw.pitch.ok_or_else(|| ClientError::MalformedCommand("setDifferentialAngles requires pitch".into()))?,
            max_speed: raw.max_speed.ok_or_else(|| ClientError::MalformedCommand("setDifferentialAngles requires maxSpeed".into()))?,
        },
        "moveToJointPositionRuckig" => Command::MoveToJointPositionRuckig { angles: require_angles(&raw)? },
        "setMaxSpeedModifier" => Command::SetMaxSpeedModifier {
            modifier: raw.modifier.ok_or_else(|| ClientError::MalformedCommand("setMaxSpeedModifier requires modifier".into()))?,
        },
        "syncSingleAndMulti" => Command::SyncSingleAndMulti { motor_id: require_motor_id(&raw)? },
        "readPID" => Command::ReadPid { motor_id: require_motor_id(&raw)? },
        "writePID_RAM" => Command::WritePidRam {
            motor_id: require_motor_id(&raw)?,
            gains: raw.gains.ok_or_else(|| ClientError::MalformedCommand("writePID_RAM requires gains".into()))?,
        },
        "writePID_ROM" => Command::WritePidRom {
            motor_id: require_motor_id(&raw)?,
            gains: raw.gains.ok_or_else(|| ClientError::MalformedCommand("writePID_ROM requires gains".into()))?,
        },
        "readAcceleration" => Command::ReadAcceleration { motor_id: require_motor_id(&raw)? },
        "writeAcceleration" => Command::WriteAcceleration {
            motor_id: require_motor_id(&raw)?,
            accel: raw.accel.ok_or_else(|| ClientError::MalformedCommand("writeAcceleration requires accel".into()))?,
        },
        "readEncoder" => Command::ReadEncoder { motor_id: require_motor_id(&raw)? },
        "writeEncoderOffset" => Command::WriteEncoderOffset {
            motor_id: require_motor_id(&raw)?,
            offset: raw.offset.ok_or_else(|| ClientError::MalformedCommand("writeEncoderOffset requires offset".into()))?,
        },
        "writeCurrentPosAsZero" => Command::WriteCurrentPosAsZero { motor_id: require_motor_id(&raw)? },
        "readMultiAngle" => Command::ReadMultiAngle { motor_id: require_motor_id(&raw)? },
        "readSingleAngle" => Command::ReadSingleAngle { motor_id: require_motor_id(&raw)? },
        "clearAngle" => Command::ClearAngle { motor_id: require_motor_id(&raw)? },
        "readState1_Error" => Command::ReadState1Error { motor_id: require_motor_id(&raw)? },
        "clearError" => Command::ClearError { motor_id: require_motor_id(&raw)? },
        "readState2" => Command::ReadState2 { motor_id: require_motor_id(&raw)? },
        "readState3" => Command::ReadState3 { motor_id: require_motor_id(&raw)? },
        other => return Err(ClientError::MalformedCommand(format!("unknown cmd: {other}"))),
    })
}

/// Outbound broadcast shape.
#[derive(Debug, Serialize)]
pub struct MotorSnapshot {
    pub temp: i8,
    #[serde(rename = "torqueA")]
    pub torque_a: i16,
    #[serde(rename = "speedDeg_s")]
    pub speed_deg_s: f64,
    #[serde(rename = "posDeg")]
    pub pos_deg: f64,
    #[serde(rename = "multiTurnRaw")]
    pub multi_turn_raw: i64,
    #[serde(rename = "multiTurnRad_Mapped")]
    pub multi_turn_rad_mapped: f64,
    #[serde(rename = "multiTurnDeg_Mapped")]
    pub multi_turn_deg_mapped: f64,
    pub error: u8,
    pub encoder_val: i32,
    #[serde(rename = "positionRad_Mapped")]
    pub position_rad_mapped: f64,
    #[serde(rename = "positionDeg_Mapped")]
    pub position_deg_mapped: f64,
    pub gains: MotorGains,
}

#[derive(Debug, Serialize)]
pub struct MotorGains {
    #[serde(rename = "angKp")]
    pub ang_kp: u8,
    #[serde(rename = "angKi")]
    pub ang_ki: u8,
    #[serde(rename = "spdKp")]
    pub spd_kp: u8,
    #[serde(rename = "spdKi")]
    pub spd_ki: u8,
    #[serde(rename = "iqKp")]
    pub iq_kp: u8,
    #[serde(rename = "iqKi")]
    pub iq_ki: u8,
}

#[derive(Debug, Serialize)]
pub struct TwinSnapshot {
    pub active: bool,
    pub joint_angles_deg: [f64; 7],
}

#[derive(Debug, Serialize)]
pub struct StateBroadcast {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub motors: std::collections::BTreeMap<String, MotorSnapshot>,
    pub diff_roll_rad: f64,
    pub diff_pitch_rad: f64,
    pub diff_roll_deg: f64,
    pub diff_pitch_deg: f64,
    pub twin: TwinSnapshot,
}

pub fn build_broadcast(tracker: &JointTracker, state: &RobotState) -> StateBroadcast {
    let mut motors = std::collections::BTreeMap::new();
    for driver in &tracker.drivers {
        let s = &driver.state;
        motors.insert(
            driver.config.id.to_string(),
            MotorSnapshot {
                temp: s.temperature_c,
                torque_a: s.torque_current_raw,
                speed_deg_s: s.speed,
                pos_deg: s.single_turn_deg,
                multi_turn_raw: s.multi_turn_raw,
                multi_turn_rad_mapped: s.multi_turn_deg_wrapped.to_radians(),
                multi_turn_deg_mapped: s.multi_turn_deg_wrapped,
                error: s.error as u8,
                encoder_val: s.encoder_raw,
                position_rad_mapped: s.single_turn_deg.to_radians(),
                position_deg_mapped: s.single_turn_deg,
                gains: MotorGains {
                    ang_kp: s.pid_gains.angle_kp,
                    ang_ki: s.pid_gains.angle_ki,
                    spd_kp: s.pid_gains.speed_kp,
                    spd_ki: s.pid_gains.speed_ki,
                    iq_kp: s.pid_gains.iq_kp,
                    iq_ki: s.pid_gains.iq_ki,
                },
            },
        );
    }
    StateBroadcast {
        kind: "motorStates",
        motors,
        diff_roll_rad: state.differential.roll_rad,
        diff_pitch_rad: state.differential.pitch_rad,
        diff_roll_deg: state.differential.roll_deg(),
        diff_pitch_deg: state.differential.pitch_deg(),
        twin: TwinSnapshot {
            active: state.twin.active,
            joint_angles_deg: state.twin.joint_angles_deg,
        },
    }
}
