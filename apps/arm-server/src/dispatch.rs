//! Command dispatch: executes one [`Command`] against the shared control
//! resources. Runs either on the control thread (normal-path, drained from
//! the queue) or on a reader thread under the emergency mutex (priority
//! commands only -- see [`crate::emergency`]).

use arm_client::{check_motor_id, Command, OtgStatus};
use arm_driver::config::{DIFF_PITCH_LIMIT_HIGH_DEG, DIFF_PITCH_LIMIT_LOW_DEG};

use crate::emergency::ControlResources;

fn pitch_limits_rad() -> (f64, f64) {
    (
        DIFF_PITCH_LIMIT_LOW_DEG.to_radians(),
        DIFF_PITCH_LIMIT_HIGH_DEG.to_radians(),
    )
}

/// Dispatch one command. Errors are logged and dropped (kinds (b)/(c)); the
/// control tick continues regardless.
pub fn dispatch(command: Command, r: &mut ControlResources) {
    if let Some(id) = command.motor_id() {
        if let Err(e) = check_motor_id(id) {
            tracing::warn!(error = %e, "dropping command with out-of-range motor id");
            return;
        }
    }

    let ControlResources {
        state_machine,
        tracker,
        engine,
        robot_state,
        bus,
    } = r;
    let bus = bus.as_mut();

    let driver_for = |tracker: &mut arm_client::JointTracker, id: u8| {
        tracker.drivers.iter_mut().find(|d| d.config.id == id)
    };

    match command {
        Command::MotorOn { motor_id } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.power_on(bus);
            }
        }
        Command::MotorOff { motor_id } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.power_off(bus);
            }
        }
        Command::MotorStop { motor_id } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.motor_stop(bus);
            }
        }
        Command::SetHoldPosition => {
            state_machine.set_hold(bus, tracker, engine, robot_state);
        }
        Command::SetEstop => {
            state_machine.set_estop(bus, tracker, engine, robot_state);
        }
        Command::OpenLoopControl { motor_id, power } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.open_loop_drive(bus, power);
            }
        }
        Command::SetTorque { motor_id, iq } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.closed_torque(bus, iq);
            }
        }
        Command::SetSpeed { motor_id, deg_per_s } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.closed_speed(bus, deg_per_s);
            }
        }
        Command::SetMultiAngle { motor_id, angle_deg } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.multi_angle(bus, angle_deg);
            }
        }
        Command::SetMultiAngleWithSpeed { motor_id, angle_deg, max_speed } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.multi_angle_with_speed(bus, angle_deg, max_speed, robot_state.speed_modifier);
            }
        }
        Command::SetSingleAngle { motor_id, angle_deg } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.single_angle(bus, angle_deg);
            }
        }
        Command::SetSingleAngleWithSpeed { motor_id, angle_deg, max_speed } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.single_angle_with_speed(bus, angle_deg, max_speed, robot_state.speed_modifier);
            }
        }
        Command::SetIncrementAngle { motor_id, delta_deg } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.increment_angle(bus, delta_deg);
            }
        }
        Command::SetIncrementAngleWithSpeed { motor_id, delta_deg, max_speed } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.increment_angle_with_speed(bus, delta_deg, max_speed, robot_state.speed_modifier);
            }
        }
        Command::SetMultiJointAngles { angles } => {
            for (d, angle) in tracker.drivers.iter_mut().zip(angles.iter()) {
                let _ = d.multi_angle(bus, *angle);
            }
        }
        Command::SetDifferentialAngles { roll_rad, pitch_rad, max_speed } => {
            let (lo, hi) = pitch_limits_rad();
            let targets = arm_client::differential::inverse(roll_rad, pitch_rad, lo, hi);
            let modifier = robot_state.speed_modifier;
            if let Some(d) = driver_for(tracker, 6) {
                let _ = d.multi_angle_with_speed(bus, targets.left_raw, max_speed, modifier);
            }
            if let Some(d) = driver_for(tracker, 7) {
                let _ = d.multi_angle_with_speed(bus, targets.right_raw, max_speed, modifier);
            }
        }
        Command::MoveToJointPositionRuckig { angles } => {
            let (lo, hi) = pitch_limits_rad();
            state_machine.move_to_joint_position(engine, robot_state, angles, lo, hi);
        }
        Command::SetMaxSpeedModifier { modifier } => {
            robot_state.speed_modifier = modifier;
            robot_state.refresh_limits(tracker.configs());
        }
        Command::SyncSingleAndMulti { motor_id } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.clear_angle(bus);
            }
        }
        Command::ReadPid { motor_id } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.read_pid(bus);
            }
        }
        Command::WritePidRam { motor_id, gains } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.write_pid_ram(bus, gains);
            }
        }
        Command::WritePidRom { motor_id, gains } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.write_pid_rom(bus, gains);
            }
        }
        Command::ReadAcceleration { motor_id } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.read_accel(bus);
            }
        }
        Command::WriteAcceleration { motor_id, accel } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.write_accel(bus, accel);
            }
        }
        Command::ReadEncoder { motor_id } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.read_encoder(bus);
            }
        }
        Command::WriteEncoderOffset { motor_id, offset } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.write_encoder_offset_rom(bus, offset);
            }
        }
        Command::WriteCurrentPosAsZero { motor_id } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.write_current_pos_as_zero(bus);
            }
        }
        Command::ReadMultiAngle { motor_id } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.read_multi_angle(bus);
            }
        }
        Command::ReadSingleAngle { motor_id } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.read_single_angle(bus);
            }
        }
        Command::ClearAngle { motor_id } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.clear_angle(bus);
            }
        }
        Command::ReadState1Error { motor_id } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.read_state1_error(bus);
            }
        }
        Command::ClearError { motor_id } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.clear_error(bus);
            }
        }
        Command::ReadState2 { motor_id } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.read_state2(bus);
            }
        }
        Command::ReadState3 { motor_id } => {
            if let Some(d) = driver_for(tracker, motor_id) {
                let _ = d.read_state3(bus);
            }
        }
    }
}

/// One control-tick's worth of work after commands have been dispatched:
/// read-back, trajectory stepping, state-machine termination handling.
pub fn tick_control(r: &mut ControlResources, dt: f64) {
    if let Err(e) = r.tracker.tick(r.bus.as_mut(), &mut r.robot_state) {
        tracing::warn!(error = %e, "joint state tracker tick failed");
    }

    if r.robot_state.trajectory.active {
        let (velocities, status) = r.engine.step(&mut r.robot_state, dt);
        for (i, driver) in r.tracker.drivers.iter_mut().enumerate() {
            if let Err(e) = driver.closed_speed(r.bus.as_mut(), velocities[i]) {
                tracing::warn!(motor_id = driver.config.id, error = %e, "speed command failed");
            }
        }
        if status != OtgStatus::Working {
            r.state_machine
                .on_trajectory_status(status, r.bus.as_mut(), &mut r.tracker, &mut r.engine, &mut r.robot_state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arm_can::MockCanBus;
    use arm_client::{JointTracker, RobotState, StateMachine, TrajectoryEngine};
    use arm_protocol::commands::{CMD_CLOSED_SPEED, CMD_POWER_ON};
    use std::time::Duration;

    fn test_resources() -> (ControlResources, arm_can::MockCanHandle) {
        let (bus, handle) = MockCanBus::new();
        let tracker = JointTracker::new(200.0);
        let robot_state = RobotState::new(tracker.configs(), 1.0);
        (
            ControlResources {
                state_machine: StateMachine::new(),
                tracker,
                engine: TrajectoryEngine::new(),
                robot_state,
                bus: Box::new(bus),
            },
            handle,
        )
    }

    /// Scenario 1: startup + motor on -- one 0x88 frame on arbitration id
    /// 0x141 with an all-zero payload.
    #[test]
    fn scenario_1_motor_on_sends_zero_payload_power_on() {
        let (mut r, handle) = test_resources();
        dispatch(Command::MotorOn { motor_id: 1 }, &mut r);

        let frame = handle.recv_sent(Duration::from_millis(5)).expect("expected a frame");
        assert_eq!(frame.id, 0x141);
        assert_eq!(frame.command(), CMD_POWER_ON);
        assert_eq!(frame.data[1..8], [0u8; 7]);
    }

    /// Scenario 2: `setSpeed` for motor 3 (reduction 9) at 30 deg/s -- a
    /// 0xA2 frame on id 0x143 whose bytes 3..6 equal 30*100*9 = 27000 LE.
    #[test]
    fn scenario_2_set_speed_scales_into_bytes_3_to_6() {
        let (mut r, handle) = test_resources();
        dispatch(Command::SetSpeed { motor_id: 3, deg_per_s: 30.0 }, &mut r);

        let frame = handle.recv_sent(Duration::from_millis(5)).expect("expected a frame");
        assert_eq!(frame.id, 0x143);
        assert_eq!(frame.command(), CMD_CLOSED_SPEED);
        let raw = i32::from_le_bytes(frame.data[3..7].try_into().unwrap());
        assert_eq!(raw, 27_000);
    }

    /// Scenario 3: a joint-position move drives joint 1 monotonically from
    /// 0 deg toward its 146 deg target, bounded per tick by Vmax*dt, then
    /// settles into Hold once the trajectory finishes.
    #[test]
    fn scenario_3_trajectory_converges_then_holds() {
        let (mut r, _handle) = test_resources();
        let (lo, hi) = pitch_limits_rad();
        let target = [146.0, 74.3, 116.0, 45.0, 78.0, 0.0, 0.0];
        r.state_machine.move_to_joint_position(&mut r.engine, &mut r.robot_state, target, lo, hi);
        assert!(r.robot_state.trajectory.active);

        let dt = 1.0 / 200.0;
        let max_step = r.robot_state.joints[0].max_speed * dt + 1e-6;
        let mut prev = r.robot_state.twin.joint_angles_deg[0];
        let mut finished = false;
        for _ in 0..20_000 {
            let (_velocities, status) = r.engine.step(&mut r.robot_state, dt);
            let pos = r.robot_state.twin.joint_angles_deg[0];
            assert!(pos >= prev - 1e-9, "joint 1 regressed: {prev} -> {pos}");
            assert!(pos - prev <= max_step, "per-tick step {} exceeded bound {}", pos - prev, max_step);
            prev = pos;
            if status != OtgStatus::Working {
                r.state_machine.on_trajectory_status(
                    status,
                    r.bus.as_mut(),
                    &mut r.tracker,
                    &mut r.engine,
                    &mut r.robot_state,
                );
                finished = true;
                break;
            }
        }
        assert!(finished, "trajectory never converged");
        assert!((prev - 146.0).abs() < 1e-6);
        assert_eq!(r.state_machine.mode, arm_client::RobotMode::Hold);
    }
}
