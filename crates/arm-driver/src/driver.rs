//! Per-motor command surface: one `MotorDriver` instance per physical
//! motor, all of them sharing one `CanBus` owned by the control thread.
//! Commands are synchronous request/response: send, then wait at most
//! [`TRANSACTION_CEILING`] for a frame whose arbitration id and command byte
//! match. A non-matching frame or a timeout ends the transaction without
//! mutating state; the driver does not retry.

use std::time::Duration;

use arm_can::CanBus;
use arm_protocol::commands::*;
use arm_protocol::{arbitration_id, motor_id_from_arbitration, CanFrame};

use crate::config::MotorConfig;
use crate::error::DriverError;
use crate::response::apply_response;
use crate::state::MotorState;

/// Ceiling for one CAN request/response round trip.
pub const TRANSACTION_CEILING: Duration = Duration::from_millis(10);

pub struct MotorDriver {
    pub config: MotorConfig,
    pub state: MotorState,
}

impl MotorDriver {
    pub fn new(config: MotorConfig) -> Self {
        Self {
            config,
            state: MotorState::default(),
        }
    }

    fn send_and_await(
        &mut self,
        bus: &mut dyn CanBus,
        command: u8,
        payload: [u8; 7],
    ) -> Result<Option<CanFrame>, DriverError> {
        let frame = CanFrame::new(arbitration_id(self.config.id), command, &payload);
        bus.send(frame, TRANSACTION_CEILING)?;
        match bus.receive(TRANSACTION_CEILING) {
            Ok(resp) => {
                let matches = motor_id_from_arbitration(resp.id) == Some(self.config.id)
                    && resp.command() == command;
                Ok(matches.then_some(resp))
            }
            Err(arm_can::CanError::Timeout) => {
                tracing::warn!(
                    motor_id = self.config.id,
                    command,
                    "CAN transaction exceeded the 10ms ceiling"
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run one transaction and, if a matching response arrived, fold it into
    /// state. Returns whether a multi-loop-angle resync should be issued.
    fn transact(
        &mut self,
        bus: &mut dyn CanBus,
        command: u8,
        payload: [u8; 7],
    ) -> Result<bool, DriverError> {
        if let Some(resp) = self.send_and_await(bus, command, payload)? {
            Ok(apply_response(&self.config, &mut self.state, &resp))
        } else {
            Ok(false)
        }
    }

    // ---- Power ----

    pub fn power_off(&mut self, bus: &mut dyn CanBus) -> Result<(), DriverError> {
        self.transact(bus, CMD_POWER_OFF, [0; 7])?;
        Ok(())
    }

    pub fn power_on(&mut self, bus: &mut dyn CanBus) -> Result<(), DriverError> {
        self.transact(bus, CMD_POWER_ON, [0; 7])?;
        Ok(())
    }

    pub fn motor_stop(&mut self, bus: &mut dyn CanBus) -> Result<(), DriverError> {
        self.transact(bus, CMD_MOTOR_STOP, [0; 7])?;
        Ok(())
    }

    // ---- Open-loop / closed-loop drive ----

    /// Open-loop drive power, range [-850, 850].
    pub fn open_loop_drive(&mut self, bus: &mut dyn CanBus, power: i16) -> Result<(), DriverError> {
        let mut payload = [0u8; 7];
        payload[0..2].copy_from_slice(&power.to_le_bytes());
        self.transact(bus, CMD_OPEN_LOOP_POWER, payload)?;
        Ok(())
    }

    /// Closed-loop torque (iq) command.
    pub fn closed_torque(&mut self, bus: &mut dyn CanBus, iq_raw: i16) -> Result<(), DriverError> {
        let mut payload = [0u8; 7];
        payload[0..2].copy_from_slice(&iq_raw.to_le_bytes());
        self.transact(bus, CMD_CLOSED_TORQUE, payload)?;
        Ok(())
    }

    /// Closed-loop speed command, deg/s at joint output. Scaled ×100 then
    /// ×10 for differential motors or ×r otherwise; not angle-clamped.
    pub fn closed_speed(&mut self, bus: &mut dyn CanBus, deg_per_s: f64) -> Result<(), DriverError> {
        let scale = if self.config.is_differential {
            10.0
        } else {
            self.config.reduction_ratio
        };
        let raw = (deg_per_s * 100.0 * scale).round() as i32;
        let mut payload = [0u8; 7];
        payload[2..6].copy_from_slice(&raw.to_le_bytes());
        self.transact(bus, CMD_CLOSED_SPEED, payload)?;
        Ok(())
    }

    // ---- Angle commands ----

    /// Clamp `value` to [limit_low, limit_high] and scale to the raw wire
    /// unit (×100×r).
    fn angle_raw(&self, value: f64) -> i32 {
        let clamped = self.config.clamp_angle(value);
        (clamped * 100.0 * self.config.reduction_ratio).round() as i32
    }

    /// Clamp a max-speed input to Vmax*speed_modifier, scale like
    /// [`closed_speed`], and promote a zero result to 1.
    fn max_speed_raw(&self, requested: f64, speed_modifier: f64) -> u16 {
        let ceiling = self.config.max_speed * speed_modifier;
        let clamped = requested.clamp(0.0, ceiling);
        let scale = if self.config.is_differential {
            10.0
        } else {
            self.config.reduction_ratio
        };
        let raw = (clamped * scale).round() as i64;
        let raw = if raw <= 0 { 1 } else { raw };
        raw.min(u16::MAX as i64) as u16
    }

    pub fn multi_angle(&mut self, bus: &mut dyn CanBus, angle: f64) -> Result<(), DriverError> {
        let mut payload = [0u8; 7];
        payload[2..6].copy_from_slice(&self.angle_raw(angle).to_le_bytes());
        self.transact(bus, CMD_MULTI_ANGLE, payload)?;
        Ok(())
    }

    pub fn multi_angle_with_speed(
        &mut self,
        bus: &mut dyn CanBus,
        angle: f64,
        max_speed: f64,
        speed_modifier: f64,
    ) -> Result<(), DriverError> {
        let mut payload = [0u8; 7];
        payload[0..2].copy_from_slice(&self.max_speed_raw(max_speed, speed_modifier).to_le_bytes());
        payload[2..6].copy_from_slice(&self.angle_raw(angle).to_le_bytes());
        self.transact(bus, CMD_MULTI_ANGLE_WITH_SPEED, payload)?;
        Ok(())
    }

    pub fn single_angle(&mut self, bus: &mut dyn CanBus, angle: f64) -> Result<(), DriverError> {
        let mut payload = [0u8; 7];
        payload[2..6].copy_from_slice(&self.angle_raw(angle).to_le_bytes());
        self.transact(bus, CMD_SINGLE_ANGLE, payload)?;
        Ok(())
    }

    pub fn single_angle_with_speed(
        &mut self,
        bus: &mut dyn CanBus,
        angle: f64,
        max_speed: f64,
        speed_modifier: f64,
    ) -> Result<(), DriverError> {
        let mut payload = [0u8; 7];
        payload[0..2].copy_from_slice(&self.max_speed_raw(max_speed, speed_modifier).to_le_bytes());
        payload[2..6].copy_from_slice(&self.angle_raw(angle).to_le_bytes());
        self.transact(bus, CMD_SINGLE_ANGLE_WITH_SPEED, payload)?;
        Ok(())
    }

    pub fn increment_angle(&mut self, bus: &mut dyn CanBus, delta: f64) -> Result<(), DriverError> {
        let mut payload = [0u8; 7];
        payload[2..6].copy_from_slice(&self.angle_raw(delta).to_le_bytes());
        self.transact(bus, CMD_INCREMENT_ANGLE, payload)?;
        Ok(())
    }

    pub fn increment_angle_with_speed(
        &mut self,
        bus: &mut dyn CanBus,
        delta: f64,
        max_speed: f64,
        speed_modifier: f64,
    ) -> Result<(), DriverError> {
        let mut payload = [0u8; 7];
        payload[0..2].copy_from_slice(&self.max_speed_raw(max_speed, speed_modifier).to_le_bytes());
        payload[2..6].copy_from_slice(&self.angle_raw(delta).to_le_bytes());
        self.transact(bus, CMD_INCREMENT_ANGLE_WITH_SPEED, payload)?;
        Ok(())
    }

    // ---- Reads ----

    pub fn read_pid(&mut self, bus: &mut dyn CanBus) -> Result<(), DriverError> {
        self.transact(bus, CMD_READ_PID, [0; 7])?;
        Ok(())
    }

    pub fn read_encoder(&mut self, bus: &mut dyn CanBus) -> Result<(), DriverError> {
        self.transact(bus, CMD_READ_ENCODER, [0; 7])?;
        Ok(())
    }

    pub fn read_single_angle(&mut self, bus: &mut dyn CanBus) -> Result<(), DriverError> {
        self.transact(bus, CMD_READ_SINGLE_ANGLE, [0; 7])?;
        Ok(())
    }

    /// Read the multi-turn angle and, for a non-differential motor whose
    /// single/multi-turn readings have diverged, issue the clearing command
    /// that forces the two back into sync.
    pub fn read_multi_angle(&mut self, bus: &mut dyn CanBus) -> Result<(), DriverError> {
        if self.transact(bus, CMD_READ_MULTI_ANGLE, [0; 7])? {
            self.send_and_await(bus, CMD_CLEAR_MULTI_LOOP_ANGLE, [0; 7])?;
        }
        Ok(())
    }

    pub fn read_state1_error(&mut self, bus: &mut dyn CanBus) -> Result<(), DriverError> {
        self.transact(bus, CMD_READ_STATE1_ERROR, [0; 7])?;
        Ok(())
    }

    pub fn read_state2(&mut self, bus: &mut dyn CanBus) -> Result<(), DriverError> {
        self.transact(bus, CMD_READ_STATE2, [0; 7])?;
        Ok(())
    }

    pub fn read_state3(&mut self, bus: &mut dyn CanBus) -> Result<(), DriverError> {
        self.transact(bus, CMD_READ_STATE3, [0; 7])?;
        Ok(())
    }

    // ---- Maintenance ----

    pub fn clear_error(&mut self, bus: &mut dyn CanBus) -> Result<(), DriverError> {
        self.transact(bus, CMD_CLEAR_ERROR, [0; 7])?;
        Ok(())
    }

    pub fn clear_angle(&mut self, bus: &mut dyn CanBus) -> Result<(), DriverError> {
        self.transact(bus, CMD_CLEAR_ANGLE, [0; 7])?;
        Ok(())
    }

    pub fn write_current_pos_as_zero(&mut self, bus: &mut dyn CanBus) -> Result<(), DriverError> {
        self.transact(bus, CMD_WRITE_CURRENT_POS_AS_ZERO, [0; 7])?;
        Ok(())
    }

    pub fn write_encoder_offset_rom(
        &mut self,
        bus: &mut dyn CanBus,
        offset: u16,
    ) -> Result<(), DriverError> {
        let mut payload = [0u8; 7];
        payload[0..2].copy_from_slice(&offset.to_le_bytes());
        self.transact(bus, CMD_WRITE_ENCODER_OFFSET_ROM, payload)?;
        Ok(())
    }

    pub fn write_pid_ram(&mut self, bus: &mut dyn CanBus, gains: [u8; 6]) -> Result<(), DriverError> {
        let mut payload = [0u8; 7];
        payload[0..6].copy_from_slice(&gains);
        self.transact(bus, CMD_WRITE_PID_RAM, payload)?;
        Ok(())
    }

    pub fn write_pid_rom(&mut self, bus: &mut dyn CanBus, gains: [u8; 6]) -> Result<(), DriverError> {
        let mut payload = [0u8; 7];
        payload[0..6].copy_from_slice(&gains);
        self.transact(bus, CMD_WRITE_PID_ROM, payload)?;
        Ok(())
    }

    pub fn write_accel(&mut self, bus: &mut dyn CanBus, accel: i32) -> Result<(), DriverError> {
        let mut payload = [0u8; 7];
        payload[2..6].copy_from_slice(&accel.to_le_bytes());
        self.transact(bus, CMD_WRITE_ACCEL, payload)?;
        Ok(())
    }

    pub fn read_accel(&mut self, bus: &mut dyn CanBus) -> Result<(), DriverError> {
        self.transact(bus, CMD_READ_ACCEL, [0; 7])?;
        Ok(())
    }
}
