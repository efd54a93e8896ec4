//! Real SocketCAN backend (Linux only).
//!
//! This is the external collaborator assumed above: blocking send/receive
//! of 8-byte frames. Kept intentionally thin — no retry logic, no
//! bus-recovery state machine; that responsibility lives one layer up, in
//! the motor driver.

use crate::{CanBus, CanError};
use arm_protocol::CanFrame;
use socketcan::{CanFrame as SocketCanFrame, CanSocket, EmbeddedFrame, Frame, Socket, StandardId};
use std::time::Duration;

pub struct SocketCanBus {
    socket: CanSocket,
}

impl SocketCanBus {
    /// Open a SocketCAN interface by name (e.g. `"can0"`).
    pub fn open(interface: &str) -> Result<Self, CanError> {
        let socket = CanSocket::open(interface).map_err(|e| CanError::Device(e.to_string()))?;
        Ok(Self { socket })
    }
}

impl CanBus for SocketCanBus {
    fn send(&mut self, frame: CanFrame, timeout: Duration) -> Result<(), CanError> {
        self.socket
            .set_write_timeout(timeout)
            .map_err(CanError::Io)?;
        let id = StandardId::new(frame.id).ok_or_else(|| {
            CanError::Device(format!("arbitration id 0x{:X} is not an 11-bit id", frame.id))
        })?;
        let raw = SocketCanFrame::new(id, &frame.data)
            .ok_or_else(|| CanError::Device("failed to build CAN frame".to_string()))?;
        self.socket.write_frame(&raw).map_err(CanError::Io)
    }

    fn receive(&mut self, timeout: Duration) -> Result<CanFrame, CanError> {
        self.socket
            .set_read_timeout(timeout)
            .map_err(CanError::Io)?;
        match self.socket.read_frame() {
            Ok(raw) => {
                let id = match raw.id() {
                    embedded_can::Id::Standard(s) => s.as_raw(),
                    embedded_can::Id::Extended(e) => e.as_raw() as u16,
                };
                let mut data = [0u8; 8];
                let slice = raw.data();
                let n = slice.len().min(8);
                data[..n].copy_from_slice(&slice[..n]);
                Ok(CanFrame { id, data })
            }
            Err(e) => {
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut
                {
                    Err(CanError::Timeout)
                } else {
                    Err(CanError::Io(e))
                }
            }
        }
    }
}
