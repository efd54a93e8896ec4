//! In-memory loopback `CanBus`, used by `arm-driver` and `arm-client` tests.

use crate::{CanBus, CanError};
use arm_protocol::CanFrame;
use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use std::time::Duration;

/// A `CanBus` that records every sent frame and serves receives from a
/// queue the test harness pushes into via [`MockCanBus::responses`].
pub struct MockCanBus {
    sent_tx: Sender<CanFrame>,
    response_rx: Receiver<CanFrame>,
    response_tx: Sender<CanFrame>,
}

/// A handle a test keeps to drive/inspect a [`MockCanBus`] from outside the
/// thread that owns it.
#[derive(Clone)]
pub struct MockCanHandle {
    sent_rx: Receiver<CanFrame>,
    response_tx: Sender<CanFrame>,
}

impl MockCanBus {
    /// Create a connected `(bus, handle)` pair.
    pub fn new() -> (Self, MockCanHandle) {
        let (sent_tx, sent_rx) = unbounded();
        let (response_tx, response_rx) = unbounded();
        let bus = Self {
            sent_tx,
            response_rx,
            response_tx: response_tx.clone(),
        };
        let handle = MockCanHandle {
            sent_rx,
            response_tx,
        };
        (bus, handle)
    }
}

impl CanBus for MockCanBus {
    fn send(&mut self, frame: CanFrame, _timeout: Duration) -> Result<(), CanError> {
        self.sent_tx
            .send(frame)
            .map_err(|e| CanError::Device(e.to_string()))
    }

    fn receive(&mut self, timeout: Duration) -> Result<CanFrame, CanError> {
        match self.response_rx.recv_timeout(timeout) {
            Ok(frame) => Ok(frame),
            Err(_) => Err(CanError::Timeout),
        }
    }
}

impl MockCanHandle {
    /// Pop the next frame the bus under test sent, if any (non-blocking).
    pub fn try_recv_sent(&self) -> Option<CanFrame> {
        match self.sent_rx.try_recv() {
            Ok(f) => Some(f),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Block until the bus under test sends a frame.
    pub fn recv_sent(&self, timeout: Duration) -> Option<CanFrame> {
        self.sent_rx.recv_timeout(timeout).ok()
    }

    /// Queue a frame for the bus under test's next `receive()` call.
    pub fn push_response(&self, frame: CanFrame) {
        let _ = self.response_tx.send(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_is_observable_via_handle() {
        let (mut bus, handle) = MockCanBus::new();
        let frame = CanFrame::new(0x141, 0x88, &[]);
        bus.send(frame, Duration::from_millis(10)).unwrap();
        assert_eq!(handle.recv_sent(Duration::from_millis(10)), Some(frame));
    }

    #[test]
    fn receive_times_out_with_no_response_queued() {
        let (mut bus, _handle) = MockCanBus::new();
        let err = bus.receive(Duration::from_millis(5));
        assert!(matches!(err, Err(CanError::Timeout)));
    }

    #[test]
    fn receive_returns_queued_response() {
        let (mut bus, handle) = MockCanBus::new();
        let frame = CanFrame::new(0x141, 0x88, &[1, 2, 3]);
        handle.push_response(frame);
        let got = bus.receive(Duration::from_millis(10)).unwrap();
        assert_eq!(got, frame);
    }
}
