//! Shared control resources and the emergency-mutex wrapper.
//!
//! Two mutexes, always acquired queue-then-emergency: the inbound command
//! queue, and the full mutable control surface (state machine, trackers,
//! trajectory engine, robot state, CAN bus). A priority command clears the
//! queue and mutates the control surface directly, bypassing the queue
//! entirely; the control thread's normal tick drains the queue first and
//! then locks the control surface for the duration of one tick, which is
//! enough to keep the two paths from racing.

use std::collections::VecDeque;
use std::sync::Arc;

use arm_can::CanBus;
use arm_client::{Command, JointTracker, RobotState, StateMachine, TrajectoryEngine};
use parking_lot::{Mutex, MutexGuard};

pub struct ControlResources {
    pub state_machine: StateMachine,
    pub tracker: JointTracker,
    pub engine: TrajectoryEngine,
    pub robot_state: RobotState,
    pub bus: Box<dyn CanBus + Send>,
}

pub struct SharedControl {
    queue: Mutex<VecDeque<Command>>,
    resources: Mutex<ControlResources>,
}

impl SharedControl {
    pub fn new(resources: ControlResources) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            resources: Mutex::new(resources),
        })
    }

    /// Normal-path command: push onto the inbound queue.
    pub fn enqueue(&self, command: Command) {
        self.queue.lock().push_back(command);
    }

    /// Priority command: clear the queue, then apply
    /// the transition directly under the emergency mutex. Guaranteed to
    /// take effect before the control thread's next `drain_and_lock`
    /// acquires the same mutex.
    pub fn inject_emergency(&self, command: &Command) {
        self.queue.lock().clear();
        let mut r = self.resources.lock();
        match command {
            Command::SetEstop => {
                r.state_machine
                    .set_estop(r.bus.as_mut(), &mut r.tracker, &mut r.engine, &mut r.robot_state);
            }
            Command::SetHoldPosition => {
                r.state_machine
                    .set_hold(r.bus.as_mut(), &mut r.tracker, &mut r.engine, &mut r.robot_state);
            }
            _ => tracing::warn!("inject_emergency called with a non-priority command"),
        }
    }

    /// Drain the inbound queue, then lock the control surface for one
    /// control-thread tick. Lock order: queue before emergency, always.
    pub fn drain_and_lock(&self) -> (Vec<Command>, MutexGuard<'_, ControlResources>) {
        let drained: Vec<Command> = self.queue.lock().drain(..).collect();
        (drained, self.resources.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arm_can::MockCanBus;
    use arm_driver::default_motor_configs;
    use arm_protocol::commands::CMD_MOTOR_STOP;
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

    #[test]
    fn emergency_estop_bypasses_and_clears_queue() {
        let (resources, handle) = test_resources();
        let shared = SharedControl::new(resources);

        for i in 0..10 {
            shared.enqueue(Command::SetSpeed { motor_id: 1, deg_per_s: i as f64 });
        }
        shared.inject_emergency(&Command::SetEstop);

        let (drained, _guard) = shared.drain_and_lock();
        assert!(drained.is_empty());

        let _ = default_motor_configs();
        for _ in 0..7 {
            let frame = handle.recv_sent(Duration::from_millis(5)).expect("expected a motor-stop frame");
            assert_eq!(frame.command(), CMD_MOTOR_STOP);
        }
    }
}
