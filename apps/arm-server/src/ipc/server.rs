//! The IPC acceptor. Binds the Unix domain socket, spawns a detached
//! reader thread per client, and exposes a broadcast path the control loop
//! calls once per broadcast tick. A client's FD list is guarded by its own
//! mutex, scoped to broadcast and connect/disconnect only -- it never nests
//! inside the queue or emergency mutexes.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use arm_client::Command;

use super::protocol::{self, StateBroadcast};
use crate::emergency::SharedControl;

pub struct IpcServer {
    socket_path: PathBuf,
    listener: UnixListener,
    clients: Arc<Mutex<Vec<UnixStream>>>,
}

impl IpcServer {
    /// Remove any stale socket file left by a previous run, then bind.
    pub fn bind(socket_path: impl AsRef<Path>) -> std::io::Result<Self> {
        let socket_path = socket_path.as_ref().to_path_buf();
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let _ = std::fs::remove_file(&socket_path);
        let listener = UnixListener::bind(&socket_path)?;
        Ok(Self {
            socket_path,
            listener,
            clients: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Spawn the accept loop on a background thread. Every accepted
    /// connection gets its own detached reader thread that classifies and
    /// forwards commands into `shared`; the accept loop itself exits once
    /// `running` is cleared (by shutting down the listener out from under
    /// it, matching the original's close-then-join shutdown sequence).
    pub fn spawn_accept_loop(&self, shared: Arc<SharedControl>, running: Arc<AtomicBool>) -> thread::JoinHandle<()> {
        let listener = self.listener.try_clone().expect("failed to clone listener fd");
        let clients = self.clients.clone();

        thread::spawn(move || {
            for stream in listener.incoming() {
                if !running.load(Ordering::Acquire) {
                    break;
                }
                let stream = match stream {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to accept IPC connection");
                        continue;
                    }
                };
                let writer = match stream.try_clone() {
                    Ok(w) => w,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to clone client stream for broadcast");
                        continue;
                    }
                };
                clients.lock().expect("client list mutex poisoned").push(writer);

                let shared = shared.clone();
                thread::spawn(move || client_reader_loop(stream, shared));
            }
        })
    }

    /// Serialize and fan the current state out to every connected client.
    /// Clients whose write fails are dropped from the list.
    pub fn broadcast(&self, message: &StateBroadcast) {
        let line = match serde_json::to_string(message) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize state broadcast");
                return;
            }
        };
        let mut clients = self.clients.lock().expect("client list mutex poisoned");
        clients.retain_mut(|client| {
            let ok = writeln!(client, "{line}").is_ok();
            if !ok {
                tracing::info!("dropping client after failed broadcast write");
            }
            ok
        });
    }

    pub fn shutdown(&self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

fn client_reader_loop(stream: UnixStream, shared: Arc<SharedControl>) {
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::info!(error = %e, "client connection closed");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match protocol::parse_line(&line) {
            Ok(command) => route(command, &shared),
            Err(e) => tracing::warn!(error = %e, "dropping malformed command"),
        }
    }
}

fn route(command: Command, shared: &SharedControl) {
    if command.is_priority() {
        shared.inject_emergency(&command);
    } else {
        shared.enqueue(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emergency::ControlResources;
    use arm_can::MockCanBus;
    use arm_client::{JointTracker, RobotState, StateMachine, TrajectoryEngine};
    use std::io::Read;
    use std::time::Duration;

    fn test_shared() -> Arc<SharedControl> {
        let (bus, _handle) = MockCanBus::new();
        let tracker = JointTracker::new(200.0);
        let robot_state = RobotState::new(tracker.configs(), 1.0);
        SharedControl::new(ControlResources {
            state_machine: StateMachine::new(),
            tracker,
            engine: TrajectoryEngine::new(),
            robot_state,
            bus: Box::new(bus),
        })
    }

    #[test]
    fn normal_command_is_queued_not_applied_immediately() {
        let shared = test_shared();
        route(Command::MotorOn { motor_id: 1 }, &shared);
        let (drained, _guard) = shared.drain_and_lock();
        assert_eq!(drained, vec![Command::MotorOn { motor_id: 1 }]);
    }

    #[test]
    fn priority_command_bypasses_the_queue() {
        let shared = test_shared();
        shared.enqueue(Command::MotorOn { motor_id: 1 });
        route(Command::SetEstop, &shared);
        let (drained, _guard) = shared.drain_and_lock();
        assert!(drained.is_empty());
    }

    #[test]
    fn accept_loop_routes_a_line_into_the_queue() {
        let dir = std::env::temp_dir().join(format!("arm-server-test-{}.sock", std::process::id()));
        let server = IpcServer::bind(&dir).expect("bind failed");
        let shared = test_shared();
        let running = Arc::new(AtomicBool::new(true));
        let _handle = server.spawn_accept_loop(shared.clone(), running.clone());

        let mut client = UnixStream::connect(&dir).expect("connect failed");
        writeln!(client, r#"{{"cmd":"motorOn","motorID":2}}"#).unwrap();

        let mut drained = Vec::new();
        for _ in 0..50 {
            let (mut d, _guard) = shared.drain_and_lock();
            drained.append(&mut d);
            if !drained.is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(drained, vec![Command::MotorOn { motor_id: 2 }]);

        running.store(false, Ordering::Release);
        server.shutdown();
        let _ = client.read(&mut [0u8; 1]);
    }
}
