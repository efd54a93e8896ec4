//! `arm-server`: the real-time control daemon binary. Wires together the IPC
//! acceptor, the fixed-cadence scheduler, command dispatch and the shared
//! control surface, then runs until interrupted.

mod config;
mod dispatch;
mod emergency;
mod ipc;
mod scheduler;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arm_can::CanBus;
use arm_client::{JointTracker, RobotState, StateMachine, TrajectoryEngine};
use clap::Parser;

use emergency::{ControlResources, SharedControl};
use ipc::server::IpcServer;

/// Real-time control daemon for the 7-DOF arm.
#[derive(Parser, Debug)]
#[command(name = "arm-server")]
#[command(about = "Armatron real-time control daemon", long_about = None)]
struct Args {
    /// Unix domain socket path clients connect to.
    #[arg(long)]
    socket: Option<String>,

    /// TOML configuration file overlay.
    #[arg(long)]
    config: Option<String>,

    /// SocketCAN interface name. Ignored when built with the mock backend.
    #[arg(long, default_value = "can0")]
    can_interface: String,

    /// tracing log level filter (e.g. `info`, `debug`, `arm_server=trace`).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn default_config_path() -> PathBuf {
    PathBuf::from("./armatron.toml")
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(target_os = "linux")]
fn open_can_bus(interface: &str) -> Box<dyn CanBus + Send> {
    match arm_can::SocketCanBus::open(interface) {
        Ok(bus) => Box::new(bus),
        Err(e) => {
            tracing::error!(error = %e, interface, "failed to open CAN interface, exiting");
            std::process::exit(1);
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn open_can_bus(_interface: &str) -> Box<dyn CanBus + Send> {
    tracing::warn!("non-Linux build: falling back to an in-memory CAN bus with no real hardware");
    let (bus, _handle) = arm_can::MockCanBus::new();
    Box::new(bus)
}

fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config_path = args.config.map(PathBuf::from).unwrap_or_else(default_config_path);
    let mut resolved = config::load(&config_path);
    if let Some(socket) = args.socket {
        resolved.socket_path = socket;
    }
    tracing::info!(?resolved, "resolved configuration");

    let bus = open_can_bus(&args.can_interface);
    let mut tracker = JointTracker::new(resolved.control_rate_hz);
    tracker.apply_limit_overrides(&resolved.joint_overrides);
    let mut robot_state = RobotState::new(tracker.configs(), resolved.speed_modifier);
    resolved.apply_pid_override(&mut robot_state.pi);
    let shared = SharedControl::new(ControlResources {
        state_machine: StateMachine::new(),
        tracker,
        engine: TrajectoryEngine::new(),
        robot_state,
        bus,
    });

    let server = match IpcServer::bind(&resolved.socket_path) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!(error = %e, path = %resolved.socket_path, "failed to bind IPC socket, exiting");
            std::process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            tracing::info!("shutdown signal received");
            running.store(false, Ordering::Release);
        })
        .expect("failed to install Ctrl+C handler");
    }

    let accept_handle = server.spawn_accept_loop(shared.clone(), running.clone());

    let socket_path = resolved.socket_path.clone();
    let dt = 1.0 / resolved.control_rate_hz;
    let broadcast_divider = resolved.broadcast_divider();
    let control_running = running.clone();
    let control_shared = shared.clone();
    let control_server = server.clone();
    let control_handle = std::thread::spawn(move || {
        scheduler::configure_realtime_thread();
        scheduler::run_control_loop(control_running, resolved.control_rate_hz, broadcast_divider, move |is_broadcast_tick| {
            let (drained, mut r) = control_shared.drain_and_lock();
            for command in drained {
                dispatch::dispatch(command, &mut r);
            }
            dispatch::tick_control(&mut r, dt);
            if is_broadcast_tick {
                let snapshot = ipc::protocol::build_broadcast(&r.tracker, &r.robot_state);
                drop(r);
                control_server.broadcast(&snapshot);
            }
        });
    });

    control_handle.join().expect("control thread panicked");
    running.store(false, Ordering::Release);
    // `accept()` only notices `running` going false on its next wakeup; poke
    // the listener with a throwaway connection so the accept thread doesn't
    // block forever waiting for a real client. Must happen before the
    // socket file is unlinked, or the connect itself fails.
    let _ = std::os::unix::net::UnixStream::connect(&socket_path);
    accept_handle.join().expect("accept thread panicked");
    server.shutdown();
}
