//! Real-time scheduler: configures the control thread for a real-time
//! policy, pinned CPU and locked memory where the OS allows it, then
//! busy-waits a fixed-period loop between ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Attempt to configure the calling thread for hard real-time behavior:
/// highest scheduling priority, pinned to CPU 0, with current and future
/// memory locked to RAM. Every step degrades independently and gracefully
/// to best-effort with a warning (kind (e)) rather than failing startup.
pub fn configure_realtime_thread() {
    use thread_priority::{set_current_thread_priority, ThreadPriority};

    match set_current_thread_priority(ThreadPriority::Max) {
        Ok(()) => tracing::info!("control thread priority set to maximum"),
        Err(e) => tracing::warn!(error = ?e, "failed to set real-time thread priority, continuing best-effort"),
    }

    pin_to_cpu0();
    lock_memory();
}

#[cfg(target_os = "linux")]
fn pin_to_cpu0() {
    let mut cpu_set = nix::sched::CpuSet::new();
    if let Err(e) = cpu_set.set(0) {
        tracing::warn!(error = %e, "failed to build CPU affinity set");
        return;
    }
    match nix::sched::sched_setaffinity(nix::unistd::Pid::from_raw(0), &cpu_set) {
        Ok(()) => tracing::info!("control thread pinned to CPU 0"),
        Err(e) => tracing::warn!(error = %e, "failed to pin control thread to a CPU, continuing best-effort"),
    }
}

#[cfg(target_os = "linux")]
fn lock_memory() {
    let ret = unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) };
    if ret == 0 {
        tracing::info!("locked current and future memory pages");
    } else {
        tracing::warn!(
            errno = std::io::Error::last_os_error().raw_os_error(),
            "mlockall failed, continuing without locked memory"
        );
    }
}

#[cfg(not(target_os = "linux"))]
fn pin_to_cpu0() {
    tracing::warn!("CPU pinning is not supported on this platform, continuing best-effort");
}

#[cfg(not(target_os = "linux"))]
fn lock_memory() {
    tracing::warn!("memory locking is not supported on this platform, continuing best-effort");
}

/// Busy-wait a fixed-period loop. `tick(is_broadcast_tick)` runs once per
/// iteration; every `divider`th iteration it's called with `true`. The loop
/// exits once `running` is cleared.
pub fn run_control_loop(
    running: Arc<AtomicBool>,
    control_rate_hz: f64,
    broadcast_divider: u32,
    mut tick: impl FnMut(bool),
) {
    let period = Duration::from_secs_f64(1.0 / control_rate_hz);
    let sleeper = spin_sleep::SpinSleeper::default();
    let mut next_deadline = Instant::now() + period;
    let mut iteration: u64 = 0;

    while running.load(Ordering::Acquire) {
        let now = Instant::now();
        if next_deadline > now {
            sleeper.sleep(next_deadline - now);
        }
        next_deadline += period;

        let is_broadcast_tick = iteration % broadcast_divider as u64 == 0;
        tick(is_broadcast_tick);
        iteration += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn broadcast_tick_fires_every_divider_iterations() {
        let running = Arc::new(AtomicBool::new(true));
        let iterations = Arc::new(AtomicU32::new(0));
        let broadcasts = Arc::new(AtomicU32::new(0));

        let running_clone = running.clone();
        let iterations_clone = iterations.clone();
        let broadcasts_clone = broadcasts.clone();
        run_control_loop(running, 2000.0, 3, move |is_broadcast| {
            let n = iterations_clone.fetch_add(1, Ordering::Relaxed);
            if is_broadcast {
                broadcasts_clone.fetch_add(1, Ordering::Relaxed);
            }
            if n >= 8 {
                running_clone.store(false, Ordering::Release);
            }
        });

        assert_eq!(iterations.load(Ordering::Relaxed), 9);
        assert_eq!(broadcasts.load(Ordering::Relaxed), 3);
    }
}
