//! Optional TOML configuration overlay. Anything absent from the
//! file, or the file itself, falls back to the compiled-in defaults.

use arm_client::{JointLimitOverride, PiSubState};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_SOCKET_PATH: &str = "/home/debian/.armatron/robot_socket";
pub const DEFAULT_CONTROL_RATE_HZ: f64 = 200.0;
pub const DEFAULT_BROADCAST_RATE_HZ: f64 = 60.0;
pub const DEFAULT_SPEED_MODIFIER: f64 = 1.0 / 6.0;

/// Shared PI gain override. Gains are shared across joints (only the error
/// accumulators are per-joint), so this overrides all of them at once.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PidOverride {
    pub kp: Option<f64>,
    pub ki: Option<f64>,
    pub max_integral: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServerConfig {
    pub socket_path: Option<String>,
    pub control_rate_hz: Option<f64>,
    pub broadcast_rate_hz: Option<f64>,
    pub speed_modifier: Option<f64>,
    /// Per-joint soft-limit overrides, keyed by motor id (1-7).
    #[serde(default)]
    pub joints: BTreeMap<u8, JointLimitOverride>,
    pub pid: Option<PidOverride>,
}

/// Resolved configuration: the overlay folded onto compiled-in defaults.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub socket_path: String,
    pub control_rate_hz: f64,
    pub broadcast_rate_hz: f64,
    pub speed_modifier: f64,
    pub joint_overrides: BTreeMap<u8, JointLimitOverride>,
    pub pid_override: Option<PidOverride>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            socket_path: DEFAULT_SOCKET_PATH.to_string(),
            control_rate_hz: DEFAULT_CONTROL_RATE_HZ,
            broadcast_rate_hz: DEFAULT_BROADCAST_RATE_HZ,
            speed_modifier: DEFAULT_SPEED_MODIFIER,
            joint_overrides: BTreeMap::new(),
            pid_override: None,
        }
    }
}

impl ResolvedConfig {
    pub fn broadcast_divider(&self) -> u32 {
        (self.control_rate_hz / self.broadcast_rate_hz) as u32
    }

    /// Fold this config's shared PID override onto `pi`, leaving absent
    /// fields at their compiled-in default.
    pub fn apply_pid_override(&self, pi: &mut PiSubState) {
        let Some(o) = &self.pid_override else {
            return;
        };
        if let Some(kp) = o.kp {
            pi.kp = kp;
        }
        if let Some(ki) = o.ki {
            pi.ki = ki;
        }
        if let Some(max_integral) = o.max_integral {
            pi.max_integral = max_integral;
        }
    }

    fn apply(mut self, overlay: ServerConfig) -> Self {
        if let Some(v) = overlay.socket_path {
            self.socket_path = v;
        }
        if let Some(v) = overlay.control_rate_hz {
            self.control_rate_hz = v;
        }
        if let Some(v) = overlay.broadcast_rate_hz {
            self.broadcast_rate_hz = v;
        }
        if let Some(v) = overlay.speed_modifier {
            self.speed_modifier = v;
        }
        self.joint_overrides.extend(overlay.joints);
        if overlay.pid.is_some() {
            self.pid_override = overlay.pid;
        }
        self
    }
}

/// Load `path` if it exists, folding its fields onto the defaults. A
/// missing file is not an error -- it just means "use the defaults".
pub fn load(path: &Path) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();
    let Ok(text) = std::fs::read_to_string(path) else {
        return defaults;
    };
    match toml::from_str::<ServerConfig>(&text) {
        Ok(overlay) => defaults.apply(overlay),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to parse config file, using defaults");
            defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let resolved = load(Path::new("/nonexistent/armatron.toml"));
        assert_eq!(resolved.socket_path, DEFAULT_SOCKET_PATH);
        assert_eq!(resolved.broadcast_divider(), 3);
    }

    #[test]
    fn partial_overlay_only_overrides_present_keys() {
        let overlay = ServerConfig {
            speed_modifier: Some(0.5),
            ..Default::default()
        };
        let resolved = ResolvedConfig::default().apply(overlay);
        assert_eq!(resolved.speed_modifier, 0.5);
        assert_eq!(resolved.socket_path, DEFAULT_SOCKET_PATH);
    }

    #[test]
    fn joint_and_pid_overrides_fold_in_by_key() {
        let mut joints = BTreeMap::new();
        joints.insert(
            3,
            JointLimitOverride {
                limit_low: Some(-10.0),
                limit_high: None,
            },
        );
        let overlay = ServerConfig {
            joints,
            pid: Some(PidOverride {
                kp: Some(4.0),
                ki: None,
                max_integral: None,
            }),
            ..Default::default()
        };
        let resolved = ResolvedConfig::default().apply(overlay);
        assert_eq!(resolved.joint_overrides[&3].limit_low, Some(-10.0));
        assert_eq!(resolved.joint_overrides[&3].limit_high, None);

        let mut pi = PiSubState::default();
        resolved.apply_pid_override(&mut pi);
        assert_eq!(pi.kp, 4.0);
        assert_eq!(pi.ki, 0.0);
    }
}
