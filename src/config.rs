//! Runtime configuration
//!
//! Every value has a sensible default for a stock Linux desktop and can be
//! overridden through environment variables. Invalid overrides are logged and
//! ignored.

use std::path::PathBuf;
use std::time::Duration;

/// Directory holding the kernel backlight devices
pub const DEFAULT_BACKLIGHT_DIR: &str = "/sys/class/backlight";
/// Firmware product name used by the VM heuristic
pub const DEFAULT_PRODUCT_NAME_PATH: &str = "/sys/devices/virtual/dmi/id/product_name";
/// CPU description used by the VM heuristic
pub const DEFAULT_CPUINFO_PATH: &str = "/proc/cpuinfo";
/// External tool used to apply brightness changes
pub const DEFAULT_BRIGHTNESS_COMMAND: &str = "brightnessctl";

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub backlight_dir: PathBuf,
    pub product_name_path: PathBuf,
    pub cpuinfo_path: PathBuf,
    /// Program invoked as `<cmd> --device <name> set <value>`
    pub brightness_command: String,
    /// Length of one monitor cache window
    pub monitor_cache_window: Duration,
    /// Number of distinct windows the monitor cache retains
    pub monitor_cache_capacity: usize,
    /// Upper bound for a single Hyprland IPC round trip
    pub ipc_timeout: Duration,
    /// `HYPRLAND_INSTANCE_SIGNATURE`, if running under Hyprland
    pub hyprland_signature: Option<String>,
    /// `XDG_RUNTIME_DIR`
    pub runtime_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backlight_dir: PathBuf::from(DEFAULT_BACKLIGHT_DIR),
            product_name_path: PathBuf::from(DEFAULT_PRODUCT_NAME_PATH),
            cpuinfo_path: PathBuf::from(DEFAULT_CPUINFO_PATH),
            brightness_command: DEFAULT_BRIGHTNESS_COMMAND.to_string(),
            monitor_cache_window: Duration::from_secs(100),
            monitor_cache_capacity: 5,
            ipc_timeout: Duration::from_millis(1000),
            hyprland_signature: None,
            runtime_dir: None,
        }
    }
}

impl Config {
    /// Build the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("LUMENBAR_BACKLIGHT_DIR") {
            config.backlight_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("LUMENBAR_PRODUCT_NAME_PATH") {
            config.product_name_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("LUMENBAR_CPUINFO_PATH") {
            config.cpuinfo_path = PathBuf::from(path);
        }
        if let Some(cmd) = lookup("LUMENBAR_BRIGHTNESS_CMD").filter(|c| !c.trim().is_empty()) {
            config.brightness_command = cmd;
        }
        if let Some(raw) = lookup("LUMENBAR_MONITOR_CACHE_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.monitor_cache_window = Duration::from_secs(secs),
                _ => tracing::warn!("Ignoring invalid LUMENBAR_MONITOR_CACHE_SECS={:?}", raw),
            }
        }
        if let Some(raw) = lookup("LUMENBAR_IPC_TIMEOUT_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.ipc_timeout = Duration::from_millis(ms),
                _ => tracing::warn!("Ignoring invalid LUMENBAR_IPC_TIMEOUT_MS={:?}", raw),
            }
        }

        config.hyprland_signature = lookup("HYPRLAND_INSTANCE_SIGNATURE").filter(|s| !s.is_empty());
        config.runtime_dir = lookup("XDG_RUNTIME_DIR").map(PathBuf::from);

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.backlight_dir, PathBuf::from(DEFAULT_BACKLIGHT_DIR));
        assert_eq!(config.brightness_command, "brightnessctl");
        assert_eq!(config.monitor_cache_window, Duration::from_secs(100));
        assert_eq!(config.monitor_cache_capacity, 5);
        assert!(config.hyprland_signature.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("LUMENBAR_BACKLIGHT_DIR", "/tmp/bl"),
            ("LUMENBAR_BRIGHTNESS_CMD", "light"),
            ("LUMENBAR_MONITOR_CACHE_SECS", "30"),
            ("LUMENBAR_IPC_TIMEOUT_MS", "250"),
            ("HYPRLAND_INSTANCE_SIGNATURE", "abc_123"),
            ("XDG_RUNTIME_DIR", "/run/user/1000"),
        ]));
        assert_eq!(config.backlight_dir, PathBuf::from("/tmp/bl"));
        assert_eq!(config.brightness_command, "light");
        assert_eq!(config.monitor_cache_window, Duration::from_secs(30));
        assert_eq!(config.ipc_timeout, Duration::from_millis(250));
        assert_eq!(config.hyprland_signature.as_deref(), Some("abc_123"));
        assert_eq!(config.runtime_dir, Some(PathBuf::from("/run/user/1000")));
    }

    #[test]
    fn invalid_numbers_keep_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("LUMENBAR_MONITOR_CACHE_SECS", "0"),
            ("LUMENBAR_IPC_TIMEOUT_MS", "soon"),
            ("HYPRLAND_INSTANCE_SIGNATURE", ""),
        ]));
        assert_eq!(config.monitor_cache_window, Duration::from_secs(100));
        assert_eq!(config.ipc_timeout, Duration::from_millis(1000));
        assert!(config.hyprland_signature.is_none());
    }
}
