//! Screen brightness control
//!
//! [`BrightnessController`] drives one backlight device through sysfs reads
//! and an external command, or simulates one when running inside a VM without
//! a backlight. Every change is published as a [`ScreenEvent`].

mod command;
pub mod sysfs;
mod watch;

pub use command::{BrightnessCommand, Brightnessctl};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use tokio::sync::broadcast;

use crate::config::Config;
use crate::core::system::SystemProfile;

/// Level range exposed in VM compatibility mode
const SIMULATED_MAX: i32 = 100;

/// Capacity of the event channel before slow subscribers start lagging
const EVENT_CAPACITY: usize = 64;

/// What triggered a [`ScreenEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    /// Our own setter; the value is a percentage
    Setter,
    /// External change of the brightness file; the value is the raw level
    Watch,
}

/// Notification that the screen brightness changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenEvent {
    pub value: i32,
    pub source: EventSource,
}

/// Read/write access to a brightness level
pub trait ScreenBrightness: Send + Sync {
    /// Current level, or `-1` if it cannot be read
    fn get(&self) -> i32;

    /// Request a new level
    ///
    /// `value` is clamped into `[0, max_level()]` before being applied.
    fn set(&self, value: i32);

    /// Upper bound of the level scale, or `-1` if unknown
    fn max_level(&self) -> i32;
}

enum Mode {
    Hardware {
        device: String,
        device_path: PathBuf,
        max_level: i32,
    },
    Simulated {
        level: AtomicI32,
    },
    Disabled,
}

/// Brightness service for the screen backlight
pub struct BrightnessController {
    mode: Mode,
    command: Arc<dyn BrightnessCommand>,
    events: broadcast::Sender<ScreenEvent>,
}

impl BrightnessController {
    /// Create the controller using `brightnessctl` from the configuration
    pub fn new(config: &Config, profile: &SystemProfile) -> Self {
        let command = Arc::new(Brightnessctl::new(config.brightness_command.clone()));
        Self::with_command(&config.backlight_dir, profile, command)
    }

    /// Create the controller with an explicit command implementation
    pub fn with_command(
        backlight_dir: &Path,
        profile: &SystemProfile,
        command: Arc<dyn BrightnessCommand>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let mode = match (&profile.backlight_device, profile.vm_detected) {
            (Some(device), _) => {
                let device_path = backlight_dir.join(device);
                let max_level = sysfs::read_max_brightness(&device_path);

                if let Err(e) = watch::spawn_watch(&device_path.join("brightness"), events.clone()) {
                    tracing::warn!("Could not watch brightness of {}: {}", device, e);
                }

                tracing::info!("Brightness service initialized for device: {}", device);
                Mode::Hardware {
                    device: device.clone(),
                    device_path,
                    max_level,
                }
            }
            (None, true) => {
                tracing::info!("Brightness service initialized in VM compatibility mode");
                Mode::Simulated {
                    level: AtomicI32::new(SIMULATED_MAX),
                }
            }
            (None, false) => Mode::Disabled,
        };

        Self {
            mode,
            command,
            events,
        }
    }

    /// Subscribe to brightness change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ScreenEvent> {
        self.events.subscribe()
    }

    /// Whether the controller drives anything at all
    pub fn is_available(&self) -> bool {
        !matches!(self.mode, Mode::Disabled)
    }

    /// Whether the controller is simulating a device
    pub fn is_simulated(&self) -> bool {
        matches!(self.mode, Mode::Simulated { .. })
    }

    /// Backlight device name in hardware mode
    pub fn device(&self) -> Option<&str> {
        match &self.mode {
            Mode::Hardware { device, .. } => Some(device),
            _ => None,
        }
    }

    /// Current level as a 0–100 percentage, if both level and scale are known
    pub fn percent(&self) -> Option<i32> {
        let level = self.get();
        let max = self.max_level();
        (level >= 0 && max > 0).then(|| to_percent(level.min(max), max))
    }

    fn publish(&self, value: i32) {
        let _ = self.events.send(ScreenEvent {
            value,
            source: EventSource::Setter,
        });
    }

    fn submit_command(&self, device: &str, value: i32) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!("Error setting screen brightness: no async runtime ({})", e);
                return;
            }
        };

        let command = Arc::clone(&self.command);
        let device = device.to_string();
        handle.spawn(async move {
            if let Err(e) = command.apply(&device, value).await {
                tracing::error!("Error setting screen brightness: {}", e);
            }
        });
    }
}

impl ScreenBrightness for BrightnessController {
    fn get(&self) -> i32 {
        match &self.mode {
            Mode::Simulated { level } => level.load(Ordering::Relaxed),
            Mode::Hardware { device_path, .. } => {
                match sysfs::read_int(&device_path.join("brightness")) {
                    Ok(value) => value,
                    Err(e) if e.is_missing() => {
                        tracing::warn!("Brightness file missing under {}", device_path.display());
                        -1
                    }
                    Err(e) => {
                        tracing::warn!("Brightness file unreadable: {}", e);
                        -1
                    }
                }
            }
            Mode::Disabled => -1,
        }
    }

    fn set(&self, value: i32) {
        let max = self.max_level();
        if matches!(self.mode, Mode::Disabled) {
            tracing::debug!("Brightness set to {} with no device available", value);
            return;
        }
        if max <= 0 {
            tracing::warn!("Ignoring brightness change: maximum level unknown ({})", max);
            return;
        }

        let clamped = value.clamp(0, max);

        match &self.mode {
            Mode::Simulated { level } => {
                level.store(clamped, Ordering::Relaxed);
                tracing::debug!("VM brightness set to {}%", clamped);
            }
            Mode::Hardware { device, .. } => self.submit_command(device, clamped),
            Mode::Disabled => return,
        }

        // Published before the command has finished; not a confirmation.
        self.publish(to_percent(clamped, max));
    }

    fn max_level(&self) -> i32 {
        match &self.mode {
            Mode::Hardware { max_level, .. } => *max_level,
            Mode::Simulated { .. } => SIMULATED_MAX,
            Mode::Disabled => -1,
        }
    }
}

/// `round(value / max * 100)`, for `max > 0`
fn to_percent(value: i32, max: i32) -> i32 {
    ((value as f64 / max as f64) * 100.0).round() as i32
}
