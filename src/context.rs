//! Application context shared by every consumer of the services

use std::sync::Arc;

use crate::brightness::BrightnessController;
use crate::config::Config;
use crate::core::system::SystemProfile;
use crate::monitors::MonitorResolver;

/// Services constructed once at startup and passed around by reference
#[derive(Clone)]
pub struct ShellContext {
    pub config: Arc<Config>,
    pub profile: SystemProfile,
    pub brightness: Arc<BrightnessController>,
    pub monitors: Arc<MonitorResolver>,
}

impl ShellContext {
    /// Probe the host and build both services
    pub fn new(config: Config) -> Self {
        let profile = SystemProfile::probe(&config);
        let brightness = Arc::new(BrightnessController::new(&config, &profile));
        let monitors = Arc::new(MonitorResolver::new(&config, &profile));

        Self {
            config: Arc::new(config),
            profile,
            brightness,
            monitors,
        }
    }

    /// Assemble a context from already-built services
    pub fn from_parts(
        config: Config,
        profile: SystemProfile,
        brightness: BrightnessController,
        monitors: MonitorResolver,
    ) -> Self {
        Self {
            config: Arc::new(config),
            profile,
            brightness: Arc::new(brightness),
            monitors: Arc::new(monitors),
        }
    }
}
