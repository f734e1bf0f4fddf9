//! Display-server monitor enumeration
//!
//! The resolver only needs two things from the display server: how many
//! monitors it knows about and the plug name of each one, by index.

use std::sync::Arc;

use super::x11;

/// Query interface over the display server's monitor list
pub trait DisplayServer: Send + Sync {
    /// Number of monitors, indexed `0..n`
    fn monitor_count(&self) -> anyhow::Result<usize>;

    /// Plug name of the monitor at `index`, if it has one
    fn plug_name(&self, index: usize) -> anyhow::Result<Option<String>>;
}

/// Stand-in used when no display server is reachable
#[derive(Debug, Default)]
pub struct Unavailable;

impl DisplayServer for Unavailable {
    fn monitor_count(&self) -> anyhow::Result<usize> {
        anyhow::bail!("No display server connection")
    }

    fn plug_name(&self, _index: usize) -> anyhow::Result<Option<String>> {
        anyhow::bail!("No display server connection")
    }
}

/// Connect to the display server of the current session
pub fn create_display() -> Arc<dyn DisplayServer> {
    let Ok(disp) = std::env::var("DISPLAY") else {
        tracing::warn!("DISPLAY is not set; monitor lookups will use fallbacks");
        return Arc::new(Unavailable);
    };

    match x11::X11Display::new() {
        Ok(display) => {
            tracing::info!("Using X11 display (DISPLAY={})", disp);
            Arc::new(display)
        }
        Err(e) => {
            tracing::warn!("Could not connect to X11 display {}: {}", disp, e);
            Arc::new(Unavailable)
        }
    }
}
