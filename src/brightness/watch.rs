//! Watching the backlight `brightness` file for external changes
//!
//! Hotkeys, other tools and the kernel itself may change the backlight behind
//! our back. An inotify watch on the attribute turns every modification into
//! a [`ScreenEvent`] carrying the raw value read from the file.

use std::path::{Path, PathBuf};

use inotify::{Inotify, WatchMask};
use tokio::sync::broadcast;

use super::sysfs;
use super::{EventSource, ScreenEvent};

/// Start watching `brightness_path`, publishing on `sender`
///
/// The watch is registered before this returns; events are then read on a
/// dedicated thread for the rest of the process lifetime.
pub fn spawn_watch(
    brightness_path: &Path,
    sender: broadcast::Sender<ScreenEvent>,
) -> anyhow::Result<()> {
    let inotify = Inotify::init()?;
    inotify.watches().add(brightness_path, WatchMask::MODIFY)?;

    let path = brightness_path.to_path_buf();
    std::thread::Builder::new()
        .name("backlight-watch".to_string())
        .spawn(move || watch_loop(inotify, path, sender))?;

    Ok(())
}

fn watch_loop(mut inotify: Inotify, path: PathBuf, sender: broadcast::Sender<ScreenEvent>) {
    let mut buffer = [0; 1024];
    loop {
        let events = match inotify.read_events_blocking(&mut buffer) {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Error while reading backlight events: {}", e);
                break;
            }
        };

        for _ in events {
            match sysfs::read_int(&path) {
                Ok(value) => {
                    // No subscribers is fine.
                    let _ = sender.send(ScreenEvent {
                        value,
                        source: EventSource::Watch,
                    });
                }
                // Truncation shows up as a modification of an empty file.
                Err(e) => tracing::debug!("Skipping brightness change: {}", e),
            }
        }
    }
}
