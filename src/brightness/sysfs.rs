//! Backlight pseudo-files under `/sys/class/backlight`

use std::path::{Path, PathBuf};

/// Error reading an integer backlight attribute
#[derive(Debug, thiserror::Error)]
pub enum SysfsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid value in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: std::num::ParseIntError,
    },
}

impl SysfsError {
    /// Whether the attribute file simply does not exist
    pub fn is_missing(&self) -> bool {
        matches!(self, SysfsError::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Pick the backlight device to drive
///
/// Returns the first entry of the directory listing (sorted by name), or
/// `None` when the directory is empty or absent.
pub fn discover_device(backlight_dir: &Path) -> Option<String> {
    let entries = match std::fs::read_dir(backlight_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(
                "No backlight devices found in {} ({}), using VM compatibility mode",
                backlight_dir.display(),
                e
            );
            return None;
        }
    };

    let mut names: Vec<String> = entries
        .flatten()
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();

    names.into_iter().next()
}

/// Read a single integer attribute such as `brightness`
pub fn read_int(path: &Path) -> Result<i32, SysfsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SysfsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    // Only the first line carries the value.
    let line = content.lines().next().unwrap_or("");
    line.trim().parse::<i32>().map_err(|source| SysfsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read `max_brightness`, returning `-1` on failure
pub fn read_max_brightness(device_path: &Path) -> i32 {
    let path = device_path.join("max_brightness");
    match read_int(&path) {
        Ok(max) => max,
        Err(e) => {
            tracing::error!("Could not read max brightness: {}", e);
            -1
        }
    }
}
