//! Host probing done once at startup
//!
//! Both services need to know whether we are running inside a virtual machine
//! and which backlight device (if any) to drive. The answers are computed once
//! and shared through [`SystemProfile`].

use std::path::Path;

use crate::brightness::sysfs;
use crate::config::Config;

/// Substrings of the firmware product name that indicate a hypervisor
const PRODUCT_NAME_MARKERS: &[&str] = &["vmware", "virtualbox", "qemu", "kvm", "virtual", "vm"];

/// Substrings of `/proc/cpuinfo` that indicate a hypervisor
const CPUINFO_MARKERS: &[&str] = &["vmware", "qemu", "kvm", "hypervisor"];

/// Device selection state shared by the brightness and monitor services
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemProfile {
    /// Whether virtualization was detected
    pub vm_detected: bool,
    /// Name of the backlight device under the backlight directory
    pub backlight_device: Option<String>,
}

impl SystemProfile {
    /// Probe the host using the paths from `config`
    pub fn probe(config: &Config) -> Self {
        let vm_detected = detect_vm(&config.product_name_path, &config.cpuinfo_path);
        let backlight_device = sysfs::discover_device(&config.backlight_dir);

        if vm_detected {
            tracing::info!("VM detected, enabling compatibility mode");
        }
        let profile = Self {
            vm_detected,
            backlight_device,
        };
        if !profile.brightness_available() {
            tracing::warn!("No backlight device and no VM detected; brightness control disabled");
        }
        profile
    }

    /// Brightness control is only possible with a device or in VM mode
    pub fn brightness_available(&self) -> bool {
        self.backlight_device.is_some() || self.vm_detected
    }
}

/// Read both system-info sources and run the VM heuristic on them
pub fn detect_vm(product_name_path: &Path, cpuinfo_path: &Path) -> bool {
    let product_name = read_lowercase(product_name_path);
    let cpuinfo = read_lowercase(cpuinfo_path);
    looks_virtual(product_name.as_deref(), cpuinfo.as_deref())
}

/// VM heuristic over already-lowercased sources; `None` means "unreadable"
pub fn looks_virtual(product_name: Option<&str>, cpuinfo: Option<&str>) -> bool {
    let product_match = product_name
        .map(str::trim)
        .is_some_and(|name| PRODUCT_NAME_MARKERS.iter().any(|m| name.contains(m)));

    let cpu_match =
        cpuinfo.is_some_and(|info| CPUINFO_MARKERS.iter().any(|m| info.contains(m)));

    product_match || cpu_match
}

fn read_lowercase(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content.to_lowercase()),
        Err(e) => {
            tracing::debug!("Could not read {}: {}", path.display(), e);
            None
        }
    }
}
