//! Monitor identity resolution
//!
//! Hyprland numbers monitors with its own ids while the display server (and
//! every toolkit on top of it) uses 0-based indices into its monitor list.
//! The two are matched through the connector's plug name, e.g. `eDP-1`.
//!
//! Every lookup degrades to a safe answer instead of failing: inside a VM the
//! primary monitor (index `0`) is assumed, otherwise `None` is returned.

pub mod display;
pub mod hyprland;
mod x11;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::Config;
use crate::core::cache::{Clock, SystemClock, TimeWindowCache};
use crate::core::system::SystemProfile;

use display::DisplayServer;
use hyprland::{HyprlandIpc, WindowManagerIpc};

/// Hyprland monitor id → output name
pub type MonitorMap = HashMap<i64, String>;

/// Output name assumed for the single monitor of a VM session
pub const VM_FALLBACK_OUTPUT: &str = "XWAYLAND0";

/// Display index assumed for the primary monitor of a VM session
const VM_FALLBACK_INDEX: usize = 0;

/// Maps Hyprland monitors to display-server monitor indices
pub struct MonitorResolver {
    ipc: Arc<dyn WindowManagerIpc>,
    display: Arc<dyn DisplayServer>,
    clock: Arc<dyn Clock>,
    cache: Mutex<TimeWindowCache<Arc<MonitorMap>>>,
    vm_detected: bool,
}

impl MonitorResolver {
    /// Resolver for the current Hyprland session and display
    pub fn new(config: &Config, profile: &SystemProfile) -> Self {
        let ipc = Arc::new(HyprlandIpc::from_config(config));
        let display = display::create_display();
        Self::with_parts(config, profile, ipc, display, Arc::new(SystemClock))
    }

    /// Resolver with explicit collaborators
    pub fn with_parts(
        config: &Config,
        profile: &SystemProfile,
        ipc: Arc<dyn WindowManagerIpc>,
        display: Arc<dyn DisplayServer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if profile.vm_detected {
            tracing::info!("Using VM-compatible monitor detection");
        }

        Self {
            ipc,
            display,
            clock,
            cache: Mutex::new(TimeWindowCache::new(
                config.monitor_cache_window,
                config.monitor_cache_capacity,
            )),
            vm_detected: profile.vm_detected,
        }
    }

    fn cache(&self) -> MutexGuard<'_, TimeWindowCache<Arc<MonitorMap>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fallback_index(&self) -> Option<usize> {
        self.vm_detected.then_some(VM_FALLBACK_INDEX)
    }

    /// All Hyprland monitors by id
    ///
    /// The mapping is fetched at most once per cache window; within a window
    /// the same `Arc` is handed out again. Failures yield the VM fallback
    /// mapping or an empty one, and are cached like any other result.
    pub async fn all_monitors(&self) -> Arc<MonitorMap> {
        let now = self.clock.now();
        let cached = self.cache().get(now);
        if let Some(map) = cached {
            return map;
        }

        let map: MonitorMap = match hyprland::monitors(self.ipc.as_ref()).await {
            Ok(entries) => entries.into_iter().map(|m| (m.id, m.name)).collect(),
            Err(e) if self.vm_detected => {
                tracing::warn!("Error getting monitors in VM, using fallback: {}", e);
                MonitorMap::from([(0, VM_FALLBACK_OUTPUT.to_string())])
            }
            Err(e) => {
                tracing::error!("Error getting monitors: {}", e);
                MonitorMap::new()
            }
        };

        let map = Arc::new(map);
        self.cache().insert(now, Arc::clone(&map));
        map
    }

    /// Display index of the monitor whose plug name is `plug_name`
    pub fn display_monitor_id_from_name(&self, plug_name: &str) -> Option<usize> {
        let count = match self.display.monitor_count() {
            Ok(count) => count,
            Err(e) => {
                tracing::error!("Error enumerating display monitors: {}", e);
                return self.fallback_index();
            }
        };

        let found = (0..count).find(|&index| match self.display.plug_name(index) {
            Ok(name) => name.as_deref() == Some(plug_name),
            // Some monitors have no plug name, notably in VMs.
            Err(e) => {
                tracing::debug!("No plug name for display monitor {}: {}", index, e);
                false
            }
        });

        found.or_else(|| self.fallback_index())
    }

    /// Display index of the Hyprland monitor `wm_id`
    pub async fn display_monitor_id(&self, wm_id: i64) -> Option<usize> {
        let monitors = self.all_monitors().await;
        match monitors.get(&wm_id) {
            Some(name) => self.display_monitor_id_from_name(name),
            None => self.fallback_index(),
        }
    }

    /// Display index of the monitor showing the focused workspace
    ///
    /// Always asks the compositor; the monitor cache is not consulted.
    pub async fn current_display_monitor_id(&self) -> Option<usize> {
        match hyprland::active_workspace(self.ipc.as_ref()).await {
            Ok(workspace) => self.display_monitor_id_from_name(&workspace.monitor),
            Err(e) => {
                tracing::error!("Error getting the active workspace: {}", e);
                self.fallback_index()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hyprland::{ACTIVE_WORKSPACE_REQUEST, IpcError, MONITORS_REQUEST};
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    /// Compositor double with swappable replies and request counters
    #[derive(Default)]
    struct FakeIpc {
        monitors_reply: Mutex<Option<String>>,
        workspace_reply: Mutex<Option<String>>,
        monitors_calls: AtomicUsize,
        workspace_calls: AtomicUsize,
    }

    impl FakeIpc {
        fn with_monitors(reply: &str) -> Self {
            let ipc = Self::default();
            ipc.set_monitors(reply);
            ipc
        }

        fn set_monitors(&self, reply: &str) {
            *self.monitors_reply.lock().unwrap() = Some(reply.to_string());
        }

        fn set_workspace(&self, reply: &str) {
            *self.workspace_reply.lock().unwrap() = Some(reply.to_string());
        }
    }

    #[async_trait]
    impl WindowManagerIpc for FakeIpc {
        async fn send_command(&self, command: &str) -> Result<String, IpcError> {
            let reply = match command {
                MONITORS_REQUEST => {
                    self.monitors_calls.fetch_add(1, Ordering::SeqCst);
                    self.monitors_reply.lock().unwrap().clone()
                }
                ACTIVE_WORKSPACE_REQUEST => {
                    self.workspace_calls.fetch_add(1, Ordering::SeqCst);
                    self.workspace_reply.lock().unwrap().clone()
                }
                _ => None,
            };
            reply.ok_or(IpcError::NoInstance)
        }
    }

    /// Display double; `Err` entries simulate per-index lookup failures
    struct FakeDisplay {
        plugs: Vec<Result<Option<&'static str>, ()>>,
        broken: bool,
    }

    impl FakeDisplay {
        fn with_plugs(names: &[&'static str]) -> Self {
            Self {
                plugs: names.iter().map(|n| Ok(Some(*n))).collect(),
                broken: false,
            }
        }
    }

    impl DisplayServer for FakeDisplay {
        fn monitor_count(&self) -> anyhow::Result<usize> {
            if self.broken {
                anyhow::bail!("display unavailable");
            }
            Ok(self.plugs.len())
        }

        fn plug_name(&self, index: usize) -> anyhow::Result<Option<String>> {
            match self.plugs.get(index) {
                Some(Ok(name)) => Ok(name.map(str::to_string)),
                _ => anyhow::bail!("no plug name for {index}"),
            }
        }
    }

    struct ManualClock(AtomicU64);

    impl ManualClock {
        fn at(secs: u64) -> Self {
            Self(AtomicU64::new(secs))
        }

        fn advance(&self, secs: u64) {
            self.0.fetch_add(secs, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> SystemTime {
            UNIX_EPOCH + Duration::from_secs(self.0.load(Ordering::SeqCst))
        }
    }

    const TWO_MONITORS: &str = r#"[
        {"id": 0, "name": "eDP-1", "focused": true},
        {"id": 1, "name": "HDMI-1", "focused": false}
    ]"#;

    struct Harness {
        ipc: Arc<FakeIpc>,
        clock: Arc<ManualClock>,
        resolver: MonitorResolver,
    }

    fn harness(vm_detected: bool, ipc: FakeIpc, display: FakeDisplay) -> Harness {
        let ipc = Arc::new(ipc);
        let clock = Arc::new(ManualClock::at(1_000_000));
        let profile = SystemProfile {
            vm_detected,
            backlight_device: None,
        };
        let resolver = MonitorResolver::with_parts(
            &Config::default(),
            &profile,
            ipc.clone(),
            Arc::new(display),
            clock.clone(),
        );
        Harness {
            ipc,
            clock,
            resolver,
        }
    }

    #[tokio::test]
    async fn all_monitors_maps_ids_to_names() {
        let h = harness(
            false,
            FakeIpc::with_monitors(TWO_MONITORS),
            FakeDisplay::with_plugs(&[]),
        );

        let monitors = h.resolver.all_monitors().await;
        assert_eq!(monitors.len(), 2);
        assert_eq!(monitors.get(&0).map(String::as_str), Some("eDP-1"));
        assert_eq!(monitors.get(&1).map(String::as_str), Some("HDMI-1"));
    }

    #[tokio::test]
    async fn same_window_is_served_from_cache() {
        let h = harness(
            false,
            FakeIpc::with_monitors(TWO_MONITORS),
            FakeDisplay::with_plugs(&[]),
        );

        let first = h.resolver.all_monitors().await;
        h.clock.advance(10);
        let second = h.resolver.all_monitors().await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(h.ipc.monitors_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn next_window_refetches() {
        let h = harness(
            false,
            FakeIpc::with_monitors(TWO_MONITORS),
            FakeDisplay::with_plugs(&[]),
        );

        let first = h.resolver.all_monitors().await;
        h.ipc.set_monitors(r#"[{"id": 4, "name": "DP-3"}]"#);
        h.clock.advance(100);
        let second = h.resolver.all_monitors().await;

        assert_eq!(h.ipc.monitors_calls.load(Ordering::SeqCst), 2);
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert_eq!(second.get(&4).map(String::as_str), Some("DP-3"));
    }

    #[tokio::test]
    async fn ipc_failure_in_vm_yields_xwayland_fallback() {
        let h = harness(true, FakeIpc::default(), FakeDisplay::with_plugs(&[]));

        let monitors = h.resolver.all_monitors().await;
        assert_eq!(
            *monitors,
            MonitorMap::from([(0, VM_FALLBACK_OUTPUT.to_string())])
        );
    }

    #[tokio::test]
    async fn ipc_failure_on_hardware_yields_empty_map() {
        let h = harness(false, FakeIpc::default(), FakeDisplay::with_plugs(&[]));
        assert!(h.resolver.all_monitors().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_reply_degrades_like_ipc_failure() {
        let h = harness(
            false,
            FakeIpc::with_monitors("not json"),
            FakeDisplay::with_plugs(&[]),
        );
        assert!(h.resolver.all_monitors().await.is_empty());

        let vm = harness(
            true,
            FakeIpc::with_monitors(r#"[{"id": "zero"}]"#),
            FakeDisplay::with_plugs(&[]),
        );
        assert_eq!(vm.resolver.all_monitors().await.len(), 1);
    }

    #[test]
    fn plug_name_lookup_scans_display_indices() {
        let h = harness(
            false,
            FakeIpc::default(),
            FakeDisplay::with_plugs(&["eDP-1", "HDMI-1"]),
        );
        assert_eq!(h.resolver.display_monitor_id_from_name("eDP-1"), Some(0));
        assert_eq!(h.resolver.display_monitor_id_from_name("HDMI-1"), Some(1));
        assert_eq!(h.resolver.display_monitor_id_from_name("DP-3"), None);
    }

    #[test]
    fn unknown_plug_name_falls_back_to_primary_in_vm() {
        let h = harness(
            true,
            FakeIpc::default(),
            FakeDisplay::with_plugs(&["eDP-1", "HDMI-1"]),
        );
        assert_eq!(h.resolver.display_monitor_id_from_name("HDMI-1"), Some(1));
        assert_eq!(h.resolver.display_monitor_id_from_name("DP-3"), Some(0));
    }

    #[test]
    fn per_index_errors_do_not_abort_the_scan() {
        let display = FakeDisplay {
            plugs: vec![Err(()), Ok(None), Ok(Some("HDMI-1"))],
            broken: false,
        };
        let h = harness(false, FakeIpc::default(), display);
        assert_eq!(h.resolver.display_monitor_id_from_name("HDMI-1"), Some(2));
    }

    #[test]
    fn unavailable_display_uses_fallback() {
        let broken = || FakeDisplay {
            plugs: Vec::new(),
            broken: true,
        };
        let hw = harness(false, FakeIpc::default(), broken());
        assert_eq!(hw.resolver.display_monitor_id_from_name("eDP-1"), None);

        let vm = harness(true, FakeIpc::default(), broken());
        assert_eq!(vm.resolver.display_monitor_id_from_name("eDP-1"), Some(0));
    }

    #[tokio::test]
    async fn wm_id_resolves_through_plug_name() {
        let h = harness(
            false,
            FakeIpc::with_monitors(TWO_MONITORS),
            FakeDisplay::with_plugs(&["HDMI-1", "eDP-1"]),
        );
        assert_eq!(h.resolver.display_monitor_id(0).await, Some(1));
        assert_eq!(h.resolver.display_monitor_id(1).await, Some(0));
        assert_eq!(h.resolver.display_monitor_id(7).await, None);
        assert_eq!(h.ipc.monitors_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_wm_id_falls_back_in_vm() {
        let h = harness(
            true,
            FakeIpc::with_monitors(TWO_MONITORS),
            FakeDisplay::with_plugs(&["eDP-1"]),
        );
        assert_eq!(h.resolver.display_monitor_id(9).await, Some(0));
    }

    #[tokio::test]
    async fn current_monitor_bypasses_the_cache() {
        let ipc = FakeIpc::with_monitors(TWO_MONITORS);
        ipc.set_workspace(r#"{"id": 2, "name": "2", "monitor": "HDMI-1"}"#);
        let h = harness(false, ipc, FakeDisplay::with_plugs(&["eDP-1", "HDMI-1"]));

        assert_eq!(h.resolver.current_display_monitor_id().await, Some(1));
        h.ipc.set_workspace(r#"{"id": 1, "name": "1", "monitor": "eDP-1"}"#);
        assert_eq!(h.resolver.current_display_monitor_id().await, Some(0));

        assert_eq!(h.ipc.workspace_calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.ipc.monitors_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn current_monitor_failure_uses_fallback() {
        let hw = harness(false, FakeIpc::default(), FakeDisplay::with_plugs(&["eDP-1"]));
        assert_eq!(hw.resolver.current_display_monitor_id().await, None);

        let vm = harness(true, FakeIpc::default(), FakeDisplay::with_plugs(&["eDP-1"]));
        assert_eq!(vm.resolver.current_display_monitor_id().await, Some(0));
    }
}
