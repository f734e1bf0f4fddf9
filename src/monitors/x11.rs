//! X11 / XWayland monitor enumeration using x11rb and RandR

use x11rb::connection::Connection;
use x11rb::protocol::randr::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{Atom, ConnectionExt as _, Window};
use x11rb::rust_connection::RustConnection;

use super::display::DisplayServer;

/// RandR 1.5 introduced GetMonitors
const RANDR_MAJOR: u32 = 1;
const RANDR_MINOR: u32 = 5;

/// X11 display connection
pub struct X11Display {
    conn: RustConnection,
    root: Window,
}

impl X11Display {
    /// Connect to the display named by `DISPLAY`
    pub fn new() -> anyhow::Result<Self> {
        let (conn, screen_num) = RustConnection::connect(None)?;
        let root = conn.setup().roots[screen_num].root;

        let version = conn.randr_query_version(RANDR_MAJOR, RANDR_MINOR)?.reply()?;
        tracing::debug!(
            "RandR version {}.{}",
            version.major_version,
            version.minor_version
        );

        Ok(Self { conn, root })
    }

    /// Active monitors in server order
    fn monitors(&self) -> anyhow::Result<Vec<randr::MonitorInfo>> {
        let reply = self.conn.randr_get_monitors(self.root, true)?.reply()?;
        Ok(reply.monitors)
    }

    fn output_name(&self, output: randr::Output) -> anyhow::Result<Option<String>> {
        let info = self
            .conn
            .randr_get_output_info(output, x11rb::CURRENT_TIME)?
            .reply()?;

        if info.name.is_empty() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8(info.name)?))
    }

    fn atom_name(&self, atom: Atom) -> anyhow::Result<Option<String>> {
        if atom == x11rb::NONE {
            return Ok(None);
        }
        let reply = self.conn.get_atom_name(atom)?.reply()?;
        Ok(Some(String::from_utf8(reply.name)?))
    }
}

impl DisplayServer for X11Display {
    fn monitor_count(&self) -> anyhow::Result<usize> {
        Ok(self.monitors()?.len())
    }

    fn plug_name(&self, index: usize) -> anyhow::Result<Option<String>> {
        let monitors = self.monitors()?;
        let Some(monitor) = monitors.get(index) else {
            anyhow::bail!("Monitor index {} out of range ({} monitors)", index, monitors.len());
        };

        // The connector name of the first output is what compositors report;
        // the monitor's own name atom usually matches it.
        if let Some(&output) = monitor.outputs.first() {
            if let Some(name) = self.output_name(output)? {
                return Ok(Some(name));
            }
        }

        self.atom_name(monitor.name)
    }
}
