//! Hyprland request socket
//!
//! Each request opens a fresh connection to `.socket.sock`, writes the
//! command (e.g. `j/monitors`) and reads the reply until the compositor
//! closes the stream.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

use crate::config::Config;

/// Request listing all monitors as JSON
pub const MONITORS_REQUEST: &str = "j/monitors";
/// Request describing the focused workspace as JSON
pub const ACTIVE_WORKSPACE_REQUEST: &str = "j/activeworkspace";

/// Errors talking to the compositor
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("not running under Hyprland (HYPRLAND_INSTANCE_SIGNATURE unset)")]
    NoInstance,
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request {0:?} timed out")]
    Timeout(String),
    #[error("invalid reply to {request:?}: {source}")]
    Json {
        request: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Transport for window-manager requests
#[async_trait]
pub trait WindowManagerIpc: Send + Sync {
    /// Send `command` and return the raw reply
    async fn send_command(&self, command: &str) -> Result<String, IpcError>;
}

/// One entry of the `j/monitors` reply; other fields are ignored
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MonitorEntry {
    pub id: i64,
    pub name: String,
}

/// The part of the `j/activeworkspace` reply we use
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ActiveWorkspace {
    pub monitor: String,
}

/// Fetch and parse the monitor list
pub async fn monitors(ipc: &dyn WindowManagerIpc) -> Result<Vec<MonitorEntry>, IpcError> {
    request_json(ipc, MONITORS_REQUEST).await
}

/// Fetch and parse the focused workspace
pub async fn active_workspace(ipc: &dyn WindowManagerIpc) -> Result<ActiveWorkspace, IpcError> {
    request_json(ipc, ACTIVE_WORKSPACE_REQUEST).await
}

async fn request_json<T>(ipc: &dyn WindowManagerIpc, request: &str) -> Result<T, IpcError>
where
    T: for<'de> Deserialize<'de>,
{
    let reply = ipc.send_command(request).await?;
    serde_json::from_str(&reply).map_err(|source| IpcError::Json {
        request: request.to_string(),
        source,
    })
}

/// Client for the Hyprland request socket
#[derive(Debug, Clone)]
pub struct HyprlandIpc {
    socket_path: Option<PathBuf>,
    timeout: Duration,
}

impl HyprlandIpc {
    /// Client talking to an explicit socket
    pub fn new(socket_path: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            socket_path,
            timeout,
        }
    }

    /// Client for the running Hyprland instance, if any
    pub fn from_config(config: &Config) -> Self {
        let socket_path = config.hyprland_signature.as_deref().map(|signature| {
            let runtime = config
                .runtime_dir
                .as_ref()
                .map(|dir| dir.join("hypr").join(signature).join(".socket.sock"));

            match runtime {
                Some(path) if path.exists() => path,
                // Hyprland before 0.40 kept its sockets under /tmp.
                _ => PathBuf::from("/tmp/hypr").join(signature).join(".socket.sock"),
            }
        });

        match &socket_path {
            Some(path) => tracing::info!("Using Hyprland socket {}", path.display()),
            None => tracing::warn!("HYPRLAND_INSTANCE_SIGNATURE not set; monitor queries will fail"),
        }

        Self::new(socket_path, config.ipc_timeout)
    }

    pub fn socket_path(&self) -> Option<&PathBuf> {
        self.socket_path.as_ref()
    }

    async fn round_trip(path: &Path, command: &str) -> Result<String, IpcError> {
        let io_err = |source: std::io::Error| IpcError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut stream = UnixStream::connect(path).await.map_err(io_err)?;
        stream.write_all(command.as_bytes()).await.map_err(io_err)?;

        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.map_err(io_err)?;
        Ok(reply)
    }
}

#[async_trait]
impl WindowManagerIpc for HyprlandIpc {
    async fn send_command(&self, command: &str) -> Result<String, IpcError> {
        let Some(path) = self.socket_path() else {
            return Err(IpcError::NoInstance);
        };

        tracing::debug!("Hyprland request: {}", command);
        tokio::time::timeout(self.timeout, Self::round_trip(path, command))
            .await
            .map_err(|_| IpcError::Timeout(command.to_string()))?
    }
}
