//! MCP server exposing the shell services
//!
//! The status bar talks to the services in-process through [`ShellContext`];
//! this server makes the same operations available to external tools over
//! stdio so brightness and monitor mapping can be driven and inspected
//! without the bar.

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars, serde,
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer, ServerHandler,
};
use serde_json::{json, Value};

use crate::brightness::ScreenBrightness;
use crate::context::ShellContext;

/// Parameters for brightness_set tool
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct BrightnessSetParams {
    /// Raw level on the device scale; clamped to [0, max_level]
    pub value: i32,
}

/// Parameters for monitor_resolve tool
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct MonitorResolveParams {
    /// Hyprland monitor id (from monitor_list)
    #[serde(default)]
    pub wm_id: Option<i64>,
    /// Plug name of the output, e.g. "eDP-1"
    #[serde(default)]
    pub plug_name: Option<String>,
}

/// Lumenbar MCP Server
#[derive(Clone)]
pub struct LumenbarServer {
    context: ShellContext,
    tool_router: ToolRouter<LumenbarServer>,
}

fn success(value: Value) -> CallToolResult {
    let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    CallToolResult::success(vec![Content::text(text)])
}

fn failure(value: Value) -> CallToolResult {
    CallToolResult::error(vec![Content::text(value.to_string())])
}

/// Snapshot of the brightness controller
pub fn brightness_status(context: &ShellContext) -> Value {
    let brightness = &context.brightness;
    let mode = if !brightness.is_available() {
        "disabled"
    } else if brightness.is_simulated() {
        "simulated"
    } else {
        "hardware"
    };

    json!({
        "available": brightness.is_available(),
        "mode": mode,
        "device": brightness.device(),
        "level": brightness.get(),
        "max_level": brightness.max_level(),
        "percent": brightness.percent()
    })
}

/// Apply a brightness change and describe what was requested
pub fn set_brightness(context: &ShellContext, value: i32) -> Result<Value, Value> {
    let brightness = &context.brightness;
    let max = brightness.max_level();
    if !brightness.is_available() || max <= 0 {
        return Err(json!({
            "error": "Brightness control unavailable",
            "max_level": max
        }));
    }

    brightness.set(value);
    let applied = value.clamp(0, max);
    Ok(json!({
        "success": true,
        "requested": value,
        "applied": applied,
        "max_level": max
    }))
}

/// Hyprland monitors sorted by id
pub async fn list_monitors(context: &ShellContext) -> Value {
    let monitors = context.monitors.all_monitors().await;
    let mut entries: Vec<(&i64, &String)> = monitors.iter().collect();
    entries.sort_by_key(|(id, _)| **id);

    let list: Vec<Value> = entries
        .into_iter()
        .map(|(id, name)| json!({ "id": id, "name": name }))
        .collect();

    json!({
        "monitors": list,
        "count": list.len(),
        "vm_detected": context.profile.vm_detected,
        "cache_window_secs": context.config.monitor_cache_window.as_secs()
    })
}

/// Resolve a Hyprland id or plug name to a display monitor index
pub async fn resolve_monitor(
    context: &ShellContext,
    params: &MonitorResolveParams,
) -> Result<Value, Value> {
    let display_id = match (params.wm_id, params.plug_name.as_deref()) {
        (Some(wm_id), _) => context.monitors.display_monitor_id(wm_id).await,
        (None, Some(plug_name)) => context.monitors.display_monitor_id_from_name(plug_name),
        (None, None) => {
            return Err(json!({
                "error": "Missing monitor selector",
                "suggestion": "Pass wm_id or plug_name"
            }));
        }
    };

    Ok(json!({
        "wm_id": params.wm_id,
        "plug_name": params.plug_name,
        "display_id": display_id
    }))
}

#[tool_router]
impl LumenbarServer {
    /// Create a server over an existing context
    pub fn new(context: ShellContext) -> Self {
        Self {
            context,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Get the screen brightness level, its maximum and the percentage")]
    async fn brightness_get(&self) -> Result<CallToolResult, McpError> {
        Ok(success(brightness_status(&self.context)))
    }

    #[tool(description = "Set the screen brightness to a raw level; values are clamped to [0, max_level]")]
    async fn brightness_set(
        &self,
        params: Parameters<BrightnessSetParams>,
    ) -> Result<CallToolResult, McpError> {
        match set_brightness(&self.context, params.0.value) {
            Ok(result) => Ok(success(result)),
            Err(error) => Ok(failure(error)),
        }
    }

    #[tool(description = "List Hyprland monitors by id with their output names")]
    async fn monitor_list(&self) -> Result<CallToolResult, McpError> {
        Ok(success(list_monitors(&self.context).await))
    }

    #[tool(description = "Map a Hyprland monitor id or a plug name to the display server's monitor index")]
    async fn monitor_resolve(
        &self,
        params: Parameters<MonitorResolveParams>,
    ) -> Result<CallToolResult, McpError> {
        match resolve_monitor(&self.context, &params.0).await {
            Ok(result) => Ok(success(result)),
            Err(error) => Ok(failure(error)),
        }
    }

    #[tool(description = "Get the display server's monitor index for the focused workspace")]
    async fn monitor_current(&self) -> Result<CallToolResult, McpError> {
        let display_id = self.context.monitors.current_display_monitor_id().await;
        Ok(success(json!({ "display_id": display_id })))
    }
}

#[tool_handler]
impl ServerHandler for LumenbarServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Lumenbar exposes screen brightness and monitor identity services. \
                 Use brightness_get / brightness_set for the backlight and monitor_list, \
                 monitor_resolve and monitor_current to map Hyprland monitors to display \
                 monitor indices.".to_string()
            ),
        }
    }

    async fn initialize(
        &self,
        _request: InitializeRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, McpError> {
        Ok(self.get_info())
    }
}
