//! Lumenbar - brightness and monitor-identity services for Hyprland status bars
//!
//! This library provides the two small stateful services a status bar needs
//! beyond what its widgets draw.
//!
//! ## Features
//!
//! - Screen brightness via sysfs and brightnessctl, with change events
//! - Hyprland monitor id → display-server monitor index resolution
//! - VM compatibility mode with simulated brightness and monitor fallbacks
//! - MCP server exposing both services over stdio
//!
//! ## Supported Environments
//!
//! - Hyprland on Wayland, with XWayland providing the display monitor list
//! - Virtual machines without a backlight device

pub mod brightness;
pub mod config;
pub mod context;
pub mod core;
pub mod monitors;
pub mod server;
