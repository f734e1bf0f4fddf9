//! Lumenbar - brightness and monitor-identity services for Hyprland status bars
//!
//! Runs the services and serves them as MCP tools over stdio.

use lumenbar::config::Config;
use lumenbar::context::ShellContext;
use lumenbar::server::LumenbarServer;
use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (stderr to keep stdout clean for MCP protocol)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".to_string().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Lumenbar");

    let context = ShellContext::new(Config::from_env());

    // Log brightness changes for anyone tailing stderr
    let mut screen_events = context.brightness.subscribe();
    tokio::spawn(async move {
        loop {
            match screen_events.recv().await {
                Ok(event) => tracing::debug!("screen: {} ({:?})", event.value, event.source),
                Err(RecvError::Lagged(missed)) => tracing::debug!("Missed {} screen events", missed),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let server = LumenbarServer::new(context);
    let transport = stdio();

    tracing::info!("Lumenbar MCP Server ready, listening on stdio");

    let service = server.serve(transport).await?;

    // Wait for graceful shutdown
    service.waiting().await?;

    tracing::info!("Lumenbar shutting down");
    Ok(())
}
