//! Headless host bridge binary for stdin/stdout JSON tool calls.
//!
//! This binary reads `ToolCall` messages as newline-delimited JSON from
//! stdin, runs them against the configured SearXNG gateway, and writes
//! `ToolResponse` messages to stdout.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.

use std::sync::Arc;

use sift::host::stdio::run_stdio_bridge;
use sift::{Gateway, GatewayConfig, ToolDispatcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise tracing to stderr only (stdout is reserved for the JSON
    // protocol).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = GatewayConfig::load()?;
    tracing::info!(
        upstream = %config.upstream.base_url,
        rendered = config.fetch.enable_rendered,
        "sift-host starting"
    );

    let gateway = Gateway::from_config(config)?;
    let dispatcher = ToolDispatcher::new(Arc::new(gateway));
    tracing::info!(tools = ?dispatcher.registry().names(), "tools registered");

    run_stdio_bridge(&dispatcher).await.map_err(|e| {
        tracing::error!(error = %e, "sift-host exited with error");
        anyhow::anyhow!("sift-host failed: {e}")
    })?;

    tracing::info!("sift-host shut down cleanly");
    Ok(())
}
