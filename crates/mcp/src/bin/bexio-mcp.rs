// Standalone MCP server binary

use anyhow::{Context, Result};
use bexio_mcp::{registry, Dispatcher, McpConfig, McpServer};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bexio-mcp", version, about = "MCP server for the Bexio accounting API")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "bexio-mcp.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = McpConfig::load(&args.config)?;

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.logging.filter))
                .unwrap_or_else(|_| EnvFilter::new("bexio_mcp=info,bexio_sdk=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::info!(base_url = %config.api.base_url, "Bexio MCP server starting");

    let client = config.build_client()?;
    let registry = registry().context("Failed to build tool registry")?;
    tracing::info!("Registered {} tools", registry.len());

    let server = McpServer::new(Dispatcher::new(registry, Arc::new(client)));
    server.serve_stdio().await?;

    Ok(())
}
