//! MCP Toolhouse server.
//!
//! Main entry point: reads credentials from the environment, then serves
//! MCP over stdin/stdout until the client disconnects.

use anyhow::{Context, Result};
use clap::Parser;
use toolhouse_mcp::{McpServer, StdioTransport, ToolhouseClient, ToolhouseConfig};

/// MCP server exposing Toolhouse bundle tools over stdio.
///
/// Requires TOOLHOUSE_API_KEY; TOOLHOUSE_BUNDLE selects the bundle
/// (default: mcp-toolhouse).
#[derive(Parser)]
#[command(name = "mcp-server-toolhouse")]
#[command(author, version, about)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the protocol stream; all logging goes to stderr.
    let filter = if cli.verbose {
        "toolhouse_mcp=debug,mcp_server_toolhouse=debug,info"
    } else {
        "toolhouse_mcp=info,mcp_server_toolhouse=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting mcp-server-toolhouse");

    let config = ToolhouseConfig::from_env().context("failed to load configuration")?;
    let client = ToolhouseClient::new(config).context("failed to build Toolhouse client")?;
    let server = McpServer::new(client);

    let mut transport = StdioTransport::stdio();
    server.serve(&mut transport).await?;

    Ok(())
}
