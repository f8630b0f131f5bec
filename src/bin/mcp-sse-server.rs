// ABOUTME: Server binary wiring configuration, logging, and the MCP engine into the SSE transport
// ABOUTME: Registers the built-in UI capabilities on every connection and serves until ctrl-c
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # MCP SSE Server Binary

use anyhow::Result;
use clap::Parser;
use mcp_sse_server::{
    config::ServerConfig,
    logging,
    mcp::{builtin, McpEngineFactory, ServerInfo},
    server::HttpServer,
};
use std::sync::Arc;
use tracing::{error, info};

/// Command-line overrides applied on top of environment configuration
#[derive(Parser)]
#[command(name = "mcp-sse-server")]
#[command(about = "MCP server over the Server-Sent Events transport")]
struct Args {
    /// Override bind address
    #[arg(long)]
    host: Option<String>,

    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override keep-alive interval in seconds
    #[arg(long)]
    keep_alive_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(keep_alive_secs) = args.keep_alive_secs {
        config.keep_alive_interval_secs = keep_alive_secs;
    }
    config.validate()?;

    info!("{}", config.summary());

    let engines =
        McpEngineFactory::new(ServerInfo::from_config(&config), builtin::register_builtin);

    let host = config.host.clone();
    let port = config.http_port;
    info!("=== Available Endpoints ===");
    info!("   SSE stream:  GET  http://{host}:{port}{}", config.stream_path);
    info!("   Messages:    POST http://{host}:{port}{}?sessionId=<id>", config.messages_path);
    info!("   Health:      GET  http://{host}:{port}/health");

    if let Err(e) = HttpServer::new(config, Arc::new(engines)).run().await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
