// ABOUTME: Main library entry point for the session-oriented MCP SSE transport server
// ABOUTME: Pairs long-lived SSE streams with POST-delivered messages per session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # MCP SSE Server
//!
//! A Model Context Protocol server speaking the SSE transport: a client opens
//! `GET /mcp`, receives an `endpoint` event naming
//! `/mcp/messages?sessionId=<id>`, and POSTs JSON-RPC messages there.
//! Responses are pushed back over the stream.
//!
//! ## Architecture
//!
//! - **SSE**: session registry, stream transport, lifecycle manager, router
//! - **MCP**: per-connection JSON-RPC engine, capability registry, UI resources
//! - **Config**: environment-driven server configuration
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use mcp_sse_server::config::ServerConfig;
//! use mcp_sse_server::mcp::{builtin, McpEngineFactory, ServerInfo};
//! use mcp_sse_server::server::HttpServer;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> mcp_sse_server::errors::AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     let info = ServerInfo::from_config(&config);
//!     let engines = McpEngineFactory::new(info, builtin::register_builtin);
//!     HttpServer::new(config, Arc::new(engines)).run().await
//! }
//! ```

/// Environment-driven configuration
pub mod config;

/// Application constants grouped by domain
pub mod constants;

/// Unified error handling
pub mod errors;

/// JSON-RPC 2.0 message types
pub mod jsonrpc;

/// Structured logging setup
pub mod logging;

/// MCP protocol engine and capabilities
pub mod mcp;

/// HTTP middleware
pub mod middleware;

/// Auxiliary HTTP routes
pub mod routes;

/// Server assembly and graceful shutdown
pub mod server;

/// SSE session transport core
pub mod sse;
