// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Default ports, endpoint paths, SSE timings, and protocol identifiers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single
//! flat namespace.

/// Network defaults
pub mod network_config {
    /// Default bind address
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 3001;
    /// Allow every origin unless configured otherwise
    pub const DEFAULT_CORS_ORIGINS: &str = "*";
}

/// HTTP endpoint paths
pub mod endpoints {
    /// Stream-open endpoint (long-lived SSE GET)
    pub const DEFAULT_STREAM_PATH: &str = "/mcp";
    /// Inbound-message endpoint (short-lived POST)
    pub const DEFAULT_MESSAGES_PATH: &str = "/mcp/messages";
    /// Health check endpoint
    pub const HEALTH_CHECK: &str = "/health";
    /// Query parameter correlating a POST with its stream
    pub const SESSION_ID_QUERY_PARAM: &str = "sessionId";
    /// Response header echoing the session id on stream open
    pub const SESSION_ID_HEADER: &str = "mcp-session-id";
}

/// Timing values
pub mod timeouts {
    /// Interval between keep-alive comments on an open stream
    pub const SSE_KEEPALIVE_INTERVAL_SECS: u64 = 15;
    /// How long a frame write waits for room in a full output buffer
    pub const SSE_SEND_TIMEOUT_MS: u64 = 5_000;
}

/// Resource limits
pub mod limits {
    /// Frames buffered per session before writers have to wait
    pub const SSE_OUTBOUND_BUFFER: usize = 256;
}

/// SSE wire vocabulary
pub mod sse_events {
    /// Event name of the endpoint announcement
    pub const ENDPOINT: &str = "endpoint";
    /// Event name of protocol frames
    pub const MESSAGE: &str = "message";
    /// Comment text of a keep-alive line
    pub const KEEPALIVE_COMMENT: &str = "keepalive";
}

/// MCP protocol identifiers
pub mod protocol {
    /// Newest protocol revision this server speaks
    pub const LATEST_PROTOCOL_VERSION: &str = "2025-03-26";
    /// Every protocol revision accepted during `initialize`
    pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26"];
    /// JSON-RPC error code for an unknown resource URI
    pub const RESOURCE_NOT_FOUND: i32 = -32002;
}

/// Service names for structured logging
pub mod service_names {
    /// Default service name
    pub const MCP_SSE_SERVER: &str = "mcp-ui-server";
}
