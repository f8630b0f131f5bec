// ABOUTME: CORS middleware configuration for the SSE and message endpoints
// ABOUTME: Provides Cross-Origin Resource Sharing setup for browser-based MCP clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::ServerConfig;
use crate::constants::endpoints;
use axum::http::{header::HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Configure CORS from `CORS_ALLOWED_ORIGINS`
///
/// `*` (the default) allows any origin; otherwise only the listed origins
/// are allowed. The `Mcp-Session-Id` response header is exposed so browser
/// clients can read the id of the stream they opened.
///
/// ```bash
/// export CORS_ALLOWED_ORIGINS="https://app.example.com,https://admin.example.com"
/// ```
#[must_use]
pub fn setup_cors(config: &ServerConfig) -> CorsLayer {
    let allow_origin = if config.cors_allowed_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect();

        if origins.is_empty() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(origins)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("cache-control"),
            HeaderName::from_static("last-event-id"),
            HeaderName::from_static(endpoints::SESSION_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(endpoints::SESSION_ID_HEADER)])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
}
