// ABOUTME: HTTP middleware layers applied to every route
// ABOUTME: Currently provides CORS configuration for browser-based MCP clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// CORS configuration
pub mod cors;

pub use cors::setup_cors;
