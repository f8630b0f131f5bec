// ABOUTME: Model Context Protocol engine bound to each SSE session
// ABOUTME: Provides the JSON-RPC dispatcher, capability registry, UI resources, and built-ins
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # MCP protocol engine
//!
//! One [`engine::McpEngine`] is created per SSE connection by
//! [`engine::McpEngineFactory`], each with its own
//! [`capabilities::CapabilityRegistry`], so no tool or resource state is
//! shared between clients.

/// Built-in UI tools and resources
pub mod builtin;
/// Tool and resource registration
pub mod capabilities;
/// JSON-RPC dispatch for one connection
pub mod engine;
/// MCP-UI resource builders
pub mod ui_resource;

pub use capabilities::{
    CapabilityRegistry, ContentBlock, EmbeddedResource, ResourceDescriptor, ResourceHandler,
    ToolDescriptor, ToolHandler,
};
pub use engine::{McpEngine, McpEngineFactory, ServerInfo};
