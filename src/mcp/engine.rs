// ABOUTME: Per-connection MCP engine dispatching JSON-RPC requests to registered capabilities
// ABOUTME: Writes responses as SSE message frames and builds engines through a setup callback
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # MCP engine
//!
//! Each inbound payload is one JSON-RPC 2.0 message. Requests get exactly
//! one `message` frame in reply, notifications and client responses get
//! none. A payload that is not valid JSON or not a JSON-RPC message is
//! answered with an error frame and also rejected back to the POST caller as
//! invalid input.

use super::capabilities::{CapabilityRegistry, ContentBlock};
use crate::config::ServerConfig;
use crate::constants::protocol;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::jsonrpc::{error_codes, JsonRpcRequest, JsonRpcResponse};
use crate::sse::{Outbound, ProtocolEngine, ProtocolEngineFactory, SseFrame};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Name and version reported in the `initialize` result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerInfo {
    /// Server name
    pub name: String,
    /// Server version
    pub version: String,
}

impl ServerInfo {
    /// Server identity from configuration
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            name: config.server_name.clone(),
            version: config.server_version.clone(),
        }
    }
}

/// MCP engine bound to one SSE connection
pub struct McpEngine {
    outbound: Arc<dyn Outbound>,
    capabilities: CapabilityRegistry,
    server_info: ServerInfo,
    initialized: AtomicBool,
    closed: AtomicBool,
}

impl McpEngine {
    /// Create an engine writing to `outbound`
    #[must_use]
    pub fn new(
        outbound: Arc<dyn Outbound>,
        capabilities: CapabilityRegistry,
        server_info: ServerInfo,
    ) -> Self {
        Self {
            outbound,
            capabilities,
            server_info,
            initialized: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Whether the client sent `notifications/initialized`
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    async fn send_response(&self, response: &JsonRpcResponse) -> AppResult<()> {
        let data = serde_json::to_string(response)?;
        self.outbound
            .send(SseFrame::message(data))
            .await
            .map_err(AppError::from)
    }

    /// Dispatch one request; `None` for notifications
    async fn dispatch(&self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone();
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "notifications/initialized" => {
                self.initialized.store(true, Ordering::Release);
                debug!("Client finished initialization");
                return None;
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                json!({ "tools": self.capabilities.tool_descriptors() }),
            ),
            "tools/call" => self.handle_tools_call(request).await,
            "resources/list" => JsonRpcResponse::success(
                id,
                json!({ "resources": self.capabilities.resource_descriptors() }),
            ),
            "resources/read" => self.handle_resources_read(request).await,
            method if method.starts_with("notifications/") => {
                debug!(method = %method, "Ignoring notification");
                return None;
            }
            method => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            ),
        };

        if request.is_notification() {
            None
        } else {
            Some(response)
        }
    }

    fn handle_initialize(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let requested = request
            .params
            .as_ref()
            .and_then(|params| params.get("protocolVersion"))
            .and_then(Value::as_str);

        let protocol_version = requested
            .filter(|version| protocol::SUPPORTED_PROTOCOL_VERSIONS.contains(version))
            .unwrap_or(protocol::LATEST_PROTOCOL_VERSION);

        info!(
            requested_version = requested.unwrap_or("none"),
            negotiated_version = %protocol_version,
            "MCP initialize"
        );

        JsonRpcResponse::success(
            request.id.clone(),
            json!({
                "protocolVersion": protocol_version,
                "capabilities": {
                    "tools": { "listChanged": false },
                    "resources": { "subscribe": false, "listChanged": false }
                },
                "serverInfo": self.server_info
            }),
        )
    }

    async fn handle_tools_call(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        let params = request.params.as_ref();
        let Some(name) = params
            .and_then(|params| params.get("name"))
            .and_then(Value::as_str)
        else {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                "Missing required parameter: name",
            );
        };
        let Some(tool) = self.capabilities.tool(name) else {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("Unknown tool: {name}"),
            );
        };

        let arguments = params
            .and_then(|params| params.get("arguments"))
            .cloned()
            .unwrap_or_else(|| json!({}));
        let (content, is_error) = match tool.call(arguments).await {
            Ok(content) => (content, false),
            Err(e) => {
                debug!(tool = %name, error = %e, "Tool call failed");
                (vec![ContentBlock::text(e.message)], true)
            }
        };

        JsonRpcResponse::success(
            id,
            json!({
                "content": content,
                "isError": is_error
            }),
        )
    }

    async fn handle_resources_read(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        let Some(uri) = request
            .params
            .as_ref()
            .and_then(|params| params.get("uri"))
            .and_then(Value::as_str)
        else {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                "Missing required parameter: uri",
            );
        };
        let Some(resource) = self.capabilities.resource(uri) else {
            return JsonRpcResponse::error(
                id,
                protocol::RESOURCE_NOT_FOUND,
                format!("Resource not found: {uri}"),
            );
        };

        let mime_type = resource.descriptor().mime_type;
        match resource.read().await {
            Ok(text) => JsonRpcResponse::success(
                id,
                json!({
                    "contents": [{ "uri": uri, "mimeType": mime_type, "text": text }]
                }),
            ),
            Err(e) => JsonRpcResponse::error(
                id,
                error_codes::INTERNAL_ERROR,
                format!("Failed to read resource: {}", e.message),
            ),
        }
    }
}

#[async_trait]
impl ProtocolEngine for McpEngine {
    async fn handle_inbound(&self, payload: Bytes) -> AppResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(AppError::new(
                ErrorCode::ResourceUnavailable,
                "Engine is closed",
            ));
        }

        let message: Value = match serde_json::from_slice(&payload) {
            Ok(message) => message,
            Err(e) => {
                let response =
                    JsonRpcResponse::error(None, error_codes::PARSE_ERROR, "Parse error");
                self.send_response(&response).await?;
                return Err(AppError::new(
                    ErrorCode::InvalidFormat,
                    format!("Invalid JSON-RPC payload: {e}"),
                )
                .with_source(e));
            }
        };

        if !message.is_object() {
            let response =
                JsonRpcResponse::error(None, error_codes::INVALID_REQUEST, "Invalid Request");
            self.send_response(&response).await?;
            return Err(AppError::new(
                ErrorCode::InvalidFormat,
                "JSON-RPC message must be an object",
            ));
        }

        if message.get("method").is_none() {
            debug!("Ignoring client response message");
            return Ok(());
        }

        let id = message.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                let response = JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_REQUEST,
                    format!("Invalid Request: {e}"),
                );
                self.send_response(&response).await?;
                return Err(AppError::new(
                    ErrorCode::InvalidFormat,
                    format!("Invalid JSON-RPC request: {e}"),
                )
                .with_source(e));
            }
        };

        debug!(method = %request.method, "Dispatching MCP request");
        match self.dispatch(&request).await {
            Some(response) => self.send_response(&response).await,
            None => Ok(()),
        }
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(server = %self.server_info.name, "MCP engine released");
        }
    }
}

/// Capability setup run once per connection
pub type CapabilitySetup = dyn Fn(&mut CapabilityRegistry) -> AppResult<()> + Send + Sync;

/// Builds a fresh [`McpEngine`] with its own capabilities for every connection
pub struct McpEngineFactory {
    server_info: ServerInfo,
    setup: Arc<CapabilitySetup>,
}

impl McpEngineFactory {
    /// Create a factory that runs `setup` against each new connection's registry
    pub fn new(
        server_info: ServerInfo,
        setup: impl Fn(&mut CapabilityRegistry) -> AppResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            server_info,
            setup: Arc::new(setup),
        }
    }
}

#[async_trait]
impl ProtocolEngineFactory for McpEngineFactory {
    async fn on_connection_open(
        &self,
        outbound: Arc<dyn Outbound>,
    ) -> AppResult<Arc<dyn ProtocolEngine>> {
        let mut capabilities = CapabilityRegistry::new();
        (self.setup)(&mut capabilities)?;
        Ok(Arc::new(McpEngine::new(
            outbound,
            capabilities,
            self.server_info.clone(),
        )))
    }
}
