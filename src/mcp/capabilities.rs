// ABOUTME: Per-connection registry of MCP tools and resources
// ABOUTME: Defines the async ToolHandler and ResourceHandler traits capabilities implement
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tool metadata as listed by `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Unique tool name
    pub name: String,
    /// What the tool does
    pub description: String,
    /// JSON Schema of the arguments object
    pub input_schema: Value,
}

/// Resource metadata as listed by `resources/list`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    /// Unique resource URI
    pub uri: String,
    /// Display name
    pub name: String,
    /// What the resource contains
    pub description: String,
    /// MIME type of the contents
    pub mime_type: String,
}

/// Resource embedded in a tool result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedResource {
    /// Resource URI
    pub uri: String,
    /// MIME type of `text`
    pub mime_type: String,
    /// Resource body
    pub text: String,
}

/// One item of a `tools/call` result's `content` array
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    /// Plain text
    Text {
        /// The text
        text: String,
    },
    /// An embedded resource, such as a UI resource a client can render
    Resource {
        /// The resource
        resource: EmbeddedResource,
    },
}

impl ContentBlock {
    /// A text block
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// An embedded resource block
    #[must_use]
    pub const fn resource(resource: EmbeddedResource) -> Self {
        Self::Resource { resource }
    }
}

/// A callable tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Metadata advertised to clients
    fn descriptor(&self) -> ToolDescriptor;

    /// Run the tool and return the result's content blocks
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are invalid or the tool fails;
    /// the error is reported to the client as an `isError` result
    async fn call(&self, arguments: Value) -> AppResult<Vec<ContentBlock>>;
}

/// A readable resource
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Metadata advertised to clients
    fn descriptor(&self) -> ResourceDescriptor;

    /// Read the resource contents as text
    ///
    /// # Errors
    ///
    /// Returns an error if the contents cannot be produced
    async fn read(&self) -> AppResult<String>;
}

/// Tools and resources available to one connection
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    tools: BTreeMap<String, Arc<dyn ToolHandler>>,
    resources: BTreeMap<String, Arc<dyn ResourceHandler>>,
}

impl CapabilityRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    ///
    /// # Errors
    ///
    /// Returns an error if a tool with the same name is already registered
    pub fn register_tool(&mut self, handler: Arc<dyn ToolHandler>) -> AppResult<()> {
        let name = handler.descriptor().name;
        if self.tools.contains_key(&name) {
            return Err(AppError::already_exists(format!("Tool '{name}'")));
        }
        self.tools.insert(name, handler);
        Ok(())
    }

    /// Register a resource
    ///
    /// # Errors
    ///
    /// Returns an error if a resource with the same URI is already registered
    pub fn register_resource(&mut self, handler: Arc<dyn ResourceHandler>) -> AppResult<()> {
        let uri = handler.descriptor().uri;
        if self.resources.contains_key(&uri) {
            return Err(AppError::already_exists(format!("Resource '{uri}'")));
        }
        self.resources.insert(uri, handler);
        Ok(())
    }

    /// Find a tool by name
    #[must_use]
    pub fn tool(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).cloned()
    }

    /// Find a resource by URI
    #[must_use]
    pub fn resource(&self, uri: &str) -> Option<Arc<dyn ResourceHandler>> {
        self.resources.get(uri).cloned()
    }

    /// Descriptors of all tools, ordered by name
    #[must_use]
    pub fn tool_descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|tool| tool.descriptor()).collect()
    }

    /// Descriptors of all resources, ordered by URI
    #[must_use]
    pub fn resource_descriptors(&self) -> Vec<ResourceDescriptor> {
        self.resources
            .values()
            .map(|resource| resource.descriptor())
            .collect()
    }
}
