// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, endpoint paths, keep-alive timing, and validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management for production deployment

use crate::constants::{endpoints, network_config, service_names, timeouts};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::info;

/// Environment type for logging and other configurations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// HTTP port
    pub http_port: u16,
    /// Path of the long-lived SSE stream endpoint
    pub stream_path: String,
    /// Path clients POST inbound messages to
    pub messages_path: String,
    /// Seconds between keep-alive comments
    pub keep_alive_interval_secs: u64,
    /// Server name reported during `initialize`
    pub server_name: String,
    /// Server version reported during `initialize`
    pub server_version: String,
    /// Allowed CORS origins (`*` allows any)
    pub cors_allowed_origins: Vec<String>,
    /// Deployment environment
    pub environment: Environment,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: network_config::DEFAULT_HOST.to_owned(),
            http_port: network_config::DEFAULT_HTTP_PORT,
            stream_path: endpoints::DEFAULT_STREAM_PATH.to_owned(),
            messages_path: endpoints::DEFAULT_MESSAGES_PATH.to_owned(),
            keep_alive_interval_secs: timeouts::SSE_KEEPALIVE_INTERVAL_SECS,
            server_name: service_names::MCP_SSE_SERVER.to_owned(),
            server_version: env!("CARGO_PKG_VERSION").to_owned(),
            cors_allowed_origins: parse_origins(network_config::DEFAULT_CORS_ORIGINS),
            environment: Environment::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed or the
    /// resulting configuration fails validation
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");

        let config = Self {
            host: env_var_or("HOST", network_config::DEFAULT_HOST),
            http_port: env_var_or("HTTP_PORT", &network_config::DEFAULT_HTTP_PORT.to_string())
                .parse()
                .map_err(|e| AppError::invalid_input(format!("Invalid HTTP_PORT value: {e}")))?,
            stream_path: env_var_or("SSE_STREAM_PATH", endpoints::DEFAULT_STREAM_PATH),
            messages_path: env_var_or("SSE_MESSAGES_PATH", endpoints::DEFAULT_MESSAGES_PATH),
            keep_alive_interval_secs: env_var_or(
                "SSE_KEEPALIVE_INTERVAL_SECS",
                &timeouts::SSE_KEEPALIVE_INTERVAL_SECS.to_string(),
            )
            .parse()
            .map_err(|e| {
                AppError::invalid_input(format!("Invalid SSE_KEEPALIVE_INTERVAL_SECS value: {e}"))
            })?,
            server_name: env_var_or("SERVER_NAME", service_names::MCP_SSE_SERVER),
            server_version: env!("CARGO_PKG_VERSION").to_owned(),
            cors_allowed_origins: parse_origins(&env_var_or(
                "CORS_ALLOWED_ORIGINS",
                network_config::DEFAULT_CORS_ORIGINS,
            )),
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first invalid value
    pub fn validate(&self) -> AppResult<()> {
        for (name, path) in [
            ("SSE_STREAM_PATH", &self.stream_path),
            ("SSE_MESSAGES_PATH", &self.messages_path),
        ] {
            if !path.starts_with('/') {
                return Err(AppError::config(format!(
                    "{name} must start with '/', got '{path}'"
                )));
            }
        }

        if self.stream_path == self.messages_path {
            return Err(AppError::config(
                "SSE_STREAM_PATH and SSE_MESSAGES_PATH cannot be the same",
            ));
        }

        if self.keep_alive_interval_secs == 0 {
            return Err(AppError::config(
                "SSE_KEEPALIVE_INTERVAL_SECS must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Keep-alive interval as a `Duration`
    #[must_use]
    pub const fn keep_alive_interval(&self) -> Duration {
        Duration::from_secs(self.keep_alive_interval_secs)
    }

    /// Socket address string for binding
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }

    /// Get a summary of the configuration for logging
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "MCP SSE Server Configuration:\n\
             - Server: {} v{}\n\
             - Listen: {}\n\
             - Stream endpoint: GET {}\n\
             - Message endpoint: POST {}\n\
             - Keep-alive interval: {}s\n\
             - CORS origins: {}\n\
             - Environment: {}",
            self.server_name,
            self.server_version,
            self.bind_address(),
            self.stream_path,
            self.messages_path,
            self.keep_alive_interval_secs,
            self.cors_allowed_origins.join(", "),
            self.environment,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse comma-separated CORS origins
fn parse_origins(origins_str: &str) -> Vec<String> {
    if origins_str.trim() == "*" {
        vec!["*".to_owned()]
    } else {
        origins_str
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
