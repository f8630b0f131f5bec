// ABOUTME: Unified error handling with standard error codes, HTTP status mapping, and JSON bodies
// ABOUTME: Defines AppError for the server and TransportError for session routing failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! [`ErrorCode`] and [`AppError`] are shared by configuration, the HTTP layer
//! and the protocol engine. [`TransportError`] is the taxonomy of the SSE
//! session core; every variant converts into an [`AppError`] so the HTTP
//! handlers can render one consistent error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (3000-3999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField = 3001,
    #[serde(rename = "INVALID_FORMAT")]
    InvalidFormat = 3002,

    // Resource Management (4000-4999)
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,
    #[serde(rename = "RESOURCE_ALREADY_EXISTS")]
    ResourceAlreadyExists = 4001,
    #[serde(rename = "RESOURCE_UNAVAILABLE")]
    ResourceUnavailable = 4003,

    // Configuration (6000-6999)
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid = 6002,

    // Internal Errors (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9003,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput | Self::MissingRequiredField | Self::InvalidFormat => 400,
            Self::ResourceNotFound => 404,
            Self::ResourceAlreadyExists => 409,
            Self::ResourceUnavailable
            | Self::ConfigError
            | Self::ConfigInvalid
            | Self::InternalError
            | Self::SerializationError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::InvalidFormat => "The data format is invalid",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ResourceAlreadyExists => "A resource with this identifier already exists",
            Self::ResourceUnavailable => "The resource is no longer available",
            Self::ConfigError => "Configuration error encountered",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::InternalError => "An internal server error occurred",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Resource already exists
    pub fn already_exists(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceAlreadyExists,
            format!("{} already exists", resource.into()),
        )
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorCode::SerializationError, error.to_string()).with_source(error)
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::internal(error.to_string()).with_source(error)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Error payload carried by [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message.clone(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

/// Failures of the SSE session core
///
/// `MissingSessionId`, `SessionNotFound` and `InvalidMessage` are
/// client-input errors.
/// None of the variants tears a session down by itself; teardown belongs to
/// the connection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The inbound request carried no `sessionId`
    #[error("Missing sessionId parameter")]
    MissingSessionId,

    /// No live session is registered under the id
    #[error("Session not found: {session_id}")]
    SessionNotFound {
        /// Id supplied by the caller
        session_id: String,
    },

    /// The protocol engine rejected a malformed payload
    #[error("Invalid message: {reason}")]
    InvalidMessage {
        /// Engine-reported reason
        reason: String,
    },

    /// The protocol engine failed while handling an inbound payload
    #[error("Message delivery failed: {reason}")]
    DeliveryFailed {
        /// Engine-reported reason
        reason: String,
    },

    /// A frame was written after the stream stopped being writable
    #[error("Stream is closed")]
    StreamClosed,

    /// The protocol engine could not bind to a new transport
    #[error("Protocol engine failed to start: {reason}")]
    EngineStartupFailed {
        /// Engine-reported reason
        reason: String,
    },
}

impl TransportError {
    /// Build a `SessionNotFound` error
    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        Self::SessionNotFound {
            session_id: session_id.into(),
        }
    }

    /// Build an `InvalidMessage` error
    pub fn invalid_message(reason: impl Into<String>) -> Self {
        Self::InvalidMessage {
            reason: reason.into(),
        }
    }

    /// Map an engine failure onto the transport taxonomy
    ///
    /// Input and format errors become `InvalidMessage`, anything else is a
    /// `DeliveryFailed`.
    #[must_use]
    pub fn from_engine_error(error: &AppError) -> Self {
        match error.code {
            ErrorCode::InvalidInput | ErrorCode::InvalidFormat | ErrorCode::MissingRequiredField => {
                Self::invalid_message(error.message.clone())
            }
            _ => Self::delivery_failed(error.message.clone()),
        }
    }

    /// Build a `DeliveryFailed` error
    pub fn delivery_failed(reason: impl Into<String>) -> Self {
        Self::DeliveryFailed {
            reason: reason.into(),
        }
    }

    /// Build an `EngineStartupFailed` error
    pub fn engine_startup_failed(reason: impl Into<String>) -> Self {
        Self::EngineStartupFailed {
            reason: reason.into(),
        }
    }

    /// Error code this failure is reported with
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingSessionId => ErrorCode::MissingRequiredField,
            Self::SessionNotFound { .. } => ErrorCode::ResourceNotFound,
            Self::InvalidMessage { .. } => ErrorCode::InvalidFormat,
            Self::StreamClosed => ErrorCode::ResourceUnavailable,
            Self::DeliveryFailed { .. } | Self::EngineStartupFailed { .. } => {
                ErrorCode::InternalError
            }
        }
    }

    /// Whether the failure was caused by the caller's input
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingSessionId | Self::SessionNotFound { .. } | Self::InvalidMessage { .. }
        )
    }
}

impl From<TransportError> for AppError {
    fn from(error: TransportError) -> Self {
        let message = match &error {
            TransportError::SessionNotFound { .. } => "Session not found".to_owned(),
            other => other.to_string(),
        };
        Self::new(error.code(), message).with_source(error)
    }
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
