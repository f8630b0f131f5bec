// ABOUTME: Health check route handlers for service monitoring and status endpoints
// ABOUTME: Reports liveness plus the number of active SSE sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Health check routes for service monitoring

use crate::constants::endpoints;
use crate::sse::SessionRegistry;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health check route
    pub fn routes(registry: SessionRegistry) -> axum::Router {
        use axum::{extract::State, routing::get, Json, Router};

        async fn health_handler(
            State(registry): State<SessionRegistry>,
        ) -> Json<serde_json::Value> {
            Json(serde_json::json!({
                "status": "healthy",
                "active_sessions": registry.len().await,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }))
        }

        Router::new()
            .route(endpoints::HEALTH_CHECK, get(health_handler))
            .with_state(registry)
    }
}
