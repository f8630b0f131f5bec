// ABOUTME: HTTP server assembly: SSE session routes, health route, CORS and request tracing
// ABOUTME: Binds the listener and shuts every live session down on ctrl-c
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::ServerConfig;
use crate::errors::AppResult;
use crate::middleware::setup_cors;
use crate::routes::HealthRoutes;
use crate::sse::{
    ConnectionManager, LifecycleSettings, ProtocolEngineFactory, SessionRegistry, SseRoutes,
};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// SSE transport server
pub struct HttpServer {
    config: ServerConfig,
    manager: ConnectionManager,
}

impl HttpServer {
    /// Create a server with a fresh session registry
    #[must_use]
    pub fn new(config: ServerConfig, engines: Arc<dyn ProtocolEngineFactory>) -> Self {
        let manager = ConnectionManager::new(
            SessionRegistry::new(),
            engines,
            LifecycleSettings::from_config(&config),
        );
        Self { config, manager }
    }

    /// The connection manager owning every session of this server
    #[must_use]
    pub const fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Build the complete router
    pub fn router(&self) -> Router {
        SseRoutes::routes(self.manager.clone(), &self.config)
            .merge(HealthRoutes::routes(self.manager.registry().clone()))
            .layer(setup_cors(&self.config))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until ctrl-c, then close every session
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or the server fails
    pub async fn run(self) -> AppResult<()> {
        let address = self.config.bind_address();
        let listener = TcpListener::bind(&address).await?;
        info!(address = %address, "SSE transport server listening");

        let app = self.router();
        let manager = self.manager.clone();
        let shutdown_signal = async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl+C, shutting down gracefully...");
            let closed = manager.shutdown().await;
            info!(sessions_closed = closed, "All SSE sessions closed");
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        info!("Server shutting down");
        Ok(())
    }
}
