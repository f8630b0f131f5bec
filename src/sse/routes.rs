// ABOUTME: HTTP route handlers for the SSE stream-open and inbound-message endpoints
// ABOUTME: Maps session frames onto axum SSE responses and transport errors onto status codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::lifecycle::ConnectionManager;
use super::router::InboundRouter;
use crate::config::ServerConfig;
use crate::constants::endpoints;
use crate::errors::AppError;
use crate::logging::SessionLogger;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{sse::Sse, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use futures_util::StreamExt;
use std::collections::HashMap;
use std::convert::Infallible;

#[derive(Clone)]
struct SseState {
    manager: ConnectionManager,
    router: InboundRouter,
}

/// SSE routes implementation
pub struct SseRoutes;

impl SseRoutes {
    /// Create the stream-open and inbound-message routes
    pub fn routes(manager: ConnectionManager, config: &ServerConfig) -> Router {
        let state = SseState {
            router: manager.inbound_router(),
            manager,
        };

        Router::new()
            .route(&config.stream_path, get(Self::handle_stream_open))
            .route(&config.messages_path, post(Self::handle_inbound_message))
            .with_state(state)
    }

    /// Open a session stream; the first event is the endpoint announcement
    async fn handle_stream_open(State(state): State<SseState>) -> Result<Response, AppError> {
        let stream = state.manager.open().await?;
        let session_id = stream.session_id().to_string();

        let events = stream.map(|frame| Ok::<_, Infallible>(frame.into_event()));
        let mut response = Sse::new(events).into_response();

        if let Ok(value) = HeaderValue::from_str(&session_id) {
            response.headers_mut().insert(
                HeaderName::from_static(endpoints::SESSION_ID_HEADER),
                value,
            );
        }

        Ok(response)
    }

    /// Deliver one POSTed payload to the session named by `sessionId`
    async fn handle_inbound_message(
        State(state): State<SseState>,
        Query(params): Query<HashMap<String, String>>,
        body: Bytes,
    ) -> Response {
        let session_id = params
            .get(endpoints::SESSION_ID_QUERY_PARAM)
            .map(String::as_str);

        match state.router.route(session_id, body).await {
            Ok(()) => (StatusCode::ACCEPTED, "Accepted").into_response(),
            Err(error) => {
                SessionLogger::log_delivery_rejected(
                    session_id,
                    &error.to_string(),
                    error.is_client_error(),
                );
                error.into_response()
            }
        }
    }
}
