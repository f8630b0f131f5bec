// ABOUTME: SSE frame vocabulary: endpoint announcement, protocol message, keep-alive comment
// ABOUTME: Converts frames into axum SSE events and builds the announced endpoint URL
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::{endpoints, sse_events};
use axum::response::sse::Event;

/// One unit of data pushed over a session's event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// `event: endpoint` carrying the URL inbound messages must be POSTed to
    Endpoint(String),
    /// `event: message` carrying one serialized protocol message
    Message(String),
    /// `: keepalive` comment line
    KeepAlive,
}

impl SseFrame {
    /// Endpoint announcement for the given URL
    #[must_use]
    pub fn endpoint(url: impl Into<String>) -> Self {
        Self::Endpoint(url.into())
    }

    /// Protocol message frame
    #[must_use]
    pub fn message(data: impl Into<String>) -> Self {
        Self::Message(data.into())
    }

    /// SSE event name, `None` for comment frames
    #[must_use]
    pub const fn event_name(&self) -> Option<&'static str> {
        match self {
            Self::Endpoint(_) => Some(sse_events::ENDPOINT),
            Self::Message(_) => Some(sse_events::MESSAGE),
            Self::KeepAlive => None,
        }
    }

    /// Data field, `None` for comment frames
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        match self {
            Self::Endpoint(data) | Self::Message(data) => Some(data),
            Self::KeepAlive => None,
        }
    }

    /// Convert into an axum SSE event
    #[must_use]
    pub fn into_event(self) -> Event {
        match self {
            Self::Endpoint(url) => Event::default().event(sse_events::ENDPOINT).data(url),
            Self::Message(data) => Event::default().event(sse_events::MESSAGE).data(data),
            Self::KeepAlive => Event::default().comment(sse_events::KEEPALIVE_COMMENT),
        }
    }
}

/// Build `<messages_path>?sessionId=<id>`, preserving any existing query
#[must_use]
pub fn endpoint_url(messages_path: &str, session_id: &str) -> String {
    let separator = if messages_path.contains('?') { '&' } else { '?' };
    format!(
        "{messages_path}{separator}{}={}",
        endpoints::SESSION_ID_QUERY_PARAM,
        urlencoding::encode(session_id)
    )
}
