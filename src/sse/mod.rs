// ABOUTME: Server-Sent Events (SSE) session transport for MCP protocol streaming
// ABOUTME: Pairs one push stream with an out-of-band POST channel per session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # SSE session transport
//!
//! A client opens a long-lived `GET` stream and receives an `endpoint` event
//! naming the URL it must `POST` its messages to. The `sessionId` query
//! parameter on that URL is the only thing correlating the two channels.
//!
//! - [`registry`]: the shared `id → Session` map
//! - [`transport`]: per-session outbound frames and sequential inbound delivery
//! - [`lifecycle`]: open, keep-alive and idempotent teardown
//! - [`router`]: routes inbound payloads to their session
//! - [`routes`]: axum handlers for both endpoints

/// Frame types written onto the event stream
pub mod frame;
/// Connection lifecycle: open, keep-alive, teardown, shutdown
pub mod lifecycle;
/// Shared session registry
pub mod registry;
/// Inbound message routing by session id
pub mod router;
/// HTTP route handlers for SSE endpoints
pub mod routes;
/// Session value object and identifier
pub mod session;
/// Outbound/inbound transport halves and engine contract
pub mod transport;

pub use frame::SseFrame;
pub use lifecycle::{CloseReason, ConnectionManager, LifecycleSettings, SessionStream};
pub use registry::SessionRegistry;
pub use router::InboundRouter;
pub use routes::SseRoutes;
pub use session::{Session, SessionId};
pub use transport::{
    Inbound, Outbound, ProtocolEngine, ProtocolEngineFactory, StreamTransport, Transport,
};
