// ABOUTME: Connection lifecycle manager: open, announce, keep-alive, and idempotent teardown
// ABOUTME: Owns process-wide shutdown of every live session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Connection lifecycle
//!
//! Per connection: `Opening` binds a fresh protocol engine, registers the
//! session and writes the endpoint announcement. `Active` emits keep-alive
//! comments. `Closing` runs once, whichever trigger fires first: the client
//! dropping the response, the engine ending the stream, an explicit close, or
//! server shutdown. After teardown the id is no longer routable.
//!
//! `open` is cancellation safe: a caller dropping the future at any await
//! point leaves no session registered and no engine bound. Once
//! [`ConnectionManager::shutdown`] starts, new streams are refused.

use super::frame::{endpoint_url, SseFrame};
use super::registry::SessionRegistry;
use super::router::InboundRouter;
use super::session::{Session, SessionId};
use super::transport::{Outbound, ProtocolEngineFactory, StreamTransport};
use crate::config::ServerConfig;
use crate::errors::TransportError;
use crate::logging::SessionLogger;
use futures_util::Stream;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

/// Why a session was torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client dropped the stream response
    ClientDisconnected,
    /// The output channel ended, usually because the engine closed it
    StreamEnded,
    /// `ConnectionManager::close` was called
    Explicit,
    /// Server shutdown
    Shutdown,
}

impl CloseReason {
    /// Stable label for logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientDisconnected => "client_disconnected",
            Self::StreamEnded => "stream_ended",
            Self::Explicit => "explicit",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings the lifecycle needs from server configuration
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    /// Path announced to clients for inbound messages
    pub messages_path: String,
    /// Interval between keep-alive comments
    pub keep_alive_interval: Duration,
}

impl LifecycleSettings {
    /// Extract lifecycle settings from server configuration
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            messages_path: config.messages_path.clone(),
            keep_alive_interval: config.keep_alive_interval(),
        }
    }
}

/// Drives every SSE connection from open to teardown
#[derive(Clone)]
pub struct ConnectionManager {
    registry: SessionRegistry,
    engines: Arc<dyn ProtocolEngineFactory>,
    settings: Arc<LifecycleSettings>,
    shutting_down: Arc<AtomicBool>,
}

impl ConnectionManager {
    /// Create a manager over the given registry and engine factory
    #[must_use]
    pub fn new(
        registry: SessionRegistry,
        engines: Arc<dyn ProtocolEngineFactory>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            registry,
            engines,
            settings: Arc::new(settings),
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether `shutdown` has started; no stream can be opened afterwards
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// The registry this manager registers sessions in
    #[must_use]
    pub const fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Router delivering inbound payloads to this manager's sessions
    #[must_use]
    pub fn inbound_router(&self) -> InboundRouter {
        InboundRouter::new(self.registry.clone())
    }

    /// Accept a new stream
    ///
    /// The engine is bound before the session is registered, and the
    /// session is registered before the endpoint announcement is written.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::EngineStartupFailed`] if the engine factory
    /// fails; nothing is registered and nothing is written in that case.
    /// Returns [`TransportError::StreamClosed`] once shutdown has started.
    pub async fn open(&self) -> Result<SessionStream, TransportError> {
        if self.is_shutting_down() {
            debug!("Refusing stream open during shutdown");
            return Err(TransportError::StreamClosed);
        }

        let (transport, frames) = StreamTransport::new();
        let unclaimed = UnclaimedTransport::new(Arc::clone(&transport));

        let outbound: Arc<dyn Outbound> = transport.clone();
        let engine = self
            .engines
            .on_connection_open(outbound)
            .await
            .map_err(|e| {
                error!(error = %e, "Protocol engine failed to start");
                TransportError::engine_startup_failed(e.message)
            })?;
        transport.connect(engine);

        // no await between registration and the stream taking ownership
        let session = self.registry.create(Arc::clone(&transport)).await;
        unclaimed.claim();
        let mut stream = SessionStream::new(self.clone(), Arc::clone(&session), frames);

        // shutdown sets its flag before draining, so a session registered
        // after the drain is caught here
        if self.is_shutting_down() {
            stream.schedule_teardown(CloseReason::Shutdown);
            return Err(TransportError::StreamClosed);
        }

        let announcement = SseFrame::endpoint(endpoint_url(
            &self.settings.messages_path,
            session.id().as_str(),
        ));
        if let Err(e) = transport.announce(announcement).await {
            stream.schedule_teardown(CloseReason::StreamEnded);
            return Err(e);
        }

        let keep_alive =
            spawn_keep_alive(Arc::downgrade(&session), self.settings.keep_alive_interval);
        session.attach_keep_alive(keep_alive).await;

        SessionLogger::log_session_opened(session.id().as_str(), self.registry.len().await);
        Ok(stream)
    }

    /// Tear down the session with this id; `false` if it is not live
    pub async fn close(&self, session_id: &str) -> bool {
        match self.registry.lookup(session_id).await {
            Some(session) => self.teardown(&session, CloseReason::Explicit).await,
            None => false,
        }
    }

    /// Tear a session down exactly once
    ///
    /// Marks the session closed, cancels keep-alive, removes it from the
    /// registry, releases the engine and closes the output channel. Returns
    /// `false` without doing anything if teardown already ran.
    pub async fn teardown(&self, session: &Arc<Session>, reason: CloseReason) -> bool {
        if !session.begin_teardown() {
            debug!(session_id = %session.id(), reason = %reason, "Session already torn down");
            return false;
        }

        session.mark_closed();
        session.cancel_keep_alive().await;
        self.registry.remove(session.id().as_str()).await;
        session.transport().shutdown().await;

        SessionLogger::log_session_closed(
            session.id().as_str(),
            reason.as_str(),
            self.registry.len().await,
        );
        true
    }

    /// Refuse new streams and tear down every live session
    ///
    /// Returns how many sessions were closed.
    pub async fn shutdown(&self) -> usize {
        if !self.shutting_down.swap(true, Ordering::SeqCst) {
            info!("Connection manager shutting down, new streams are refused");
        }
        let sessions = self.registry.drain().await;
        let mut closed = 0;
        for session in &sessions {
            if self.teardown(session, CloseReason::Shutdown).await {
                closed += 1;
            }
        }
        closed
    }
}

fn spawn_keep_alive(session: Weak<Session>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let Some(session) = session.upgrade() else {
                break;
            };
            if !session.is_open() {
                break;
            }
            if let Err(e) = session.transport().send(SseFrame::KeepAlive).await {
                warn!(session_id = %session.id(), error = %e, "Keep-alive write failed");
            }
        }
    })
}

/// Transport not yet owned by a registered session
///
/// Dropped without [`UnclaimedTransport::claim`], it shuts the transport
/// down so a cancelled open does not leave an engine and its delivery
/// worker behind.
struct UnclaimedTransport {
    transport: Option<Arc<StreamTransport>>,
}

impl UnclaimedTransport {
    const fn new(transport: Arc<StreamTransport>) -> Self {
        Self {
            transport: Some(transport),
        }
    }

    fn claim(mut self) {
        self.transport = None;
    }
}

impl Drop for UnclaimedTransport {
    fn drop(&mut self) {
        let Some(transport) = self.transport.take() else {
            return;
        };
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    transport.shutdown().await;
                    debug!("Released transport of an abandoned stream open");
                });
            }
            Err(_) => {
                warn!("No runtime available to release abandoned transport");
            }
        }
    }
}

/// Frames of one session, as consumed by the HTTP response body
///
/// Ending or dropping the stream tears the session down.
pub struct SessionStream {
    manager: ConnectionManager,
    session: Arc<Session>,
    frames: ReceiverStream<SseFrame>,
    finished: bool,
}

impl SessionStream {
    fn new(
        manager: ConnectionManager,
        session: Arc<Session>,
        frames: mpsc::Receiver<SseFrame>,
    ) -> Self {
        Self {
            manager,
            session,
            frames: ReceiverStream::new(frames),
            finished: false,
        }
    }

    /// Id of the session this stream belongs to
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        self.session.id()
    }

    /// The session this stream belongs to
    #[must_use]
    pub const fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn schedule_teardown(&mut self, reason: CloseReason) {
        if self.finished {
            return;
        }
        self.finished = true;
        if self.session.is_torn_down() {
            return;
        }

        let manager = self.manager.clone();
        let session = Arc::clone(&self.session);
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    manager.teardown(&session, reason).await;
                });
            }
            Err(_) => {
                warn!(session_id = %self.session.id(), "No runtime available to tear down session");
            }
        }
    }
}

impl Stream for SessionStream {
    type Item = SseFrame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = Pin::new(&mut self.frames).poll_next(cx);
        if matches!(polled, Poll::Ready(None)) {
            self.schedule_teardown(CloseReason::StreamEnded);
        }
        polled
    }
}

impl Drop for SessionStream {
    fn drop(&mut self) {
        self.schedule_teardown(CloseReason::ClientDisconnected);
    }
}
