// ABOUTME: Session value object pairing one SSE stream with its client-visible identifier
// ABOUTME: Holds the liveness flag, keep-alive task handle, and one-shot teardown marker
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::transport::StreamTransport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Opaque, unguessable session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random identifier
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One live SSE session
///
/// Only the connection lifecycle mutates a session: it marks it closed and
/// cancels its keep-alive task. Frames reach the client exclusively through
/// the session's [`StreamTransport`].
pub struct Session {
    id: SessionId,
    transport: Arc<StreamTransport>,
    created_at: DateTime<Utc>,
    open: AtomicBool,
    torn_down: AtomicBool,
    keep_alive: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    pub(crate) fn new(id: SessionId, transport: Arc<StreamTransport>) -> Self {
        Self {
            id,
            transport,
            created_at: Utc::now(),
            open: AtomicBool::new(true),
            torn_down: AtomicBool::new(false),
            keep_alive: Mutex::new(None),
        }
    }

    /// Session identifier
    #[must_use]
    pub const fn id(&self) -> &SessionId {
        &self.id
    }

    /// The session's transport
    #[must_use]
    pub const fn transport(&self) -> &Arc<StreamTransport> {
        &self.transport
    }

    /// When the stream was opened
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True from creation until teardown starts
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Whether teardown has been claimed
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    /// Claim teardown; returns `true` only for the first caller
    pub(crate) fn begin_teardown(&self) -> bool {
        !self.torn_down.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn mark_closed(&self) {
        self.open.store(false, Ordering::Release);
    }

    /// Store the keep-alive task, aborting it at once if teardown already ran
    pub(crate) async fn attach_keep_alive(&self, handle: JoinHandle<()>) {
        let mut slot = self.keep_alive.lock().await;
        if self.is_torn_down() {
            handle.abort();
        } else {
            *slot = Some(handle);
        }
    }

    /// Abort the keep-alive task; later calls are no-ops
    pub(crate) async fn cancel_keep_alive(&self) {
        let handle = self.keep_alive.lock().await.take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_uuids() {
        let id = SessionId::generate();
        assert_eq!(id.as_str().len(), 36);
        assert!(Uuid::parse_str(id.as_str()).is_ok());
        assert_ne!(id, SessionId::generate());
    }

    #[tokio::test]
    async fn test_teardown_claimed_once() {
        let (transport, _rx) = StreamTransport::new();
        let session = Session::new(SessionId::generate(), transport);
        assert!(session.is_open());
        assert!(session.begin_teardown());
        assert!(!session.begin_teardown());
    }

    #[tokio::test]
    async fn test_keep_alive_attached_after_teardown_is_aborted() {
        let (transport, _rx) = StreamTransport::new();
        let session = Session::new(SessionId::generate(), transport);
        assert!(session.begin_teardown());

        let handle = tokio::spawn(std::future::pending::<()>());
        session.attach_keep_alive(handle).await;
        assert!(session.keep_alive.lock().await.is_none());
    }
}
