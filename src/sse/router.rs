// ABOUTME: Inbound message router delivering POSTed payloads to the owning session
// ABOUTME: Distinguishes missing and unknown session ids from delivery failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::registry::SessionRegistry;
use super::transport::Inbound;
use crate::errors::TransportError;
use bytes::Bytes;

/// Routes inbound payloads by session id
///
/// Routing never removes a session, even when delivery fails.
#[derive(Clone)]
pub struct InboundRouter {
    registry: SessionRegistry,
}

impl InboundRouter {
    /// Create a router over the registry
    #[must_use]
    pub const fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    /// Deliver `payload` to the session named by `session_id`
    ///
    /// # Errors
    ///
    /// - [`TransportError::MissingSessionId`] if the id is absent or empty
    /// - [`TransportError::SessionNotFound`] if no open session has that id
    /// - [`TransportError::InvalidMessage`] if the engine rejected the payload as malformed
    /// - [`TransportError::DeliveryFailed`] if the engine failed handling it
    /// - [`TransportError::StreamClosed`] if the session closed mid-delivery
    pub async fn route(
        &self,
        session_id: Option<&str>,
        payload: Bytes,
    ) -> Result<(), TransportError> {
        let session_id = session_id
            .filter(|id| !id.is_empty())
            .ok_or(TransportError::MissingSessionId)?;

        let session = self
            .registry
            .lookup(session_id)
            .await
            .filter(|session| session.is_open())
            .ok_or_else(|| TransportError::session_not_found(session_id))?;

        session.transport().deliver_inbound(payload).await
    }
}
