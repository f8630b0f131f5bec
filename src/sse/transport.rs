// ABOUTME: Stream transport owning one session's outbound frames and inbound delivery queue
// ABOUTME: Defines the Outbound/Inbound halves and the protocol engine contract
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Transport halves of one SSE session
//!
//! The push stream and the POST channel are asymmetric, so they are modelled
//! as two traits: [`Outbound`] is what a protocol engine writes to, and
//! [`Inbound`] is what the router delivers to. [`StreamTransport`] implements
//! both and is the only writer of its session's output channel.

use super::frame::SseFrame;
use crate::constants::{limits, timeouts};
use crate::errors::{AppResult, TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, warn};

/// Server → client half of a session
#[async_trait]
pub trait Outbound: Send + Sync {
    /// Queue a frame onto the event stream
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::StreamClosed`] if the stream is not writable
    /// or the client stopped reading
    async fn send(&self, frame: SseFrame) -> Result<(), TransportError>;

    /// End the event stream; the session is then torn down by its lifecycle
    async fn close(&self);
}

/// Client → server half of a session
#[async_trait]
pub trait Inbound: Send + Sync {
    /// Hand a payload to the bound protocol engine and wait for it to be handled
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidMessage`] if the engine rejects the
    /// payload as malformed, [`TransportError::DeliveryFailed`] if handling
    /// fails, or [`TransportError::StreamClosed`] after teardown
    async fn deliver_inbound(&self, payload: Bytes) -> Result<(), TransportError>;
}

/// Both halves of a session transport
pub trait Transport: Outbound + Inbound {}

impl<T: Outbound + Inbound + ?Sized> Transport for T {}

/// Per-connection protocol engine bound to one transport
#[async_trait]
pub trait ProtocolEngine: Send + Sync {
    /// Handle one inbound payload
    ///
    /// # Errors
    ///
    /// Returns an error if the payload could not be handled
    async fn handle_inbound(&self, payload: Bytes) -> AppResult<()>;

    /// Release engine state; called once at session teardown
    async fn close(&self);
}

/// Creates one protocol engine per accepted connection
#[async_trait]
pub trait ProtocolEngineFactory: Send + Sync {
    /// Bind a fresh engine to a newly opened transport
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot start; no session is registered
    async fn on_connection_open(
        &self,
        outbound: Arc<dyn Outbound>,
    ) -> AppResult<Arc<dyn ProtocolEngine>>;
}

/// Writability of the output channel
enum OutboundState {
    /// Created, endpoint not yet announced; only `announce` may write
    Pending(mpsc::Sender<SseFrame>),
    /// Announced; any frame may be written
    Open(mpsc::Sender<SseFrame>),
    /// Closed by the engine or by teardown
    Closed,
}

type Delivery = (Bytes, oneshot::Sender<Result<(), TransportError>>);

/// Transport for one SSE session
pub struct StreamTransport {
    outbound: RwLock<OutboundState>,
    send_timeout: Duration,
    inbound: Mutex<Option<mpsc::UnboundedSender<Delivery>>>,
    engine: Mutex<Option<Arc<dyn ProtocolEngine>>>,
    pending: Arc<AtomicUsize>,
}

impl StreamTransport {
    /// Create a transport and the receiving end of its output channel
    #[must_use]
    pub fn new() -> (Arc<Self>, mpsc::Receiver<SseFrame>) {
        Self::with_buffer(
            limits::SSE_OUTBOUND_BUFFER,
            Duration::from_millis(timeouts::SSE_SEND_TIMEOUT_MS),
        )
    }

    /// Create a transport buffering at most `capacity` frames
    ///
    /// A write into a full buffer waits up to `send_timeout` before failing
    /// with [`TransportError::StreamClosed`].
    #[must_use]
    pub fn with_buffer(
        capacity: usize,
        send_timeout: Duration,
    ) -> (Arc<Self>, mpsc::Receiver<SseFrame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let transport = Arc::new(Self {
            outbound: RwLock::new(OutboundState::Pending(tx)),
            send_timeout,
            inbound: Mutex::new(None),
            engine: Mutex::new(None),
            pending: Arc::new(AtomicUsize::new(0)),
        });
        (transport, rx)
    }

    /// Write the endpoint announcement and open the stream for other frames
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::StreamClosed`] if the stream was already
    /// announced, closed, or its receiver is gone
    pub async fn announce(&self, frame: SseFrame) -> Result<(), TransportError> {
        let mut state = self.outbound.write().await;
        match std::mem::replace(&mut *state, OutboundState::Closed) {
            OutboundState::Pending(tx) => {
                if tx.try_send(frame).is_err() {
                    return Err(TransportError::StreamClosed);
                }
                *state = OutboundState::Open(tx);
                Ok(())
            }
            other => {
                *state = other;
                Err(TransportError::StreamClosed)
            }
        }
    }

    /// Bind the engine and start the sequential delivery worker
    ///
    /// Payloads are handled one at a time in the order they were enqueued.
    /// Binding never suspends, so once this returns [`StreamTransport::shutdown`]
    /// is guaranteed to release the engine.
    pub fn connect(&self, engine: Arc<dyn ProtocolEngine>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Delivery>();
        let worker_engine = Arc::clone(&engine);
        let pending = Arc::clone(&self.pending);
        *self.engine.lock() = Some(engine);
        *self.inbound.lock() = Some(tx);

        tokio::spawn(async move {
            while let Some((payload, reply)) = rx.recv().await {
                let outcome = worker_engine
                    .handle_inbound(payload)
                    .await
                    .map_err(|e| TransportError::from_engine_error(&e));
                pending.fetch_sub(1, Ordering::AcqRel);
                if reply.send(outcome).is_err() {
                    debug!("Inbound caller went away before delivery completed");
                }
            }
            debug!("Inbound delivery worker stopped");
        });
    }

    /// Payloads accepted for delivery and not yet handled by the engine
    #[must_use]
    pub fn pending_deliveries(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Whether frames other than the announcement can currently be written
    pub async fn is_open(&self) -> bool {
        let state = self.outbound.read().await;
        matches!(*state, OutboundState::Open(_))
    }

    /// Stop accepting inbound payloads, release the engine, close the output
    ///
    /// Once this returns no frame can be written to the stream.
    pub async fn shutdown(&self) {
        self.inbound.lock().take();

        let engine = self.engine.lock().take();
        if let Some(engine) = engine {
            engine.close().await;
        }

        *self.outbound.write().await = OutboundState::Closed;
    }
}

#[async_trait]
impl Outbound for StreamTransport {
    async fn send(&self, frame: SseFrame) -> Result<(), TransportError> {
        // held across the wait so teardown cannot complete under a pending write
        let state = self.outbound.read().await;
        let OutboundState::Open(tx) = &*state else {
            return Err(TransportError::StreamClosed);
        };
        match tx.send_timeout(frame, self.send_timeout).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => {
                warn!(
                    timeout_ms = self.send_timeout.as_millis(),
                    "Output buffer full, client is not reading"
                );
                Err(TransportError::StreamClosed)
            }
            Err(SendTimeoutError::Closed(_)) => Err(TransportError::StreamClosed),
        }
    }

    async fn close(&self) {
        *self.outbound.write().await = OutboundState::Closed;
    }
}

#[async_trait]
impl Inbound for StreamTransport {
    async fn deliver_inbound(&self, payload: Bytes) -> Result<(), TransportError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        {
            let inbound = self.inbound.lock();
            let queue = inbound.as_ref().ok_or(TransportError::StreamClosed)?;
            self.pending.fetch_add(1, Ordering::AcqRel);
            if queue.send((payload, reply_tx)).is_err() {
                self.pending.fetch_sub(1, Ordering::AcqRel);
                return Err(TransportError::StreamClosed);
            }
        }

        reply_rx.await.unwrap_or_else(|_| {
            Err(TransportError::delivery_failed(
                "delivery worker stopped before handling the message",
            ))
        })
    }
}
