// ABOUTME: Shared test utilities and recording protocol engines for integration tests
// ABOUTME: Provides engine factories that record payloads, fail on demand, or refuse to start
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `mcp_sse_server`

use async_trait::async_trait;
use bytes::Bytes;
use mcp_sse_server::{
    errors::{AppError, AppResult},
    sse::{
        ConnectionManager, LifecycleSettings, Outbound, ProtocolEngine, ProtocolEngineFactory,
        SessionRegistry, SseFrame,
    },
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::sync::Semaphore;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// What one connection's engine observed
pub struct ConnectionRecord {
    received: Mutex<Vec<String>>,
    closed: AtomicBool,
    outbound: Arc<dyn Outbound>,
}

impl ConnectionRecord {
    /// Payloads handled so far, in handling order
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    /// Whether the engine was released
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// The transport handed to the engine
    pub fn outbound(&self) -> Arc<dyn Outbound> {
        Arc::clone(&self.outbound)
    }
}

/// Engine recording every payload
///
/// Special payloads: `fail` is an engine failure, `malformed` is rejected as
/// bad input, `close` ends the stream, `reply:<text>` pushes `<text>` back as
/// a message frame.
struct RecordingEngine {
    record: Arc<ConnectionRecord>,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
}

#[async_trait]
impl ProtocolEngine for RecordingEngine {
    async fn handle_inbound(&self, payload: Bytes) -> AppResult<()> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let text = String::from_utf8_lossy(&payload).into_owned();
        if text == "fail" {
            return Err(AppError::internal("engine failed on payload"));
        }
        if text == "malformed" {
            return Err(AppError::invalid_input("engine rejected payload"));
        }
        self.record.received.lock().unwrap().push(text.clone());

        if text == "close" {
            self.record.outbound.close().await;
        } else if let Some(reply) = text.strip_prefix("reply:") {
            self.record
                .outbound
                .send(SseFrame::message(reply))
                .await
                .map_err(AppError::from)?;
        }
        Ok(())
    }

    async fn close(&self) {
        self.record.closed.store(true, Ordering::SeqCst);
    }
}

/// Factory handing out one recording engine per connection
#[derive(Default)]
pub struct RecordingEngineFactory {
    connections: Mutex<Vec<Arc<ConnectionRecord>>>,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingEngineFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Engines sleep `delay` before handling each payload
    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            connections: Mutex::new(Vec::new()),
            delay: Some(delay),
            gate: None,
        })
    }

    /// Engines handle a payload only after taking a permit from the returned gate
    pub fn gated() -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let factory = Arc::new(Self {
            connections: Mutex::new(Vec::new()),
            delay: None,
            gate: Some(Arc::clone(&gate)),
        });
        (factory, gate)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    /// Record of the `index`-th opened connection
    pub fn connection(&self, index: usize) -> Arc<ConnectionRecord> {
        Arc::clone(&self.connections.lock().unwrap()[index])
    }
}

#[async_trait]
impl ProtocolEngineFactory for RecordingEngineFactory {
    async fn on_connection_open(
        &self,
        outbound: Arc<dyn Outbound>,
    ) -> AppResult<Arc<dyn ProtocolEngine>> {
        let record = Arc::new(ConnectionRecord {
            received: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            outbound,
        });
        self.connections.lock().unwrap().push(Arc::clone(&record));
        Ok(Arc::new(RecordingEngine {
            record,
            delay: self.delay,
            gate: self.gate.clone(),
        }))
    }
}

/// Factory whose engines never start
pub struct FailingEngineFactory;

#[async_trait]
impl ProtocolEngineFactory for FailingEngineFactory {
    async fn on_connection_open(
        &self,
        _outbound: Arc<dyn Outbound>,
    ) -> AppResult<Arc<dyn ProtocolEngine>> {
        Err(AppError::internal("engine unavailable"))
    }
}

/// Lifecycle settings with the default messages path and a custom keep-alive
pub fn test_settings(keep_alive_interval: Duration) -> LifecycleSettings {
    LifecycleSettings {
        messages_path: "/mcp/messages".to_owned(),
        keep_alive_interval,
    }
}

/// Manager over a fresh registry with a keep-alive too slow to interfere
pub fn test_manager(engines: Arc<dyn ProtocolEngineFactory>) -> ConnectionManager {
    init_test_logging();
    ConnectionManager::new(
        SessionRegistry::new(),
        engines,
        test_settings(Duration::from_secs(3600)),
    )
}

/// Poll until the registry is empty or `timeout` elapses
pub async fn wait_for_empty_registry(registry: &SessionRegistry, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if registry.is_empty().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    registry.is_empty().await
}
