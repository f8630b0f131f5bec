// ABOUTME: Integration tests for the connection lifecycle manager
// ABOUTME: Covers announcement ordering, keep-alive, idempotent teardown, and shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use bytes::Bytes;
use common::{
    test_manager, test_settings, wait_for_empty_registry, FailingEngineFactory,
    RecordingEngineFactory,
};
use futures_util::{future::join_all, FutureExt, StreamExt};
use mcp_sse_server::errors::TransportError;
use mcp_sse_server::sse::{
    CloseReason, ConnectionManager, Outbound, SessionRegistry, SessionStream, SseFrame,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::coop::consume_budget;

async fn next_frame(stream: &mut SessionStream) -> Option<SseFrame> {
    tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("timed out waiting for a frame")
}

/// Poll until every engine the factory handed out has been released
async fn wait_for_released_engines(factory: &Arc<RecordingEngineFactory>, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let all_closed = (0..factory.connection_count()).all(|i| factory.connection(i).is_closed());
        if all_closed || tokio::time::Instant::now() >= deadline {
            return all_closed;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_open_announces_endpoint_first() {
    let factory = RecordingEngineFactory::new();
    let manager = test_manager(factory.clone());

    let mut stream = manager.open().await.unwrap();
    let id = stream.session_id().clone();

    assert_eq!(
        next_frame(&mut stream).await,
        Some(SseFrame::endpoint(format!("/mcp/messages?sessionId={id}")))
    );
    assert!(manager.registry().lookup(id.as_str()).await.is_some());
    assert_eq!(factory.connection_count(), 1);
}

#[tokio::test]
async fn test_engine_frames_follow_announcement() {
    let factory = RecordingEngineFactory::new();
    let manager = test_manager(factory.clone());
    let mut stream = manager.open().await.unwrap();
    let id = stream.session_id().as_str().to_owned();

    manager
        .inbound_router()
        .route(Some(&id), Bytes::from_static(b"reply:hello"))
        .await
        .unwrap();

    assert!(matches!(next_frame(&mut stream).await, Some(SseFrame::Endpoint(_))));
    assert_eq!(next_frame(&mut stream).await, Some(SseFrame::message("hello")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opens_yield_distinct_live_ids() {
    let manager = test_manager(RecordingEngineFactory::new());

    let streams: Vec<_> = join_all((0..50).map(|_| {
        let manager = manager.clone();
        async move { manager.open().await.unwrap() }
    }))
    .await;

    let ids: HashSet<_> = streams.iter().map(|s| s.session_id().clone()).collect();
    assert_eq!(ids.len(), 50);
    assert_eq!(manager.registry().len().await, 50);

    let registered: HashSet<_> = manager.registry().session_ids().await.into_iter().collect();
    assert_eq!(registered, ids);
}

#[tokio::test]
async fn test_engine_startup_failure_registers_nothing() {
    let manager = test_manager(std::sync::Arc::new(FailingEngineFactory));

    let result = manager.open().await;
    assert!(matches!(
        result,
        Err(TransportError::EngineStartupFailed { .. })
    ));
    assert!(manager.registry().is_empty().await);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let factory = RecordingEngineFactory::new();
    let manager = test_manager(factory.clone());
    let mut stream = manager.open().await.unwrap();
    let id = stream.session_id().as_str().to_owned();
    let session = stream.session().clone();

    assert!(manager.close(&id).await);
    assert!(!manager.close(&id).await);
    assert!(!manager.teardown(&session, CloseReason::StreamEnded).await);

    assert!(manager.registry().is_empty().await);
    assert!(!session.is_open());
    assert!(factory.connection(0).is_closed());

    // buffered announcement, then end of stream
    assert!(matches!(next_frame(&mut stream).await, Some(SseFrame::Endpoint(_))));
    assert_eq!(next_frame(&mut stream).await, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_teardown_triggers_run_once() {
    let manager = test_manager(RecordingEngineFactory::new());
    let stream = manager.open().await.unwrap();
    let session = stream.session().clone();

    let first = {
        let manager = manager.clone();
        let session = session.clone();
        tokio::spawn(async move { manager.teardown(&session, CloseReason::StreamEnded).await })
    };
    let second = {
        let manager = manager.clone();
        let session = session.clone();
        tokio::spawn(async move {
            manager
                .teardown(&session, CloseReason::ClientDisconnected)
                .await
        })
    };

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    assert_eq!(outcomes.iter().filter(|torn_down| **torn_down).count(), 1);
    assert!(manager.registry().is_empty().await);
}

#[tokio::test]
async fn test_dropping_stream_tears_session_down() {
    let factory = RecordingEngineFactory::new();
    let manager = test_manager(factory.clone());
    let stream = manager.open().await.unwrap();
    let id = stream.session_id().as_str().to_owned();

    drop(stream);

    assert!(wait_for_empty_registry(manager.registry(), Duration::from_secs(2)).await);
    assert!(factory.connection(0).is_closed());
    assert!(matches!(
        manager
            .inbound_router()
            .route(Some(&id), Bytes::from_static(b"late"))
            .await,
        Err(TransportError::SessionNotFound { .. })
    ));
}

#[tokio::test]
async fn test_engine_closing_outbound_ends_stream_and_tears_down() {
    let factory = RecordingEngineFactory::new();
    let manager = test_manager(factory.clone());
    let mut stream = manager.open().await.unwrap();
    let id = stream.session_id().as_str().to_owned();

    manager
        .inbound_router()
        .route(Some(&id), Bytes::from_static(b"close"))
        .await
        .unwrap();

    assert!(matches!(next_frame(&mut stream).await, Some(SseFrame::Endpoint(_))));
    assert_eq!(next_frame(&mut stream).await, None);
    assert!(wait_for_empty_registry(manager.registry(), Duration::from_secs(2)).await);
    assert!(factory.connection(0).is_closed());
}

#[tokio::test]
async fn test_outbound_writes_fail_after_teardown() {
    let factory = RecordingEngineFactory::new();
    let manager = test_manager(factory.clone());
    let stream = manager.open().await.unwrap();
    let id = stream.session_id().as_str().to_owned();

    assert!(manager.close(&id).await);
    let outbound = factory.connection(0).outbound();
    assert_eq!(
        outbound.send(SseFrame::message("too late")).await,
        Err(TransportError::StreamClosed)
    );
}

#[tokio::test]
async fn test_keep_alive_only_while_open() {
    let factory = RecordingEngineFactory::new();
    let manager = ConnectionManager::new(
        SessionRegistry::new(),
        factory,
        test_settings(Duration::from_millis(50)),
    );
    let mut stream = manager.open().await.unwrap();
    let id = stream.session_id().as_str().to_owned();

    assert!(matches!(next_frame(&mut stream).await, Some(SseFrame::Endpoint(_))));
    assert_eq!(next_frame(&mut stream).await, Some(SseFrame::KeepAlive));
    assert_eq!(next_frame(&mut stream).await, Some(SseFrame::KeepAlive));

    assert!(manager.close(&id).await);

    // whatever was queued before teardown drains, then the stream ends for good
    while let Some(frame) = next_frame(&mut stream).await {
        assert_eq!(frame, SseFrame::KeepAlive);
    }

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(next_frame(&mut stream).await, None);
}

#[tokio::test]
async fn test_shutdown_closes_every_session() {
    let factory = RecordingEngineFactory::new();
    let manager = test_manager(factory.clone());

    let mut streams = Vec::new();
    for _ in 0..3 {
        streams.push(manager.open().await.unwrap());
    }

    assert_eq!(manager.shutdown().await, 3);
    assert!(manager.registry().is_empty().await);
    for index in 0..3 {
        assert!(factory.connection(index).is_closed());
    }
    for stream in &streams {
        assert!(!stream.session().is_open());
    }
    assert_eq!(manager.shutdown().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_abandoned_open_leaves_nothing_behind() {
    let factory = RecordingEngineFactory::new();
    let manager = test_manager(factory.clone());

    // with the task budget spent, the next tokio lock acquisition yields,
    // so each round drops `open` at a later await point
    for spent in 0..128 {
        let manager = manager.clone();
        tokio::spawn(async move {
            for _ in 0..spent {
                consume_budget().await;
            }
            drop(manager.open().now_or_never());
        })
        .await
        .unwrap();
    }

    assert!(factory.connection_count() > 0);
    assert!(wait_for_empty_registry(manager.registry(), Duration::from_secs(2)).await);
    assert!(wait_for_released_engines(&factory, Duration::from_secs(2)).await);
}

#[tokio::test]
async fn test_open_after_shutdown_is_refused() {
    let factory = RecordingEngineFactory::new();
    let manager = test_manager(factory.clone());
    let stream = manager.open().await.unwrap();

    assert_eq!(manager.shutdown().await, 1);
    assert!(manager.is_shutting_down());
    assert!(stream.session().is_torn_down());

    assert!(matches!(
        manager.open().await,
        Err(TransportError::StreamClosed)
    ));
    assert!(manager.registry().is_empty().await);
    assert_eq!(factory.connection_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shutdown_racing_opens_abandons_no_session() {
    let factory = RecordingEngineFactory::new();
    let manager = test_manager(factory.clone());

    let opens: Vec<_> = (0..32)
        .map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.open().await })
        })
        .collect();
    tokio::task::yield_now().await;
    let closed = manager.shutdown().await;

    let mut streams = Vec::new();
    for open in opens {
        match open.await.unwrap() {
            Ok(stream) => streams.push(stream),
            Err(error) => assert_eq!(error, TransportError::StreamClosed),
        }
    }

    // a stream handed out before shutdown was drained and torn down by it
    assert!(streams.len() <= closed);
    assert!(streams.iter().all(|stream| stream.session().is_torn_down()));
    assert!(wait_for_empty_registry(manager.registry(), Duration::from_secs(2)).await);
    assert!(wait_for_released_engines(&factory, Duration::from_secs(2)).await);
}
