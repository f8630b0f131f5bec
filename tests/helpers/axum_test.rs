// ABOUTME: Axum HTTP testing utilities for integration tests
// ABOUTME: Drives routers in-process and reads SSE frames from streaming bodies

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use futures_util::StreamExt;
use std::time::Duration;
use tower::ServiceExt;

/// Helper to build and execute HTTP requests against Axum routers
pub struct AxumTestRequest {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl AxumTestRequest {
    /// Create a new GET request
    pub fn get(uri: &str) -> Self {
        Self {
            method: Method::GET,
            uri: uri.to_owned(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Create a new POST request
    pub fn post(uri: &str) -> Self {
        Self {
            method: Method::POST,
            uri: uri.to_owned(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add a header to the request
    #[allow(dead_code)]
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_owned(), value.to_owned()));
        self
    }

    /// Add a raw body to the request
    pub fn body(mut self, body: &str) -> Self {
        self.body = Some(body.to_owned());
        self
    }

    /// Add a JSON body to the request
    #[allow(dead_code)]
    pub fn json(mut self, data: &serde_json::Value) -> Self {
        self.body = Some(serde_json::to_string(data).expect("Failed to serialize JSON"));
        self.headers.push((
            header::CONTENT_TYPE.as_str().to_owned(),
            "application/json".to_owned(),
        ));
        self
    }

    fn build(self) -> Request<Body> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        for (key, value) in self.headers {
            builder = builder.header(key, value);
        }
        builder
            .body(Body::from(self.body.unwrap_or_default()))
            .expect("Failed to build request")
    }

    /// Execute the request and eagerly read the body
    pub async fn send(self, app: Router) -> AxumTestResponse {
        let response = app
            .oneshot(self.build())
            .await
            .expect("Failed to execute request");
        AxumTestResponse::from_response(response).await
    }

    /// Execute a stream-open request, keeping the body as a live event stream
    #[allow(dead_code)]
    pub async fn open_sse(self, app: Router) -> SseTestStream {
        let response = app
            .oneshot(self.build())
            .await
            .expect("Failed to execute request");
        SseTestStream {
            status: response.status(),
            headers: response.headers().clone(),
            body: response.into_body().into_data_stream(),
            buffer: String::new(),
        }
    }
}

/// Wrapper around Axum HTTP response for testing
pub struct AxumTestResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl AxumTestResponse {
    async fn from_response(response: axum::http::Response<Body>) -> Self {
        use axum::body::to_bytes;
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body")
            .to_vec();
        Self { status, body }
    }

    /// Get the response status code as u16 for easy assertion
    pub const fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// Get the response body as a JSON value
    #[allow(dead_code)]
    pub fn json<T: serde::de::DeserializeOwned>(self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to deserialize JSON response")
    }

    /// Get the response body as a string
    #[allow(dead_code)]
    pub fn text(self) -> String {
        String::from_utf8(self.body).expect("Failed to decode response as UTF-8")
    }
}

/// One parsed SSE event block
#[allow(dead_code)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseTestEvent {
    pub event: Option<String>,
    pub data: Option<String>,
    pub comment: Option<String>,
}

/// Live SSE response body
pub struct SseTestStream {
    pub status: StatusCode,
    pub headers: HeaderMap,
    body: axum::body::BodyDataStream,
    buffer: String,
}

impl SseTestStream {
    /// Wait up to `timeout` for the next complete event block
    pub async fn next_event(&mut self, timeout: Duration) -> Option<SseTestEvent> {
        tokio::time::timeout(timeout, async {
            loop {
                if let Some(end) = self.buffer.find("\n\n") {
                    let block: String = self.buffer.drain(..end + 2).collect();
                    return Some(parse_block(&block));
                }
                let chunk = self.body.next().await?.ok()?;
                self.buffer.push_str(&String::from_utf8_lossy(&chunk));
            }
        })
        .await
        .ok()
        .flatten()
    }

    /// Wait for the next `event: message` frame, skipping keep-alives
    #[allow(dead_code)]
    pub async fn next_message(&mut self, timeout: Duration) -> Option<String> {
        loop {
            let event = self.next_event(timeout).await?;
            if event.event.as_deref() == Some("message") {
                return event.data;
            }
        }
    }
}

fn parse_block(block: &str) -> SseTestEvent {
    let mut event = SseTestEvent::default();
    for line in block.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            event.event = Some(name.trim().to_owned());
        } else if let Some(data) = line.strip_prefix("data:") {
            let data = data.strip_prefix(' ').unwrap_or(data);
            event.data = Some(match event.data.take() {
                Some(existing) => format!("{existing}\n{data}"),
                None => data.to_owned(),
            });
        } else if let Some(comment) = line.strip_prefix(':') {
            event.comment = Some(comment.trim().to_owned());
        }
    }
    event
}
