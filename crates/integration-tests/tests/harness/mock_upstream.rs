//! Mock Responses-API backend for integration tests
//!
//! Serves `POST /openai/responses` with canned buffered or streamed output,
//! captures every request body, and can be told to fail with 500s.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

/// Mock upstream that returns predictable Responses-API payloads
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    completion_count: AtomicU32,
    /// Number of requests to fail with 500 before succeeding (0 = never fail)
    fail_count: AtomicU32,
    captured: Mutex<Vec<serde_json::Value>>,
    response_text: String,
    stream_pieces: Vec<String>,
}

impl MockUpstream {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(0, "Hello from mock upstream", &["Hello", " world"]).await
    }

    /// Start a mock server that fails the first `n` requests with 500
    pub async fn start_failing(n: u32) -> anyhow::Result<Self> {
        Self::start_inner(n, "Hello from mock upstream", &["Hello", " world"]).await
    }

    /// Start a mock server with custom buffered response content
    pub async fn start_with_response(content: &str) -> anyhow::Result<Self> {
        Self::start_inner(0, content, &["Hello", " world"]).await
    }

    /// Start a mock server that streams the given text deltas, one chunk each
    pub async fn start_streaming(pieces: &[&str]) -> anyhow::Result<Self> {
        Self::start_inner(0, "Hello from mock upstream", pieces).await
    }

    async fn start_inner(fail_count: u32, content: &str, pieces: &[&str]) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            completion_count: AtomicU32::new(0),
            fail_count: AtomicU32::new(fail_count),
            captured: Mutex::new(Vec::new()),
            response_text: content.to_owned(),
            stream_pieces: pieces.iter().map(|&p| p.to_owned()).collect(),
        });

        let app = Router::new()
            .route("/openai/responses", routing::post(handle_responses))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as the upstream endpoint
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of completion requests received
    pub fn completion_count(&self) -> u32 {
        self.state.completion_count.load(Ordering::Relaxed)
    }

    /// Make the next `n` requests fail with 500
    pub fn set_failing(&self, n: u32) {
        self.state.fail_count.store(n, Ordering::Relaxed);
    }

    /// The most recently captured request body
    pub fn last_request(&self) -> Option<serde_json::Value> {
        self.state.captured.lock().unwrap().last().cloned()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_responses(
    State(state): State<Arc<MockState>>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.completion_count.fetch_add(1, Ordering::Relaxed);
    state.captured.lock().unwrap().push(body.clone());

    if state.fail_count.load(Ordering::Relaxed) > 0 {
        state.fail_count.fetch_sub(1, Ordering::Relaxed);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": { "message": "mock upstream intentional failure" }
            })),
        )
            .into_response();
    }

    let model = body["model"].as_str().unwrap_or("mock-model").to_owned();

    if body["stream"].as_bool().unwrap_or(false) {
        return build_stream_body(&state, &model).into_response();
    }

    Json(serde_json::json!({
        "id": "resp-test-1",
        "object": "response",
        "created": 1_700_000_000u64,
        "model": model,
        "output": [{ "type": "text", "text": state.response_text }],
        "usage": { "input_tokens": 10, "output_tokens": 5, "total_tokens": 15 }
    }))
    .into_response()
}

/// Build an SSE body: one text chunk per piece, a completed reasoning item,
/// then the done marker
fn build_stream_body(state: &MockState, model: &str) -> impl IntoResponse {
    let mut body = String::new();

    for piece in &state.stream_pieces {
        let chunk = serde_json::json!({
            "id": "resp-test-stream",
            "object": "response.chunk",
            "created": 1_700_000_000u64,
            "model": model,
            "output": [{ "type": "text", "delta": piece }]
        });
        body.push_str(&format!("data: {chunk}\n\n"));
    }

    let terminator = serde_json::json!({
        "id": "resp-test-stream",
        "object": "response.chunk",
        "created": 1_700_000_000u64,
        "model": model,
        "output": [{ "type": "reasoning", "status": "completed" }]
    });
    body.push_str(&format!("data: {terminator}\n\n"));
    body.push_str("data: [DONE]\n\n");

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/event-stream")],
        body,
    )
}
