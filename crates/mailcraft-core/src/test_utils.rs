//! Test utilities for mailcraft-core
//!
//! This module provides a mock Azure Document Intelligence server that speaks
//! just enough of the REST protocol (analyze, poll, info) for backend tests
//! and local development.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::sync::oneshot;

use crate::analysis::sample_invoice_result;

/// API key the mock server accepts
pub const MOCK_API_KEY: &str = "test-key";

/// Documents containing this marker are accepted but their analysis fails
pub const FAIL_MARKER: &[u8] = b"%FAIL";

/// Documents containing this marker report `running` for [`SLOW_POLLS`]
/// status checks before succeeding
pub const SLOW_MARKER: &[u8] = b"%SLOW";

/// Documents containing this marker never leave the `running` state
pub const STUCK_MARKER: &[u8] = b"%STUCK";

/// Status checks a slow analysis spends in `running`
pub const SLOW_POLLS: u32 = 3;

#[derive(Clone)]
struct MockState {
    addr: SocketAddr,
    slow_polls: Arc<AtomicU32>,
}

/// Mock Document Intelligence server for testing and development
pub struct MockDocumentIntelligence {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDocumentIntelligence {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new()
            .route("/formrecognizer/info", get(handle_info))
            .route("/formrecognizer/documentModels/:model", post(handle_analyze))
            .route(
                "/formrecognizer/documentModels/:model/analyzeResults/:id",
                get(handle_result),
            )
            .with_state(MockState {
                addr,
                slow_polls: Arc::new(AtomicU32::new(0)),
            });

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDocumentIntelligence {
    fn drop(&mut self) {
        self.stop();
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("ocp-apim-subscription-key")
        .and_then(|v| v.to_str().ok())
        == Some(MOCK_API_KEY)
}

/// Account info endpoint (health check)
async fn handle_info(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({ "customDocumentModels": { "count": 0, "limit": 500 } })).into_response()
}

/// `POST /documentModels/{model}:analyze`
async fn handle_analyze(
    State(state): State<MockState>,
    Path(model): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let Some(model) = model.strip_suffix(":analyze") else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !body.starts_with(b"%PDF") {
        let error = json!({
            "error": {
                "code": "InvalidRequest",
                "message": "Invalid input file. The file is corrupted or format is unsupported."
            }
        });
        return (StatusCode::BAD_REQUEST, Json(error)).into_response();
    }

    let contains = |marker: &[u8]| body.windows(marker.len()).any(|w| w == marker);
    let id = if contains(FAIL_MARKER) {
        "fail"
    } else if contains(SLOW_MARKER) {
        "slow"
    } else if contains(STUCK_MARKER) {
        "stuck"
    } else {
        "ok"
    };
    let location = format!(
        "http://{}/formrecognizer/documentModels/{}/analyzeResults/{}?api-version=2023-07-31",
        state.addr, model, id
    );
    (StatusCode::ACCEPTED, [("operation-location", location)]).into_response()
}

/// `GET /documentModels/{model}/analyzeResults/{id}`
async fn handle_result(
    State(state): State<MockState>,
    Path((_model, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let succeeded = || json!({ "status": "succeeded", "analyzeResult": sample_invoice_result() });
    let body = match id.as_str() {
        "ok" => succeeded(),
        "slow" => {
            if state.slow_polls.fetch_add(1, Ordering::SeqCst) < SLOW_POLLS {
                json!({ "status": "running" })
            } else {
                succeeded()
            }
        }
        "stuck" => json!({ "status": "running" }),
        "fail" => json!({
            "status": "failed",
            "error": { "code": "InternalServerError", "message": "Document could not be processed" }
        }),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    Json(body).into_response()
}
