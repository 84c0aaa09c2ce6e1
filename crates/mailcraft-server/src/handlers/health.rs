//! Server info and health handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;
use mailcraft_core::DocumentAnalyzer;

/// Server health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since the router was created
    pub uptime: f64,
    pub environment: String,
}

/// Per-endpoint health response
#[derive(Debug, Serialize)]
pub struct EndpointHealth {
    pub success: bool,
    pub message: &'static str,
    pub timestamp: String,
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// GET / - Server info with the endpoint list
pub async fn root_info(State(state): State<Arc<AppState>>) -> Json<Value> {
    let analyzer = state
        .analyzer
        .as_ref()
        .map(|client| json!({ "model": client.model_id() }));

    Json(json!({
        "success": true,
        "message": "Mailcraft - PDF Order Analysis Server",
        "version": env!("CARGO_PKG_VERSION"),
        "analyzer": analyzer,
        "endpoints": {
            "analyze": "POST /analyze - Analyze PDF documents (JSON with base64)",
            "processEmail": "POST /process-email - Process email with PDF attachments (FormData)",
            "catalog": "GET /catalog?q=&mode=filter|search - Filter or search the product catalog",
            "health": "GET /health - Server health check",
        }
    }))
}

/// GET /health - Server health check
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "healthy",
        timestamp: now(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        environment: state.config.environment.clone(),
    })
}

/// GET /analyze/health
pub async fn analyze_health() -> Json<EndpointHealth> {
    Json(EndpointHealth {
        success: true,
        message: "Analyze endpoint is healthy",
        timestamp: now(),
    })
}

/// GET /process-email/health
pub async fn process_email_health() -> Json<EndpointHealth> {
    Json(EndpointHealth {
        success: true,
        message: "Process email endpoint is healthy",
        timestamp: now(),
    })
}
