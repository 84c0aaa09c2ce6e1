//! Mailcraft Web Server
//!
//! Axum-based REST API for invoice analysis:
//! - `POST /analyze` analyzes one base64-encoded PDF
//! - `POST /process-email` analyzes every PDF attached to an email form
//! - `GET /catalog` filters or searches the product catalog
//!
//! Every error is returned in the envelope
//! `{"success": false, "error": {"message", "code"}}`.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use mailcraft_core::{AnalyzerClient, AnalyzerConfig, Catalog, DocumentAnalyzer};

mod handlers;

/// Maximum size of one email attachment (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Maximum number of attachments per email
pub const MAX_ATTACHMENTS: usize = 10;

/// Maximum JSON body size for `/analyze` (10 MB)
pub const MAX_JSON_BODY: usize = 10 * 1024 * 1024;

/// Multipart body limit: every attachment at full size plus the text fields
const MAX_MULTIPART_BODY: usize = MAX_ATTACHMENTS * MAX_UPLOAD_SIZE + 1024 * 1024;

/// Origins allowed when `ALLOWED_ORIGINS` is not set
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:5173", "http://localhost:5174"];

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Allowed CORS origins
    pub allowed_origins: Vec<String>,
    /// Deployment environment reported by `/health`
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|o| o.to_string())
                .collect(),
            environment: "development".to_string(),
        }
    }
}

impl ServerConfig {
    /// Read `ALLOWED_ORIGINS` (comma-separated) and `MAILCRAFT_ENV`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(origins) = std::env::var("ALLOWED_ORIGINS") {
            config.allowed_origins = parse_origins(&origins);
        }
        if let Ok(env) = std::env::var("MAILCRAFT_ENV") {
            if !env.trim().is_empty() {
                config.environment = env.trim().to_string();
            }
        }
        config
    }
}

/// Split a comma-separated origin list, dropping blanks
pub fn parse_origins(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

/// Shared application state
pub struct AppState {
    /// `None` when no analyzer backend is configured
    pub analyzer: Option<AnalyzerClient>,
    pub analyzer_config: AnalyzerConfig,
    pub config: ServerConfig,
    pub catalog: Catalog,
    pub started_at: Instant,
}

impl AppState {
    /// The configured analyzer, or 503 when there is none
    pub fn require_analyzer(&self) -> Result<&AnalyzerClient, AppError> {
        self.analyzer.as_ref().ok_or_else(|| {
            AppError::unavailable(
                "Document analysis is not configured (set AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT and AZURE_DOCUMENT_INTELLIGENCE_KEY)",
            )
        })
    }
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Create the application router
pub fn create_router(
    analyzer: Option<AnalyzerClient>,
    analyzer_config: AnalyzerConfig,
    config: ServerConfig,
) -> anyhow::Result<Router> {
    let catalog = Catalog::embedded()?;

    let cors = build_cors(&config.allowed_origins);

    let state = Arc::new(AppState {
        analyzer,
        analyzer_config,
        config,
        catalog,
        started_at: Instant::now(),
    });

    let app = Router::new()
        .route("/", get(handlers::root_info))
        .route("/health", get(handlers::health))
        .route(
            "/analyze",
            post(handlers::analyze).layer(DefaultBodyLimit::max(MAX_JSON_BODY)),
        )
        .route("/analyze/health", get(handlers::analyze_health))
        .route(
            "/process-email",
            post(handlers::process_email).layer(DefaultBodyLimit::max(MAX_MULTIPART_BODY)),
        )
        .route("/process-email/health", get(handlers::process_email_health))
        .route("/catalog", get(handlers::view_catalog))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    Ok(app)
}

fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// 404 for every unrouted path
async fn not_found(request: Request) -> Response {
    let body = Json(serde_json::json!({
        "success": false,
        "error": {
            "message": "Endpoint not found",
            "code": "NOT_FOUND",
            "path": request.uri().path(),
        }
    }));
    (StatusCode::NOT_FOUND, body).into_response()
}

/// Start the server
pub async fn serve(host: &str, port: u16, config: ServerConfig) -> anyhow::Result<()> {
    let analyzer_config = AnalyzerConfig::load()?;
    let analyzer = AnalyzerClient::from_env(&analyzer_config.azure);
    check_analyzer_connection(analyzer.as_ref()).await;

    info!(
        environment = %config.environment,
        origins = %config.allowed_origins.join(", "),
        "CORS enabled"
    );

    let app = create_router(analyzer, analyzer_config, config)?;
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down server gracefully");
}

/// Check and log analyzer backend status
async fn check_analyzer_connection(analyzer: Option<&AnalyzerClient>) {
    match analyzer {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ Document analysis connected: {} (model: {})",
                    client.endpoint(),
                    client.model_id()
                );
            } else {
                warn!(
                    "⚠️  Document analysis configured but not responding: {} (model: {})",
                    client.endpoint(),
                    client.model_id()
                );
            }
        }
        None => {
            warn!("⚠️  Document analysis not configured (set AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT and AZURE_DOCUMENT_INTELLIGENCE_KEY)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with HTTP status and machine-readable code
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            internal: None,
        }
    }

    pub fn bad_request(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, msg)
    }

    pub fn unavailable(msg: &str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "ANALYZER_UNAVAILABLE", msg)
    }

    /// Analysis failed; the provider's message is passed through
    pub fn processing(err: impl std::fmt::Display) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "PROCESSING_ERROR",
            err.to_string(),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "success": false,
            "error": {
                "message": self.message,
                "code": self.code,
            }
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR",
            // Return generic message to client
            message: "Internal server error".to_string(),
            // Keep full error for logging
            internal: Some(err.into()),
        }
    }
}
