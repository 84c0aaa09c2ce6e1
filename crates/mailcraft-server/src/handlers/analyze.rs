//! Single-PDF analysis handler

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::{AppError, AppState, SuccessResponse};
use mailcraft_core::{analyze_pdf, is_valid_base64, OrderDetails};

/// Request body for POST /analyze
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub pdf_base64: Option<String>,
    pub file_name: Option<String>,
}

/// Successful analysis payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeData {
    pub order_details: OrderDetails,
    pub raw_azure_response: Value,
    /// Milliseconds spent handling the request
    pub processing_time: u64,
}

/// POST /analyze - Analyze a base64-encoded PDF
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse<AnalyzeData>>, AppError> {
    let start = Instant::now();

    let Json(request) =
        body.map_err(|e| AppError::bad_request("INVALID_REQUEST", e.body_text()))?;

    let pdf_base64 = request
        .pdf_base64
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("MISSING_PDF", "Missing pdfBase64 in request body"))?;

    if !is_valid_base64(&pdf_base64) {
        return Err(AppError::bad_request(
            "INVALID_BASE64",
            "Invalid base64 format",
        ));
    }

    let analyzer = state.require_analyzer()?;
    let pdf = base64::engine::general_purpose::STANDARD
        .decode(&pdf_base64)
        .map_err(|_| AppError::bad_request("INVALID_BASE64", "Invalid base64 format"))?;

    let file_name = request.file_name.as_deref().unwrap_or("unnamed");
    info!(file = %file_name, bytes = pdf.len(), "Processing PDF");

    let analysis = analyze_pdf(analyzer, &pdf, &state.analyzer_config.confidence)
        .await
        .map_err(|e| {
            warn!(file = %file_name, error = %e, "Analysis failed");
            AppError::processing(e)
        })?;

    let processing_time = start.elapsed().as_millis() as u64;
    info!(
        file = %file_name,
        elapsed_ms = processing_time,
        confidence = analysis.order_details.confidence.overall,
        line_items = analysis.order_details.line_items.len(),
        "Analysis complete"
    );

    Ok(SuccessResponse::new(AnalyzeData {
        order_details: analysis.order_details,
        raw_azure_response: analysis.raw,
        processing_time,
    }))
}
