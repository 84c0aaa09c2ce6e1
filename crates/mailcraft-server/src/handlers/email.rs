//! Email processing handler (multipart form with PDF attachments)

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use tracing::debug;

use crate::{AppError, AppState, SuccessResponse, MAX_ATTACHMENTS, MAX_UPLOAD_SIZE};
use mailcraft_core::{process_email as run_pipeline, Attachment, EmailReport, EmailSubmission};

/// Content type recorded for parts that do not declare one
const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

/// POST /process-email - Analyze every PDF attached to an email
///
/// Form fields: `from`, `subject`, `body` and any number of `attachments`
/// file parts (at most [`MAX_ATTACHMENTS`], each at most [`MAX_UPLOAD_SIZE`]).
pub async fn process_email(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SuccessResponse<EmailReport>>, AppError> {
    let mut multipart =
        multipart.map_err(|e| AppError::bad_request("INVALID_UPLOAD", e.body_text()))?;

    let mut submission = EmailSubmission::default();
    let mut attachments: Vec<Attachment> = Vec::new();

    // Extract fields from multipart form
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::bad_request("INVALID_UPLOAD", format!("Failed to read form field: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "from" | "subject" | "body" => {
                let value = field.text().await.map_err(|_| {
                    AppError::bad_request("INVALID_UPLOAD", format!("Failed to read {}", name))
                })?;
                match name.as_str() {
                    "from" => submission.from = value,
                    "subject" => submission.subject = value,
                    _ => submission.body = value,
                }
            }
            "attachments" => {
                if attachments.len() == MAX_ATTACHMENTS {
                    return Err(AppError::bad_request(
                        "INVALID_UPLOAD",
                        format!("Too many files. Maximum is {}", MAX_ATTACHMENTS),
                    ));
                }

                let file_name = field.file_name().unwrap_or("unnamed").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(UNKNOWN_CONTENT_TYPE)
                    .to_string();
                let bytes = field.bytes().await.map_err(|_| {
                    AppError::bad_request("INVALID_UPLOAD", "Failed to read file data")
                })?;

                // Check file size limit
                if bytes.len() > MAX_UPLOAD_SIZE {
                    return Err(AppError::bad_request(
                        "INVALID_UPLOAD",
                        format!(
                            "File too large. Maximum size is {} MB",
                            MAX_UPLOAD_SIZE / 1024 / 1024
                        ),
                    ));
                }

                debug!(file = %file_name, content_type = %content_type, bytes = bytes.len(), "Received attachment");
                attachments.push(Attachment {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    if submission.validate().is_err() {
        return Err(AppError::bad_request(
            "MISSING_FIELDS",
            "Missing required fields: from, subject, body",
        ));
    }

    let analyzer = state.require_analyzer()?;
    // Per-file failures are inside the report; an Err here is internal
    let report = run_pipeline(
        analyzer,
        &submission,
        &attachments,
        &state.analyzer_config.confidence,
    )
    .await?;

    Ok(SuccessResponse::new(report))
}
