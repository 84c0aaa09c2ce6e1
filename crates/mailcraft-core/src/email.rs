//! Email processing pipeline
//!
//! Every attachment of a submitted email is analyzed in turn. A failing
//! attachment becomes a failed per-file result and never aborts the batch.

use std::time::Instant;

use serde::{Serialize, Serializer};
use tracing::{info, warn};

use crate::analysis::{analyze_pdf, DocumentAnalyzer};
use crate::confidence::{aggregate, ConfidenceWeights};
use crate::error::{Error, Result};
use crate::models::OrderDetails;

/// Only content type accepted for analysis
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Sender, subject and body of an incoming email
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailSubmission {
    pub from: String,
    pub subject: String,
    pub body: String,
}

impl EmailSubmission {
    /// All three fields must be non-empty
    pub fn validate(&self) -> Result<()> {
        if self.from.is_empty() || self.subject.is_empty() || self.body.is_empty() {
            return Err(Error::MissingFields("from, subject, body".into()));
        }
        Ok(())
    }
}

/// One uploaded file
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn is_pdf(&self) -> bool {
        self.content_type.eq_ignore_ascii_case(PDF_CONTENT_TYPE)
    }
}

/// Outcome of analyzing one attachment
#[derive(Debug, Clone, PartialEq)]
pub enum PerFileResult {
    Success {
        file_name: String,
        file_size: usize,
        order_details: OrderDetails,
        confidence: f64,
    },
    Failure {
        file_name: String,
        file_size: usize,
        error: String,
    },
}

impl PerFileResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PerFileResult::Success { .. })
    }

    pub fn file_name(&self) -> &str {
        match self {
            PerFileResult::Success { file_name, .. } | PerFileResult::Failure { file_name, .. } => {
                file_name
            }
        }
    }

    /// Overall confidence of a successful analysis
    pub fn confidence(&self) -> Option<f64> {
        match self {
            PerFileResult::Success { confidence, .. } => Some(*confidence),
            PerFileResult::Failure { .. } => None,
        }
    }
}

/// Flat wire form: `{fileName, fileSize, success, orderDetails?, confidence?, error?}`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PerFileWire<'a> {
    file_name: &'a str,
    file_size: usize,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_details: Option<&'a OrderDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Serialize for PerFileResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let wire = match self {
            PerFileResult::Success {
                file_name,
                file_size,
                order_details,
                confidence,
            } => PerFileWire {
                file_name,
                file_size: *file_size,
                success: true,
                order_details: Some(order_details),
                confidence: Some(*confidence),
                error: None,
            },
            PerFileResult::Failure {
                file_name,
                file_size,
                error,
            } => PerFileWire {
                file_name,
                file_size: *file_size,
                success: false,
                order_details: None,
                confidence: None,
                error: Some(error.as_str()),
            },
        };
        wire.serialize(serializer)
    }
}

/// Batch totals over all attachments
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(rename = "totalPDFs")]
    pub total_pdfs: usize,
    pub successful_analyses: usize,
    pub failed_analyses: usize,
    /// Mean overall confidence of the successful analyses, 0 when there are none
    pub average_confidence: f64,
}

impl Summary {
    pub fn from_results(results: &[PerFileResult]) -> Self {
        let confidences: Vec<f64> = results.iter().filter_map(PerFileResult::confidence).collect();
        Self {
            total_pdfs: results.len(),
            successful_analyses: confidences.len(),
            failed_analyses: results.len() - confidences.len(),
            average_confidence: aggregate(&confidences),
        }
    }
}

/// Echo of the submitted email
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailData {
    pub from: String,
    pub subject: String,
    pub body: String,
    pub attachments_count: usize,
}

/// Full result of processing one email
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailReport {
    pub email_data: EmailData,
    pub pdf_analysis: Vec<PerFileResult>,
    pub summary: Summary,
    /// Wall-clock milliseconds spent on the whole email
    pub processing_time: u64,
}

/// Validate the submission and analyze its attachments one after another
pub async fn process_email<A>(
    analyzer: &A,
    submission: &EmailSubmission,
    attachments: &[Attachment],
    weights: &ConfidenceWeights,
) -> Result<EmailReport>
where
    A: DocumentAnalyzer + ?Sized,
{
    let start = Instant::now();
    submission.validate()?;

    info!(
        from = %submission.from,
        subject = %submission.subject,
        attachments = attachments.len(),
        "Processing email"
    );

    let mut results = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        results.push(process_attachment(analyzer, attachment, weights).await);
    }

    let summary = Summary::from_results(&results);
    let processing_time = start.elapsed().as_millis() as u64;
    info!(
        successful = summary.successful_analyses,
        total = summary.total_pdfs,
        elapsed_ms = processing_time,
        "Email processed"
    );

    Ok(EmailReport {
        email_data: EmailData {
            from: submission.from.clone(),
            subject: submission.subject.clone(),
            body: submission.body.clone(),
            attachments_count: attachments.len(),
        },
        pdf_analysis: results,
        summary,
        processing_time,
    })
}

async fn process_attachment<A>(
    analyzer: &A,
    attachment: &Attachment,
    weights: &ConfidenceWeights,
) -> PerFileResult
where
    A: DocumentAnalyzer + ?Sized,
{
    let file_name = attachment.file_name.clone();
    let file_size = attachment.bytes.len();

    if !attachment.is_pdf() {
        warn!(file = %file_name, content_type = %attachment.content_type, "Skipping non-PDF attachment");
        return PerFileResult::Failure {
            file_name,
            file_size,
            error: "Only PDF files are allowed".to_string(),
        };
    }

    match analyze_pdf(analyzer, &attachment.bytes, weights).await {
        Ok(analysis) => {
            let confidence = analysis.order_details.confidence.overall;
            info!(file = %file_name, confidence, "Attachment analyzed");
            PerFileResult::Success {
                file_name,
                file_size,
                order_details: analysis.order_details,
                confidence,
            }
        }
        Err(e) => {
            warn!(file = %file_name, error = %e, "Attachment analysis failed");
            PerFileResult::Failure {
                file_name,
                file_size,
                error: e.to_string(),
            }
        }
    }
}
