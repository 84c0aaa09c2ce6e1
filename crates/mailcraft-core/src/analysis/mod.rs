//! Pluggable document analysis backend abstraction
//!
//! A backend turns PDF bytes into the provider's raw `analyzeResult` JSON.
//! The extractor in [`crate::extract`] then maps that JSON to order details.
//!
//! # Architecture
//!
//! - `DocumentAnalyzer` trait: defines the interface for all backends
//! - `AnalyzerClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `AzureBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `ANALYZER_BACKEND`: Backend to use (azure, mock). Default: azure
//! - `AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT`: Resource endpoint (required for azure)
//! - `AZURE_DOCUMENT_INTELLIGENCE_KEY`: Resource key (required for azure)

mod azure;
mod mock;

pub use azure::AzureBackend;
pub use mock::{sample_invoice_result, MockBackend};

use std::time::Instant;

use async_trait::async_trait;
use base64::Engine;
use serde_json::Value;
use tracing::{error, info};

use crate::confidence::ConfidenceWeights;
use crate::config::AzureSettings;
use crate::error::Result;
use crate::extract::extract_order_details;
use crate::models::OrderDetails;

/// Trait defining the interface for all document analysis backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Analyze a PDF and return the provider's raw `analyzeResult`
    async fn analyze(&self, pdf: &[u8]) -> Result<Value>;

    /// Check if the backend is reachable with the configured credentials
    async fn health_check(&self) -> bool;

    /// Endpoint URL (for logging)
    fn endpoint(&self) -> &str;

    /// Model ID used for analysis
    fn model_id(&self) -> &str;
}

/// Concrete analyzer client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AnalyzerClient {
    /// Azure Document Intelligence (REST API)
    Azure(AzureBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AnalyzerClient {
    /// Create an analyzer client from environment variables
    ///
    /// Returns None if the selected backend is not configured.
    pub fn from_env(settings: &AzureSettings) -> Option<Self> {
        let backend = std::env::var("ANALYZER_BACKEND").unwrap_or_else(|_| "azure".to_string());

        match backend.to_lowercase().as_str() {
            "azure" => AzureBackend::from_env(settings).map(AnalyzerClient::Azure),
            "mock" => Some(AnalyzerClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown ANALYZER_BACKEND, falling back to azure");
                AzureBackend::from_env(settings).map(AnalyzerClient::Azure)
            }
        }
    }

    /// Create an Azure backend directly
    pub fn azure(endpoint: &str, api_key: &str, settings: AzureSettings) -> Result<Self> {
        Ok(AnalyzerClient::Azure(AzureBackend::new(
            endpoint, api_key, settings,
        )?))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AnalyzerClient::Mock(MockBackend::new())
    }
}

#[async_trait]
impl DocumentAnalyzer for AnalyzerClient {
    async fn analyze(&self, pdf: &[u8]) -> Result<Value> {
        match self {
            AnalyzerClient::Azure(b) => b.analyze(pdf).await,
            AnalyzerClient::Mock(b) => b.analyze(pdf).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AnalyzerClient::Azure(b) => b.health_check().await,
            AnalyzerClient::Mock(b) => b.health_check().await,
        }
    }

    fn endpoint(&self) -> &str {
        match self {
            AnalyzerClient::Azure(b) => b.endpoint(),
            AnalyzerClient::Mock(b) => b.endpoint(),
        }
    }

    fn model_id(&self) -> &str {
        match self {
            AnalyzerClient::Azure(b) => b.model_id(),
            AnalyzerClient::Mock(b) => b.model_id(),
        }
    }
}

/// Raw provider response together with the extracted order details
#[derive(Debug, Clone)]
pub struct PdfAnalysis {
    pub raw: Value,
    pub order_details: OrderDetails,
}

/// Analyze one PDF and extract its order details
pub async fn analyze_pdf<A>(
    analyzer: &A,
    pdf: &[u8],
    weights: &ConfidenceWeights,
) -> Result<PdfAnalysis>
where
    A: DocumentAnalyzer + ?Sized,
{
    let start = Instant::now();
    info!(model = analyzer.model_id(), bytes = pdf.len(), "Analyzing document");

    let raw = analyzer.analyze(pdf).await.inspect_err(|e| {
        error!(error = %e, "Error analyzing document");
    })?;

    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Document analyzed"
    );

    let order_details = extract_order_details(&raw, weights);
    Ok(PdfAnalysis { raw, order_details })
}

/// Whether `s` is canonical standard-alphabet base64
pub fn is_valid_base64(s: &str) -> bool {
    let engine = base64::engine::general_purpose::STANDARD;
    engine
        .decode(s)
        .map(|bytes| engine.encode(bytes) == s)
        .unwrap_or(false)
}
