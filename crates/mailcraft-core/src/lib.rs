//! Mailcraft Core Library
//!
//! Shared functionality for the Mailcraft email/invoice pipeline:
//! - Order details model extracted from invoice analysis results
//! - Confidence aggregation with configurable category weights
//! - Field extraction from Azure Document Intelligence `prebuilt-invoice` output
//! - Pluggable document analysis backends (Azure, mock)
//! - Email processing pipeline with per-attachment results and a summary
//! - JSON tree filter and search highlighting for the catalog viewer

pub mod analysis;
pub mod catalog;
pub mod confidence;
pub mod config;
pub mod email;
pub mod error;
pub mod extract;
pub mod json_filter;
pub mod models;

/// Test utilities including a mock Document Intelligence server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use analysis::{
    analyze_pdf, is_valid_base64, AnalyzerClient, AzureBackend, DocumentAnalyzer, MockBackend,
    PdfAnalysis,
};
pub use catalog::{Catalog, CatalogView, ViewMode};
pub use confidence::{aggregate, ConfidenceWeights};
pub use config::{AnalyzerConfig, AzureSettings};
pub use email::{process_email, Attachment, EmailReport, EmailSubmission, PerFileResult, Summary};
pub use error::{Error, Result};
pub use extract::{extract_order_details, parse_decimal};
pub use json_filter::{filter_json, highlight_paths, FilterMatch};
pub use models::{Confidence, Customer, LineItem, OrderDetails, Vendor};
