//! CLI command tests

use std::io::Write;

use mailcraft_core::{AnalyzerClient, ConfidenceWeights, OrderDetails};

use crate::commands::{self, format_order_summary, resolve_port, run_filter, DEFAULT_PORT};

fn temp_file(contents: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file
}

// ========== Serve Command Tests ==========

#[test]
fn test_resolve_port_precedence() {
    assert_eq!(resolve_port(Some(8080), Some("9000")).unwrap(), 8080);
    assert_eq!(resolve_port(None, Some("9000")).unwrap(), 9000);
    assert_eq!(resolve_port(None, None).unwrap(), DEFAULT_PORT);
    assert!(resolve_port(None, Some("not-a-port")).is_err());
}

// ========== Analyze Command Tests ==========

#[tokio::test]
async fn test_analyze_file_summary() {
    let file = temp_file(b"%PDF-1.7 test invoice");
    let output = commands::analyze_file(
        &AnalyzerClient::mock(),
        file.path(),
        &ConfidenceWeights::default(),
        false,
    )
    .await
    .unwrap();

    assert!(output.contains("INV-1001"));
    assert!(output.contains("Line items (2)"));
    assert!(output.contains("411.40 EUR"));
    assert!(output.contains("Confidence"));
}

#[tokio::test]
async fn test_analyze_file_json() {
    let file = temp_file(b"%PDF-1.7 test invoice");
    let output = commands::analyze_file(
        &AnalyzerClient::mock(),
        file.path(),
        &ConfidenceWeights::default(),
        true,
    )
    .await
    .unwrap();

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["orderId"], "INV-1001");
    assert_eq!(json["lineItems"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_analyze_file_rejected_document() {
    let file = temp_file(b"plain text, not a pdf");
    let result = commands::analyze_file(
        &AnalyzerClient::mock(),
        file.path(),
        &ConfidenceWeights::default(),
        false,
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_analyze_missing_file() {
    let result = commands::analyze_file(
        &AnalyzerClient::mock(),
        std::path::Path::new("/nonexistent/invoice.pdf"),
        &ConfidenceWeights::default(),
        false,
    )
    .await;
    let err = result.unwrap_err().to_string();
    assert!(err.contains("Failed to read"));
}

#[test]
fn test_summary_of_empty_order() {
    let output = format_order_summary(&OrderDetails::default());
    assert!(output.contains("(no id)"));
    assert!(output.contains("Line items (0)"));
    assert!(output.contains("Total:    -"));
    assert!(output.contains("Confidence: 0.0%"));
}

#[tokio::test]
async fn test_summary_layout() {
    let file = temp_file(b"%PDF-1.7 test invoice");
    let output = commands::analyze_file(
        &AnalyzerClient::mock(),
        file.path(),
        &ConfidenceWeights::default(),
        false,
    )
    .await
    .unwrap();

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], "📄 Order INV-1001");
    assert!(lines.contains(&"   Vendor: Puertas SAGA"));
    assert!(lines.contains(&"   Total:    411.40 EUR"));
    assert!(lines.last().unwrap().starts_with("📊 Confidence:"));
    assert!(!output.ends_with('\n'));
}

// ========== Filter Command Tests ==========

#[test]
fn test_run_filter_prunes() {
    let output = run_filter(r#"{"a": {"b": "needle", "c": "other"}}"#, "needle", false).unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json, serde_json::json!({ "a": { "b": "needle" } }));
}

#[test]
fn test_run_filter_no_matches() {
    let output = run_filter(r#"["x", "y"]"#, "z", false).unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json, serde_json::json!({ "noMatches": true }));
}

#[test]
fn test_run_filter_search_lists_paths() {
    let output = run_filter(r#"{"a": {"b": "needle"}}"#, "needle", true).unwrap();
    assert_eq!(output, "root.a.b");
}

#[test]
fn test_run_filter_invalid_json() {
    assert!(run_filter("{oops", "x", false).is_err());
}

#[test]
fn test_cmd_filter_reads_file() {
    let file = temp_file(br#"{"k": "v"}"#);
    let result = commands::cmd_filter(file.path().to_str().unwrap(), "v", false);
    assert!(result.is_ok());
}
