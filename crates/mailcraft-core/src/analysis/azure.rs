//! Azure Document Intelligence backend
//!
//! Analysis is a long-running operation: the document is POSTed to the model's
//! `:analyze` endpoint, which answers `202 Accepted` with an
//! `Operation-Location` header. That URL is polled until the operation
//! reports `succeeded` or `failed`, or the configured poll budget runs out.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AzureSettings;
use crate::error::{Error, Result};

use super::DocumentAnalyzer;

const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION_HEADER: &str = "operation-location";

/// Azure Document Intelligence REST client
#[derive(Clone)]
pub struct AzureBackend {
    http_client: Client,
    endpoint: String,
    api_key: String,
    settings: AzureSettings,
}

impl AzureBackend {
    /// Create a new Azure backend
    pub fn new(endpoint: &str, api_key: &str, settings: AzureSettings) -> Result<Self> {
        if endpoint.trim().is_empty() || api_key.trim().is_empty() {
            return Err(Error::Config(
                "Azure Document Intelligence endpoint and API key are required".into(),
            ));
        }

        let http_client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            settings,
        })
    }

    /// Create from environment variables
    pub fn from_env(settings: &AzureSettings) -> Option<Self> {
        let endpoint = std::env::var("AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT").ok()?;
        let api_key = std::env::var("AZURE_DOCUMENT_INTELLIGENCE_KEY").ok()?;
        match Self::new(&endpoint, &api_key, settings.clone()) {
            Ok(backend) => Some(backend),
            Err(e) => {
                warn!(error = %e, "Azure Document Intelligence not configured");
                None
            }
        }
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/formrecognizer/documentModels/{}:analyze?api-version={}",
            self.endpoint, self.settings.model, self.settings.api_version
        )
    }

    fn info_url(&self) -> String {
        format!(
            "{}/formrecognizer/info?api-version={}",
            self.endpoint, self.settings.api_version
        )
    }

    async fn poll_operation(&self, operation_url: &str) -> Result<Value> {
        for attempt in 1..=self.settings.max_polls {
            tokio::time::sleep(self.settings.poll_interval).await;

            let response = self
                .http_client
                .get(operation_url)
                .header(API_KEY_HEADER, &self.api_key)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::Provider(error_message(status, &body)));
            }

            let poll: Value = response.json().await?;
            match poll.get("status").and_then(Value::as_str).unwrap_or("") {
                "succeeded" => {
                    return poll
                        .get("analyzeResult")
                        .cloned()
                        .ok_or_else(|| Error::Provider("No analyzeResult in response".into()));
                }
                "failed" => {
                    let message = poll
                        .pointer("/error/message")
                        .and_then(Value::as_str)
                        .unwrap_or("Unknown error");
                    return Err(Error::Provider(format!("Analysis failed: {}", message)));
                }
                status => debug!(attempt, status, "Analysis still running"),
            }
        }

        Err(Error::Provider(format!(
            "Analysis timed out after {} status checks",
            self.settings.max_polls
        )))
    }
}

/// Human-readable message for a non-success provider response
fn error_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Invalid key or endpoint?".to_string()
            } else {
                body.trim().to_string()
            }
        });
    format!("Request failed ({}): {}", status, detail)
}

#[async_trait]
impl DocumentAnalyzer for AzureBackend {
    async fn analyze(&self, pdf: &[u8]) -> Result<Value> {
        let response = self
            .http_client
            .post(self.analyze_url())
            .header(API_KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, "application/pdf")
            .body(pdf.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider(error_message(status, &body)));
        }

        let operation_url = response
            .headers()
            .get(OPERATION_LOCATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::Provider("No Operation-Location in response".into()))?
            .to_string();
        debug!(operation = %operation_url, "Analysis accepted");

        self.poll_operation(&operation_url).await
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(self.info_url())
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Azure health check failed");
                false
            }
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn model_id(&self) -> &str {
        &self.settings.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockDocumentIntelligence, SLOW_POLLS};
    use std::time::Duration;

    fn fast_settings() -> AzureSettings {
        AzureSettings {
            poll_interval: Duration::from_millis(1),
            max_polls: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_requires_endpoint_and_key() {
        assert!(AzureBackend::new("", "key", AzureSettings::default()).is_err());
        assert!(AzureBackend::new("https://x.example", "", AzureSettings::default()).is_err());
    }

    #[test]
    fn test_analyze_url() {
        let backend =
            AzureBackend::new("https://x.example/", "key", AzureSettings::default()).unwrap();
        assert_eq!(
            backend.analyze_url(),
            "https://x.example/formrecognizer/documentModels/prebuilt-invoice:analyze?api-version=2023-07-31"
        );
    }

    #[test]
    fn test_error_message_prefers_provider_message() {
        let body = r#"{"error":{"code":"InvalidRequest","message":"Invalid input file."}}"#;
        let msg = error_message(StatusCode::BAD_REQUEST, body);
        assert!(msg.contains("Invalid input file."));
        assert!(msg.contains("400"));

        let msg = error_message(StatusCode::UNAUTHORIZED, "");
        assert!(msg.contains("Invalid key or endpoint?"));
    }

    #[tokio::test]
    async fn test_analyze_against_mock_server() {
        let server = MockDocumentIntelligence::start().await;
        let backend = AzureBackend::new(&server.url(), "test-key", fast_settings()).unwrap();

        let result = backend.analyze(b"%PDF-1.7 invoice").await.unwrap();
        let docs = result["documents"].as_array().unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0]["fields"]["Items"]["valueArray"].is_array());
    }

    #[tokio::test]
    async fn test_analyze_rejected_document() {
        let server = MockDocumentIntelligence::start().await;
        let backend = AzureBackend::new(&server.url(), "test-key", fast_settings()).unwrap();

        let err = backend.analyze(b"garbage").await.unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
        assert!(err.to_string().contains("Invalid input file"));
    }

    #[tokio::test]
    async fn test_analyze_wrong_key() {
        let server = MockDocumentIntelligence::start().await;
        let backend = AzureBackend::new(&server.url(), "wrong", fast_settings()).unwrap();

        let err = backend.analyze(b"%PDF-1.7").await.unwrap_err();
        assert!(err.to_string().contains("401"));
        assert!(!backend.health_check().await);
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockDocumentIntelligence::start().await;
        let backend = AzureBackend::new(&server.url(), "test-key", fast_settings()).unwrap();
        assert!(backend.health_check().await);
    }

    #[tokio::test]
    async fn test_analyze_waits_for_running_operation() {
        let server = MockDocumentIntelligence::start().await;
        let backend = AzureBackend::new(&server.url(), "test-key", fast_settings()).unwrap();

        // Needs SLOW_POLLS running answers plus the final one, within max_polls
        assert!(SLOW_POLLS < fast_settings().max_polls);
        let result = backend.analyze(b"%PDF-1.7 %SLOW").await.unwrap();
        assert_eq!(
            result["documents"][0]["fields"]["InvoiceId"]["content"],
            "INV-1001"
        );
    }

    #[tokio::test]
    async fn test_analyze_times_out_after_max_polls() {
        let server = MockDocumentIntelligence::start().await;
        let settings = AzureSettings {
            max_polls: 2,
            ..fast_settings()
        };
        let backend = AzureBackend::new(&server.url(), "test-key", settings).unwrap();

        let err = backend.analyze(b"%PDF-1.7 %STUCK").await.unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
        assert!(err.to_string().contains("timed out after 2 status checks"));
    }

    #[tokio::test]
    async fn test_failed_operation_reports_message() {
        let server = MockDocumentIntelligence::start().await;
        let backend = AzureBackend::new(&server.url(), "test-key", fast_settings()).unwrap();

        let err = backend.analyze(b"%PDF-1.7 %FAIL").await.unwrap_err();
        assert!(err.to_string().contains("Analysis failed"));
    }
}
