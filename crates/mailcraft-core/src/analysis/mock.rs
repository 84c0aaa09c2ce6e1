//! Mock backend for testing
//!
//! Returns a fixed invoice for anything that looks like a PDF and a provider
//! error otherwise. Useful for unit tests and for running the server without
//! Azure credentials (`ANALYZER_BACKEND=mock`).

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{Error, Result};

use super::DocumentAnalyzer;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Mock analyzer backend
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self { healthy: true }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self { healthy: false }
    }
}

#[async_trait]
impl DocumentAnalyzer for MockBackend {
    async fn analyze(&self, pdf: &[u8]) -> Result<Value> {
        if !pdf.starts_with(PDF_MAGIC) {
            return Err(Error::Provider(
                "Invalid request: the file is corrupted or format is unsupported".into(),
            ));
        }
        Ok(sample_invoice_result())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn endpoint(&self) -> &str {
        "mock://localhost"
    }

    fn model_id(&self) -> &str {
        "prebuilt-invoice"
    }
}

fn field(kind: &str, content: &str, confidence: f64) -> Value {
    json!({ "type": kind, "content": content, "confidence": confidence })
}

fn item(description: &str, code: &str, quantity: &str, unit_price: &str, amount: &str) -> Value {
    json!({
        "type": "object",
        "valueObject": {
            "Description": field("string", description, 0.93),
            "ProductCode": field("string", code, 0.88),
            "Quantity": field("number", quantity, 0.91),
            "Unit": field("string", "ea", 0.85),
            "UnitPrice": field("currency", unit_price, 0.9),
            "Amount": field("currency", amount, 0.92),
        },
        "confidence": 0.9
    })
}

/// A two-line invoice in the REST `analyzeResult` shape
pub fn sample_invoice_result() -> Value {
    json!({
        "apiVersion": "2023-07-31",
        "modelId": "prebuilt-invoice",
        "content": "INVOICE INV-1001",
        "documents": [{
            "docType": "invoice",
            "confidence": 0.98,
            "fields": {
                "CustomerName": field("string", "Carpinteria Lopez", 0.92),
                "CustomerAddress": field("address", "Calle Mayor 12, Madrid", 0.86),
                "CustomerAddressRecipient": field("string", "Ana Lopez", 0.8),
                "VendorName": field("string", "Puertas SAGA", 0.95),
                "VendorAddress": field("address", "Poligono Industrial 4, Toledo", 0.9),
                "InvoiceId": field("string", "INV-1001", 0.97),
                "InvoiceDate": field("date", "2024-03-01", 0.96),
                "DueDate": field("date", "2024-03-31", 0.94),
                "CurrencyCode": field("string", "EUR", 0.9),
                "Items": {
                    "type": "array",
                    "valueArray": [
                        item("SAGA 100 1105 door 825x2030", "1105", "2", "EUR 145.00", "EUR 290.00"),
                        item("Lever handle CORAL", "CORAL", "4", "EUR 12.50", "EUR 50.00"),
                    ]
                },
                "SubTotal": field("currency", "EUR 340.00", 0.93),
                "TotalTax": field("currency", "EUR 71.40", 0.9),
                "InvoiceTotal": field("currency", "EUR 411.40", 0.95)
            }
        }]
    })
}
