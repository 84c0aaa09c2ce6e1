//! Analyze command implementation

use std::path::Path;

use anyhow::{Context, Result};

use mailcraft_core::{
    analyze_pdf, AnalyzerClient, AnalyzerConfig, ConfidenceWeights, DocumentAnalyzer,
    OrderDetails,
};

pub async fn cmd_analyze(file: &Path, json: bool) -> Result<()> {
    let config = AnalyzerConfig::load().context("Failed to load analyzer config")?;
    let client = AnalyzerClient::from_env(&config.azure).context(
        "Document analysis not configured (set AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT and AZURE_DOCUMENT_INTELLIGENCE_KEY, or ANALYZER_BACKEND=mock)",
    )?;

    let output = analyze_file(&client, file, &config.confidence, json).await?;
    println!("{}", output);
    Ok(())
}

/// Analyze `file` and render the order as JSON or a readable summary
pub async fn analyze_file<A>(
    analyzer: &A,
    file: &Path,
    weights: &ConfidenceWeights,
    json: bool,
) -> Result<String>
where
    A: DocumentAnalyzer + ?Sized,
{
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let analysis = analyze_pdf(analyzer, &bytes, weights)
        .await
        .with_context(|| format!("Failed to analyze {}", file.display()))?;

    if json {
        Ok(serde_json::to_string_pretty(&analysis.order_details)?)
    } else {
        Ok(format_order_summary(&analysis.order_details))
    }
}

fn money(value: Option<f64>, currency: &str) -> String {
    match value {
        Some(v) => format!("{:.2} {}", v, currency).trim_end().to_string(),
        None => "-".to_string(),
    }
}

/// Human-readable order summary
pub fn format_order_summary(order: &OrderDetails) -> String {
    let currency = order.currency.as_deref().unwrap_or("");
    let mut lines = vec![format!(
        "📄 Order {}",
        order.order_id.as_deref().unwrap_or("(no id)")
    )];

    if let Some(date) = &order.order_date {
        lines.push(format!("   Date: {}", date));
    }
    if let Some(due) = &order.due_date {
        lines.push(format!("   Due: {}", due));
    }
    lines.push(format!(
        "   Customer: {}",
        order.customer.name.as_deref().unwrap_or("-")
    ));
    if let Some(vendor) = order.vendor.as_ref().and_then(|v| v.name.as_deref()) {
        lines.push(format!("   Vendor: {}", vendor));
    }

    lines.push(String::new());
    lines.push(format!("📦 Line items ({})", order.line_items.len()));
    lines.extend(order.line_items.iter().map(|item| {
        format!(
            "   {:>2}. {:<12} {:<40} x{:<6} {:>12}",
            item.line_number,
            item.product_code.as_deref().unwrap_or("-"),
            item.description,
            item.quantity,
            money(item.total_price, currency),
        )
    }));

    lines.push(String::new());
    lines.push(format!("   Subtotal: {}", money(order.subtotal, currency)));
    lines.push(format!("   Tax:      {}", money(order.tax, currency)));
    lines.push(format!("   Total:    {}", money(order.total, currency)));

    let c = &order.confidence;
    lines.push(format!(
        "📊 Confidence: {:.1}% (customer {:.1}%, items {:.1}%, totals {:.1}%)",
        c.overall * 100.0,
        c.customer_info * 100.0,
        c.line_items * 100.0,
        c.totals * 100.0
    ));

    lines.join("\n")
}
