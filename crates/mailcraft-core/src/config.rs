//! Analyzer configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/mailcraft/config/analyzer.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Missing keys in an override file keep their default values.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::confidence::ConfidenceWeights;
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/analyzer.toml");

/// Allowed rounding error when checking that the weights sum to 1
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Azure Document Intelligence request settings
#[derive(Debug, Clone, PartialEq)]
pub struct AzureSettings {
    /// Model ID used for every document
    pub model: String,
    /// REST API version query parameter
    pub api_version: String,
    /// Delay between operation status checks
    pub poll_interval: Duration,
    /// Status checks before the analysis is abandoned
    pub max_polls: u32,
    /// Per-request HTTP timeout
    pub timeout: Duration,
}

impl Default for AzureSettings {
    fn default() -> Self {
        Self {
            model: "prebuilt-invoice".to_string(),
            api_version: "2023-07-31".to_string(),
            poll_interval: Duration::from_millis(1000),
            max_polls: 60,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Full analyzer configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyzerConfig {
    pub azure: AzureSettings,
    pub confidence: ConfidenceWeights,
}

impl AnalyzerConfig {
    /// Load from the default override location, else the embedded defaults
    pub fn load() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load_from(&path),
            None => parse_config(DEFAULT_CONFIG),
        }
    }

    /// Load from `path` if it exists, else the embedded defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!(path = %path.display(), "Loading analyzer config override");
            let content = fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;
            parse_config(&content)
        } else {
            parse_config(DEFAULT_CONFIG)
        }
    }
}

/// Override location for the analyzer config
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("mailcraft").join("config").join("analyzer.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    azure: Option<RawAzure>,
    confidence: Option<RawConfidence>,
}

#[derive(Debug, Deserialize)]
struct RawAzure {
    model: Option<String>,
    api_version: Option<String>,
    poll_interval_ms: Option<u64>,
    max_polls: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawConfidence {
    customer_info: Option<f64>,
    line_items: Option<f64>,
    totals: Option<f64>,
}

fn parse_config(content: &str) -> Result<AnalyzerConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = AnalyzerConfig::default();

    if let Some(azure) = raw.azure {
        if let Some(model) = azure.model {
            config.azure.model = model;
        }
        if let Some(version) = azure.api_version {
            config.azure.api_version = version;
        }
        if let Some(ms) = azure.poll_interval_ms {
            config.azure.poll_interval = Duration::from_millis(ms);
        }
        if let Some(polls) = azure.max_polls {
            config.azure.max_polls = polls;
        }
        if let Some(secs) = azure.timeout_secs {
            config.azure.timeout = Duration::from_secs(secs);
        }
    }

    if let Some(weights) = raw.confidence {
        if let Some(w) = weights.customer_info {
            config.confidence.customer_info = w;
        }
        if let Some(w) = weights.line_items {
            config.confidence.line_items = w;
        }
        if let Some(w) = weights.totals {
            config.confidence.totals = w;
        }
    }

    for (name, w) in [
        ("customer_info", config.confidence.customer_info),
        ("line_items", config.confidence.line_items),
        ("totals", config.confidence.totals),
    ] {
        if !(0.0..=1.0).contains(&w) {
            return Err(Error::Config(format!(
                "confidence.{} must be within [0, 1], got {}",
                name, w
            )));
        }
    }
    let weights = &config.confidence;
    let sum = weights.customer_info + weights.line_items + weights.totals;
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(Error::Config(format!(
            "confidence weights must sum to 1, got {}",
            sum
        )));
    }
    if config.azure.max_polls == 0 {
        return Err(Error::Config("azure.max_polls must be at least 1".into()));
    }

    Ok(config)
}
