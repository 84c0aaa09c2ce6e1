//! Product catalog viewer
//!
//! The catalog is a static JSON document compiled into the binary. Viewing it
//! either prunes it down to the matching parts (`filter`) or returns it whole
//! with the paths that match highlighted (`search`).

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::Result;
use crate::json_filter::{filter_json, highlight_paths, FilterMatch};

/// Embedded catalog (compiled into binary)
const CATALOG_JSON: &str = include_str!("../../../data/catalog.json");

/// Label of the root node in highlighted paths
pub const ROOT_LABEL: &str = "root";

/// How the catalog is narrowed by a search term
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Filter,
    Search,
}

/// Catalog data as shown for one search term
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub mode: ViewMode,
    pub term: String,
    pub data: Value,
    /// Whether anything matched (always true for an empty term)
    pub matches: bool,
    /// Highlighted paths in search mode
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<String>,
}

/// Static product catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    data: Value,
}

impl Catalog {
    /// Parse the catalog embedded at build time
    pub fn embedded() -> Result<Self> {
        Self::from_json(CATALOG_JSON)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(Self::from_value(serde_json::from_str(content)?))
    }

    pub fn from_value(data: Value) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// View the catalog through `term`
    pub fn view(&self, term: &str, mode: ViewMode) -> CatalogView {
        let (data, matches, highlights) = match mode {
            ViewMode::Filter => match filter_json(&self.data, term) {
                FilterMatch::Found(value) => (Cow::into_owned(value), true, Vec::new()),
                FilterMatch::NotFound => (json!({ "noMatches": true }), false, Vec::new()),
            },
            ViewMode::Search => {
                let highlights = highlight_paths(&self.data, term, ROOT_LABEL);
                let matches = term.is_empty() || !highlights.is_empty();
                (self.data.clone(), matches, highlights)
            }
        };
        debug!(term, ?mode, matches, "Catalog viewed");

        CatalogView {
            mode,
            term: term.to_string(),
            data,
            matches,
            highlights,
        }
    }
}
