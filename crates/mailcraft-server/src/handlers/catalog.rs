//! Catalog viewer handler

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState};
use mailcraft_core::{CatalogView, ViewMode};

/// Query parameters for the catalog viewer
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    /// Search term (empty shows the whole catalog)
    pub q: Option<String>,
    /// `filter` (default) prunes the catalog, `search` highlights paths
    pub mode: Option<ViewMode>,
}

/// GET /catalog - Filter or search the product catalog
pub async fn view_catalog(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CatalogQuery>, QueryRejection>,
) -> Result<Json<CatalogView>, AppError> {
    let Query(params) = query.map_err(|e| AppError::bad_request("INVALID_REQUEST", e.body_text()))?;

    let term = params.q.as_deref().unwrap_or("");
    let mode = params.mode.unwrap_or_default();

    Ok(Json(state.catalog.view(term, mode)))
}
