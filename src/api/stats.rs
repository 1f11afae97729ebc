use crate::api::errors::ApiError;
use crate::ingest::handler::AppState;
use crate::query::frequency::{self, VisitSummary};
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

/// GET /api/stats/summary — The five ranked frequency tables.
///
/// Scans the entire visit log on every call: load all rows, classify each
/// user agent, count per dimension, sort. Exact and uncached, acceptable
/// for small-site volumes.
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VisitSummary>, ApiError> {
    let summary = tokio::task::spawn_blocking(move || {
        let visits = state.store.load_all()?;
        Ok::<_, duckdb::Error>(frequency::compute_summary(&visits))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Summary task panicked: {e}")))??;

    Ok(Json(summary))
}
