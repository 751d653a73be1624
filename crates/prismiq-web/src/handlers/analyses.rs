//! Stored analyses: explorer listing, detail view, raw history.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Local;
use prismiq_common::ApiError;
use prismiq_db::AnalysisRecord;
use serde::Deserialize;

use crate::response::{analysis_detail, decode_result, explorer_entries, AnalysisDetail, ExplorerEntry};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct ExplorerQuery {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_explorer_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_explorer_limit() -> usize {
    30
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    20
}

/// Pages are 1-based; page 0 is treated as page 1.
pub async fn explorer(
    State(state): State<SharedState>,
    Query(q): Query<ExplorerQuery>,
) -> Result<Json<Vec<ExplorerEntry>>, ApiError> {
    let skip = q.page.saturating_sub(1).saturating_mul(q.limit);
    let records = state.store.list(skip, q.limit).await?;
    Ok(Json(explorer_entries(&records)))
}

pub async fn analysis(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<AnalysisDetail>, ApiError> {
    let record = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;
    let result = decode_result(&record)
        .ok_or_else(|| ApiError::Internal(format!("analysis {id} has an unreadable result")))?;
    let detail = analysis_detail(result, Local::now(), &mut rand::thread_rng());
    Ok(Json(detail))
}

pub async fn history(
    State(state): State<SharedState>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<AnalysisRecord>>, ApiError> {
    Ok(Json(state.store.list(q.skip, q.limit).await?))
}
