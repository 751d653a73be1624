//! Trained-model metrics, served verbatim from their JSON artifacts.

use std::path::Path;

use axum::extract::State;
use axum::Json;
use prismiq_common::ApiError;
use serde_json::Value;
use tracing::error;

use crate::state::SharedState;

async fn load_metrics(path: &Path) -> Result<Json<Value>, ApiError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        error!(path = %path.display(), error = %e, "failed to read metrics");
        ApiError::Internal(format!("failed to read {}: {e}", path.display()))
    })?;
    let value = serde_json::from_str(&raw).map_err(|e| {
        error!(path = %path.display(), error = %e, "metrics file is not valid JSON");
        ApiError::Internal(format!("invalid metrics file {}: {e}", path.display()))
    })?;
    Ok(Json(value))
}

pub async fn koi_metrics(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    load_metrics(&state.config.koi_metrics_path).await
}

pub async fn planet_metrics(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    load_metrics(&state.config.planet_metrics_path).await
}
