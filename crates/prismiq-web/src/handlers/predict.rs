//! Classification endpoints.
//!
//! `/predict` returns the full result without storing it; `/predict_manual`
//! and `/upload` store the result and return the short summary.

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Local;
use prismiq_classifier::ClassificationResult;
use prismiq_common::{ApiError, KoiFeatures};
use prismiq_db::NewAnalysis;
use tracing::{debug, info};

use crate::response::{upload_summary, UploadSummary};
use crate::state::{AppEvent, SharedState};
use crate::upload::parse_upload;

pub async fn predict(
    State(state): State<SharedState>,
    Json(features): Json<KoiFeatures>,
) -> Result<Json<ClassificationResult>, ApiError> {
    let result = state.pipeline.classify(features.into()).await?;
    Ok(Json(result))
}

pub async fn predict_manual(
    State(state): State<SharedState>,
    Json(features): Json<KoiFeatures>,
) -> Result<Json<UploadSummary>, ApiError> {
    classify_and_store(&state, features).await.map(Json)
}

pub async fn upload(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<UploadSummary>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read multipart field: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            debug!(field = field.name().unwrap_or(""), "skipping non-file field");
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read {filename}: {e}")))?;

        let features = parse_upload(&filename, &data)?;
        info!(%filename, bytes = data.len(), "classifying uploaded row");
        return classify_and_store(&state, features).await.map(Json);
    }
    Err(ApiError::BadRequest("no file in upload".to_string()))
}

async fn classify_and_store(state: &SharedState, features: KoiFeatures) -> Result<UploadSummary, ApiError> {
    let result = state.pipeline.classify(features.into()).await?;

    let stored = state
        .store
        .insert(
            NewAnalysis::new(to_json(&features)?, to_json(&result)?)
                .with_explanation(result.koi.koi_explanation.clone()),
        )
        .await?;

    state.publish(AppEvent::AnalysisStored {
        analysis_id: stored.id,
        prediction: result.koi.prediction.clone(),
    });
    Ok(upload_summary(&result, stored.id, Local::now()))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}
