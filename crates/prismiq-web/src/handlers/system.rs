//! Welcome banner and store reset.

use axum::extract::State;
use axum::Json;
use prismiq_common::ApiError;
use serde_json::{json, Value};
use tracing::info;

use crate::state::{AppEvent, SharedState};

pub async fn home() -> Json<Value> {
    Json(json!({ "message": "Welcome to Prismiq API!" }))
}

pub async fn reset_db(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    state.store.clear().await?;
    info!("analysis table reset");
    state.publish(AppEvent::StoreReset);
    Ok(Json(json!({
        "status": "success",
        "message": "Analysis table reset successfully",
    })))
}
