//! Axum router: maps all URL paths to handlers.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::analyses::{analysis, explorer, history};
use crate::handlers::metrics::{koi_metrics, planet_metrics};
use crate::handlers::predict::{predict, predict_manual, upload};
use crate::handlers::system::{home, reset_db};
use crate::sse::sse_handler;
use crate::state::{AppState, SharedState};
use crate::ws::{ws_explorer, ws_logs};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/", get(home))

        // Classification
        .route("/predict",        post(predict))
        .route("/predict_manual", post(predict_manual))
        .route("/upload",         post(upload))

        // Stored analyses
        .route("/explorer",       get(explorer))
        .route("/analysis/{id}",  get(analysis))
        .route("/history",        get(history))
        .route("/reset_db",       post(reset_db))

        // Model metrics
        .route("/metrics/koi",    get(koi_metrics))
        .route("/metrics/planet", get(planet_metrics))

        // Live progress
        .route("/ws/logs",        get(ws_logs))
        .route("/ws/explorer",    get(ws_explorer))
        .route("/api/events",     get(sse_handler))

        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
