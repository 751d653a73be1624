//! Shared application state for the web server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use prismiq_classifier::{ClassificationPipeline, PipelineStage, ProgressObserver};
use prismiq_db::AnalysisStore;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events pushed to connected clients via SSE and WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A classification request moved to a new pipeline stage
    PipelineStage { stage: PipelineStage, message: String },
    /// A classified row was persisted
    AnalysisStored { analysis_id: i64, prediction: String },
    /// The analysis table was emptied
    StoreReset,
}

/// Web-layer settings resolved from the `[server]` and `[models]` config sections.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub koi_metrics_path: PathBuf,
    pub planet_metrics_path: PathBuf,
    pub explorer_poll: Duration,
    pub max_upload_bytes: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            koi_metrics_path: PathBuf::from("models_store/koi_model_metrics.json"),
            planet_metrics_path: PathBuf::from("models_store/planet_model_metrics.json"),
            explorer_poll: Duration::from_secs(2),
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ClassificationPipeline>,
    pub store: Arc<dyn AnalysisStore>,
    pub config: WebConfig,
    /// Broadcast channel for SSE / WebSocket push events
    pub event_tx: broadcast::Sender<AppEvent>,
}

impl AppState {
    /// Wires the pipeline's stage notifications into the event channel.
    pub fn new(
        pipeline: ClassificationPipeline,
        store: Arc<dyn AnalysisStore>,
        config: WebConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let observer = BroadcastObserver { tx: event_tx.clone() };
        let pipeline = pipeline.with_observer(Arc::new(observer));
        Self { pipeline: Arc::new(pipeline), store, config, event_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Fire-and-forget; having no subscribers is not an error.
    pub fn publish(&self, event: AppEvent) {
        let _ = self.event_tx.send(event);
    }
}

pub type SharedState = Arc<AppState>;

struct BroadcastObserver {
    tx: broadcast::Sender<AppEvent>,
}

impl ProgressObserver for BroadcastObserver {
    fn on_stage(&self, stage: PipelineStage) {
        let _ = self.tx.send(AppEvent::PipelineStage {
            stage,
            message: stage.message().to_string(),
        });
    }
}
