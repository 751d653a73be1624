//! Prismiq: KOI disposition and planet-type classification service.
//! Entry point for the server binary.

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use prismiq_classifier::{
    ArchetypeTable, ClassificationPipeline, ClassifierModel, OnnxClassifier, ReferenceStats,
};
use prismiq_common::{KOI_FEATURES, PLANET_FEATURES};
use prismiq_db::{AnalysisRepository, AnalysisStore, Database, InMemoryAnalysisStore};
use prismiq_llm::{build_backend, LlmNarrator};
use prismiq_web::{build_router, AppState, WebConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, DatabaseConfig, ModelsConfig};

fn load_models(models: &ModelsConfig) -> anyhow::Result<(Arc<dyn ClassifierModel>, Arc<dyn ClassifierModel>)> {
    let mut koi = OnnxClassifier::load("koi", &models.koi_model_path, KOI_FEATURES.len())
        .with_context(|| format!("loading KOI classifier from {}", models.koi_model_path.display()))?;
    if let Some(path) = &models.koi_importance_path {
        koi = koi
            .with_importance_file(path)
            .with_context(|| format!("loading feature importance from {}", path.display()))?;
    }
    info!(path = %models.koi_model_path.display(), "loaded KOI classifier");

    let planet = OnnxClassifier::load("planet", &models.planet_model_path, PLANET_FEATURES.len())
        .with_context(|| format!("loading planet classifier from {}", models.planet_model_path.display()))?;
    info!(path = %models.planet_model_path.display(), "loaded planet-type classifier");

    Ok((Arc::new(koi), Arc::new(planet)))
}

fn load_archetypes(models: &ModelsConfig) -> anyhow::Result<ArchetypeTable> {
    match &models.archetypes_path {
        Some(path) => {
            let table = ArchetypeTable::from_path(path)
                .with_context(|| format!("loading archetypes from {}", path.display()))?;
            info!(path = %path.display(), archetypes = table.len(), "loaded archetype table");
            Ok(table)
        }
        None => Ok(ArchetypeTable::default()),
    }
}

fn build_pipeline(config: &Config) -> anyhow::Result<ClassificationPipeline> {
    let (koi, planet) = load_models(&config.models)?;

    let reference = ReferenceStats::from_path(&config.models.reference_stats_path).with_context(|| {
        format!("loading reference statistics from {}", config.models.reference_stats_path.display())
    })?;
    info!(path = %config.models.reference_stats_path.display(), "loaded reference statistics");

    let archetypes = load_archetypes(&config.models)?;

    let backend = build_backend(&config.llm.backend_config())?;
    let narrator = LlmNarrator::new(backend)
        .with_max_tokens(config.llm.max_tokens)
        .with_temperature(config.llm.temperature);
    if !narrator.is_configured() {
        warn!("text generation not configured; explanations will use placeholder text");
    }

    Ok(ClassificationPipeline::new(koi, planet, Arc::new(reference), Arc::new(archetypes))
        .with_narrator(Arc::new(narrator))
        .with_narrative_timeout(config.llm.timeout()))
}

async fn open_store(database: &DatabaseConfig) -> anyhow::Result<Arc<dyn AnalysisStore>> {
    if database.in_memory {
        warn!("using in-memory analysis store; records are lost on restart");
        return Ok(Arc::new(InMemoryAnalysisStore::new()));
    }

    let db = Database::open(&database.path)
        .await
        .with_context(|| format!("opening LanceDB at {}", database.path.display()))?;
    db.initialize().await?;
    info!(path = %database.path.display(), "LanceDB ready");
    Ok(Arc::new(AnalysisRepository::new(Arc::new(db))))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("prismiq=debug,info")),
        )
        .init();

    info!("Prismiq starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!(provider = ?config.llm.provider, model = %config.llm.model, "configuration loaded");

    let pipeline = build_pipeline(&config)?;
    let store = open_store(&config.database).await?;

    let web_config = WebConfig {
        koi_metrics_path: config.models.koi_metrics_path.clone(),
        planet_metrics_path: config.models.planet_metrics_path.clone(),
        explorer_poll: Duration::from_secs(config.server.explorer_poll_secs.max(1)),
        max_upload_bytes: config.server.max_upload_bytes,
    };
    let app = build_router(AppState::new(pipeline, store, web_config));

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
