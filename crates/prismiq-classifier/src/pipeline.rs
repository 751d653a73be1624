//! Two-stage classification pipeline.
//!
//! Disposition classifier → reference statistics → narrative, then, for
//! exoplanets only, planet-type classifier → statistics → fuzzy archetypes →
//! agreement → narrative. Classifier failures abort the request; narrative
//! failures degrade to a fixed placeholder.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use prismiq_common::{
    label_for, Disposition, FeatureVector, NarrativeError, TextGenerator, DisabledGenerator,
    KOI_CLASSES, KOI_FEATURES, PLANET_CLASSES, PLANET_FEATURES,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::archetypes::ArchetypeTable;
use crate::fuzzy::FuzzyClassifier;
use crate::model::{ClassifierModel, ModelError};
use crate::prompt::PromptBuilder;
use crate::reliability::{koi_reliability, planet_reliability, Reliability};
use crate::stats::{OutlierFlag, ReferenceStats, StageStatistics, ZScoreRecord};

/// Narrative text when no text generator is configured.
pub const NARRATIVE_UNCONFIGURED: &str =
    "(text generation not configured; no explanation available)";
/// Narrative text when the text generator fails or times out.
pub const NARRATIVE_UNAVAILABLE: &str = "(explanation unavailable: text generation failed)";

pub const DEFAULT_NARRATIVE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} classifier failed: {source}")]
    Classifier {
        stage: &'static str,
        #[source]
        source: ModelError,
    },
    #[error("classifier task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<PipelineError> for prismiq_common::ApiError {
    fn from(err: PipelineError) -> Self {
        prismiq_common::ApiError::Internal(err.to_string())
    }
}

// ── Progress ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Validating,
    Preprocessing,
    KoiClassifier,
    PlanetClassifier,
    Explanation,
    Finalizing,
    Complete,
}

impl PipelineStage {
    pub fn message(&self) -> &'static str {
        match self {
            PipelineStage::Validating => "Validating input...",
            PipelineStage::Preprocessing => "Preprocessing features...",
            PipelineStage::KoiClassifier => "Running KOI classifier...",
            PipelineStage::PlanetClassifier => "Running planet classifier...",
            PipelineStage::Explanation => "Fetching explanation...",
            PipelineStage::Finalizing => "Finalizing results...",
            PipelineStage::Complete => "Analysis complete",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Receives stage notifications. Best effort; must not block.
pub trait ProgressObserver: Send + Sync {
    fn on_stage(&self, stage: PipelineStage);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_stage(&self, _stage: PipelineStage) {}
}

// ── Results ─────────────────────────────────────────────────────────────────

/// Disposition-stage outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KoiAssessment {
    pub prediction: String,
    pub prediction_code: usize,
    pub probabilities: BTreeMap<String, f64>,
    /// Highest class probability.
    pub confidence: f64,
    pub reliability: Reliability,
    #[serde(flatten)]
    pub statistics: StageStatistics,
    /// Keyed by human-readable feature name; empty when the model exposes none.
    pub feature_importance: BTreeMap<String, f64>,
    pub koi_explanation: String,
}

/// Planet-type outcome, present only for exoplanets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetTypeAssessment {
    pub ml_prediction: String,
    pub ml_code: usize,
    pub ml_probabilities: BTreeMap<String, f64>,
    pub rule_based_prediction: String,
    pub rule_scores: BTreeMap<String, f64>,
    pub agreement: bool,
    pub planet_z_scores: BTreeMap<String, f64>,
    pub planet_stats: BTreeMap<String, ZScoreRecord>,
    pub planet_outliers: Vec<OutlierFlag>,
    pub planet_extreme_outlier: bool,
    pub planet_reliability: Reliability,
    pub planet_explanation: String,
}

impl PlanetTypeAssessment {
    /// Raw input value of a planet-stage feature, e.g. `koi_prad`.
    pub fn feature_value(&self, key: &str) -> Option<f64> {
        self.planet_stats.get(key).map(|r| r.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(flatten)]
    pub koi: KoiAssessment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planet_type: Option<PlanetTypeAssessment>,
}

impl ClassificationResult {
    pub fn is_exoplanet(&self) -> bool {
        self.koi.prediction == Disposition::Exoplanet.as_str()
    }

    pub fn outlier_count(&self) -> usize {
        self.koi.statistics.outlier_count()
    }
}

// ── Pipeline ────────────────────────────────────────────────────────────────

pub struct ClassificationPipeline {
    koi_model: Arc<dyn ClassifierModel>,
    planet_model: Arc<dyn ClassifierModel>,
    reference: Arc<ReferenceStats>,
    fuzzy: FuzzyClassifier,
    narrator: Arc<dyn TextGenerator>,
    narrative_timeout: Duration,
    observer: Arc<dyn ProgressObserver>,
}

impl ClassificationPipeline {
    pub fn new(
        koi_model: Arc<dyn ClassifierModel>,
        planet_model: Arc<dyn ClassifierModel>,
        reference: Arc<ReferenceStats>,
        archetypes: Arc<ArchetypeTable>,
    ) -> Self {
        Self {
            koi_model,
            planet_model,
            reference,
            fuzzy: FuzzyClassifier::new(archetypes),
            narrator: Arc::new(DisabledGenerator),
            narrative_timeout: DEFAULT_NARRATIVE_TIMEOUT,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_narrator(mut self, narrator: Arc<dyn TextGenerator>) -> Self {
        self.narrator = narrator;
        self
    }

    pub fn with_narrative_timeout(mut self, timeout: Duration) -> Self {
        self.narrative_timeout = timeout;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn reference(&self) -> &ReferenceStats {
        &self.reference
    }

    /// Classify one 8-feature row.
    pub async fn classify(&self, row: FeatureVector) -> Result<ClassificationResult, PipelineError> {
        self.observer.on_stage(PipelineStage::Validating);
        let missing = KOI_FEATURES.iter().filter(|f| !row.is_present(**f)).count();
        if missing > 0 {
            debug!(missing, "row has missing features; they score as NaN");
        }

        self.observer.on_stage(PipelineStage::Preprocessing);
        let koi_input = row.koi_vector();

        self.observer.on_stage(PipelineStage::KoiClassifier);
        let (code, proba) = run_model(self.koi_model.clone(), koi_input, "koi").await?;
        let confidence = max_probability(&proba);
        let prediction = label_for(&KOI_CLASSES, code);

        let statistics = self.reference.score(&row, &KOI_FEATURES);
        let reliability = koi_reliability(confidence, statistics.outlier_count());
        let feature_importance = self.pretty_importance();

        info!(
            model = self.koi_model.name(),
            %prediction,
            confidence,
            outliers = statistics.outlier_count(),
            extreme = statistics.extreme_outlier,
            reliability = reliability.score,
            "disposition stage complete"
        );

        let probabilities = label_probabilities(&KOI_CLASSES, &proba);

        self.observer.on_stage(PipelineStage::Explanation);
        let prompt = PromptBuilder::koi_prompt(
            &prediction,
            &row,
            &probabilities,
            &feature_importance,
            &statistics,
            &reliability,
        );
        let koi_explanation = self.narrate(&prompt, "koi").await;

        let koi = KoiAssessment {
            prediction,
            prediction_code: code,
            probabilities,
            confidence,
            reliability,
            statistics,
            feature_importance,
            koi_explanation,
        };

        let planet_type = if Disposition::from_code(code) == Some(Disposition::Exoplanet) {
            Some(self.classify_planet_type(&row).await?)
        } else {
            debug!(prediction = %koi.prediction, "skipping planet-type stage");
            None
        };

        self.observer.on_stage(PipelineStage::Finalizing);
        let result = ClassificationResult { koi, planet_type };
        self.observer.on_stage(PipelineStage::Complete);
        Ok(result)
    }

    async fn classify_planet_type(&self, row: &FeatureVector) -> Result<PlanetTypeAssessment, PipelineError> {
        self.observer.on_stage(PipelineStage::PlanetClassifier);
        let reduced = row.restrict(&PLANET_FEATURES);

        let (ml_code, proba) =
            run_model(self.planet_model.clone(), reduced.planet_vector(), "planet").await?;
        let confidence = max_probability(&proba);
        let ml_prediction = label_for(&PLANET_CLASSES, ml_code);
        let ml_probabilities = label_probabilities(&PLANET_CLASSES, &proba);

        let verdict = self.fuzzy.classify(&reduced);
        let rule_scores = verdict.score_map();
        let statistics = self.reference.score(&reduced, &PLANET_FEATURES);

        // The ML label may have no archetype (e.g. `Unknown (7)`); it then scores 0.
        let archetype_score = verdict.score_of(&ml_prediction).unwrap_or(0.0);
        let reliability = planet_reliability(confidence, archetype_score, statistics.outlier_count());
        let agreement = ml_prediction == verdict.best;

        info!(
            model = self.planet_model.name(),
            %ml_prediction,
            rule_based = %verdict.best,
            agreement,
            outliers = statistics.outlier_count(),
            reliability = reliability.score,
            "planet-type stage complete"
        );

        self.observer.on_stage(PipelineStage::Explanation);
        let prompt = PromptBuilder::planet_prompt(
            &ml_prediction,
            &ml_probabilities,
            &verdict.best,
            &rule_scores,
            &reduced,
        );
        let planet_explanation = self.narrate(&prompt, "planet").await;

        let StageStatistics { z_scores, stats, outliers, extreme_outlier } = statistics;
        Ok(PlanetTypeAssessment {
            ml_prediction,
            ml_code,
            ml_probabilities,
            rule_based_prediction: verdict.best,
            rule_scores,
            agreement,
            planet_z_scores: z_scores,
            planet_stats: stats,
            planet_outliers: outliers,
            planet_extreme_outlier: extreme_outlier,
            planet_reliability: reliability,
            planet_explanation,
        })
    }

    fn pretty_importance(&self) -> BTreeMap<String, f64> {
        self.koi_model
            .feature_importance()
            .unwrap_or_default()
            .into_iter()
            .map(|(idx, weight)| {
                let name = KOI_FEATURES
                    .get(idx)
                    .map(|f| f.pretty().to_string())
                    .unwrap_or_else(|| format!("f{}", idx));
                (name, weight)
            })
            .collect()
    }

    async fn narrate(&self, prompt: &str, stage: &'static str) -> String {
        match tokio::time::timeout(self.narrative_timeout, self.narrator.generate(prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(NarrativeError::Unconfigured)) => NARRATIVE_UNCONFIGURED.to_string(),
            Ok(Err(e)) => {
                warn!(stage, generator = self.narrator.name(), error = %e, "narrative generation failed");
                NARRATIVE_UNAVAILABLE.to_string()
            }
            Err(_) => {
                warn!(
                    stage,
                    generator = self.narrator.name(),
                    timeout_secs = self.narrative_timeout.as_secs(),
                    "narrative generation timed out"
                );
                NARRATIVE_UNAVAILABLE.to_string()
            }
        }
    }
}

/// Run one prediction on the blocking pool.
async fn run_model(
    model: Arc<dyn ClassifierModel>,
    features: Vec<f64>,
    stage: &'static str,
) -> Result<(usize, Vec<f64>), PipelineError> {
    let outcome = tokio::task::spawn_blocking(move || {
        let (code, proba) = model.predict_with_proba(&features)?;
        if proba.is_empty() {
            return Err(ModelError::InvalidOutput("empty probability vector".to_string()));
        }
        Ok((code, proba))
    })
    .await?;

    outcome.map_err(|source| {
        error!(stage, error = %source, "classifier failed");
        PipelineError::Classifier { stage, source }
    })
}

fn max_probability(proba: &[f64]) -> f64 {
    proba.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn label_probabilities(classes: &[&str], proba: &[f64]) -> BTreeMap<String, f64> {
    proba
        .iter()
        .enumerate()
        .map(|(i, &p)| (label_for(classes, i), p))
        .collect()
}
