//! End-to-end tests of the classification pipeline with mock classifiers.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use prismiq_classifier::{
    ArchetypeTable, ClassificationPipeline, ClassifierModel, MockClassifier, ModelError, PipelineError,
    PipelineStage, ProgressObserver, ReferenceStats, ReliabilityLabel, NARRATIVE_UNAVAILABLE,
    NARRATIVE_UNCONFIGURED,
};
use prismiq_test_utils::{
    reference_stats_json, super_earth_row, unit_reference_stats_json, FailingGenerator,
    SlowGenerator, StubGenerator,
};

fn koi_model(code: usize, probabilities: Vec<f64>) -> Arc<dyn ClassifierModel> {
    Arc::new(MockClassifier::new("koi").with_prediction(code, probabilities).expecting(8))
}

fn planet_model(code: usize, probabilities: Vec<f64>) -> Arc<dyn ClassifierModel> {
    Arc::new(MockClassifier::new("planet").with_prediction(code, probabilities).expecting(6))
}

fn exoplanet_koi() -> Arc<dyn ClassifierModel> {
    koi_model(0, vec![0.9, 0.07, 0.03])
}

fn super_earth_planet() -> Arc<dyn ClassifierModel> {
    planet_model(0, vec![0.8, 0.1, 0.05, 0.03, 0.02])
}

fn pipeline(
    koi: Arc<dyn ClassifierModel>,
    planet: Arc<dyn ClassifierModel>,
    reference_json: &str,
) -> ClassificationPipeline {
    ClassificationPipeline::new(
        koi,
        planet,
        Arc::new(ReferenceStats::from_json(reference_json).unwrap()),
        Arc::new(ArchetypeTable::default()),
    )
}

#[derive(Default)]
struct RecordingObserver {
    stages: Mutex<Vec<PipelineStage>>,
}

impl ProgressObserver for RecordingObserver {
    fn on_stage(&self, stage: PipelineStage) {
        self.stages.lock().push(stage);
    }
}

#[tokio::test]
async fn test_super_earth_end_to_end_agreement() {
    let narrator = Arc::new(StubGenerator::new("A compact rocky world."));
    let pipeline = pipeline(exoplanet_koi(), super_earth_planet(), &reference_stats_json())
        .with_narrator(narrator.clone());

    let result = pipeline.classify(super_earth_row()).await.unwrap();

    assert_eq!(result.koi.prediction, "Exoplanet");
    assert_eq!(result.koi.prediction_code, 0);
    assert_eq!(result.koi.confidence, 0.9);
    assert!(result.koi.statistics.outliers.is_empty());
    assert!(!result.koi.statistics.extreme_outlier);
    assert_eq!(result.koi.reliability.score, 0.9);
    assert_eq!(result.koi.reliability.label, ReliabilityLabel::High);
    assert_eq!(result.koi.koi_explanation, "A compact rocky world.");

    let planet = result.planet_type.expect("exoplanets carry a planet-type stage");
    assert_eq!(planet.ml_prediction, "Super-Earth");
    assert_eq!(planet.rule_based_prediction, "Super-Earth");
    assert!(planet.agreement);

    let top = planet
        .rule_scores
        .values()
        .copied()
        .fold(f64::MIN, f64::max);
    assert_eq!(planet.rule_scores["Super-Earth"], top);

    // 0.8 × Super-Earth archetype score × exp(0)
    let expected = 0.8 * planet.rule_scores["Super-Earth"];
    assert!((planet.planet_reliability.score - expected).abs() < 1e-12);
    assert_eq!(planet.planet_reliability.label, ReliabilityLabel::Medium);
    assert_eq!(planet.planet_z_scores.len(), 6);
    assert_eq!(planet.feature_value("koi_prad"), Some(1.9));

    assert_eq!(narrator.calls(), 2);
}

#[tokio::test]
async fn test_planet_stage_only_for_exoplanets() {
    for code in [1, 2] {
        // The planet model would fail if called.
        let pipeline = pipeline(
            koi_model(code, vec![0.1, 0.3, 0.6]),
            Arc::new(MockClassifier::new("planet").failing("must not run")),
            &reference_stats_json(),
        );
        let result = pipeline.classify(super_earth_row()).await.unwrap();
        assert!(result.planet_type.is_none(), "code {code}");
        assert!(!result.is_exoplanet());
    }
}

#[tokio::test]
async fn test_koi_classifier_failure_is_fatal() {
    let pipeline = pipeline(
        Arc::new(MockClassifier::new("koi").failing("artifact missing")),
        super_earth_planet(),
        &reference_stats_json(),
    );
    let err = pipeline.classify(super_earth_row()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Classifier { stage: "koi", .. }), "{err}");
}

#[tokio::test]
async fn test_planet_classifier_failure_is_fatal() {
    let pipeline = pipeline(
        exoplanet_koi(),
        Arc::new(MockClassifier::new("planet").expecting(8)),
        &reference_stats_json(),
    );
    let err = pipeline.classify(super_earth_row()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Classifier { stage: "planet", .. }), "{err}");
    assert!(err.to_string().contains("expected 8 input features, got 6"));
}

#[tokio::test]
async fn test_narrative_failure_only_touches_text() {
    let ok = pipeline(exoplanet_koi(), super_earth_planet(), &reference_stats_json())
        .with_narrator(Arc::new(StubGenerator::new("text")))
        .classify(super_earth_row())
        .await
        .unwrap();
    let failed = pipeline(exoplanet_koi(), super_earth_planet(), &reference_stats_json())
        .with_narrator(Arc::new(FailingGenerator))
        .classify(super_earth_row())
        .await
        .unwrap();

    assert_eq!(failed.koi.koi_explanation, NARRATIVE_UNAVAILABLE);
    let failed_planet = failed.planet_type.clone().unwrap();
    assert_eq!(failed_planet.planet_explanation, NARRATIVE_UNAVAILABLE);

    let mut patched = failed.clone();
    patched.koi.koi_explanation = ok.koi.koi_explanation.clone();
    if let (Some(p), Some(o)) = (patched.planet_type.as_mut(), ok.planet_type.as_ref()) {
        p.planet_explanation = o.planet_explanation.clone();
    }
    assert_eq!(patched, ok);
}

#[tokio::test]
async fn test_unconfigured_narrator_uses_placeholder() {
    let result = pipeline(koi_model(1, vec![0.2, 0.7, 0.1]), super_earth_planet(), &reference_stats_json())
        .classify(super_earth_row())
        .await
        .unwrap();
    assert_eq!(result.koi.koi_explanation, NARRATIVE_UNCONFIGURED);
}

#[tokio::test]
async fn test_slow_narrator_times_out_to_placeholder() {
    let result = pipeline(koi_model(2, vec![0.1, 0.1, 0.8]), super_earth_planet(), &reference_stats_json())
        .with_narrator(Arc::new(SlowGenerator { delay: Duration::from_secs(5) }))
        .with_narrative_timeout(Duration::from_millis(20))
        .classify(super_earth_row())
        .await
        .unwrap();
    assert_eq!(result.koi.koi_explanation, NARRATIVE_UNAVAILABLE);
    assert_eq!(result.koi.prediction, "False Positive");
}

#[tokio::test]
async fn test_repeated_classification_is_identical() {
    let pipeline = pipeline(exoplanet_koi(), super_earth_planet(), &reference_stats_json())
        .with_narrator(Arc::new(StubGenerator::new("same")));

    let first = serde_json::to_string(&pipeline.classify(super_earth_row()).await.unwrap()).unwrap();
    let second = serde_json::to_string(&pipeline.classify(super_earth_row()).await.unwrap()).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_outliers_reduce_reliability() {
    // Unit statistics: z equals the raw value.
    let result = pipeline(exoplanet_koi(), super_earth_planet(), &unit_reference_stats_json())
        .classify(super_earth_row())
        .await
        .unwrap();

    let flagged: Vec<&str> = result
        .koi
        .statistics
        .outliers
        .iter()
        .map(|o| o.feature.as_str())
        .collect();
    assert_eq!(flagged, vec!["koi_period", "koi_depth", "koi_incl", "koi_teq", "koi_model_snr"]);
    assert!(result.koi.statistics.extreme_outlier);
    assert!((result.koi.reliability.score - 0.9 * (-0.75f64).exp()).abs() < 1e-12);
    assert_eq!(result.koi.reliability.label, ReliabilityLabel::Low);

    let planet = result.planet_type.unwrap();
    assert_eq!(planet.planet_outliers.len(), 3);
    assert!(planet.planet_extreme_outlier);
}

#[tokio::test]
async fn test_feature_importance_uses_pretty_names() {
    let importance: BTreeMap<usize, f64> = [(0, 5.0), (3, 2.0), (12, 1.0)].into_iter().collect();
    let koi = Arc::new(
        MockClassifier::new("koi")
            .with_prediction(2, vec![0.1, 0.2, 0.7])
            .with_importance(importance),
    );
    let result = pipeline(koi, super_earth_planet(), &reference_stats_json())
        .classify(super_earth_row())
        .await
        .unwrap();

    let keys: Vec<&str> = result.koi.feature_importance.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["Orbital Period (days)", "Planet Radius (Earth radii)", "f12"]);
}

#[tokio::test]
async fn test_unknown_planet_label_scores_zero() {
    let result = pipeline(exoplanet_koi(), planet_model(7, vec![0.9, 0.1]), &reference_stats_json())
        .classify(super_earth_row())
        .await
        .unwrap();

    let planet = result.planet_type.unwrap();
    assert_eq!(planet.ml_prediction, "Unknown (7)");
    assert!(!planet.agreement);
    assert_eq!(planet.planet_reliability.score, 0.0);
    assert_eq!(planet.planet_reliability.label, ReliabilityLabel::Low);
}

#[tokio::test]
async fn test_observer_sees_stages_in_order() {
    let observer = Arc::new(RecordingObserver::default());
    pipeline(exoplanet_koi(), super_earth_planet(), &reference_stats_json())
        .with_observer(observer.clone())
        .classify(super_earth_row())
        .await
        .unwrap();

    let stages = observer.stages.lock().clone();
    assert_eq!(
        stages,
        vec![
            PipelineStage::Validating,
            PipelineStage::Preprocessing,
            PipelineStage::KoiClassifier,
            PipelineStage::Explanation,
            PipelineStage::PlanetClassifier,
            PipelineStage::Explanation,
            PipelineStage::Finalizing,
            PipelineStage::Complete,
        ]
    );
}

#[tokio::test]
async fn test_result_json_shape_round_trips() {
    let result = pipeline(exoplanet_koi(), super_earth_planet(), &reference_stats_json())
        .classify(super_earth_row())
        .await
        .unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["prediction"], "Exoplanet");
    assert_eq!(json["reliability"]["label"], "High");
    assert!(json["z_scores"]["koi_incl"].is_number());
    assert_eq!(json["stats"]["koi_prad"]["value"], 1.9);
    assert_eq!(json["planet_type"]["planet_stats"]["koi_teq"]["value"], 700.0);
    assert_eq!(json["planet_type"]["agreement"], true);

    let back: prismiq_classifier::ClassificationResult = serde_json::from_value(json).unwrap();
    assert_eq!(back, result);
}

/// Answers only through the combined call, counting how often it runs.
struct SinglePassModel {
    code: usize,
    probabilities: Vec<f64>,
    runs: AtomicUsize,
}

impl SinglePassModel {
    fn new(code: usize, probabilities: Vec<f64>) -> Self {
        Self { code, probabilities, runs: AtomicUsize::new(0) }
    }
}

impl ClassifierModel for SinglePassModel {
    fn predict(&self, _features: &[f64]) -> Result<usize, ModelError> {
        Err(ModelError::Inference("separate predict call".to_string()))
    }

    fn predict_proba(&self, _features: &[f64]) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::Inference("separate predict_proba call".to_string()))
    }

    fn predict_with_proba(&self, _features: &[f64]) -> Result<(usize, Vec<f64>), ModelError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok((self.code, self.probabilities.clone()))
    }

    fn name(&self) -> &str {
        "single-pass"
    }
}

#[tokio::test]
async fn test_each_classifier_runs_once_per_request() {
    let koi = Arc::new(SinglePassModel::new(0, vec![0.9, 0.07, 0.03]));
    let planet = Arc::new(SinglePassModel::new(0, vec![0.8, 0.1, 0.05, 0.03, 0.02]));

    let result = pipeline(koi.clone(), planet.clone(), &reference_stats_json())
        .classify(super_earth_row())
        .await
        .unwrap();

    assert_eq!(result.koi.prediction, "Exoplanet");
    assert_eq!(result.planet_type.unwrap().ml_prediction, "Super-Earth");
    assert_eq!(koi.runs.load(Ordering::SeqCst), 1);
    assert_eq!(planet.runs.load(Ordering::SeqCst), 1);
}
