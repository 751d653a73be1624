//! HTTP surface against mock classifiers and the in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use prismiq_classifier::{
    ArchetypeTable, ClassificationPipeline, ClassifierModel, MockClassifier, PipelineStage,
    ReferenceStats,
};
use prismiq_db::{AnalysisStore, InMemoryAnalysisStore};
use prismiq_test_utils::{
    features_json, hot_jupiter_features, reference_stats_json, super_earth_features, StubGenerator,
};
use prismiq_web::{build_router, AppEvent, AppState, WebConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

struct Harness {
    app: Router,
    store: Arc<InMemoryAnalysisStore>,
    events: tokio::sync::broadcast::Receiver<AppEvent>,
    _dir: tempfile::TempDir,
}

fn model(name: &str, code: usize, probabilities: Vec<f64>) -> Arc<dyn ClassifierModel> {
    Arc::new(MockClassifier::new(name).with_prediction(code, probabilities))
}

fn harness_with(koi: Arc<dyn ClassifierModel>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let koi_metrics = dir.path().join("koi_metrics.json");
    std::fs::write(&koi_metrics, r#"{"accuracy": 0.91, "confusion_matrix": [[50, 3], [4, 43]]}"#).unwrap();

    let pipeline = ClassificationPipeline::new(
        koi,
        model("planet", 0, vec![0.8, 0.1, 0.05, 0.03, 0.02]),
        Arc::new(ReferenceStats::from_json(&reference_stats_json()).unwrap()),
        Arc::new(ArchetypeTable::default()),
    )
    .with_narrator(Arc::new(StubGenerator::new("Consistent with a rocky planet.")));

    let store = Arc::new(InMemoryAnalysisStore::new());
    let config = WebConfig {
        koi_metrics_path: koi_metrics,
        planet_metrics_path: dir.path().join("missing.json"),
        ..WebConfig::default()
    };
    let state = AppState::new(pipeline, store.clone(), config);
    let events = state.subscribe();

    Harness { app: build_router(state), store, events, _dir: dir }
}

fn harness() -> Harness {
    harness_with(model("koi", 0, vec![0.9, 0.07, 0.03]))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_file(filename: &str, content: &str) -> Request<Body> {
    let boundary = "prismiq-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n{content}\r\n--{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_home() {
    let h = harness();
    let (status, body) = send(&h.app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Welcome to Prismiq API!"}));
}

#[tokio::test]
async fn test_predict_returns_full_result_without_storing() {
    let h = harness();
    let (status, body) = send(&h.app, post_json("/predict", &features_json(&super_earth_features()))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "Exoplanet");
    assert_eq!(body["confidence"], 0.9);
    assert_eq!(body["reliability"]["label"], "High");
    assert_eq!(body["koi_explanation"], "Consistent with a rocky planet.");
    assert_eq!(body["planet_type"]["ml_prediction"], "Super-Earth");
    assert_eq!(body["planet_type"]["rule_based_prediction"], "Super-Earth");
    assert_eq!(body["planet_type"]["agreement"], true);
    assert_eq!(h.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_predict_rejects_missing_feature() {
    let h = harness();
    let mut body = features_json(&super_earth_features());
    body.as_object_mut().unwrap().remove("koi_teq");
    let resp = h.app.clone().oneshot(post_json("/predict", &body)).await.unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn test_classifier_failure_is_500_with_detail() {
    let h = harness_with(Arc::new(MockClassifier::new("koi").failing("model file corrupt")));
    let (status, body) = send(&h.app, post_json("/predict", &features_json(&super_earth_features()))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("model file corrupt"));
}

#[tokio::test]
async fn test_predict_manual_stores_and_summarises() {
    let mut h = harness();
    let (status, body) =
        send(&h.app, post_json("/predict_manual", &features_json(&super_earth_features()))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis_id"], 1);
    assert_eq!(body["prediction"], "Exoplanet");
    assert_eq!(body["reliability"], "High");
    assert_eq!(body["planet_type"], "Super-Earth");
    assert_eq!(body["extreme_outlier"], false);
    assert!(!body["logs"].as_array().unwrap().is_empty());

    let stored = h.store.find_by_id(1).await.unwrap().unwrap();
    assert_eq!(stored.features, features_json(&super_earth_features()));
    assert_eq!(stored.explanation.as_deref(), Some("Consistent with a rocky planet."));

    let mut stages = Vec::new();
    while let Ok(event) = h.events.try_recv() {
        match event {
            AppEvent::PipelineStage { stage, .. } => stages.push(stage),
            AppEvent::AnalysisStored { analysis_id, .. } => assert_eq!(analysis_id, 1),
            AppEvent::StoreReset => panic!("unexpected reset"),
        }
    }
    assert_eq!(stages.first(), Some(&PipelineStage::Validating));
    assert_eq!(stages.last(), Some(&PipelineStage::Complete));
}

#[tokio::test]
async fn test_non_exoplanet_has_null_planet_type() {
    let h = harness_with(model("koi", 2, vec![0.1, 0.2, 0.7]));
    let (_, body) = send(&h.app, post_json("/predict_manual", &features_json(&hot_jupiter_features()))).await;
    assert_eq!(body["prediction"], "False Positive");
    assert_eq!(body["planet_type"], Value::Null);
}

#[tokio::test]
async fn test_upload_csv() {
    let h = harness();
    let csv = "koi_period,koi_duration,koi_depth,koi_prad,koi_sma,koi_incl,koi_teq,koi_model_snr\n\
               3.5,2.9,1200,1.9,0.04,89,700,25\n";
    let (status, body) = send(&h.app, post_file("koi.csv", csv)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis_id"], 1);
    assert_eq!(body["prediction"], "Exoplanet");
}

#[tokio::test]
async fn test_upload_json_array() {
    let h = harness();
    let rows = json!([features_json(&super_earth_features())]).to_string();
    let (status, body) = send(&h.app, post_file("rows.json", &rows)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["planet_type"], "Super-Earth");
}

#[tokio::test]
async fn test_upload_rejects_other_formats() {
    let h = harness();
    let (status, body) = send(&h.app, post_file("koi.txt", "whatever")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Only CSV/JSON supported");
    assert_eq!(h.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_upload_rejects_non_numeric_feature() {
    let h = harness();
    let csv = "koi_period,koi_duration,koi_depth,koi_prad,koi_sma,koi_incl,koi_teq,koi_model_snr\n\
               3.5,2.9,deep,1.9,0.04,89,700,25\n";
    let (status, body) = send(&h.app, post_file("koi.csv", csv)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("koi_depth"));
}

#[tokio::test]
async fn test_explorer_paginates() {
    let h = harness();
    for _ in 0..3 {
        send(&h.app, post_json("/predict_manual", &features_json(&super_earth_features()))).await;
    }

    let (status, body) = send(&h.app, get("/explorer?page=2&limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "analysis_id": 3,
            "prediction": "Exoplanet",
            "confidence": 0.9,
            "reliability": "High",
            "planet_type": "Super-Earth",
            "outlier_count": 0
        }])
    );

    let (_, all) = send(&h.app, get("/explorer")).await;
    assert_eq!(all.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_analysis_detail_and_404() {
    let h = harness();
    send(&h.app, post_json("/predict_manual", &features_json(&super_earth_features()))).await;

    let (status, body) = send(&h.app, get("/analysis/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "Exoplanet");
    assert_eq!(body["planet_type"]["planet_stats"]["koi_prad"]["value"], 1.9);
    assert!(body["likely_atmosphere"]["likely_gases"].as_array().unwrap().len() >= 3);
    assert_eq!(body["logs"].as_array().unwrap().len(), 7);

    let (status, body) = send(&h.app, get("/analysis/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Not found"}));
}

#[tokio::test]
async fn test_history_and_reset() {
    let h = harness();
    send(&h.app, post_json("/predict_manual", &features_json(&super_earth_features()))).await;
    send(&h.app, post_json("/predict_manual", &features_json(&hot_jupiter_features()))).await;

    let (_, history) = send(&h.app, get("/history?skip=1")).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], 2);

    let (status, body) = send(&h.app, Request::post("/reset_db").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "message": "Analysis table reset successfully"}));
    assert_eq!(h.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_metrics_pass_through_and_missing_file() {
    let h = harness();
    let (status, body) = send(&h.app, get("/metrics/koi")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confusion_matrix"], json!([[50, 3], [4, 43]]));

    let (status, body) = send(&h.app, get("/metrics/planet")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("missing.json"));
}
