//! Analysis repository against an on-disk LanceDB directory.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use prismiq_db::{AnalysisRepository, AnalysisStore, Database, DbError, NewAnalysis};
use serde_json::json;

async fn open_repo(dir: &tempfile::TempDir) -> AnalysisRepository {
    let db = Database::open(dir.path().join("prismiq.lance")).await.unwrap();
    db.initialize().await.unwrap();
    AnalysisRepository::new(Arc::new(db))
}

fn analysis(prediction: &str) -> NewAnalysis {
    NewAnalysis::new(
        json!({"koi_period": 3.5, "koi_prad": 1.9}),
        json!({"prediction": prediction, "confidence": 0.9}),
    )
}

#[tokio::test]
async fn test_insert_and_find() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open_repo(&dir).await;

    let stored = repo
        .insert(analysis("Exoplanet").with_explanation("deep, short transit"))
        .await
        .unwrap();
    assert_eq!(stored.id, 1);

    let found = repo.find_by_id(1).await.unwrap().unwrap();
    assert_eq!(found.result["prediction"], "Exoplanet");
    assert_eq!(found.explanation.as_deref(), Some("deep, short transit"));
    assert!(repo.find_by_id(2).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_count_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open_repo(&dir).await;
    for p in ["Exoplanet", "Candidate", "False Positive"] {
        repo.insert(analysis(p)).await.unwrap();
    }

    assert_eq!(repo.count().await.unwrap(), 3);
    let ids: Vec<i64> = repo.list(0, 2).await.unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2]);

    repo.clear().await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 0);
    assert_eq!(repo.insert(analysis("Candidate")).await.unwrap().id, 1);
}

#[tokio::test]
async fn test_ids_continue_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let repo = open_repo(&dir).await;
        repo.insert(analysis("Exoplanet")).await.unwrap();
        repo.insert(analysis("Candidate")).await.unwrap();
    }
    let repo = open_repo(&dir).await;
    let next = repo.insert(analysis("False Positive")).await.unwrap();
    assert_eq!(next.id, 3);
}

#[tokio::test]
async fn test_trait_object_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn AnalysisStore> = Arc::new(open_repo(&dir).await);
    store.insert(analysis("Exoplanet")).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_uninitialized_table_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("empty.lance")).await.unwrap();
    let repo = AnalysisRepository::new(Arc::new(db));
    assert!(matches!(repo.count().await, Err(DbError::TableNotFound(_))));
}
