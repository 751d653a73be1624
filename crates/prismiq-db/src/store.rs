//! Storage seam used by the web layer.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::analyses::AnalysisRepository;
use crate::error::Result;
use crate::schema::{AnalysisRecord, NewAnalysis};

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn insert(&self, analysis: NewAnalysis) -> Result<AnalysisRecord>;
    async fn find_by_id(&self, id: i64) -> Result<Option<AnalysisRecord>>;
    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<AnalysisRecord>>;
    async fn count(&self) -> Result<u64>;
    async fn clear(&self) -> Result<()>;
}

#[async_trait]
impl AnalysisStore for AnalysisRepository {
    async fn insert(&self, analysis: NewAnalysis) -> Result<AnalysisRecord> {
        AnalysisRepository::insert(self, analysis).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<AnalysisRecord>> {
        AnalysisRepository::find_by_id(self, id).await
    }

    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<AnalysisRecord>> {
        AnalysisRepository::list(self, offset, limit).await
    }

    async fn count(&self) -> Result<u64> {
        AnalysisRepository::count(self).await
    }

    async fn clear(&self) -> Result<()> {
        AnalysisRepository::clear(self).await
    }
}

/// Process-local store for tests and `database.in_memory = true`.
#[derive(Default)]
pub struct InMemoryAnalysisStore {
    inner: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    records: Vec<AnalysisRecord>,
    last_id: i64,
}

impl InMemoryAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalysisStore for InMemoryAnalysisStore {
    async fn insert(&self, analysis: NewAnalysis) -> Result<AnalysisRecord> {
        let mut state = self.inner.write().await;
        state.last_id += 1;
        let record = analysis.into_record(state.last_id, Utc::now());
        state.records.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<AnalysisRecord>> {
        let state = self.inner.read().await;
        Ok(state.records.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<AnalysisRecord>> {
        let state = self.inner.read().await;
        Ok(state.records.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.inner.read().await.records.len() as u64)
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.inner.write().await;
        state.records.clear();
        state.last_id = 0;
        Ok(())
    }
}
