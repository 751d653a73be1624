//! Analysis repository on LanceDB.
//!
//! Identifiers are sequential integers starting at 1. LanceDB has no
//! sequence type, so the next id is derived from the table on first insert
//! and tracked under a mutex afterwards; inserts are serialised through it.

use std::sync::Arc;

use arrow_array::{Array, Int64Array, RecordBatchIterator};
use chrono::Utc;
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::Table;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::schema::{AnalysisRecord, NewAnalysis, TABLE_ANALYSES};
use crate::schema_arrow::{analysis_to_record, batch_to_analyses};

#[derive(Clone)]
pub struct AnalysisRepository {
    db: Arc<Database>,
    next_id: Arc<Mutex<Option<i64>>>,
}

impl AnalysisRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db, next_id: Arc::new(Mutex::new(None)) }
    }

    async fn table(&self) -> Result<Table> {
        self.db
            .connection()
            .open_table(TABLE_ANALYSES)
            .execute()
            .await
            .map_err(|e| match e {
                lancedb::Error::TableNotFound { .. } => DbError::TableNotFound(TABLE_ANALYSES.to_string()),
                other => other.into(),
            })
    }

    async fn max_id(&self, table: &Table) -> Result<i64> {
        let mut stream = table
            .query()
            .select(Select::columns(&["id"]))
            .execute()
            .await?;

        let mut max = 0;
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            let ids = batch
                .column_by_name("id")
                .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
                .ok_or_else(|| DbError::CorruptRecord {
                    column: "id",
                    reason: "unexpected column type".to_string(),
                })?;
            if let Some(batch_max) = ids.iter().flatten().max() {
                max = max.max(batch_max);
            }
        }
        Ok(max)
    }

    /// Append one record and return it with its assigned id.
    pub async fn insert(&self, analysis: NewAnalysis) -> Result<AnalysisRecord> {
        let table = self.table().await?;
        let mut next = self.next_id.lock().await;
        let id = match *next {
            Some(id) => id,
            None => self.max_id(&table).await? + 1,
        };

        let record = analysis.into_record(id, Utc::now());
        let batch = analysis_to_record(&record)?;
        let schema = batch.schema();
        table
            .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
            .execute()
            .await?;

        *next = Some(id + 1);
        debug!(id, "stored analysis");
        Ok(record)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<AnalysisRecord>> {
        let table = self.table().await?;
        let mut stream = table
            .query()
            .only_if(&format!("id = {id}"))
            .limit(1)
            .execute()
            .await?;

        while let Some(batch) = stream.next().await {
            let batch = batch?;
            if batch.num_rows() > 0 {
                return Ok(batch_to_analyses(&batch)?.into_iter().next());
            }
        }
        Ok(None)
    }

    /// Records in insertion order, paginated.
    pub async fn list(&self, offset: usize, limit: usize) -> Result<Vec<AnalysisRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let table = self.table().await?;
        let mut stream = table
            .query()
            .limit(limit)
            .offset(offset)
            .execute()
            .await?;

        let mut records = Vec::new();
        while let Some(batch) = stream.next().await {
            records.extend(batch_to_analyses(&batch?)?);
        }
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    pub async fn count(&self) -> Result<u64> {
        let table = self.table().await?;
        Ok(table.count_rows(None).await? as u64)
    }

    /// Delete every record and restart ids at 1.
    pub async fn clear(&self) -> Result<()> {
        let table = self.table().await?;
        let mut next = self.next_id.lock().await;
        table.delete("id IS NOT NULL").await?;
        *next = Some(1);
        info!(table = TABLE_ANALYSES, "cleared analyses");
        Ok(())
    }
}
