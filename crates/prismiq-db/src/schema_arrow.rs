//! Arrow conversion for analysis records.
//!
//! JSON documents are stored as UTF-8 columns; timestamps as RFC 3339 text.

use std::sync::Arc;

use arrow_array::{Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use chrono::{DateTime, Utc};

use crate::error::{DbError, Result};
use crate::schema::AnalysisRecord;

pub fn analysis_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("features", DataType::Utf8, false),
        Field::new("result", DataType::Utf8, false),
        Field::new("explanation", DataType::Utf8, true),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

pub fn analysis_to_record(analysis: &AnalysisRecord) -> Result<RecordBatch> {
    let id = Int64Array::from(vec![analysis.id]);
    let features = StringArray::from(vec![serde_json::to_string(&analysis.features)?]);
    let result = StringArray::from(vec![serde_json::to_string(&analysis.result)?]);
    let explanation = StringArray::from(vec![analysis.explanation.as_deref()]);
    let created_at = StringArray::from(vec![analysis.created_at.to_rfc3339()]);

    Ok(RecordBatch::try_new(
        analysis_schema(),
        vec![
            Arc::new(id) as Arc<dyn Array>,
            Arc::new(features),
            Arc::new(result),
            Arc::new(explanation),
            Arc::new(created_at),
        ],
    )?)
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &'static str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DbError::CorruptRecord { column: name, reason: "missing column".to_string() })?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| DbError::CorruptRecord { column: name, reason: "unexpected column type".to_string() })
}

pub fn record_to_analysis(batch: &RecordBatch, row: usize) -> Result<AnalysisRecord> {
    let ids = column::<Int64Array>(batch, "id")?;
    let features = column::<StringArray>(batch, "features")?;
    let results = column::<StringArray>(batch, "result")?;
    let explanations = column::<StringArray>(batch, "explanation")?;
    let created = column::<StringArray>(batch, "created_at")?;

    let created_at = DateTime::parse_from_rfc3339(created.value(row))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::CorruptRecord { column: "created_at", reason: e.to_string() })?;

    Ok(AnalysisRecord {
        id: ids.value(row),
        features: serde_json::from_str(features.value(row))?,
        result: serde_json::from_str(results.value(row))?,
        explanation: (!explanations.is_null(row)).then(|| explanations.value(row).to_string()),
        created_at,
    })
}

pub fn batch_to_analyses(batch: &RecordBatch) -> Result<Vec<AnalysisRecord>> {
    (0..batch.num_rows()).map(|row| record_to_analysis(batch, row)).collect()
}
