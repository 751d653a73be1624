//! Analysis record definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TABLE_ANALYSES: &str = "analyses";

/// A stored classification request.
///
/// `features` and `result` are kept as JSON documents so stored rows survive
/// changes to the result shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub features: serde_json::Value,
    pub result: serde_json::Value,
    pub explanation: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for a new record; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalysis {
    pub features: serde_json::Value,
    pub result: serde_json::Value,
    pub explanation: Option<String>,
}

impl NewAnalysis {
    pub fn new(features: serde_json::Value, result: serde_json::Value) -> Self {
        Self { features, result, explanation: None }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub(crate) fn into_record(self, id: i64, created_at: DateTime<Utc>) -> AnalysisRecord {
        AnalysisRecord {
            id,
            features: self.features,
            result: self.result,
            explanation: self.explanation,
            created_at,
        }
    }
}
