//! Response shapes derived from a [`ClassificationResult`].

use chrono::{DateTime, Local};
use prismiq_classifier::{ClassificationResult, ReliabilityLabel};
use prismiq_db::AnalysisRecord;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::atmosphere::{predict_atmosphere, AtmosphereEstimate};

/// Returned by `/upload` and `/predict_manual`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub analysis_id: i64,
    pub prediction: String,
    pub confidence: f64,
    pub reliability: ReliabilityLabel,
    pub planet_type: Option<String>,
    pub extreme_outlier: bool,
    pub logs: Vec<String>,
}

/// One row of the `/explorer` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerEntry {
    pub analysis_id: i64,
    pub prediction: String,
    pub confidence: f64,
    pub reliability: ReliabilityLabel,
    pub planet_type: Option<String>,
    pub outlier_count: usize,
}

/// Stored result extended with an atmosphere estimate and a log trail.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisDetail {
    #[serde(flatten)]
    pub result: ClassificationResult,
    pub likely_atmosphere: AtmosphereEstimate,
    pub logs: Vec<String>,
}

fn stamp(now: &DateTime<Local>, line: impl AsRef<str>) -> String {
    format!("[{}] {}", now.format("%H:%M:%S"), line.as_ref())
}

fn planet_label(result: &ClassificationResult) -> Option<String> {
    result.planet_type.as_ref().map(|p| p.ml_prediction.clone())
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

pub fn upload_summary(result: &ClassificationResult, analysis_id: i64, now: DateTime<Local>) -> UploadSummary {
    let koi = &result.koi;
    let mut logs = vec![
        stamp(&now, "Validating input..."),
        stamp(&now, format!("Disposition: {} ({:.2}%)", koi.prediction, koi.confidence * 100.0)),
        stamp(&now, format!("Outlier count = {}", koi.statistics.outlier_count())),
        stamp(&now, format!("Reliability: {}", koi.reliability.label)),
    ];
    if let Some(planet) = &result.planet_type {
        logs.push(stamp(
            &now,
            format!("Planet type: {} (rule-based: {})", planet.ml_prediction, planet.rule_based_prediction),
        ));
    }
    logs.push(stamp(&now, format!("Stored as analysis #{analysis_id}")));

    UploadSummary {
        analysis_id,
        prediction: koi.prediction.clone(),
        confidence: koi.confidence,
        reliability: koi.reliability.label,
        planet_type: planet_label(result),
        extreme_outlier: koi.statistics.extreme_outlier,
        logs,
    }
}

pub fn explorer_entry(analysis_id: i64, result: &ClassificationResult) -> ExplorerEntry {
    ExplorerEntry {
        analysis_id,
        prediction: result.koi.prediction.clone(),
        confidence: round3(result.koi.confidence),
        reliability: result.koi.reliability.label,
        planet_type: planet_label(result),
        outlier_count: result.outlier_count(),
    }
}

/// Decode a stored record's result; records that no longer decode are
/// skipped with a warning.
pub fn decode_result(record: &AnalysisRecord) -> Option<ClassificationResult> {
    match serde_json::from_value(record.result.clone()) {
        Ok(result) => Some(result),
        Err(e) => {
            warn!(analysis_id = record.id, error = %e, "stored result does not decode");
            None
        }
    }
}

pub fn explorer_entries(records: &[AnalysisRecord]) -> Vec<ExplorerEntry> {
    records
        .iter()
        .filter_map(|r| decode_result(r).map(|result| explorer_entry(r.id, &result)))
        .collect()
}

pub fn analysis_detail<R: Rng + ?Sized>(
    result: ClassificationResult,
    now: DateTime<Local>,
    rng: &mut R,
) -> AnalysisDetail {
    let planet = result.planet_type.as_ref();
    let planet_type = planet.map(|p| p.ml_prediction.as_str());
    let radius = planet.and_then(|p| p.feature_value("koi_prad"));
    let teq = planet.and_then(|p| p.feature_value("koi_teq"));

    let likely_atmosphere = predict_atmosphere(planet_type, radius, teq, rng);

    let fmt_opt = |v: Option<f64>| v.map_or_else(|| "N/A".to_string(), |v| v.to_string());
    let gases = likely_atmosphere
        .likely_gases
        .iter()
        .map(|g| g.element.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let logs = vec![
        stamp(&now, "Booting analysis pipeline..."),
        stamp(
            &now,
            format!(
                "Prediction: {} (Confidence: {:.2}%)",
                result.koi.prediction,
                result.koi.confidence * 100.0
            ),
        ),
        stamp(&now, format!("Reliability: {}", result.koi.reliability.label)),
        stamp(&now, format!("Planet Type: {}", planet_type.unwrap_or("N/A"))),
        stamp(&now, format!("Radius: {} R⊕, Temp: {} K", fmt_opt(radius), fmt_opt(teq))),
        stamp(&now, format!("Atmosphere: {}", if gases.is_empty() { "None".to_string() } else { gases })),
        stamp(&now, "Analysis complete."),
    ];

    AnalysisDetail { result, likely_atmosphere, logs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(id: i64, result: serde_json::Value) -> AnalysisRecord {
        AnalysisRecord {
            id,
            features: json!({}),
            result,
            explanation: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(0.91234), 0.912);
        assert_eq!(round3(0.9996), 1.0);
    }

    #[test]
    fn test_undecodable_records_are_skipped() {
        let entries = explorer_entries(&[record(1, json!({"prediction": "Exoplanet"}))]);
        assert!(entries.is_empty());
    }
}
