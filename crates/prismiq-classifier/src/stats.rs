//! Z-scores of a feature row against the reference population.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use prismiq_common::{Feature, FeatureVector, KOI_FEATURES};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// |z| above this marks a feature as an outlier.
pub const OUTLIER_Z: f64 = 3.0;
/// |z| above this marks the row as an extreme outlier.
pub const EXTREME_Z: f64 = 5.0;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("failed to read reference statistics {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse reference statistics: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("reference statistics have no {kind} for {feature}")]
    Missing { kind: &'static str, feature: Feature },
    #[error("reference {kind} for {feature} is not finite")]
    NotFinite { kind: &'static str, feature: Feature },
}

#[derive(Debug, Deserialize)]
struct RawReference {
    means: HashMap<String, f64>,
    stds: HashMap<String, f64>,
}

/// Per-feature population mean and standard deviation. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceStats {
    means: [f64; 8],
    stds: [f64; 8],
}

impl ReferenceStats {
    /// Build from `means`/`stds` maps keyed by catalogue column name.
    /// All eight KOI features are required; other keys are ignored.
    /// A standard deviation of exactly zero is stored as 1.
    pub fn from_maps(
        means: &HashMap<String, f64>,
        stds: &HashMap<String, f64>,
    ) -> Result<Self, StatsError> {
        let mut out = Self { means: [0.0; 8], stds: [1.0; 8] };
        for feature in KOI_FEATURES {
            let mean = lookup(means, feature, "mean")?;
            let std = lookup(stds, feature, "std")?;
            out.means[feature.index()] = mean;
            out.stds[feature.index()] = if std == 0.0 { 1.0 } else { std };
        }
        Ok(out)
    }

    /// Parse the `{"means": {...}, "stds": {...}}` artifact.
    pub fn from_json(raw: &str) -> Result<Self, StatsError> {
        let parsed: RawReference = serde_json::from_str(raw)?;
        Self::from_maps(&parsed.means, &parsed.stds)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StatsError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| StatsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn mean(&self, feature: Feature) -> f64 {
        self.means[feature.index()]
    }

    /// Effective standard deviation (never zero).
    pub fn std(&self, feature: Feature) -> f64 {
        self.stds[feature.index()]
    }

    pub fn z_score(&self, feature: Feature, value: f64) -> f64 {
        (value - self.mean(feature)) / self.std(feature)
    }

    /// Z-scores, outliers and the extreme flag of `row` over `features`.
    pub fn score(&self, row: &FeatureVector, features: &[Feature]) -> StageStatistics {
        let mut z_scores = BTreeMap::new();
        let mut stats = BTreeMap::new();
        let mut outliers = Vec::new();
        let mut extreme_outlier = false;

        for &feature in features {
            let value = row.get(feature);
            let record = ZScoreRecord {
                value,
                mean: self.mean(feature),
                std: self.std(feature),
                z: self.z_score(feature, value),
            };
            // NaN compares false, so missing values never flag.
            if record.z.abs() > OUTLIER_Z {
                outliers.push(OutlierFlag { feature: feature.key().to_string(), z: record.z });
            }
            if record.z.abs() > EXTREME_Z {
                extreme_outlier = true;
            }
            z_scores.insert(feature.key().to_string(), record.z);
            stats.insert(feature.key().to_string(), record);
        }

        StageStatistics { z_scores, stats, outliers, extreme_outlier }
    }
}

fn lookup(map: &HashMap<String, f64>, feature: Feature, kind: &'static str) -> Result<f64, StatsError> {
    let v = *map
        .get(feature.key())
        .ok_or(StatsError::Missing { kind, feature })?;
    if !v.is_finite() {
        return Err(StatsError::NotFinite { kind, feature });
    }
    Ok(v)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZScoreRecord {
    pub value: f64,
    pub mean: f64,
    pub std: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierFlag {
    pub feature: String,
    pub z: f64,
}

/// Statistical profile of one classification stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageStatistics {
    pub z_scores: BTreeMap<String, f64>,
    pub stats: BTreeMap<String, ZScoreRecord>,
    /// Flagged features in stage column order.
    pub outliers: Vec<OutlierFlag>,
    pub extreme_outlier: bool,
}

impl StageStatistics {
    pub fn outlier_count(&self) -> usize {
        self.outliers.len()
    }

    /// `feature (Z=1.23); ...`, or the literal `"None"` when nothing was flagged.
    pub fn outlier_summary(&self) -> String {
        if self.outliers.is_empty() {
            return "None".to_string();
        }
        self.outliers
            .iter()
            .map(|o| format!("{} (Z={:.2})", o.feature, o.z))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
