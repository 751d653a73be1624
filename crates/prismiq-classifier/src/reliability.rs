//! Composite reliability of a model prediction.
//!
//! `score = confidence × exp(−0.15 × outliers)` at the KOI stage; the planet
//! stage additionally multiplies in the fuzzy score of the ML-predicted type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exponential penalty per flagged outlier.
pub const OUTLIER_DECAY: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReliabilityLabel {
    High,
    Medium,
    Low,
}

impl ReliabilityLabel {
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            ReliabilityLabel::High
        } else if score > 0.5 {
            ReliabilityLabel::Medium
        } else {
            ReliabilityLabel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReliabilityLabel::High => "High",
            ReliabilityLabel::Medium => "Medium",
            ReliabilityLabel::Low => "Low",
        }
    }
}

impl fmt::Display for ReliabilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reliability {
    pub score: f64,
    pub label: ReliabilityLabel,
}

impl Reliability {
    pub fn from_score(score: f64) -> Self {
        Self { score, label: ReliabilityLabel::from_score(score) }
    }
}

fn outlier_penalty(outliers: usize) -> f64 {
    (-OUTLIER_DECAY * outliers as f64).exp()
}

pub fn koi_reliability(confidence: f64, outliers: usize) -> Reliability {
    Reliability::from_score(confidence * outlier_penalty(outliers))
}

/// `archetype_score` is the fuzzy score of the ML-predicted label
/// (0 when the label has no archetype).
pub fn planet_reliability(confidence: f64, archetype_score: f64, outliers: usize) -> Reliability {
    Reliability::from_score(confidence * archetype_score * outlier_penalty(outliers))
}
