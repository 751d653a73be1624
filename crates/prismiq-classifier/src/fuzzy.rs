//! Rule-based planet-type classifier.
//!
//! Each archetype score is the weighted sum of feature memberships. Scores are
//! raw magnitudes, not probabilities; the best archetype is the arg-max, with
//! exact ties going to the archetype declared first in the table.

use std::collections::BTreeMap;
use std::sync::Arc;

use prismiq_common::FeatureVector;
use serde::{Deserialize, Serialize};

use crate::archetypes::{ArchetypeSpec, ArchetypeTable};
use crate::membership::membership;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeScore {
    pub archetype: String,
    pub score: f64,
}

/// Outcome of one fuzzy classification, scores in table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyVerdict {
    pub best: String,
    pub scores: Vec<ArchetypeScore>,
}

impl FuzzyVerdict {
    /// Score of `archetype`, or `None` when the table has no such entry.
    pub fn score_of(&self, archetype: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|s| s.archetype == archetype)
            .map(|s| s.score)
    }

    pub fn best_score(&self) -> f64 {
        self.score_of(&self.best).unwrap_or(0.0)
    }

    pub fn score_map(&self) -> BTreeMap<String, f64> {
        self.scores
            .iter()
            .map(|s| (s.archetype.clone(), s.score))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct FuzzyClassifier {
    table: Arc<ArchetypeTable>,
}

impl FuzzyClassifier {
    pub fn new(table: Arc<ArchetypeTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ArchetypeTable {
        &self.table
    }

    /// Score every archetype against `row` and pick the best one.
    pub fn classify(&self, row: &FeatureVector) -> FuzzyVerdict {
        let scores: Vec<ArchetypeScore> = self
            .table
            .iter()
            .map(|spec| ArchetypeScore {
                archetype: spec.name.clone(),
                score: archetype_score(spec, row),
            })
            .collect();

        // Strict `>` keeps the earliest archetype on exact ties.
        let mut best: Option<&ArchetypeScore> = None;
        for s in &scores {
            match best {
                Some(b) if s.score > b.score => best = Some(s),
                None => best = Some(s),
                _ => {}
            }
        }
        let best = best.map(|s| s.archetype.clone()).unwrap_or_default();

        tracing::debug!(best = %best, "fuzzy archetype scoring complete");
        FuzzyVerdict { best, scores }
    }
}

/// Weighted membership sum of `row` against one archetype.
pub fn archetype_score(spec: &ArchetypeSpec, row: &FeatureVector) -> f64 {
    spec.features
        .iter()
        .map(|t| t.weight * membership(row.get(t.feature), t.primary, t.soft))
        .sum()
}
