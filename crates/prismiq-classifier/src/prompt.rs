//! Prompt templates for the narrative explanations.

use std::collections::BTreeMap;

use prismiq_common::{FeatureVector, KOI_FEATURES, PLANET_FEATURES};

use crate::reliability::Reliability;
use crate::stats::StageStatistics;

/// Prompt builder for both classification stages.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Explanation request for the disposition stage.
    pub fn koi_prompt(
        prediction: &str,
        row: &FeatureVector,
        probabilities: &BTreeMap<String, f64>,
        importance: &BTreeMap<String, f64>,
        statistics: &StageStatistics,
        reliability: &Reliability,
    ) -> String {
        format!(
            r#"You are an astrophysicist.
The disposition classifier predicted: {prediction}.
Input features: {features}.
Class probabilities: {probabilities}.
Global feature importance: {importance}.
Input z-scores: {z_scores}.
Outlier flags: {outliers}.
Reliability score: {label} ({score:.2}%).

Please provide a scientific explanation for why this object was classified as {prediction}. Discuss:
1. Which input features align with known exoplanet/candidate/false positive patterns.
2. How the probability distribution indicates model certainty.
3. How unusual (z-score) feature values may have influenced the prediction.
4. If outlier flags are present, explicitly mention how they may reduce reliability.
5. If reliability is not High, explain why and how outliers reduced it.
Keep it clear, technical, and astronomy-focused.
"#,
            prediction = prediction,
            features = Self::format_pretty_features(row, &KOI_FEATURES),
            probabilities = Self::format_map(probabilities),
            importance = Self::format_map(importance),
            z_scores = Self::format_map(&statistics.z_scores),
            outliers = statistics.outlier_summary(),
            label = reliability.label,
            score = reliability.score * 100.0,
        )
    }

    /// Explanation request comparing the ML and rule-based planet types.
    pub fn planet_prompt(
        ml_prediction: &str,
        ml_probabilities: &BTreeMap<String, f64>,
        rule_prediction: &str,
        rule_scores: &BTreeMap<String, f64>,
        row: &FeatureVector,
    ) -> String {
        format!(
            r#"The exoplanet was detected. Two systems classified its type:
- ML model -> {ml_prediction}, probabilities {ml_probabilities}.
- Rule-based fuzzy system -> {rule_prediction}, scores {rule_scores}.
Features used: {features}.
Please give a clear astronomy-focused explanation of why they agree/disagree, which features influenced both systems, and what type is more likely.
"#,
            ml_prediction = ml_prediction,
            ml_probabilities = Self::format_map(ml_probabilities),
            rule_prediction = rule_prediction,
            rule_scores = Self::format_map(rule_scores),
            features = Self::format_keyed_features(row),
        )
    }

    fn format_pretty_features(row: &FeatureVector, features: &[prismiq_common::Feature]) -> String {
        let parts: Vec<String> = features
            .iter()
            .map(|f| format!("{}: {}", f.pretty(), row.get(*f)))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }

    fn format_keyed_features(row: &FeatureVector) -> String {
        let parts: Vec<String> = PLANET_FEATURES
            .iter()
            .map(|f| format!("{}: {}", f.key(), row.get(*f)))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }

    fn format_map(map: &BTreeMap<String, f64>) -> String {
        if map.is_empty() {
            return "{}".to_string();
        }
        let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}: {:.4}", k, v)).collect();
        format!("{{{}}}", parts.join(", "))
    }
}
