//! Contract for the trained statistical classifiers.
//!
//! The pipeline only sees this trait, so the ONNX-backed classifiers and the
//! in-process mock used by tests are interchangeable.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact not found: {0}")]
    NotFound(String),
    #[error("failed to load model: {0}")]
    Load(String),
    #[error("expected {expected} input features, got {actual}")]
    Shape { expected: usize, actual: usize },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("model produced an invalid output: {0}")]
    InvalidOutput(String),
}

/// A trained classifier over a fixed-width feature row.
///
/// Implementations must be deterministic for a given input.
pub trait ClassifierModel: Send + Sync {
    /// Index of the predicted class.
    fn predict(&self, features: &[f64]) -> Result<usize, ModelError>;

    /// Class probabilities, indexed by class code.
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ModelError>;

    /// Predicted class and probabilities from one call. Backends that get both
    /// from a single inference pass should override this.
    fn predict_with_proba(&self, features: &[f64]) -> Result<(usize, Vec<f64>), ModelError> {
        Ok((self.predict(features)?, self.predict_proba(features)?))
    }

    /// Global importance keyed by input column index, when the model exposes it.
    fn feature_importance(&self) -> Option<BTreeMap<usize, f64>> {
        None
    }

    /// Short identifier for logs.
    fn name(&self) -> &str;
}

// ── Mock Implementation for Testing ────────────────────────────────────────

/// Classifier returning a fixed answer, for tests and offline runs.
#[derive(Debug, Clone)]
pub struct MockClassifier {
    name: String,
    n_features: Option<usize>,
    class: usize,
    probabilities: Vec<f64>,
    importance: Option<BTreeMap<usize, f64>>,
    fail_with: Option<String>,
}

impl MockClassifier {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            n_features: None,
            class: 0,
            probabilities: vec![1.0],
            importance: None,
            fail_with: None,
        }
    }

    /// Predict `class` with the given probability vector.
    pub fn with_prediction(mut self, class: usize, probabilities: Vec<f64>) -> Self {
        self.class = class;
        self.probabilities = probabilities;
        self
    }

    /// Reject rows whose width is not `n`.
    pub fn expecting(mut self, n: usize) -> Self {
        self.n_features = Some(n);
        self
    }

    pub fn with_importance(mut self, importance: BTreeMap<usize, f64>) -> Self {
        self.importance = Some(importance);
        self
    }

    /// Fail every call with `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    fn check(&self, features: &[f64]) -> Result<(), ModelError> {
        if let Some(message) = &self.fail_with {
            return Err(ModelError::Inference(message.clone()));
        }
        match self.n_features {
            Some(expected) if expected != features.len() => Err(ModelError::Shape {
                expected,
                actual: features.len(),
            }),
            _ => Ok(()),
        }
    }
}

impl ClassifierModel for MockClassifier {
    fn predict(&self, features: &[f64]) -> Result<usize, ModelError> {
        self.check(features)?;
        Ok(self.class)
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.check(features)?;
        Ok(self.probabilities.clone())
    }

    fn feature_importance(&self) -> Option<BTreeMap<usize, f64>> {
        self.importance.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
