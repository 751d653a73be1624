//! ONNX Runtime backend for the exported classifiers.
//!
//! Expects the usual scikit-learn/XGBoost export layout: one `float32` input
//! of shape `[N, n_features]`, output 0 the `int64` label and output 1 the
//! `float32` probability matrix (exported without a zipmap).

use std::collections::BTreeMap;
use std::path::Path;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use prismiq_common::Feature;
use tracing::{debug, info};

use crate::model::{ClassifierModel, ModelError};

pub struct OnnxClassifier {
    name: String,
    session: Mutex<Session>,
    n_features: usize,
    label_output: String,
    proba_output: String,
    importance: Option<BTreeMap<usize, f64>>,
}

impl OnnxClassifier {
    /// Load a classifier taking `n_features` columns.
    pub fn load(name: &str, path: impl AsRef<Path>, n_features: usize) -> Result<Self, ModelError> {
        let path = path.as_ref();
        info!(model = name, path = %path.display(), "Loading ONNX classifier");

        if !path.exists() {
            return Err(ModelError::NotFound(path.display().to_string()));
        }

        let session = Session::builder()
            .map_err(|e| ModelError::Load(format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError::Load(format!("optimization level: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| ModelError::Load(format!("{}: {}", path.display(), e)))?;

        let mut outputs = session.outputs.iter().map(|o| o.name.clone());
        let label_output = outputs
            .next()
            .ok_or_else(|| ModelError::Load("model defines no outputs".to_string()))?;
        let proba_output = outputs
            .next()
            .ok_or_else(|| ModelError::Load("model defines no probability output".to_string()))?;

        debug!(model = name, %label_output, %proba_output, "ONNX outputs resolved");

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
            n_features,
            label_output,
            proba_output,
            importance: None,
        })
    }

    /// Attach global feature importance from a JSON sidecar
    /// (`{"f0": 12.0, "f3": 4.5}` or catalogue column names).
    pub fn with_importance_file(mut self, path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ModelError::Load(format!("{}: {}", path.display(), e)))?;
        let parsed: BTreeMap<String, f64> = serde_json::from_str(&raw)
            .map_err(|e| ModelError::Load(format!("{}: {}", path.display(), e)))?;
        self.importance = Some(parse_importance(&parsed));
        Ok(self)
    }

    fn run(&self, features: &[f64]) -> Result<(i64, Vec<f64>), ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::Shape {
                expected: self.n_features,
                actual: features.len(),
            });
        }

        let input = Array2::<f32>::from_shape_vec(
            (1, self.n_features),
            features.iter().map(|&v| v as f32).collect(),
        )
        .map_err(|e| ModelError::Inference(format!("input array: {}", e)))?;
        let tensor = Value::from_array(input)
            .map_err(|e| ModelError::Inference(format!("input tensor: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let label = outputs
            .get(&self.label_output)
            .ok_or_else(|| ModelError::InvalidOutput(format!("missing output {}", self.label_output)))?
            .try_extract_tensor::<i64>()
            .map_err(|e| ModelError::InvalidOutput(format!("label: {}", e)))?
            .1
            .first()
            .copied()
            .ok_or_else(|| ModelError::InvalidOutput("empty label tensor".to_string()))?;

        let proba = outputs
            .get(&self.proba_output)
            .ok_or_else(|| ModelError::InvalidOutput(format!("missing output {}", self.proba_output)))?
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::InvalidOutput(format!("probabilities: {}", e)))?
            .1
            .iter()
            .map(|&p| p as f64)
            .collect::<Vec<_>>();

        if proba.is_empty() {
            return Err(ModelError::InvalidOutput("empty probability tensor".to_string()));
        }
        Ok((label, proba))
    }
}

impl ClassifierModel for OnnxClassifier {
    fn predict(&self, features: &[f64]) -> Result<usize, ModelError> {
        class_code(self.run(features)?.0)
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        Ok(self.run(features)?.1)
    }

    /// Both outputs come from the same session run.
    fn predict_with_proba(&self, features: &[f64]) -> Result<(usize, Vec<f64>), ModelError> {
        let (label, proba) = self.run(features)?;
        Ok((class_code(label)?, proba))
    }

    fn feature_importance(&self) -> Option<BTreeMap<usize, f64>> {
        self.importance.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn class_code(label: i64) -> Result<usize, ModelError> {
    usize::try_from(label).map_err(|_| ModelError::InvalidOutput(format!("negative class {}", label)))
}

/// Map booster-style keys (`f3`) or column names (`koi_prad`) to column
/// indices. Unrecognised keys are dropped.
pub fn parse_importance(raw: &BTreeMap<String, f64>) -> BTreeMap<usize, f64> {
    raw.iter()
        .filter_map(|(key, &weight)| {
            let idx = key
                .strip_prefix('f')
                .and_then(|n| n.parse::<usize>().ok())
                .or_else(|| Feature::from_key(key).map(Feature::index))?;
            Some((idx, weight))
        })
        .collect()
}
