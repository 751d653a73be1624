//! prismiq-classifier: KOI disposition and planet-type classification.
//!
//! Layers, leaves first:
//! - [`membership`]: trapezoidal fuzzy membership
//! - [`archetypes`]: the planet archetype table
//! - [`fuzzy`]: weighted archetype scoring and best-match selection
//! - [`stats`] / [`reliability`]: z-scores, outliers, reliability score
//! - [`model`] / [`onnx`]: trained-classifier contract and ONNX backend
//! - [`pipeline`]: the two-stage orchestrator

pub mod archetypes;
pub mod fuzzy;
pub mod membership;
pub mod model;
pub mod onnx;
pub mod pipeline;
pub mod prompt;
pub mod reliability;
pub mod stats;

pub use archetypes::{ArchetypeError, ArchetypeSpec, ArchetypeTable, ToleranceSpec};
pub use fuzzy::{ArchetypeScore, FuzzyClassifier, FuzzyVerdict};
pub use membership::{membership, Bounds};
pub use model::{ClassifierModel, MockClassifier, ModelError};
pub use onnx::OnnxClassifier;
pub use pipeline::{
    ClassificationPipeline, ClassificationResult, KoiAssessment, NoopObserver, PipelineError,
    PipelineStage, PlanetTypeAssessment, ProgressObserver, NARRATIVE_UNAVAILABLE,
    NARRATIVE_UNCONFIGURED,
};
pub use reliability::{Reliability, ReliabilityLabel};
pub use stats::{ReferenceStats, StageStatistics, StatsError, ZScoreRecord};
