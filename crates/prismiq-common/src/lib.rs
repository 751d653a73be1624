//! prismiq-common: Shared types, errors, and traits used across all Prismiq crates.

pub mod error;
pub mod features;
pub mod labels;
pub mod narrative;

// Re-export commonly used types
pub use error::ApiError;
pub use features::{Feature, FeatureVector, KoiFeatures, KOI_FEATURES, PLANET_FEATURES};
pub use labels::{label_for, Disposition, PlanetType, KOI_CLASSES, PLANET_CLASSES};
pub use narrative::{DisabledGenerator, NarrativeError, TextGenerator};
