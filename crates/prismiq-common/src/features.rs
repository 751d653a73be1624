//! Transit feature names and the feature vector consumed by both
//! classification stages.
//!
//! The KOI stage uses all eight features in [`KOI_FEATURES`] order; the
//! planet-type stage uses the six in [`PLANET_FEATURES`] (inclination and
//! SNR excluded). Order matters: the trained classifiers were fitted on
//! these exact column orders.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One named transit feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    /// Orbital period (days)
    #[serde(rename = "koi_period")]
    Period,
    /// Transit duration (hrs)
    #[serde(rename = "koi_duration")]
    Duration,
    /// Transit depth (ppm)
    #[serde(rename = "koi_depth")]
    Depth,
    /// Planet radius (Earth radii)
    #[serde(rename = "koi_prad")]
    Radius,
    /// Semi-major axis (AU)
    #[serde(rename = "koi_sma")]
    SemiMajorAxis,
    /// Inclination (deg)
    #[serde(rename = "koi_incl")]
    Inclination,
    /// Equilibrium temperature (K)
    #[serde(rename = "koi_teq")]
    EquilibriumTemp,
    /// Signal-to-noise ratio
    #[serde(rename = "koi_model_snr")]
    Snr,
}

/// Column order of the KOI disposition classifier.
pub const KOI_FEATURES: [Feature; 8] = [
    Feature::Period,
    Feature::Duration,
    Feature::Depth,
    Feature::Radius,
    Feature::SemiMajorAxis,
    Feature::Inclination,
    Feature::EquilibriumTemp,
    Feature::Snr,
];

/// Column order of the planet-type classifier.
pub const PLANET_FEATURES: [Feature; 6] = [
    Feature::Period,
    Feature::Duration,
    Feature::Depth,
    Feature::Radius,
    Feature::SemiMajorAxis,
    Feature::EquilibriumTemp,
];

impl Feature {
    /// Catalogue column name, e.g. `koi_prad`.
    pub const fn key(self) -> &'static str {
        match self {
            Feature::Period          => "koi_period",
            Feature::Duration        => "koi_duration",
            Feature::Depth           => "koi_depth",
            Feature::Radius          => "koi_prad",
            Feature::SemiMajorAxis   => "koi_sma",
            Feature::Inclination     => "koi_incl",
            Feature::EquilibriumTemp => "koi_teq",
            Feature::Snr             => "koi_model_snr",
        }
    }

    /// Human-readable name with units.
    pub const fn pretty(self) -> &'static str {
        match self {
            Feature::Period          => "Orbital Period (days)",
            Feature::Duration        => "Transit Duration (hrs)",
            Feature::Depth           => "Transit Depth (ppm)",
            Feature::Radius          => "Planet Radius (Earth radii)",
            Feature::SemiMajorAxis   => "Semi-Major Axis (AU)",
            Feature::Inclination     => "Inclination (deg)",
            Feature::EquilibriumTemp => "Equilibrium Temp (K)",
            Feature::Snr             => "Signal-to-Noise Ratio",
        }
    }

    /// Position of this feature in [`KOI_FEATURES`].
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_key(key: &str) -> Option<Self> {
        KOI_FEATURES.iter().copied().find(|f| f.key() == key)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Request body carrying all eight features. Every field is required.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KoiFeatures {
    pub koi_period: f64,
    pub koi_duration: f64,
    pub koi_depth: f64,
    pub koi_prad: f64,
    pub koi_sma: f64,
    pub koi_incl: f64,
    pub koi_teq: f64,
    pub koi_model_snr: f64,
}

/// Immutable feature row. Absent features read as `NaN`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; 8],
}

impl FeatureVector {
    /// A row with every feature missing.
    pub fn empty() -> Self {
        Self { values: [f64::NAN; 8] }
    }

    /// Builder-style setter used when assembling partial rows.
    pub fn with(mut self, feature: Feature, value: f64) -> Self {
        self.values[feature.index()] = value;
        self
    }

    /// Value for `feature`, `NaN` when missing.
    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    pub fn is_present(&self, feature: Feature) -> bool {
        !self.get(feature).is_nan()
    }

    /// Values in the order given by `features`.
    pub fn select(&self, features: &[Feature]) -> Vec<f64> {
        features.iter().map(|&f| self.get(f)).collect()
    }

    /// Copy of this row keeping only `features`; everything else becomes missing.
    pub fn restrict(&self, features: &[Feature]) -> Self {
        features
            .iter()
            .fold(Self::empty(), |row, &f| row.with(f, self.get(f)))
    }

    /// 8-column input of the KOI classifier.
    pub fn koi_vector(&self) -> Vec<f64> {
        self.select(&KOI_FEATURES)
    }

    /// 6-column input of the planet-type classifier.
    pub fn planet_vector(&self) -> Vec<f64> {
        self.select(&PLANET_FEATURES)
    }

    /// Present features as `(feature, value)` pairs in catalogue order.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        KOI_FEATURES
            .iter()
            .map(move |&f| (f, self.get(f)))
            .filter(|(_, v)| !v.is_nan())
    }
}

impl From<KoiFeatures> for FeatureVector {
    fn from(r: KoiFeatures) -> Self {
        Self {
            values: [
                r.koi_period,
                r.koi_duration,
                r.koi_depth,
                r.koi_prad,
                r.koi_sma,
                r.koi_incl,
                r.koi_teq,
                r.koi_model_snr,
            ],
        }
    }
}
