//! Shared fixtures for Prismiq tests: reference statistics, canonical feature
//! rows and scripted text generators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use prismiq_common::{Feature, FeatureVector, KoiFeatures, NarrativeError, TextGenerator, KOI_FEATURES};

// ── Reference statistics ────────────────────────────────────────────────────

/// Population means and standard deviations roughly matching the Kepler
/// cumulative KOI table.
pub const REFERENCE_MEANS: [(Feature, f64); 8] = [
    (Feature::Period, 56.0),
    (Feature::Duration, 5.6),
    (Feature::Depth, 23_700.0),
    (Feature::Radius, 102.0),
    (Feature::SemiMajorAxis, 0.16),
    (Feature::Inclination, 82.5),
    (Feature::EquilibriumTemp, 1085.0),
    (Feature::Snr, 259.0),
];

pub const REFERENCE_STDS: [(Feature, f64); 8] = [
    (Feature::Period, 117.0),
    (Feature::Duration, 6.5),
    (Feature::Depth, 82_000.0),
    (Feature::Radius, 3_020.0),
    (Feature::SemiMajorAxis, 0.26),
    (Feature::Inclination, 15.4),
    (Feature::EquilibriumTemp, 856.0),
    (Feature::Snr, 795.0),
];

/// Reference statistics artifact in its on-disk JSON shape.
pub fn reference_stats_json() -> String {
    let to_map = |pairs: &[(Feature, f64)]| {
        pairs
            .iter()
            .map(|(f, v)| (f.key().to_string(), serde_json::json!(v)))
            .collect::<serde_json::Map<_, _>>()
    };
    serde_json::json!({
        "means": to_map(&REFERENCE_MEANS),
        "stds": to_map(&REFERENCE_STDS),
    })
    .to_string()
}

/// Mean 0, std 1 for every feature, so z-scores equal raw values.
pub fn unit_reference_stats_json() -> String {
    let zeros: serde_json::Map<_, _> = KOI_FEATURES
        .iter()
        .map(|f| (f.key().to_string(), serde_json::json!(0.0)))
        .collect();
    let ones: serde_json::Map<_, _> = KOI_FEATURES
        .iter()
        .map(|f| (f.key().to_string(), serde_json::json!(1.0)))
        .collect();
    serde_json::json!({ "means": zeros, "stds": ones }).to_string()
}

// ── Feature rows ────────────────────────────────────────────────────────────

/// Temperate super-Earth on a 3.5 day orbit.
pub fn super_earth_features() -> KoiFeatures {
    KoiFeatures {
        koi_period: 3.5,
        koi_duration: 2.9,
        koi_depth: 1200.0,
        koi_prad: 1.9,
        koi_sma: 0.04,
        koi_incl: 89.0,
        koi_teq: 700.0,
        koi_model_snr: 25.0,
    }
}

pub fn super_earth_row() -> FeatureVector {
    super_earth_features().into()
}

/// Inflated, strongly irradiated giant.
pub fn hot_jupiter_features() -> KoiFeatures {
    KoiFeatures {
        koi_period: 3.0,
        koi_duration: 3.0,
        koi_depth: 15_000.0,
        koi_prad: 12.0,
        koi_sma: 0.04,
        koi_incl: 87.0,
        koi_teq: 1500.0,
        koi_model_snr: 400.0,
    }
}

pub fn hot_jupiter_row() -> FeatureVector {
    hot_jupiter_features().into()
}

/// JSON request body for `features`.
pub fn features_json(features: &KoiFeatures) -> serde_json::Value {
    serde_json::json!({
        "koi_period": features.koi_period,
        "koi_duration": features.koi_duration,
        "koi_depth": features.koi_depth,
        "koi_prad": features.koi_prad,
        "koi_sma": features.koi_sma,
        "koi_incl": features.koi_incl,
        "koi_teq": features.koi_teq,
        "koi_model_snr": features.koi_model_snr,
    })
}

// ── Text generators ─────────────────────────────────────────────────────────

/// Returns a fixed reply and counts calls.
#[derive(Debug, Default)]
pub struct StubGenerator {
    reply: String,
    calls: AtomicUsize,
}

impl StubGenerator {
    pub fn new(reply: &str) -> Self {
        Self { reply: reply.to_string(), calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, NarrativeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Always fails.
#[derive(Debug, Default)]
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, NarrativeError> {
        Err(NarrativeError::Failed("upstream returned 503".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Sleeps before answering; pair with a short narrative timeout.
#[derive(Debug)]
pub struct SlowGenerator {
    pub delay: Duration,
}

#[async_trait]
impl TextGenerator for SlowGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, NarrativeError> {
        tokio::time::sleep(self.delay).await;
        Ok("late reply".to_string())
    }

    fn name(&self) -> &str {
        "slow"
    }
}
