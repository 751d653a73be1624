//! Heuristic atmosphere composition from planet type, radius and
//! equilibrium temperature.
//!
//! Percentages are jittered around fixed centres so repeated requests vary;
//! the RNG is a parameter so callers and tests control it.

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtmosphereConfidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasShare {
    pub element: String,
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtmosphereEstimate {
    pub likely_gases: Vec<GasShare>,
    pub confidence: AtmosphereConfidence,
    pub comment: String,
    pub habitable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TempBucket {
    Unknown,
    Cold,
    Habitable,
    Warm,
    Hot,
}

impl TempBucket {
    fn of(teq: Option<f64>) -> Self {
        match teq {
            None => TempBucket::Unknown,
            Some(t) if t < 250.0 => TempBucket::Cold,
            Some(t) if t <= 350.0 => TempBucket::Habitable,
            Some(t) if t <= 1000.0 => TempBucket::Warm,
            Some(_) => TempBucket::Hot,
        }
    }
}

/// `"{v:.1}% ± {spread:.0}%"`, `"Trace"` at or below 0.05, `"N/A"` when not finite.
pub fn format_percentage(value: f64, spread: f64) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }
    if value <= 0.05 {
        return "Trace".to_string();
    }
    format!("{:.1}% ± {:.0}%", value, spread)
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, center: f64, spread: f64) -> f64 {
    (center + rng.gen_range(-spread..=spread)).max(0.0)
}

fn gas(element: &str, percentage: String) -> GasShare {
    GasShare { element: element.to_string(), percentage }
}

fn trace(element: &str) -> GasShare {
    gas(element, "Trace".to_string())
}

pub fn predict_atmosphere<R: Rng + ?Sized>(
    planet_type: Option<&str>,
    radius: Option<f64>,
    teq: Option<f64>,
    rng: &mut R,
) -> AtmosphereEstimate {
    let pt = planet_type.unwrap_or("").to_lowercase();
    let radius = radius.filter(|r| !r.is_nan());
    let teq = teq.filter(|t| !t.is_nan());

    let mut estimate = if matches!(pt.as_str(), "gas giant" | "hot jupiter" | "jupiter-like")
        || radius.is_some_and(|r| r > 6.0)
    {
        AtmosphereEstimate {
            likely_gases: vec![
                gas("Hydrogen (H₂)", format_percentage(jitter(rng, 88.0, 3.0), 5.0)),
                gas("Helium (He)", format_percentage(jitter(rng, 11.0, 2.0), 3.0)),
                gas("Methane (CH₄)", format_percentage(jitter(rng, 0.5, 0.5), 1.0)),
                gas("Ammonia (NH₃)", format_percentage(jitter(rng, 0.1, 0.2), 1.0)),
            ],
            confidence: AtmosphereConfidence::High,
            comment: "Gas giant: H₂/He-dominated atmosphere expected.".to_string(),
            habitable: false,
        }
    } else if matches!(pt.as_str(), "mini-neptune" | "minineptune")
        || radius.is_some_and(|r| r > 1.5 && r <= 6.0)
    {
        AtmosphereEstimate {
            likely_gases: vec![
                gas("Hydrogen (H₂)", format_percentage(jitter(rng, 55.0, 6.0), 8.0)),
                gas("Helium (He)", format_percentage(jitter(rng, 20.0, 4.0), 6.0)),
                gas("Water vapor (H₂O)", format_percentage(jitter(rng, 8.0, 4.0), 6.0)),
                gas("Methane (CH₄)", format_percentage(jitter(rng, 3.0, 2.0), 2.0)),
            ],
            confidence: AtmosphereConfidence::Medium,
            comment: "Volatile-rich envelope: H₂/He with possible H₂O/CH₄.".to_string(),
            habitable: false,
        }
    } else {
        rocky(radius.unwrap_or(1.0), TempBucket::of(teq), rng)
    };

    if teq.is_some_and(|t| t > 1000.0) {
        estimate = AtmosphereEstimate {
            likely_gases: vec![
                gas("Carbon dioxide (CO₂)", format_percentage(80.0, 8.0)),
                trace("Sodium (Na) vapor"),
                trace("Potassium (K) vapor"),
            ],
            confidence: AtmosphereConfidence::High,
            comment: "Extreme Teq: runaway greenhouse or mineral vapor atmosphere.".to_string(),
            habitable: false,
        };
    }

    estimate
}

fn rocky<R: Rng + ?Sized>(radius: f64, bucket: TempBucket, rng: &mut R) -> AtmosphereEstimate {
    if radius <= 1.5 && bucket == TempBucket::Habitable {
        return AtmosphereEstimate {
            likely_gases: vec![
                gas("Nitrogen (N₂)", format_percentage(jitter(rng, 75.0, 6.0), 6.0)),
                gas("Oxygen (O₂)", format_percentage(jitter(rng, 21.0, 4.0), 4.0)),
                gas("Argon (Ar)", format_percentage(jitter(rng, 0.9, 0.3), 0.2)),
                gas("Water vapor (H₂O)", format_percentage(jitter(rng, 2.0, 2.0), 2.0)),
                gas("Carbon dioxide (CO₂)", format_percentage(jitter(rng, 0.1, 0.2), 0.2)),
            ],
            confidence: AtmosphereConfidence::Medium,
            comment: "Rocky planet in temperate range: N₂/O₂ atmosphere plausible.".to_string(),
            habitable: true,
        };
    }

    if radius <= 1.5 && matches!(bucket, TempBucket::Cold | TempBucket::Warm) {
        return AtmosphereEstimate {
            likely_gases: vec![
                gas("Nitrogen (N₂)", format_percentage(jitter(rng, 60.0, 10.0), 8.0)),
                gas("Carbon dioxide (CO₂)", format_percentage(jitter(rng, 25.0, 8.0), 8.0)),
                gas("Oxygen (O₂)", format_percentage(jitter(rng, 10.0, 5.0), 6.0)),
                trace("Trace gases"),
            ],
            confidence: AtmosphereConfidence::Low,
            comment: "Rocky planet but temperature suggests high CO₂ or thin atmosphere."
                .to_string(),
            habitable: false,
        };
    }

    AtmosphereEstimate {
        likely_gases: vec![
            gas("Nitrogen (N₂)", format_percentage(jitter(rng, 40.0, 12.0), 8.0)),
            gas("Carbon dioxide (CO₂)", format_percentage(jitter(rng, 25.0, 10.0), 8.0)),
            gas("Water vapor (H₂O)", format_percentage(jitter(rng, 10.0, 6.0), 5.0)),
            gas("Methane (CH₄)", format_percentage(jitter(rng, 1.0, 1.0), 1.0)),
        ],
        confidence: AtmosphereConfidence::Medium,
        comment: "Super-Earth: heavier, CO₂-rich atmosphere possible.".to_string(),
        habitable: false,
    }
}
