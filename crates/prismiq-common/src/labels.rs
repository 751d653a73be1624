//! Class-index → label mappings of the two trained classifiers.

use serde::{Deserialize, Serialize};

/// Labels of the KOI disposition classifier, indexed by class code.
pub const KOI_CLASSES: [&str; 3] = ["Exoplanet", "Candidate", "False Positive"];

/// Labels of the planet-type classifier, indexed by class code.
pub const PLANET_CLASSES: [&str; 5] = [
    "Super-Earth",
    "Mini-Neptune",
    "Neptune-like",
    "Gas Giant",
    "Hot Jupiter",
];

/// Label for a class code; codes outside the mapping become `Unknown (n)`.
pub fn label_for(classes: &[&str], code: usize) -> String {
    classes
        .get(code)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Unknown ({})", code))
}

/// KOI disposition outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
    Exoplanet,
    Candidate,
    #[serde(rename = "False Positive")]
    FalsePositive,
}

impl Disposition {
    pub fn from_code(code: usize) -> Option<Self> {
        match code {
            0 => Some(Disposition::Exoplanet),
            1 => Some(Disposition::Candidate),
            2 => Some(Disposition::FalsePositive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Exoplanet     => KOI_CLASSES[0],
            Disposition::Candidate     => KOI_CLASSES[1],
            Disposition::FalsePositive => KOI_CLASSES[2],
        }
    }
}

/// Planet archetype / planet-type class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanetType {
    #[serde(rename = "Super-Earth")]
    SuperEarth,
    #[serde(rename = "Mini-Neptune")]
    MiniNeptune,
    #[serde(rename = "Neptune-like")]
    NeptuneLike,
    #[serde(rename = "Gas Giant")]
    GasGiant,
    #[serde(rename = "Hot Jupiter")]
    HotJupiter,
}

impl PlanetType {
    /// Declaration order. The built-in archetype table is built in this order,
    /// so it is also the default tie-break order of the fuzzy classifier.
    pub const ALL: [PlanetType; 5] = [
        PlanetType::SuperEarth,
        PlanetType::MiniNeptune,
        PlanetType::NeptuneLike,
        PlanetType::GasGiant,
        PlanetType::HotJupiter,
    ];

    pub fn from_code(code: usize) -> Option<Self> {
        Self::ALL.get(code).copied()
    }

    pub fn as_str(&self) -> &'static str {
        PLANET_CLASSES[*self as usize]
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_for_known_and_unknown_codes() {
        assert_eq!(label_for(&KOI_CLASSES, 0), "Exoplanet");
        assert_eq!(label_for(&KOI_CLASSES, 2), "False Positive");
        assert_eq!(label_for(&KOI_CLASSES, 7), "Unknown (7)");
    }

    #[test]
    fn test_disposition_codes_match_labels() {
        for (code, label) in KOI_CLASSES.iter().enumerate() {
            assert_eq!(Disposition::from_code(code).unwrap().as_str(), *label);
        }
        assert_eq!(Disposition::from_code(3), None);
    }

    #[test]
    fn test_planet_type_labels() {
        assert_eq!(PlanetType::from_code(4), Some(PlanetType::HotJupiter));
        assert_eq!(PlanetType::from_label("Neptune-like"), Some(PlanetType::NeptuneLike));
        assert_eq!(PlanetType::GasGiant.as_str(), "Gas Giant");
        assert_eq!(PlanetType::from_label("Jupiter-like"), None);
    }
}
