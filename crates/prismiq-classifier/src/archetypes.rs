//! Planet archetype table evaluated by the fuzzy classifier.
//!
//! The table is built once at startup (either the built-in reference data or
//! a YAML/JSON override) and shared read-only afterwards. Archetype order is
//! significant: it is the tie-break order of [`crate::fuzzy::FuzzyClassifier`].

use std::path::Path;

use prismiq_common::{Feature, PlanetType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::membership::Bounds;

#[derive(Debug, Error)]
pub enum ArchetypeError {
    #[error("failed to read archetype table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse archetype table: {0}")]
    Parse(String),
    #[error("archetype table is empty")]
    Empty,
    #[error("duplicate archetype '{0}'")]
    DuplicateArchetype(String),
    #[error("{archetype}/{feature}: weight {weight} is negative or not finite")]
    InvalidWeight {
        archetype: String,
        feature: Feature,
        weight: f64,
    },
    #[error("{archetype}/{feature}: {reason}")]
    InvalidRange {
        archetype: String,
        feature: Feature,
        reason: &'static str,
    },
}

/// Tolerance of one archetype for one feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceSpec {
    pub feature: Feature,
    #[serde(default)]
    pub primary: Bounds,
    #[serde(default)]
    pub soft: Bounds,
    pub weight: f64,
}

impl ToleranceSpec {
    pub const fn new(feature: Feature, primary: Bounds, soft: Bounds, weight: f64) -> Self {
        Self { feature, primary, soft, weight }
    }

    fn validate(&self, archetype: &str) -> Result<(), ArchetypeError> {
        let range_err = |reason| ArchetypeError::InvalidRange {
            archetype: archetype.to_string(),
            feature: self.feature,
            reason,
        };

        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(ArchetypeError::InvalidWeight {
                archetype: archetype.to_string(),
                feature: self.feature,
                weight: self.weight,
            });
        }

        if let (Some(lo), Some(hi)) = (self.primary.lower, self.primary.upper) {
            if lo > hi {
                return Err(range_err("primary lower bound exceeds upper bound"));
            }
        }

        // Ramp sides: soft must lie strictly outside primary.
        if let (Some(p), Some(s)) = (self.primary.lower, self.soft.lower) {
            if s > p {
                return Err(range_err("soft lower bound is inside the primary range"));
            }
            if s == p {
                return Err(range_err("zero-width ramp below the primary range"));
            }
        }
        if let (Some(p), Some(s)) = (self.primary.upper, self.soft.upper) {
            if s < p {
                return Err(range_err("soft upper bound is inside the primary range"));
            }
            if s == p {
                return Err(range_err("zero-width ramp above the primary range"));
            }
        }

        if self.primary.is_unbounded() {
            if let (Some(lo), Some(hi)) = (self.soft.lower, self.soft.upper) {
                if lo >= hi {
                    return Err(range_err("soft range has no width"));
                }
            }
        }

        Ok(())
    }
}

/// One planet archetype: its name and per-feature tolerances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeSpec {
    pub name: String,
    pub features: Vec<ToleranceSpec>,
}

impl ArchetypeSpec {
    /// Sum of feature weights. Totals differ between archetypes and are not
    /// normalised, so scores are only comparable within one archetype's scale.
    pub fn total_weight(&self) -> f64 {
        self.features.iter().map(|t| t.weight).sum()
    }
}

/// Ordered, validated archetype registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeTable {
    archetypes: Vec<ArchetypeSpec>,
}

impl ArchetypeTable {
    /// Build a table, rejecting malformed tolerances.
    pub fn new(archetypes: Vec<ArchetypeSpec>) -> Result<Self, ArchetypeError> {
        let table = Self { archetypes };
        table.validate()?;
        Ok(table)
    }

    /// Load a table from YAML (`.yaml`/`.yml`) or JSON (anything else).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ArchetypeError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ArchetypeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            Self::from_yaml(&raw)
        } else {
            Self::from_json(&raw)
        }
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ArchetypeError> {
        let table: Self =
            serde_yaml::from_str(raw).map_err(|e| ArchetypeError::Parse(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_json(raw: &str) -> Result<Self, ArchetypeError> {
        let table: Self =
            serde_json::from_str(raw).map_err(|e| ArchetypeError::Parse(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), ArchetypeError> {
        if self.archetypes.is_empty() {
            return Err(ArchetypeError::Empty);
        }
        for (i, spec) in self.archetypes.iter().enumerate() {
            if self.archetypes[..i].iter().any(|a| a.name == spec.name) {
                return Err(ArchetypeError::DuplicateArchetype(spec.name.clone()));
            }
            for tol in &spec.features {
                tol.validate(&spec.name)?;
            }
        }
        Ok(())
    }

    /// Archetypes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ArchetypeSpec> {
        self.archetypes.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ArchetypeSpec> {
        self.archetypes.iter().find(|a| a.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.archetypes.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

impl Default for ArchetypeTable {
    /// Reference table of the five planet archetypes.
    fn default() -> Self {
        use Feature::*;

        const NONE: Bounds = Bounds::UNBOUNDED;
        let b = Bounds::between;
        let tol = ToleranceSpec::new;

        let tolerances = [
            vec![
                tol(Radius,          b(1.5, 2.5),     b(1.2, 3.0),     0.50),
                tol(Depth,           b(500.0, 2000.0), b(300.0, 3000.0), 0.15),
                tol(Duration,        b(2.0, 6.0),     b(1.0, 8.0),     0.10),
                tol(EquilibriumTemp, NONE,            b(100.0, 1200.0), 0.15),
                tol(Period,          NONE,            NONE,            0.10),
            ],
            vec![
                tol(Radius,          b(2.5, 4.0),      b(2.2, 5.0),      0.45),
                tol(Depth,           b(1500.0, 5000.0), b(1000.0, 8000.0), 0.20),
                tol(Duration,        b(3.0, 7.0),      b(2.0, 9.0),      0.10),
                tol(EquilibriumTemp, NONE,             b(50.0, 1500.0),  0.15),
                tol(SemiMajorAxis,   NONE,             b(0.03, 0.6),     0.10),
            ],
            vec![
                tol(Radius,          b(4.0, 6.0),       b(3.5, 7.0),       0.45),
                tol(Depth,           b(4000.0, 10000.0), b(3000.0, 14000.0), 0.20),
                tol(Duration,        b(4.0, 10.0),      b(3.0, 12.0),      0.10),
                tol(SemiMajorAxis,   NONE,              b(0.1, 10.0),      0.10),
                tol(EquilibriumTemp, NONE,              b(50.0, 1000.0),   0.15),
            ],
            vec![
                tol(Radius,          b(6.0, 11.0),             b(5.0, 13.0),              0.45),
                tol(Depth,           Bounds::at_least(5000.0), Bounds::at_least(4000.0),  0.15),
                tol(Duration,        b(6.0, 12.0),             b(5.0, 15.0),              0.10),
                tol(EquilibriumTemp, Bounds::at_most(500.0),   Bounds::at_most(1000.0),   0.15),
                tol(SemiMajorAxis,   Bounds::at_least(0.5),    b(0.1, 10.0),              0.15),
            ],
            vec![
                tol(Radius,          Bounds::at_least(8.0),     Bounds::at_least(6.5),    0.40),
                tol(Period,          Bounds::at_most(10.0),     Bounds::at_most(20.0),    0.25),
                tol(EquilibriumTemp, Bounds::at_least(1000.0),  Bounds::at_least(800.0),  0.15),
                tol(Depth,           Bounds::at_least(10000.0), Bounds::at_least(8000.0), 0.10),
                tol(Duration,        b(2.0, 5.0),               b(1.5, 6.0),              0.10),
            ],
        ];

        let archetypes = PlanetType::ALL
            .iter()
            .zip(tolerances)
            .map(|(planet, features)| ArchetypeSpec { name: planet.as_str().into(), features })
            .collect();

        Self { archetypes }
    }
}
