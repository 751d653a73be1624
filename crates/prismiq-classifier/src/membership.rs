//! Trapezoidal fuzzy membership.
//!
//! A tolerance is a primary range (full membership) inside a soft range
//! (linear fall-off to zero). Either bound of either range may be absent,
//! meaning "no limit on that side".

use serde::{Deserialize, Serialize};

/// Inclusive range with optional ends.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default)]
    pub lower: Option<f64>,
    #[serde(default)]
    pub upper: Option<f64>,
}

impl Bounds {
    pub const UNBOUNDED: Bounds = Bounds { lower: None, upper: None };

    pub const fn between(lower: f64, upper: f64) -> Self {
        Self { lower: Some(lower), upper: Some(upper) }
    }

    pub const fn at_least(lower: f64) -> Self {
        Self { lower: Some(lower), upper: None }
    }

    pub const fn at_most(upper: f64) -> Self {
        Self { lower: None, upper: Some(upper) }
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }
}

/// Degree in [0, 1] to which `value` fits `primary` with `soft` fall-off.
///
/// Branches, in order:
/// - `NaN` → 0
/// - both primary bounds → 1 inside, ramps on each side that has a soft bound
/// - only a primary lower bound → 1 at or above it, ramp below from `soft.lower`
/// - only a primary upper bound → mirror image
/// - no primary bound, both soft bounds → triangle peaking at the soft midpoint
/// - nothing usable → 0
pub fn membership(value: f64, primary: Bounds, soft: Bounds) -> f64 {
    if value.is_nan() {
        return 0.0;
    }

    match (primary.lower, primary.upper) {
        (Some(p_lo), Some(p_hi)) => {
            if p_lo <= value && value <= p_hi {
                return 1.0;
            }
            if let Some(s_lo) = soft.lower {
                if s_lo <= value && value < p_lo {
                    return (value - s_lo) / (p_lo - s_lo);
                }
            }
            if let Some(s_hi) = soft.upper {
                if p_hi < value && value <= s_hi {
                    return (s_hi - value) / (s_hi - p_hi);
                }
            }
            0.0
        }
        (Some(p_lo), None) => {
            if value >= p_lo {
                return 1.0;
            }
            match soft.lower {
                Some(s_lo) if s_lo <= value => (value - s_lo) / (p_lo - s_lo),
                _ => 0.0,
            }
        }
        (None, Some(p_hi)) => {
            if value <= p_hi {
                return 1.0;
            }
            match soft.upper {
                Some(s_hi) if value <= s_hi => (s_hi - value) / (s_hi - p_hi),
                _ => 0.0,
            }
        }
        (None, None) => match (soft.lower, soft.upper) {
            (Some(s_lo), Some(s_hi)) => {
                if value < s_lo || value > s_hi {
                    return 0.0;
                }
                let mid = 0.5 * (s_lo + s_hi);
                let half_width = mid - s_lo;
                if half_width <= 0.0 {
                    return 0.0;
                }
                1.0 - (value - mid).abs() / half_width
            }
            _ => 0.0,
        },
    }
}
