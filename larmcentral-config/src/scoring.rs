//! Hospital scoring configuration.
//!
//! One weight per criterion; the weights must sum to 1.0 so that scores stay
//! comparable across configurations. Defaults emphasize ETA and specialty
//! match over ER load.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Hospital scoring configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct ScoringConfig {
    /// Per-criterion weights, summing to 1.0.
    #[validate(custom(function = validation::validate_weight_sum))]
    #[serde(default)]
    pub weights: ScoringWeights,

    /// Scores within this distance of each other are considered tied and
    /// resolved by the deterministic tie-break chain.
    #[serde(default = "default_score_epsilon")]
    #[validate(range(min = 0.0, max = 0.01))]
    pub score_epsilon: f64,

    /// ETA normalization horizon (minutes): an ETA at or beyond this value
    /// scores zero on the proximity criterion.
    #[serde(default = "default_eta_horizon")]
    #[validate(range(min = 5.0, max = 240.0))]
    pub eta_horizon_min: f64,

    /// On-call emergency doctor count that earns full staff credit.
    #[serde(default = "default_staff_target")]
    #[validate(range(min = 1, max = 50))]
    pub staff_target: u32,
}

fn default_score_epsilon() -> f64 {
    1e-6
}

fn default_eta_horizon() -> f64 {
    60.0
}

fn default_staff_target() -> u32 {
    5
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            score_epsilon: default_score_epsilon(),
            eta_horizon_min: default_eta_horizon(),
            staff_target: default_staff_target(),
        }
    }
}

/// Per-criterion scoring weights.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScoringWeights {
    /// Proximity criterion: inverted, normalized ETA.
    pub eta: f64,
    /// Specialty match criterion (full or partial credit).
    pub specialty: f64,
    /// Available bed ratio criterion.
    pub beds: f64,
    /// Inverse ER load criterion.
    pub er_load: f64,
    /// Equipment availability criterion.
    pub equipment: f64,
    /// On-call staff criterion.
    pub staff: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            eta: 0.30,
            specialty: 0.25,
            beds: 0.15,
            er_load: 0.10,
            equipment: 0.10,
            staff: 0.10,
        }
    }
}

impl ScoringWeights {
    /// Sum of all criterion weights.
    pub fn total(&self) -> f64 {
        self.eta + self.specialty + self.beds + self.er_load + self.equipment + self.staff
    }
}
