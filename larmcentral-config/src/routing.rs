//! Route estimation configuration.
//!
//! Parameters for the deterministic ETA model: base travel speed, the
//! congestion clamp that bounds runaway ETAs under pathological traffic
//! input, and the hysteresis margin that keeps noisy feeds from thrashing
//! committed assignments.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Route estimator configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct RoutingConfig {
    /// Base travel speed for an emergency vehicle with priority (km/h).
    #[serde(default = "default_base_speed")]
    #[validate(range(min = 5.0, max = 150.0))]
    pub base_speed_kmh: f64,

    /// Nominal path segment length (km); the route is subdivided into
    /// segments of roughly this size for per-segment congestion lookup.
    #[serde(default = "default_segment_length")]
    #[validate(range(min = 0.1, max = 10.0))]
    pub segment_length_km: f64,

    /// Upper clamp for per-segment congestion multipliers.
    #[serde(default = "default_max_congestion")]
    #[validate(range(min = 1.0, max = 20.0))]
    pub max_congestion_factor: f64,

    /// Relative ETA deviation that must be exceeded before a traffic
    /// re-estimate triggers hospital re-evaluation.
    #[serde(default = "default_eta_hysteresis")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub eta_hysteresis: f64,

    /// Congestion factor at or above which a segment is surfaced as a
    /// traffic alert on the estimate.
    #[serde(default = "default_alert_congestion")]
    #[validate(range(min = 1.0, max = 20.0))]
    pub alert_congestion_factor: f64,
}

fn default_base_speed() -> f64 {
    35.0
}

fn default_segment_length() -> f64 {
    1.0
}

fn default_max_congestion() -> f64 {
    5.0
}

fn default_eta_hysteresis() -> f64 {
    0.15
}

fn default_alert_congestion() -> f64 {
    2.5
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_speed_kmh: default_base_speed(),
            segment_length_km: default_segment_length(),
            max_congestion_factor: default_max_congestion(),
            eta_hysteresis: default_eta_hysteresis(),
            alert_congestion_factor: default_alert_congestion(),
        }
    }
}
