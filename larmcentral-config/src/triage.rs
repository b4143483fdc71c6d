//! Vitals triage thresholds.
//!
//! Per-metric normal and critical bounds. Default values follow standard
//! adult reference ranges: out-of-range on two or more metrics escalates to
//! elevated risk, any single metric beyond a critical bound (or reduced
//! consciousness) escalates to critical.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Vitals assessment configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct TriageConfig {
    /// Heart rate bounds (bpm).
    #[validate(nested)]
    #[serde(default = "default_heart_rate")]
    pub heart_rate: VitalBounds,

    /// Systolic blood pressure bounds (mmHg).
    #[validate(nested)]
    #[serde(default = "default_systolic")]
    pub systolic_bp: VitalBounds,

    /// Diastolic blood pressure bounds (mmHg).
    #[validate(nested)]
    #[serde(default = "default_diastolic")]
    pub diastolic_bp: VitalBounds,

    /// Oxygen saturation bounds (%).
    #[validate(nested)]
    #[serde(default = "default_spo2")]
    pub spo2: VitalBounds,

    /// Respiratory rate bounds (breaths/min).
    #[validate(nested)]
    #[serde(default = "default_respiratory")]
    pub respiratory_rate: VitalBounds,

    /// AVPU level at or below which consciousness alone is critical
    /// (alert, verbal, pain, unresponsive).
    #[serde(default = "default_consciousness_floor")]
    #[validate(custom(function = validation::validate_avpu))]
    pub consciousness_floor: String,

    /// Number of out-of-range metrics that escalates risk to elevated.
    #[serde(default = "default_elevated_metric_count")]
    #[validate(range(min = 1, max = 5))]
    pub elevated_metric_count: usize,
}

/// Normal and critical bounds for one vital sign.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, Copy)]
pub struct VitalBounds {
    /// Lower edge of the normal range.
    pub low: f64,
    /// Upper edge of the normal range.
    pub high: f64,
    /// Below this value the metric alone is critical.
    pub critical_low: f64,
    /// Above this value the metric alone is critical.
    pub critical_high: f64,
}

impl VitalBounds {
    const fn new(low: f64, high: f64, critical_low: f64, critical_high: f64) -> Self {
        Self {
            low,
            high,
            critical_low,
            critical_high,
        }
    }
}

fn default_heart_rate() -> VitalBounds {
    VitalBounds::new(60.0, 100.0, 50.0, 120.0)
}

fn default_systolic() -> VitalBounds {
    VitalBounds::new(90.0, 140.0, 80.0, 180.0)
}

fn default_diastolic() -> VitalBounds {
    VitalBounds::new(60.0, 90.0, 50.0, 110.0)
}

fn default_spo2() -> VitalBounds {
    VitalBounds::new(95.0, 100.0, 90.0, 100.5)
}

fn default_respiratory() -> VitalBounds {
    VitalBounds::new(12.0, 20.0, 8.0, 30.0)
}

fn default_consciousness_floor() -> String {
    "pain".into()
}

fn default_elevated_metric_count() -> usize {
    2
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            heart_rate: default_heart_rate(),
            systolic_bp: default_systolic(),
            diastolic_bp: default_diastolic(),
            spo2: default_spo2(),
            respiratory_rate: default_respiratory(),
            consciousness_floor: default_consciousness_floor(),
            elevated_metric_count: default_elevated_metric_count(),
        }
    }
}
