//! Vitals snapshots and the risk vocabulary shared by assessor and engine.

use serde::{Deserialize, Serialize};

/// AVPU consciousness scale, ordered from fully alert to unresponsive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consciousness {
    Alert,
    Verbal,
    Pain,
    Unresponsive,
}

impl Consciousness {
    /// Parses an AVPU level name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "alert" => Some(Self::Alert),
            "verbal" => Some(Self::Verbal),
            "pain" => Some(Self::Pain),
            "unresponsive" => Some(Self::Unresponsive),
            _ => None,
        }
    }
}

/// One immutable reading of patient vital signs.
///
/// Superseded by newer snapshots; never mutated in place.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VitalsSnapshot {
    /// Heart rate (bpm).
    pub heart_rate: f64,
    /// Systolic blood pressure (mmHg).
    pub systolic_bp: f64,
    /// Diastolic blood pressure (mmHg).
    pub diastolic_bp: f64,
    /// Oxygen saturation (%).
    pub spo2: f64,
    /// Respiratory rate (breaths/min).
    pub respiratory_rate: f64,
    /// AVPU consciousness level.
    pub consciousness: Consciousness,
    /// Measurement time (epoch ms).
    pub timestamp_ms: u64,
}

/// Patient risk stratification level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Normal,
    Elevated,
    Critical,
}

/// Structured abnormality flags emitted by the assessor, consumed by
/// consoles and by hospital-requirement derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalFlag {
    Tachycardia,
    Bradycardia,
    Hypertension,
    Hypotension,
    Hypoxia,
    Tachypnea,
    Bradypnea,
    Unresponsive,
}

/// Assessor output: level plus the flags that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub flags: Vec<VitalFlag>,
}

/// Condition pattern suspected from the vitals alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspectedCondition {
    CardiacArrest,
    Stroke,
    RespiratoryDistress,
    TraumaticShock,
}

/// Direction of a vital sign over the retained history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Steady,
}

/// Per-metric trend over the retained vitals history.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub heart_rate: Option<TrendDirection>,
    pub systolic_bp: Option<TrendDirection>,
    pub spo2: Option<TrendDirection>,
}
