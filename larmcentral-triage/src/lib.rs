//! ## larmcentral-triage
//! **Vitals risk stratification**
//!
//! Pure, deterministic assessment of streamed vital signs against
//! configured bounds. No I/O, no clock access: the assessor sees one
//! snapshot (or a bounded history) and returns a risk level with
//! structured flags. Escalation side effects are the engine's business.

use thiserror::Error;

use larmcentral_config::{TriageConfig, VitalBounds};
use larmcentral_core::model::{
    Consciousness, RiskAssessment, RiskLevel, SuspectedCondition, TrendDirection, TrendReport,
    VitalFlag, VitalsSnapshot,
};

mod suspicion;

pub use suspicion::suspect_condition;

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("Unknown AVPU level in configuration: {0}")]
    InvalidConsciousnessFloor(String),
}

/// How one metric reading relates to its configured bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Range {
    Normal,
    Abnormal,
    Critical,
}

fn classify(value: f64, bounds: &VitalBounds) -> Range {
    if value < bounds.critical_low || value > bounds.critical_high {
        Range::Critical
    } else if value < bounds.low || value > bounds.high {
        Range::Abnormal
    } else {
        Range::Normal
    }
}

/// Configured vitals assessor.
///
/// Construction parses the consciousness floor once so assessment stays a
/// pure function over immutable state.
pub struct VitalsAssessor {
    config: TriageConfig,
    consciousness_floor: Consciousness,
}

impl VitalsAssessor {
    pub fn new(config: TriageConfig) -> Result<Self, TriageError> {
        let consciousness_floor = Consciousness::from_name(&config.consciousness_floor)
            .ok_or_else(|| {
                TriageError::InvalidConsciousnessFloor(config.consciousness_floor.clone())
            })?;
        Ok(Self {
            config,
            consciousness_floor,
        })
    }

    /// Assesses one snapshot: risk level plus structured abnormality flags.
    ///
    /// Any single metric beyond a critical bound, or consciousness at or
    /// below the configured floor, is critical on its own; two or more
    /// out-of-range metrics escalate to elevated.
    pub fn assess(&self, vitals: &VitalsSnapshot) -> RiskAssessment {
        let mut flags = Vec::new();
        let mut out_of_range = 0usize;
        let mut any_critical = false;

        let metrics: [(f64, &VitalBounds, VitalFlag, VitalFlag); 5] = [
            (
                vitals.heart_rate,
                &self.config.heart_rate,
                VitalFlag::Bradycardia,
                VitalFlag::Tachycardia,
            ),
            (
                vitals.systolic_bp,
                &self.config.systolic_bp,
                VitalFlag::Hypotension,
                VitalFlag::Hypertension,
            ),
            (
                vitals.diastolic_bp,
                &self.config.diastolic_bp,
                VitalFlag::Hypotension,
                VitalFlag::Hypertension,
            ),
            (
                vitals.spo2,
                &self.config.spo2,
                VitalFlag::Hypoxia,
                VitalFlag::Hypoxia,
            ),
            (
                vitals.respiratory_rate,
                &self.config.respiratory_rate,
                VitalFlag::Bradypnea,
                VitalFlag::Tachypnea,
            ),
        ];

        for (value, bounds, low_flag, high_flag) in metrics {
            let range = classify(value, bounds);
            if range == Range::Normal {
                continue;
            }
            out_of_range += 1;
            any_critical |= range == Range::Critical;
            flags.push(if value < bounds.low { low_flag } else { high_flag });
        }

        if vitals.consciousness >= self.consciousness_floor {
            flags.push(VitalFlag::Unresponsive);
            any_critical = true;
        }

        flags.sort();
        flags.dedup();

        let level = if any_critical {
            RiskLevel::Critical
        } else if out_of_range >= self.config.elevated_metric_count {
            RiskLevel::Elevated
        } else {
            RiskLevel::Normal
        };

        RiskAssessment { level, flags }
    }
}

/// Trend of each tracked metric over the retained history (oldest first).
///
/// Mirrors what the receiving hospital wants at handover: direction, not
/// magnitude.
pub fn vital_trends(history: &[VitalsSnapshot]) -> TrendReport {
    if history.len() < 2 {
        return TrendReport::default();
    }

    let first = &history[0];
    let last = &history[history.len() - 1];

    let direction = |a: f64, b: f64| {
        if b > a {
            TrendDirection::Rising
        } else if b < a {
            TrendDirection::Falling
        } else {
            TrendDirection::Steady
        }
    };

    TrendReport {
        heart_rate: Some(direction(first.heart_rate, last.heart_rate)),
        systolic_bp: Some(direction(first.systolic_bp, last.systolic_bp)),
        spo2: Some(direction(first.spo2, last.spo2)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assessor() -> VitalsAssessor {
        VitalsAssessor::new(TriageConfig::default()).unwrap()
    }

    fn normal_vitals() -> VitalsSnapshot {
        VitalsSnapshot {
            heart_rate: 75.0,
            systolic_bp: 120.0,
            diastolic_bp: 80.0,
            spo2: 98.0,
            respiratory_rate: 16.0,
            consciousness: Consciousness::Alert,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn healthy_snapshot_is_normal() {
        let result = assessor().assess(&normal_vitals());
        assert_eq!(result.level, RiskLevel::Normal);
        assert!(result.flags.is_empty());
    }

    #[test]
    fn single_abnormal_metric_stays_normal() {
        let mut vitals = normal_vitals();
        vitals.heart_rate = 110.0;
        let result = assessor().assess(&vitals);
        assert_eq!(result.level, RiskLevel::Normal);
        assert_eq!(result.flags, vec![VitalFlag::Tachycardia]);
    }

    #[test]
    fn two_abnormal_metrics_are_elevated() {
        let mut vitals = normal_vitals();
        vitals.heart_rate = 110.0;
        vitals.respiratory_rate = 24.0;
        let result = assessor().assess(&vitals);
        assert_eq!(result.level, RiskLevel::Elevated);
    }

    #[test]
    fn spo2_below_critical_bound_is_critical_with_hypoxia() {
        let mut vitals = normal_vitals();
        vitals.spo2 = 85.0;
        let result = assessor().assess(&vitals);
        assert_eq!(result.level, RiskLevel::Critical);
        assert!(result.flags.contains(&VitalFlag::Hypoxia));
    }

    #[test]
    fn reduced_consciousness_alone_is_critical() {
        let mut vitals = normal_vitals();
        vitals.consciousness = Consciousness::Pain;
        let result = assessor().assess(&vitals);
        assert_eq!(result.level, RiskLevel::Critical);
        assert!(result.flags.contains(&VitalFlag::Unresponsive));
    }

    #[test]
    fn trends_report_direction() {
        let mut early = normal_vitals();
        let mut late = normal_vitals();
        early.spo2 = 97.0;
        late.spo2 = 91.0;
        late.heart_rate = 95.0;
        let report = vital_trends(&[early, late]);
        assert_eq!(report.spo2, Some(TrendDirection::Falling));
        assert_eq!(report.heart_rate, Some(TrendDirection::Rising));
    }

    #[test]
    fn short_history_has_no_trends() {
        let report = vital_trends(&[normal_vitals()]);
        assert_eq!(report, TrendReport::default());
    }

    /// Push each metric further from the middle of its normal range.
    fn worsen(vitals: &VitalsSnapshot, steps: f64) -> VitalsSnapshot {
        let mut worse = *vitals;
        worse.heart_rate += steps * 10.0;
        worse.systolic_bp += steps * 15.0;
        worse.respiratory_rate += steps * 4.0;
        worse.spo2 -= steps * 3.0;
        worse
    }

    proptest! {
        /// Componentwise-more-abnormal vitals never yield a lower level.
        #[test]
        fn risk_is_monotonic_in_severity(base_steps in 0.0f64..4.0, extra in 0.0f64..4.0) {
            let assessor = assessor();
            let baseline = worsen(&normal_vitals(), base_steps);
            let worse = worsen(&baseline, extra);
            prop_assert!(assessor.assess(&worse).level >= assessor.assess(&baseline).level);
        }

        /// Assessment is deterministic.
        #[test]
        fn assessment_is_pure(steps in 0.0f64..5.0) {
            let assessor = assessor();
            let vitals = worsen(&normal_vitals(), steps);
            prop_assert_eq!(assessor.assess(&vitals), assessor.assess(&vitals));
        }
    }
}
