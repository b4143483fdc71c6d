//! Condition suspicion from vitals patterns.
//!
//! Coarse pattern matching used to upgrade hospital requirements on
//! escalation and to prime the handover summary. Decision support only:
//! the suspected condition is surfaced, never acted on clinically.

use larmcentral_core::model::{SuspectedCondition, VitalsSnapshot};

/// Matches the snapshot against known deterioration patterns.
///
/// Patterns are checked most-severe first; the first hit wins.
pub fn suspect_condition(vitals: &VitalsSnapshot) -> Option<SuspectedCondition> {
    let hr = vitals.heart_rate;
    let sys = vitals.systolic_bp;
    let spo2 = vitals.spo2;
    let rr = vitals.respiratory_rate;

    // Cardiac arrest pattern: extreme rate or collapsed pressure.
    if hr < 50.0 || hr > 150.0 || sys < 80.0 {
        return Some(SuspectedCondition::CardiacArrest);
    }

    // Stroke pattern: high pressure with normal-to-low rate.
    if sys > 160.0 && hr < 80.0 {
        return Some(SuspectedCondition::Stroke);
    }

    // Respiratory distress pattern.
    if spo2 < 92.0 || rr > 25.0 {
        return Some(SuspectedCondition::RespiratoryDistress);
    }

    // Shock pattern: low pressure with compensating tachycardia.
    if sys < 90.0 && hr > 100.0 {
        return Some(SuspectedCondition::TraumaticShock);
    }

    None
}
