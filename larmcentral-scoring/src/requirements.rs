//! Hospital requirements derived from the emergency.

use serde::{Deserialize, Serialize};

use larmcentral_core::model::{Condition, Specialty, SuspectedCondition};

/// What the destination hospital must (or should) provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    /// The condition driving specialty and equipment scoring.
    pub condition: Condition,
    /// Specialty the hospital should carry.
    pub specialty: Specialty,
    /// Whether missing that specialty makes the hospital ineligible.
    pub mandatory: bool,
}

impl Requirements {
    /// Baseline requirements for a reported condition.
    pub fn for_condition(condition: Condition) -> Self {
        Self {
            condition,
            specialty: condition.required_specialty(),
            mandatory: condition.specialty_is_mandatory(),
        }
    }

    /// Upgraded requirements after a critical risk escalation.
    ///
    /// The suspected condition pattern, when present, overrides the
    /// reported category; either way the specialty becomes mandatory so
    /// re-scoring only considers hospitals that can actually take the
    /// deteriorating patient.
    pub fn escalated(condition: Condition, suspected: Option<SuspectedCondition>) -> Self {
        let effective = match suspected {
            Some(SuspectedCondition::CardiacArrest) => Condition::Cardiac,
            Some(SuspectedCondition::Stroke) => Condition::Stroke,
            Some(SuspectedCondition::TraumaticShock) => Condition::Trauma,
            Some(SuspectedCondition::RespiratoryDistress) | None => condition,
        };
        Self {
            condition: effective,
            specialty: effective.required_specialty(),
            mandatory: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_condition_is_soft() {
        let req = Requirements::for_condition(Condition::Other);
        assert_eq!(req.specialty, Specialty::General);
        assert!(!req.mandatory);
    }

    #[test]
    fn escalation_makes_specialty_mandatory() {
        let req = Requirements::escalated(Condition::Other, None);
        assert!(req.mandatory);
    }

    #[test]
    fn suspected_pattern_overrides_reported_category() {
        let req = Requirements::escalated(Condition::Other, Some(SuspectedCondition::Stroke));
        assert_eq!(req.condition, Condition::Stroke);
        assert_eq!(req.specialty, Specialty::Neuro);
        assert!(req.mandatory);
    }
}
