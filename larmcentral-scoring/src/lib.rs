//! ## larmcentral-scoring
//! **Multi-criteria hospital suitability scoring**
//!
//! Pure function from a hospital's live state plus the emergency's
//! requirements to a weighted score, or an explicit ineligibility. The
//! scorer never raises: hospitals that cannot take the patient come back
//! as `Ineligible` with a reason, and everything else gets a number in
//! [0, 1] with a deterministic tie-break chain.
//!
//! Freshness is the caller's contract: the engine filters stale hospitals
//! before scoring, so this crate never sees (and never defaults) stale
//! state.

use serde::{Deserialize, Serialize};

use larmcentral_config::ScoringConfig;
use larmcentral_core::model::{
    Condition, Equipment, EquipmentState, Hospital, HospitalId, Specialty,
};

mod requirements;

pub use requirements::Requirements;

/// Why a hospital cannot take this patient at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IneligibleReason {
    /// No free emergency beds.
    NoBeds,
    /// A mandatory specialty is not in the capability set.
    MissingSpecialty,
}

/// Per-criterion sub-scores, all normalized to [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub eta: f64,
    pub specialty: f64,
    pub beds: f64,
    pub er_load: f64,
    pub equipment: f64,
    pub staff: f64,
    pub total: f64,
}

/// Outcome of scoring one hospital.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScoreOutcome {
    Eligible(ScoreBreakdown),
    Ineligible(IneligibleReason),
}

impl ScoreOutcome {
    pub fn score(&self) -> Option<f64> {
        match self {
            ScoreOutcome::Eligible(breakdown) => Some(breakdown.total),
            ScoreOutcome::Ineligible(_) => None,
        }
    }
}

/// One entry of a ranked candidate list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedHospital {
    pub hospital: HospitalId,
    pub eta_min: f64,
    pub breakdown: ScoreBreakdown,
    /// Human-readable grounds for the ranking, for console display.
    pub reasons: Vec<String>,
}

/// Configured hospital scorer.
pub struct HospitalScorer {
    config: ScoringConfig,
}

impl HospitalScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Scores one hospital against the requirements, given the current ETA
    /// from the ambulance (or pickup) to that hospital.
    pub fn score(&self, hospital: &Hospital, req: &Requirements, eta_min: f64) -> ScoreOutcome {
        if hospital.available_beds() == 0 {
            return ScoreOutcome::Ineligible(IneligibleReason::NoBeds);
        }
        if req.mandatory && !hospital.specialties.contains(&req.specialty) {
            return ScoreOutcome::Ineligible(IneligibleReason::MissingSpecialty);
        }

        let weights = &self.config.weights;
        let eta_score = (1.0 - eta_min / self.config.eta_horizon_min).clamp(0.0, 1.0);
        let specialty = specialty_score(hospital, req.condition);
        let beds = hospital.bed_ratio().clamp(0.0, 1.0);
        let er_load = (1.0 - hospital.er_load).clamp(0.0, 1.0);
        let equipment = equipment_score(hospital, req.condition);
        let staff =
            (f64::from(hospital.on_call_doctors) / f64::from(self.config.staff_target)).min(1.0);

        let total = eta_score * weights.eta
            + specialty * weights.specialty
            + beds * weights.beds
            + er_load * weights.er_load
            + equipment * weights.equipment
            + staff * weights.staff;

        ScoreOutcome::Eligible(ScoreBreakdown {
            eta: eta_score,
            specialty,
            beds,
            er_load,
            equipment,
            staff,
            total,
        })
    }

    /// Scores and ranks a candidate set, best first.
    ///
    /// Scores within `score_epsilon` are tied and resolved by: lower ETA,
    /// then higher bed ratio, then lowest hospital id.
    pub fn rank(
        &self,
        candidates: &[(&Hospital, f64)],
        req: &Requirements,
    ) -> Vec<RankedHospital> {
        let mut ranked: Vec<(RankedHospital, f64)> = candidates
            .iter()
            .filter_map(|(hospital, eta_min)| match self.score(hospital, req, *eta_min) {
                ScoreOutcome::Eligible(breakdown) => Some((
                    RankedHospital {
                        hospital: hospital.id.clone(),
                        eta_min: *eta_min,
                        breakdown,
                        reasons: recommendation_reasons(hospital, req.condition, breakdown.total),
                    },
                    hospital.bed_ratio(),
                )),
                ScoreOutcome::Ineligible(_) => None,
            })
            .collect();

        let epsilon = self.config.score_epsilon;
        ranked.sort_by(|(a, a_beds), (b, b_beds)| {
            let by_score = if (a.breakdown.total - b.breakdown.total).abs() <= epsilon {
                std::cmp::Ordering::Equal
            } else {
                b.breakdown
                    .total
                    .partial_cmp(&a.breakdown.total)
                    .unwrap_or(std::cmp::Ordering::Equal)
            };
            by_score
                .then_with(|| {
                    a.eta_min
                        .partial_cmp(&b.eta_min)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| {
                    b_beds
                        .partial_cmp(a_beds)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.hospital.cmp(&b.hospital))
        });

        ranked.into_iter().map(|(entry, _)| entry).collect()
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }
}

/// Specialty match credit, with dedicated-unit bonuses.
fn specialty_score(hospital: &Hospital, condition: Condition) -> f64 {
    match condition {
        Condition::Cardiac => {
            if hospital.specialties.contains(&Specialty::Cardiac) {
                if hospital.equipment_state(Equipment::CathLab) != EquipmentState::Unavailable {
                    1.0
                } else {
                    0.8
                }
            } else {
                0.3
            }
        }
        Condition::Stroke => {
            if hospital.specialties.contains(&Specialty::Neuro) {
                if hospital.stroke_center {
                    1.0
                } else {
                    0.8
                }
            } else {
                0.2
            }
        }
        Condition::Trauma => {
            if hospital.specialties.contains(&Specialty::Trauma) {
                match hospital.trauma_center_level {
                    Some(1) => 1.0,
                    Some(2) => 0.8,
                    _ => 0.6,
                }
            } else {
                0.4
            }
        }
        Condition::Other => 0.7,
    }
}

/// Equipment availability credit for the condition, with partial credit
/// for busy equipment.
fn equipment_score(hospital: &Hospital, condition: Condition) -> f64 {
    let mut score: f64 = 0.5;

    match condition {
        Condition::Cardiac => match hospital.equipment_state(Equipment::CathLab) {
            EquipmentState::Available => score += 0.5,
            EquipmentState::Busy => score += 0.2,
            EquipmentState::Unavailable => {}
        },
        Condition::Stroke => {
            if hospital.equipment_state(Equipment::CtScanner) == EquipmentState::Available {
                score += 0.3;
            }
            if hospital.equipment_state(Equipment::Mri) == EquipmentState::Available {
                score += 0.2;
            }
        }
        Condition::Trauma => {
            if hospital.equipment_state(Equipment::CtScanner) == EquipmentState::Available {
                score += 0.3;
            }
            if hospital.equipment_state(Equipment::OperatingRoom) == EquipmentState::Available {
                score += 0.2;
            }
        }
        Condition::Other => {}
    }

    score.min(1.0)
}

/// Human-readable grounds for recommending a hospital.
fn recommendation_reasons(hospital: &Hospital, condition: Condition, total: f64) -> Vec<String> {
    let mut reasons = Vec::new();

    if total > 0.8 {
        reasons.push("Excellent match for patient condition".to_string());
    } else if total > 0.6 {
        reasons.push("Good match for patient condition".to_string());
    }

    if condition == Condition::Cardiac
        && hospital.equipment_state(Equipment::CathLab) != EquipmentState::Unavailable
    {
        reasons.push("Has cardiac catheterization lab".to_string());
    }

    if condition == Condition::Stroke && hospital.stroke_center {
        reasons.push("Designated stroke center".to_string());
    }

    if condition == Condition::Trauma {
        match hospital.trauma_center_level {
            Some(1) => reasons.push("Level 1 trauma center".to_string()),
            Some(2) => reasons.push("Level 2 trauma center".to_string()),
            _ => {}
        }
    }

    if hospital.er_load < 0.5 {
        reasons.push("Low emergency room load".to_string());
    }

    if hospital.available_beds() > 5 {
        reasons.push("Good bed availability".to_string());
    }

    if reasons.is_empty() {
        reasons.push("Available for emergency care".to_string());
    }

    reasons
}
