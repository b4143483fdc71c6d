//! Emergency case records and the per-case state machine.

use serde::{Deserialize, Serialize};

use super::{
    AmbulanceId, EmergencyId, HospitalId, RiskAssessment, Route, Specialty, SuspectedCondition,
};
use crate::geo::GeoPoint;

/// Reported condition category of an emergency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Cardiac,
    Trauma,
    Stroke,
    Other,
}

impl Condition {
    /// Specialty a destination hospital must (or should) carry.
    pub fn required_specialty(&self) -> Specialty {
        match self {
            Condition::Cardiac => Specialty::Cardiac,
            Condition::Trauma => Specialty::Trauma,
            Condition::Stroke => Specialty::Neuro,
            Condition::Other => Specialty::General,
        }
    }

    /// Whether the specialty requirement is mandatory for eligibility.
    pub fn specialty_is_mandatory(&self) -> bool {
        !matches!(self, Condition::Other)
    }
}

/// Lifecycle of an emergency case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyStatus {
    Reported,
    Assigned,
    EnRoute,
    Arrived,
    Closed,
    Cancelled,
}

impl EmergencyStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EmergencyStatus::Closed | EmergencyStatus::Cancelled)
    }

    /// Legal forward transitions. `Cancelled` is reachable from every
    /// non-closed state; everything else is strictly linear.
    pub fn can_transition_to(&self, next: EmergencyStatus) -> bool {
        use EmergencyStatus::*;
        match (self, next) {
            (Reported, Assigned)
            | (Assigned, EnRoute)
            | (EnRoute, Arrived)
            | (Arrived, Closed) => true,
            (from, Cancelled) if !from.is_terminal() => true,
            _ => false,
        }
    }
}

/// An emergency case, owned exclusively by the allocation engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Emergency {
    pub id: EmergencyId,
    pub pickup: GeoPoint,
    pub condition: Condition,
    /// Creation time (epoch ms).
    pub created_ms: u64,
    pub status: EmergencyStatus,
    /// Assigned unit; present from `Assigned` onward.
    pub ambulance: Option<AmbulanceId>,
    /// Committed destination; present from `Assigned` onward.
    pub hospital: Option<HospitalId>,
    /// Score of the committed hospital at the last (re)evaluation.
    pub committed_score: Option<f64>,
    /// Committed route estimate to the destination.
    pub route: Option<Route>,
    /// Latest risk assessment from streamed vitals.
    pub risk: Option<RiskAssessment>,
    /// Condition pattern suspected from vitals, if any.
    pub suspected: Option<SuspectedCondition>,
    /// Set when a degraded-mode fallback was committed and an operator
    /// should review the destination.
    pub needs_manual_override: bool,
}

impl Emergency {
    pub fn new(id: EmergencyId, pickup: GeoPoint, condition: Condition, created_ms: u64) -> Self {
        Self {
            id,
            pickup,
            condition,
            created_ms,
            status: EmergencyStatus::Reported,
            ambulance: None,
            hospital: None,
            committed_score: None,
            route: None,
            risk: None,
            suspected: None,
            needs_manual_override: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}
