//! Domain model for the dispatch core.
//!
//! Entities are addressed by identifier and live in id-indexed maps inside
//! the engine's state store; cross-references between records are always
//! ids, never owning links, so closing one entity cannot dangle another.

mod ambulance;
mod emergency;
mod hospital;
mod ids;
mod route;
mod vitals;

pub use ambulance::{Ambulance, AmbulanceStatus};
pub use emergency::{Condition, Emergency, EmergencyStatus};
pub use hospital::{Equipment, EquipmentState, Hospital, Specialty};
pub use ids::{AmbulanceId, EmergencyId, HospitalId, SegmentId};
pub use route::{Route, RouteSegment, TrafficAlert};
pub use vitals::{
    Consciousness, RiskAssessment, RiskLevel, SuspectedCondition, TrendDirection, TrendReport,
    VitalFlag, VitalsSnapshot,
};
