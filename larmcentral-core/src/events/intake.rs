//! Producer events accepted by the allocation engine.
//!
//! Telemetry feeds, hospital capacity feeds, traffic feeds, and console
//! actions all funnel into this one vocabulary; the engine applies them
//! strictly one at a time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::model::{
    AmbulanceId, Condition, EmergencyId, Equipment, EquipmentState, HospitalId, SegmentId,
    VitalsSnapshot,
};

/// A single intake event with its submission timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DispatchEvent {
    /// Submission time (epoch ms).
    pub timestamp_ms: u64,
    pub kind: EventKind,
}

impl DispatchEvent {
    pub fn new(timestamp_ms: u64, kind: EventKind) -> Self {
        Self { timestamp_ms, kind }
    }
}

/// Every mutation the engine accepts, across all producers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Ambulance telemetry: position fix.
    LocationUpdate {
        ambulance: AmbulanceId,
        location: GeoPoint,
    },
    /// Ambulance console: new vitals snapshot.
    VitalsUpdate {
        ambulance: AmbulanceId,
        vitals: VitalsSnapshot,
    },
    /// Hospital capacity feed refresh.
    HospitalStatusUpdate {
        hospital: HospitalId,
        available_beds: u32,
        er_load: f64,
        equipment: BTreeMap<Equipment, EquipmentState>,
        on_call_doctors: u32,
    },
    /// Traffic feed: congestion factor for one road-grid segment.
    TrafficUpdate {
        segment: SegmentId,
        congestion_factor: f64,
    },
    /// Console: report a new emergency.
    CreateEmergency {
        emergency: EmergencyId,
        pickup: GeoPoint,
        condition: Condition,
    },
    /// Ambulance console: crew acknowledged the dispatch.
    Acknowledge { emergency: EmergencyId },
    /// Ambulance console: arrived at the destination hospital.
    MarkArrived { emergency: EmergencyId },
    /// Console: case handed over, release the unit.
    Close { emergency: EmergencyId },
    /// Console: abort the case from any non-closed state.
    Cancel { emergency: EmergencyId },
    /// Operator-forced destination, bypassing the switch margin.
    ManualOverride {
        emergency: EmergencyId,
        hospital: HospitalId,
    },
}

impl EventKind {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::LocationUpdate { .. } => "location_update",
            EventKind::VitalsUpdate { .. } => "vitals_update",
            EventKind::HospitalStatusUpdate { .. } => "hospital_state_update",
            EventKind::TrafficUpdate { .. } => "traffic_update",
            EventKind::CreateEmergency { .. } => "create_emergency",
            EventKind::Acknowledge { .. } => "acknowledge",
            EventKind::MarkArrived { .. } => "mark_arrived",
            EventKind::Close { .. } => "close",
            EventKind::Cancel { .. } => "cancel",
            EventKind::ManualOverride { .. } => "manual_override",
        }
    }
}
