//! Ambulance unit records.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::{AmbulanceId, EmergencyId, VitalsSnapshot};
use crate::geo::GeoPoint;

/// Operational state of an ambulance unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbulanceStatus {
    #[default]
    Idle,
    Dispatched,
    Transporting,
}

/// An ambulance as tracked from telemetry.
///
/// `emergency` is a weak reference: an id resolved through the store on
/// demand, never an owning link.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ambulance {
    pub id: AmbulanceId,
    pub location: GeoPoint,
    #[serde(default)]
    pub status: AmbulanceStatus,
    /// Active emergency this unit serves, if any.
    #[serde(default)]
    pub emergency: Option<EmergencyId>,
    /// Most recent vitals snapshot from the onboard console.
    #[serde(default)]
    pub vitals: Option<VitalsSnapshot>,
    /// Bounded history of recent snapshots, newest last, for trend analysis.
    #[serde(default)]
    pub vitals_history: VecDeque<VitalsSnapshot>,
    /// Last telemetry receipt (epoch ms).
    #[serde(default)]
    pub last_seen_ms: u64,
}

impl Ambulance {
    pub fn new(id: AmbulanceId, location: GeoPoint) -> Self {
        Self {
            id,
            location,
            status: AmbulanceStatus::Idle,
            emergency: None,
            vitals: None,
            vitals_history: VecDeque::new(),
            last_seen_ms: 0,
        }
    }

    /// Records a vitals snapshot, keeping at most `history_len` entries.
    pub fn record_vitals(&mut self, snapshot: VitalsSnapshot, history_len: usize) {
        self.vitals = Some(snapshot);
        self.vitals_history.push_back(snapshot);
        while self.vitals_history.len() > history_len {
            self.vitals_history.pop_front();
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == AmbulanceStatus::Idle && self.emergency.is_none()
    }
}
