//! Hospital records and capability vocabulary.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::HospitalId;
use crate::geo::GeoPoint;

/// Clinical specialty capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Specialty {
    Cardiac,
    Neuro,
    Trauma,
    Pediatric,
    Orthopedic,
    General,
}

/// Trackable equipment classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    CtScanner,
    Mri,
    CathLab,
    OperatingRoom,
}

/// Live availability of one equipment class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentState {
    Available,
    Busy,
    Unavailable,
}

/// A hospital as the engine sees it: static capabilities plus the latest
/// feed state and the engine's own reservation ledger.
///
/// `reported_beds` is the raw feed value; `reserved_beds` counts active
/// commitments. Scoring and eligibility always read [`Hospital::available_beds`],
/// so a feed update can never retroactively invalidate a committed
/// reservation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Hospital {
    pub id: HospitalId,
    pub name: String,
    pub location: GeoPoint,
    pub specialties: BTreeSet<Specialty>,
    /// Total emergency beds (capacity, not availability).
    pub total_beds: u32,
    /// Latest feed-reported free beds.
    pub reported_beds: u32,
    /// Beds currently held by committed assignments.
    #[serde(default)]
    pub reserved_beds: u32,
    /// ER load factor in [0, 1].
    pub er_load: f64,
    #[serde(default)]
    pub equipment: BTreeMap<Equipment, EquipmentState>,
    /// On-call emergency doctors.
    pub on_call_doctors: u32,
    /// Trauma center designation (1 = highest), if any.
    #[serde(default)]
    pub trauma_center_level: Option<u8>,
    #[serde(default)]
    pub stroke_center: bool,
    /// Last hospital-feed update (epoch ms).
    #[serde(default)]
    pub last_update_ms: u64,
}

impl Hospital {
    /// Beds usable for new assignments: the feed value net of reservations.
    pub fn available_beds(&self) -> u32 {
        self.reported_beds.saturating_sub(self.reserved_beds)
    }

    /// Fraction of total beds currently available.
    pub fn bed_ratio(&self) -> f64 {
        if self.total_beds == 0 {
            return 0.0;
        }
        f64::from(self.available_beds()) / f64::from(self.total_beds)
    }

    /// Whether the feed state is recent enough to base decisions on.
    pub fn is_fresh(&self, now_ms: u64, freshness_window_secs: u64) -> bool {
        now_ms.saturating_sub(self.last_update_ms) <= freshness_window_secs * 1000
    }

    /// Live state of one equipment class; absent entries are unavailable.
    pub fn equipment_state(&self, equipment: Equipment) -> EquipmentState {
        self.equipment
            .get(&equipment)
            .copied()
            .unwrap_or(EquipmentState::Unavailable)
    }
}
