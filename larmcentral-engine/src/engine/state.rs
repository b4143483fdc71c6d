//! The authoritative dispatch state store.
//!
//! Entities are held in id-indexed maps and mutated only through the
//! serialized event-processing path. Bed reservations and ambulance
//! attachment are the two guarded resources: every reserve/release is a
//! single transition checked against the store's invariants, and a failed
//! check leaves the store untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use larmcentral_core::model::{
    Ambulance, AmbulanceId, AmbulanceStatus, Emergency, EmergencyId, Hospital, HospitalId,
};
use larmcentral_core::DispatchError;

/// Initial roster of hospitals and ambulance units.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Roster {
    pub hospitals: Vec<Hospital>,
    pub ambulances: Vec<Ambulance>,
}

/// Authoritative in-memory state, cloned into read snapshots after each
/// applied event.
#[derive(Clone, Debug, Default)]
pub struct DispatchState {
    emergencies: HashMap<EmergencyId, Emergency>,
    ambulances: HashMap<AmbulanceId, Ambulance>,
    hospitals: HashMap<HospitalId, Hospital>,
    /// Emergencies still waiting for a unit, in creation order.
    pending: Vec<EmergencyId>,
    /// Terminal cases, retained for console history.
    archived: Vec<Emergency>,
}

impl DispatchState {
    pub fn from_roster(roster: Roster) -> Self {
        Self {
            emergencies: HashMap::new(),
            ambulances: roster
                .ambulances
                .into_iter()
                .map(|a| (a.id.clone(), a))
                .collect(),
            hospitals: roster
                .hospitals
                .into_iter()
                .map(|h| (h.id.clone(), h))
                .collect(),
            pending: Vec::new(),
            archived: Vec::new(),
        }
    }

    pub fn emergency(&self, id: &EmergencyId) -> Option<&Emergency> {
        self.emergencies.get(id)
    }

    pub fn emergency_mut(&mut self, id: &EmergencyId) -> Option<&mut Emergency> {
        self.emergencies.get_mut(id)
    }

    pub fn ambulance(&self, id: &AmbulanceId) -> Option<&Ambulance> {
        self.ambulances.get(id)
    }

    pub fn ambulance_mut(&mut self, id: &AmbulanceId) -> Option<&mut Ambulance> {
        self.ambulances.get_mut(id)
    }

    pub fn hospital(&self, id: &HospitalId) -> Option<&Hospital> {
        self.hospitals.get(id)
    }

    pub fn hospital_mut(&mut self, id: &HospitalId) -> Option<&mut Hospital> {
        self.hospitals.get_mut(id)
    }

    pub fn emergencies(&self) -> impl Iterator<Item = &Emergency> {
        self.emergencies.values()
    }

    pub fn ambulances(&self) -> impl Iterator<Item = &Ambulance> {
        self.ambulances.values()
    }

    pub fn hospitals(&self) -> impl Iterator<Item = &Hospital> {
        self.hospitals.values()
    }

    pub fn archived(&self) -> &[Emergency] {
        &self.archived
    }

    /// Active emergency ids whose allocation is still waiting for
    /// resources, oldest first.
    pub fn pending(&self) -> &[EmergencyId] {
        &self.pending
    }

    pub fn push_pending(&mut self, id: EmergencyId) {
        if !self.pending.contains(&id) {
            self.pending.push(id);
        }
    }

    pub fn remove_pending(&mut self, id: &EmergencyId) {
        self.pending.retain(|p| p != id);
    }

    /// Inserts a new emergency record.
    pub fn insert_emergency(&mut self, emergency: Emergency) -> Result<(), DispatchError> {
        if self.emergencies.contains_key(&emergency.id) {
            return Err(DispatchError::Validation(format!(
                "duplicate emergency id {}",
                emergency.id
            )));
        }
        self.emergencies.insert(emergency.id.clone(), emergency);
        Ok(())
    }

    /// Moves a terminal emergency out of the active map.
    pub fn archive_emergency(&mut self, id: &EmergencyId) {
        self.remove_pending(id);
        if let Some(emergency) = self.emergencies.remove(id) {
            self.archived.push(emergency);
        }
    }

    /// Reserves one bed at a hospital. Rejected if no bed is actually
    /// available; eligibility checks upstream make this unreachable in a
    /// correct event stream.
    pub fn reserve_bed(&mut self, id: &HospitalId) -> Result<(), DispatchError> {
        let hospital = self.hospitals.get_mut(id).ok_or_else(|| {
            DispatchError::Validation(format!("unknown hospital {id}"))
        })?;
        if hospital.available_beds() == 0 {
            debug_assert!(false, "bed reservation at full hospital {id}");
            return Err(DispatchError::InvariantViolation(format!(
                "bed reservation would overdraw hospital {id}"
            )));
        }
        hospital.reserved_beds += 1;
        Ok(())
    }

    /// Releases one previously reserved bed.
    pub fn release_bed(&mut self, id: &HospitalId) -> Result<(), DispatchError> {
        let hospital = self.hospitals.get_mut(id).ok_or_else(|| {
            DispatchError::Validation(format!("unknown hospital {id}"))
        })?;
        if hospital.reserved_beds == 0 {
            debug_assert!(false, "double bed release at hospital {id}");
            return Err(DispatchError::InvariantViolation(format!(
                "bed release without reservation at hospital {id}"
            )));
        }
        hospital.reserved_beds -= 1;
        Ok(())
    }

    /// Attaches an ambulance to an emergency; rejects double booking.
    pub fn attach_ambulance(
        &mut self,
        ambulance_id: &AmbulanceId,
        emergency_id: &EmergencyId,
    ) -> Result<(), DispatchError> {
        let ambulance = self.ambulances.get_mut(ambulance_id).ok_or_else(|| {
            DispatchError::Validation(format!("unknown ambulance {ambulance_id}"))
        })?;
        if let Some(existing) = &ambulance.emergency {
            debug_assert!(false, "double booking of ambulance {ambulance_id}");
            return Err(DispatchError::InvariantViolation(format!(
                "ambulance {ambulance_id} already serves emergency {existing}"
            )));
        }
        ambulance.status = AmbulanceStatus::Dispatched;
        ambulance.emergency = Some(emergency_id.clone());
        Ok(())
    }

    /// Releases an ambulance back to idle.
    pub fn detach_ambulance(&mut self, ambulance_id: &AmbulanceId) -> Result<(), DispatchError> {
        let ambulance = self.ambulances.get_mut(ambulance_id).ok_or_else(|| {
            DispatchError::Validation(format!("unknown ambulance {ambulance_id}"))
        })?;
        ambulance.status = AmbulanceStatus::Idle;
        ambulance.emergency = None;
        Ok(())
    }

    /// Verifies the cross-reference invariants; used by tests and the
    /// randomized-injection harness.
    pub fn check_invariants(&self) -> Result<(), DispatchError> {
        let mut seen: HashMap<&AmbulanceId, &EmergencyId> = HashMap::new();
        for emergency in self.emergencies.values().filter(|e| e.is_active()) {
            if let Some(ambulance) = &emergency.ambulance {
                if let Some(other) = seen.insert(ambulance, &emergency.id) {
                    return Err(DispatchError::InvariantViolation(format!(
                        "ambulance {ambulance} referenced by {other} and {}",
                        emergency.id
                    )));
                }
            }
            if matches!(
                emergency.status,
                larmcentral_core::model::EmergencyStatus::Assigned
                    | larmcentral_core::model::EmergencyStatus::EnRoute
                    | larmcentral_core::model::EmergencyStatus::Arrived
            ) && (emergency.ambulance.is_none() || emergency.hospital.is_none())
            {
                return Err(DispatchError::InvariantViolation(format!(
                    "emergency {} is {:?} without full references",
                    emergency.id, emergency.status
                )));
            }
        }
        for hospital in self.hospitals.values() {
            if hospital.reserved_beds > hospital.total_beds {
                return Err(DispatchError::InvariantViolation(format!(
                    "hospital {} reservations exceed capacity",
                    hospital.id
                )));
            }
        }
        Ok(())
    }
}
