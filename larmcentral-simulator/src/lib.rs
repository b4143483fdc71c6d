/*!
# Larmcentral Simulator

Deterministic simulation and replay for the dispatch decision core. A
driver (scripted scenario or seeded random generator) feeds intake events
into the engine on a virtual clock; the ordered notification stream is
folded into a BLAKE3 hash, so two runs of the same scenario must produce
the same decision log, hash and all.

## Key Components:
- **Scenario**: YAML script of roster + timed events.
- **Drivers**: scripted replay and seeded randomized generation.
- **Decision hashing**: replay validation against an expected hash.
*/

use std::sync::Arc;

use blake3::Hasher;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use larmcentral_config::LarmcentralConfig;
use larmcentral_core::events::Notification;
use larmcentral_core::DispatchError;
use larmcentral_engine::{DispatchRuntime, Roster};
use larmcentral_telemetry::MetricsRecorder;

pub mod diagnostics;
pub mod driver;
pub mod randomized;
pub mod scenario;

pub use diagnostics::DiagnosticsCollector;
pub use driver::{DispatchDriver, ScenarioDriver};
pub use randomized::RandomizedEventDriver;
pub use scenario::{load_scenario, save_scenario, Scenario, ScenarioError, TimedEvent};

/// Ties a dispatch runtime to a driver and hashes the decision log.
pub struct Simulator {
    runtime: Arc<DispatchRuntime>,
    notifications: UnboundedReceiver<Arc<Notification>>,
    hasher: Hasher,
    decisions: u64,
}

impl Simulator {
    pub fn new(
        config: LarmcentralConfig,
        roster: Roster,
        metrics: MetricsRecorder,
    ) -> Result<Self, DispatchError> {
        let runtime = DispatchRuntime::new(config, roster, metrics)?;
        // Subscribe before the first event so no decision escapes the log.
        let notifications = runtime.subscribe();
        Ok(Self {
            runtime,
            notifications,
            hasher: Hasher::new(),
            decisions: 0,
        })
    }

    pub fn runtime(&self) -> &Arc<DispatchRuntime> {
        &self.runtime
    }

    /// Runs the driver to completion and returns the decision-log hash.
    pub async fn run(&mut self, driver: &mut dyn DispatchDriver) -> Result<String, DispatchError> {
        while let Some(event) = driver.next_event().await? {
            self.runtime.apply_now(&event);
            self.fold_notifications();
        }
        self.fold_notifications();

        info!("Simulation complete: {} decisions hashed", self.decisions);
        Ok(hex::encode(self.hasher.finalize().as_bytes()))
    }

    /// Folds every drained notification into the state hash, in sequence
    /// order.
    fn fold_notifications(&mut self) {
        while let Ok(notification) = self.notifications.try_recv() {
            let serialized = serde_yaml::to_string(notification.as_ref())
                .expect("notifications serialize cleanly");
            self.hasher.update(serialized.as_bytes());
            self.decisions += 1;
        }
    }

    pub fn decisions(&self) -> u64 {
        self.decisions
    }
}

/// Demo roster used when no scenario supplies one: a handful of Delhi
/// hospitals with distinct capability profiles, plus three units.
pub fn default_roster() -> Roster {
    use larmcentral_core::geo::GeoPoint;
    use larmcentral_core::model::{
        Ambulance, AmbulanceId, Equipment, EquipmentState, Hospital, HospitalId, Specialty,
    };
    use std::collections::{BTreeMap, BTreeSet};

    let hospital = |id: &str,
                    name: &str,
                    lat: f64,
                    lng: f64,
                    specialties: &[Specialty],
                    beds: u32,
                    trauma: Option<u8>,
                    stroke: bool,
                    cath: bool| {
        let mut equipment = BTreeMap::new();
        equipment.insert(Equipment::CtScanner, EquipmentState::Available);
        equipment.insert(Equipment::OperatingRoom, EquipmentState::Available);
        if cath {
            equipment.insert(Equipment::CathLab, EquipmentState::Available);
        }
        Hospital {
            id: HospitalId::from(id),
            name: name.to_string(),
            location: GeoPoint::new(lat, lng),
            specialties: specialties.iter().copied().collect::<BTreeSet<_>>(),
            total_beds: beds * 2,
            reported_beds: beds,
            reserved_beds: 0,
            er_load: 0.5,
            equipment,
            on_call_doctors: 4,
            trauma_center_level: trauma,
            stroke_center: stroke,
            last_update_ms: 0,
        }
    };

    Roster {
        hospitals: vec![
            hospital(
                "H001",
                "All India Institute of Medical Sciences",
                28.5672,
                77.2100,
                &[
                    Specialty::Cardiac,
                    Specialty::Neuro,
                    Specialty::Trauma,
                    Specialty::Pediatric,
                    Specialty::General,
                ],
                12,
                Some(1),
                true,
                true,
            ),
            hospital(
                "H002",
                "Fortis Escorts Heart Institute",
                28.6139,
                77.2090,
                &[Specialty::Cardiac, Specialty::General],
                6,
                Some(2),
                false,
                true,
            ),
            hospital(
                "H003",
                "Max Super Speciality Hospital",
                28.6289,
                77.2065,
                &[
                    Specialty::Neuro,
                    Specialty::Cardiac,
                    Specialty::Trauma,
                    Specialty::Orthopedic,
                ],
                8,
                Some(1),
                true,
                true,
            ),
            hospital(
                "H004",
                "Safdarjung Hospital",
                28.5706,
                77.2081,
                &[
                    Specialty::Trauma,
                    Specialty::General,
                    Specialty::Pediatric,
                    Specialty::Orthopedic,
                ],
                10,
                Some(1),
                false,
                false,
            ),
        ],
        ambulances: vec![
            Ambulance::new(AmbulanceId::from("AMB-1"), GeoPoint::new(28.58, 77.20)),
            Ambulance::new(AmbulanceId::from("AMB-2"), GeoPoint::new(28.61, 77.22)),
            Ambulance::new(AmbulanceId::from("AMB-3"), GeoPoint::new(28.63, 77.19)),
        ],
    }
}
