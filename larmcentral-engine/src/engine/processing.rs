//! Serialized event application.
//!
//! One event is fully applied, including any cascading re-score and
//! reservation commit, before the next is touched. Validation happens
//! before any mutation, so a rejected event leaves the state exactly as it
//! was. The engine never blocks on external I/O here: traffic and hospital
//! state arrive inside events as already-fetched snapshots.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use larmcentral_config::LarmcentralConfig;
use larmcentral_core::events::{DispatchEvent, EventKind, NotificationBus, NotificationKind};
use larmcentral_core::geo::GeoPoint;
use larmcentral_core::model::{
    AmbulanceStatus, Emergency, EmergencyStatus, RiskLevel, VitalsSnapshot,
};
use larmcentral_core::DispatchError;
use larmcentral_routing::{RouteEstimator, TrafficSnapshot};
use larmcentral_scoring::{HospitalScorer, Requirements};
use larmcentral_telemetry::MetricsRecorder;
use larmcentral_triage::{suspect_condition, VitalsAssessor};

use super::state::{DispatchState, Roster};

/// The allocation engine's event processor: owns the authoritative state
/// and the three decision leaves.
pub struct DispatchProcessor {
    pub(crate) config: Arc<LarmcentralConfig>,
    pub(crate) state: DispatchState,
    pub(crate) traffic: TrafficSnapshot,
    pub(crate) assessor: VitalsAssessor,
    pub(crate) estimator: RouteEstimator,
    pub(crate) scorer: HospitalScorer,
    pub(crate) notifier: Arc<NotificationBus>,
    pub(crate) metrics: Arc<MetricsRecorder>,
}

impl DispatchProcessor {
    pub fn new(
        config: Arc<LarmcentralConfig>,
        roster: Roster,
        notifier: Arc<NotificationBus>,
        metrics: Arc<MetricsRecorder>,
    ) -> Result<Self, DispatchError> {
        let assessor = VitalsAssessor::new(config.triage.clone())
            .map_err(|e| DispatchError::Config(e.to_string()))?;
        Ok(Self {
            estimator: RouteEstimator::new(config.routing.clone()),
            scorer: HospitalScorer::new(config.scoring.clone()),
            assessor,
            config,
            state: DispatchState::from_roster(roster),
            traffic: TrafficSnapshot::new(),
            notifier,
            metrics,
        })
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    /// Applies one event. Rejected events are counted and leave the state
    /// untouched; the caller decides whether to log or abort.
    #[instrument(skip_all, level = "debug", fields(kind = event.kind.label()))]
    pub fn apply(&mut self, event: &DispatchEvent) -> Result<(), DispatchError> {
        debug!("Applying intake event");
        let result = self.apply_inner(event);
        match &result {
            Ok(()) => self.metrics.inc_processed_events(),
            Err(err) => {
                self.metrics.rejected_events.inc();
                warn!("Rejected intake event: {err}");
            }
        }
        result
    }

    fn apply_inner(&mut self, event: &DispatchEvent) -> Result<(), DispatchError> {
        let now = event.timestamp_ms;
        match &event.kind {
            EventKind::LocationUpdate {
                ambulance,
                location,
            } => {
                validate_geo(location)?;
                let unit = self
                    .state
                    .ambulance_mut(ambulance)
                    .ok_or_else(|| unknown("ambulance", ambulance.as_str()))?;
                unit.location = *location;
                unit.last_seen_ms = now;
                Ok(())
            }

            EventKind::VitalsUpdate { ambulance, vitals } => {
                validate_vitals(vitals)?;
                self.handle_vitals(ambulance.clone(), *vitals, now)
            }

            EventKind::HospitalStatusUpdate {
                hospital,
                available_beds,
                er_load,
                equipment,
                on_call_doctors,
            } => {
                if !er_load.is_finite() || !(0.0..=1.0).contains(er_load) {
                    return Err(DispatchError::Validation(format!(
                        "er_load {er_load} outside [0, 1]"
                    )));
                }
                {
                    let h = self
                        .state
                        .hospital_mut(hospital)
                        .ok_or_else(|| unknown("hospital", hospital.as_str()))?;
                    h.reported_beds = *available_beds;
                    h.er_load = *er_load;
                    h.equipment = equipment.clone();
                    h.on_call_doctors = *on_call_doctors;
                    h.last_update_ms = now;
                }
                // Fresh capacity may unblock waiting cases and can shift
                // the ranking of committed ones.
                self.retry_pending(now);
                self.reevaluate_all(now);
                Ok(())
            }

            EventKind::TrafficUpdate {
                segment,
                congestion_factor,
            } => {
                if !congestion_factor.is_finite() || *congestion_factor <= 0.0 {
                    return Err(DispatchError::Validation(format!(
                        "congestion factor {congestion_factor} must be positive"
                    )));
                }
                self.traffic.apply(segment.clone(), *congestion_factor, now);
                self.traffic
                    .prune_stale(now, self.config.engine.freshness_window_secs);
                self.handle_traffic_change(segment.clone(), now);
                Ok(())
            }

            EventKind::CreateEmergency {
                emergency,
                pickup,
                condition,
            } => {
                validate_geo(pickup)?;
                self.state.insert_emergency(Emergency::new(
                    emergency.clone(),
                    *pickup,
                    *condition,
                    now,
                ))?;
                self.try_assign(emergency, now)
            }

            EventKind::Acknowledge { emergency } => {
                let ambulance = {
                    let e = self.active_in_status(emergency, EmergencyStatus::Assigned)?;
                    e.ambulance.clone()
                };
                self.state
                    .emergency_mut(emergency)
                    .expect("checked above")
                    .status = EmergencyStatus::EnRoute;
                if let Some(ambulance) = ambulance {
                    if let Some(unit) = self.state.ambulance_mut(&ambulance) {
                        unit.status = AmbulanceStatus::Transporting;
                    }
                }
                Ok(())
            }

            EventKind::MarkArrived { emergency } => {
                self.active_in_status(emergency, EmergencyStatus::EnRoute)?;
                self.state
                    .emergency_mut(emergency)
                    .expect("checked above")
                    .status = EmergencyStatus::Arrived;
                Ok(())
            }

            EventKind::Close { emergency } => {
                self.active_in_status(emergency, EmergencyStatus::Arrived)?;
                self.close_case(emergency, now, true)
            }

            EventKind::Cancel { emergency } => {
                let e = self
                    .state
                    .emergency(emergency)
                    .ok_or_else(|| unknown("emergency", emergency.as_str()))?;
                if !e.status.can_transition_to(EmergencyStatus::Cancelled) {
                    return Err(DispatchError::Validation(format!(
                        "emergency {emergency} is already terminal"
                    )));
                }
                self.close_case(emergency, now, false)
            }

            EventKind::ManualOverride {
                emergency,
                hospital,
            } => self.handle_manual_override(emergency.clone(), hospital.clone(), now),
        }
    }

    /// Looks up an active emergency and checks its current status.
    fn active_in_status(
        &self,
        id: &larmcentral_core::model::EmergencyId,
        expected: EmergencyStatus,
    ) -> Result<&Emergency, DispatchError> {
        let e = self
            .state
            .emergency(id)
            .ok_or_else(|| unknown("emergency", id.as_str()))?;
        if e.status != expected {
            return Err(DispatchError::Validation(format!(
                "emergency {id} is {:?}, expected {:?}",
                e.status, expected
            )));
        }
        Ok(e)
    }

    fn handle_vitals(
        &mut self,
        ambulance: larmcentral_core::model::AmbulanceId,
        vitals: VitalsSnapshot,
        now: u64,
    ) -> Result<(), DispatchError> {
        let history_len = self.config.engine.vitals_history_len;
        let emergency_id = {
            let unit = self
                .state
                .ambulance_mut(&ambulance)
                .ok_or_else(|| unknown("ambulance", ambulance.as_str()))?;
            unit.record_vitals(vitals, history_len);
            unit.last_seen_ms = now;
            unit.emergency.clone()
        };

        let Some(emergency_id) = emergency_id else {
            return Ok(());
        };

        let assessment = self.assessor.assess(&vitals);
        let suspected = suspect_condition(&vitals);

        let (escalated, condition, suspected, status) = {
            let Some(e) = self.state.emergency_mut(&emergency_id) else {
                return Ok(());
            };
            let previous = e.risk.as_ref().map(|r| r.level);
            let escalated = assessment.level == RiskLevel::Critical
                && previous != Some(RiskLevel::Critical);
            e.risk = Some(assessment.clone());
            // A suspicion, once raised, sticks for the handover even if a
            // later snapshot looks calmer.
            e.suspected = suspected.or(e.suspected);
            (escalated, e.condition, e.suspected, e.status)
        };

        if escalated {
            self.metrics.risk_escalations.inc();
            // Escalation is announced before any re-score is attempted.
            let snapshot = self.state.emergency(&emergency_id).expect("active").clone();
            self.notifier.publish(
                now,
                emergency_id.clone(),
                NotificationKind::RiskEscalated { assessment },
                snapshot,
            );

            if matches!(
                status,
                EmergencyStatus::Assigned | EmergencyStatus::EnRoute
            ) {
                let requirements = Requirements::escalated(condition, suspected);
                self.reevaluate(&emergency_id, &requirements, true, now)?;
            }
        }
        Ok(())
    }
}

fn unknown(entity: &str, id: &str) -> DispatchError {
    DispatchError::Validation(format!("unknown {entity} {id}"))
}

fn validate_geo(point: &GeoPoint) -> Result<(), DispatchError> {
    let valid = point.lat.is_finite()
        && point.lng.is_finite()
        && (-90.0..=90.0).contains(&point.lat)
        && (-180.0..=180.0).contains(&point.lng);
    if valid {
        Ok(())
    } else {
        Err(DispatchError::Validation(format!(
            "coordinates ({}, {}) out of range",
            point.lat, point.lng
        )))
    }
}

fn validate_vitals(vitals: &VitalsSnapshot) -> Result<(), DispatchError> {
    let values = [
        vitals.heart_rate,
        vitals.systolic_bp,
        vitals.diastolic_bp,
        vitals.spo2,
        vitals.respiratory_rate,
    ];
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) || vitals.spo2 > 100.0 {
        return Err(DispatchError::Validation(
            "vitals snapshot contains implausible values".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use larmcentral_core::events::{Notification, NotificationBus};
    use larmcentral_core::model::{
        Ambulance, AmbulanceId, Condition, Consciousness, EmergencyId, Hospital, HospitalId,
        SegmentId, Specialty,
    };
    use std::collections::{BTreeMap, BTreeSet};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn hospital(id: &str, lat: f64, beds: u32, specialties: &[Specialty]) -> Hospital {
        Hospital {
            id: HospitalId::from(id),
            name: format!("Hospital {id}"),
            location: GeoPoint::new(lat, 77.2),
            specialties: specialties.iter().copied().collect::<BTreeSet<_>>(),
            total_beds: 20,
            reported_beds: beds,
            reserved_beds: 0,
            er_load: 0.4,
            equipment: BTreeMap::new(),
            on_call_doctors: 4,
            trauma_center_level: None,
            stroke_center: false,
            last_update_ms: 0,
        }
    }

    fn ambulance(id: &str, lat: f64) -> Ambulance {
        Ambulance::new(AmbulanceId::from(id), GeoPoint::new(lat, 77.2))
    }

    fn processor(roster: Roster) -> (DispatchProcessor, UnboundedReceiver<Arc<Notification>>) {
        let notifier = Arc::new(NotificationBus::new());
        let rx = notifier.subscribe();
        let processor = DispatchProcessor::new(
            Arc::new(LarmcentralConfig::default()),
            roster,
            notifier,
            Arc::new(MetricsRecorder::new()),
        )
        .unwrap();
        (processor, rx)
    }

    fn create(id: &str, lat: f64, condition: Condition, ts: u64) -> DispatchEvent {
        DispatchEvent::new(
            ts,
            EventKind::CreateEmergency {
                emergency: EmergencyId::from(id),
                pickup: GeoPoint::new(lat, 77.2),
                condition,
            },
        )
    }

    fn normal_vitals(ts: u64) -> VitalsSnapshot {
        VitalsSnapshot {
            heart_rate: 75.0,
            systolic_bp: 120.0,
            diastolic_bp: 80.0,
            spo2: 98.0,
            respiratory_rate: 16.0,
            consciousness: Consciousness::Alert,
            timestamp_ms: ts,
        }
    }

    fn drain(rx: &mut UnboundedReceiver<Arc<Notification>>) -> Vec<Arc<Notification>> {
        let mut out = Vec::new();
        while let Ok(n) = rx.try_recv() {
            out.push(n);
        }
        out
    }

    #[test]
    fn mandatory_specialty_beats_shorter_eta() {
        // A: cardiac-capable but farther. B: closer, bigger, not cardiac.
        let roster = Roster {
            hospitals: vec![
                hospital("HA", 28.6523, 1, &[Specialty::Cardiac]),
                hospital("HB", 28.6261, 5, &[Specialty::General]),
            ],
            ambulances: vec![ambulance("AMB-1", 28.60)],
        };
        let (mut p, _rx) = processor(roster);
        p.apply(&create("EMG-1", 28.60, Condition::Cardiac, 1000)).unwrap();

        let e = p.state().emergency(&EmergencyId::from("EMG-1")).unwrap();
        assert_eq!(e.status, EmergencyStatus::Assigned);
        assert_eq!(e.hospital, Some(HospitalId::from("HA")));
    }

    #[test]
    fn feed_drop_after_commit_is_not_retroactive() {
        let roster = Roster {
            hospitals: vec![hospital("H001", 28.63, 1, &[Specialty::General])],
            ambulances: vec![ambulance("AMB-1", 28.60)],
        };
        let (mut p, _rx) = processor(roster);
        p.apply(&create("EMG-1", 28.60, Condition::Other, 1000)).unwrap();

        let h001 = HospitalId::from("H001");
        assert_eq!(p.state().hospital(&h001).unwrap().available_beds(), 0);

        // Feed now reports zero raw beds.
        p.apply(&DispatchEvent::new(
            2000,
            EventKind::HospitalStatusUpdate {
                hospital: h001.clone(),
                available_beds: 0,
                er_load: 0.4,
                equipment: BTreeMap::new(),
                on_call_doctors: 4,
            },
        ))
        .unwrap();

        // The committed reservation stands.
        let e = p.state().emergency(&EmergencyId::from("EMG-1")).unwrap();
        assert_eq!(e.hospital, Some(h001.clone()));
        assert_eq!(e.status, EmergencyStatus::Assigned);
        assert_eq!(p.state().hospital(&h001).unwrap().reserved_beds, 1);

        // Walk to closure; the release leaves the ledger consistent with
        // the feed, not negative.
        let emg = EmergencyId::from("EMG-1");
        p.apply(&DispatchEvent::new(3000, EventKind::Acknowledge { emergency: emg.clone() }))
            .unwrap();
        p.apply(&DispatchEvent::new(4000, EventKind::MarkArrived { emergency: emg.clone() }))
            .unwrap();
        p.apply(&DispatchEvent::new(5000, EventKind::Close { emergency: emg })).unwrap();

        let h = p.state().hospital(&h001).unwrap();
        assert_eq!(h.reserved_beds, 0);
        assert_eq!(h.available_beds(), 0);
    }

    #[test]
    fn risk_escalation_is_announced_before_any_rescore() {
        let roster = Roster {
            hospitals: vec![hospital("H001", 28.63, 5, &[Specialty::General])],
            ambulances: vec![ambulance("AMB-1", 28.60)],
        };
        let (mut p, mut rx) = processor(roster);
        p.apply(&create("EMG-1", 28.60, Condition::Other, 1000)).unwrap();

        let mut vitals = normal_vitals(2000);
        vitals.spo2 = 85.0;
        p.apply(&DispatchEvent::new(
            2000,
            EventKind::VitalsUpdate {
                ambulance: AmbulanceId::from("AMB-1"),
                vitals,
            },
        ))
        .unwrap();

        let notifications = drain(&mut rx);
        assert!(matches!(
            notifications[0].kind,
            NotificationKind::AssignmentChanged { .. }
        ));
        let escalation_at = notifications
            .iter()
            .position(|n| matches!(n.kind, NotificationKind::RiskEscalated { .. }))
            .expect("risk_escalated emitted");
        let rescore_after = notifications
            .iter()
            .skip(1)
            .position(|n| matches!(n.kind, NotificationKind::AssignmentChanged { .. }))
            .map(|i| i + 1);
        if let Some(rescore_at) = rescore_after {
            assert!(escalation_at < rescore_at);
        }

        let e = p.state().emergency(&EmergencyId::from("EMG-1")).unwrap();
        assert_eq!(e.risk.as_ref().unwrap().level, RiskLevel::Critical);
    }

    #[test]
    fn marginal_score_jitter_never_flips_the_assignment() {
        let roster = Roster {
            hospitals: vec![
                hospital("H001", 28.63, 5, &[Specialty::General]),
                hospital("H002", 28.632, 5, &[Specialty::General]),
            ],
            ambulances: vec![ambulance("AMB-1", 28.60)],
        };
        let (mut p, mut rx) = processor(roster);
        p.apply(&create("EMG-1", 28.60, Condition::Other, 1000)).unwrap();
        let committed = p
            .state()
            .emergency(&EmergencyId::from("EMG-1"))
            .unwrap()
            .hospital
            .clone();

        // Noisy feed: ER load wobbles about one percent each refresh.
        for i in 0..20u64 {
            let load = if i % 2 == 0 { 0.39 } else { 0.41 };
            for id in ["H001", "H002"] {
                p.apply(&DispatchEvent::new(
                    2000 + i * 100,
                    EventKind::HospitalStatusUpdate {
                        hospital: HospitalId::from(id),
                        available_beds: 5,
                        er_load: load,
                        equipment: BTreeMap::new(),
                        on_call_doctors: 4,
                    },
                ))
                .unwrap();
            }
        }

        let e = p.state().emergency(&EmergencyId::from("EMG-1")).unwrap();
        assert_eq!(e.hospital, committed);
        let switches = drain(&mut rx)
            .iter()
            .filter(|n| {
                matches!(
                    n.kind,
                    NotificationKind::AssignmentChanged { previous: Some(_), .. }
                )
            })
            .count();
        assert_eq!(switches, 0);
    }

    #[test]
    fn degraded_fallback_flags_operator_review() {
        let roster = Roster {
            hospitals: vec![hospital("H001", 28.63, 5, &[Specialty::General])],
            ambulances: vec![ambulance("AMB-1", 28.60)],
        };
        let (mut p, mut rx) = processor(roster);
        p.apply(&create("EMG-1", 28.60, Condition::Cardiac, 1000)).unwrap();

        let e = p.state().emergency(&EmergencyId::from("EMG-1")).unwrap();
        assert_eq!(e.status, EmergencyStatus::Assigned);
        assert_eq!(e.hospital, Some(HospitalId::from("H001")));
        assert!(e.needs_manual_override);
        assert_eq!(p.metrics.fallback_assignments.get() as u64, 1);

        let notifications = drain(&mut rx);
        assert!(notifications
            .iter()
            .any(|n| matches!(n.kind, NotificationKind::ManualOverrideRequired { .. })));
    }

    #[test]
    fn stale_hospital_is_excluded_from_scoring() {
        let mut stale = hospital("H001", 28.61, 10, &[Specialty::General]);
        stale.last_update_ms = 0;
        let mut fresh = hospital("H002", 28.65, 3, &[Specialty::General]);
        fresh.last_update_ms = 100_000;

        let roster = Roster {
            hospitals: vec![stale, fresh],
            ambulances: vec![ambulance("AMB-1", 28.60)],
        };
        let (mut p, _rx) = processor(roster);
        // 120 s in: H001's feed is two minutes old, beyond the window.
        p.apply(&create("EMG-1", 28.60, Condition::Other, 120_000)).unwrap();

        let e = p.state().emergency(&EmergencyId::from("EMG-1")).unwrap();
        assert_eq!(e.hospital, Some(HospitalId::from("H002")));
    }

    #[test]
    fn waiting_case_is_retried_when_a_unit_frees_up() {
        let roster = Roster {
            hospitals: vec![hospital("H001", 28.63, 5, &[Specialty::General])],
            ambulances: vec![ambulance("AMB-1", 28.60)],
        };
        let (mut p, _rx) = processor(roster);
        p.apply(&create("EMG-1", 28.60, Condition::Other, 1000)).unwrap();
        p.apply(&create("EMG-2", 28.605, Condition::Other, 1100)).unwrap();

        let second = EmergencyId::from("EMG-2");
        assert_eq!(
            p.state().emergency(&second).unwrap().status,
            EmergencyStatus::Reported
        );
        assert_eq!(p.state().pending(), &[second.clone()]);

        let first = EmergencyId::from("EMG-1");
        p.apply(&DispatchEvent::new(2000, EventKind::Acknowledge { emergency: first.clone() }))
            .unwrap();
        p.apply(&DispatchEvent::new(3000, EventKind::MarkArrived { emergency: first.clone() }))
            .unwrap();
        p.apply(&DispatchEvent::new(4000, EventKind::Close { emergency: first })).unwrap();

        let e = p.state().emergency(&second).unwrap();
        assert_eq!(e.status, EmergencyStatus::Assigned);
        assert_eq!(e.ambulance, Some(AmbulanceId::from("AMB-1")));
    }

    #[test]
    fn traffic_shift_beyond_hysteresis_recomputes_the_route() {
        let roster = Roster {
            hospitals: vec![hospital("H001", 28.65, 5, &[Specialty::General])],
            ambulances: vec![ambulance("AMB-1", 28.60)],
        };
        let (mut p, mut rx) = processor(roster);
        p.apply(&create("EMG-1", 28.60, Condition::Other, 1000)).unwrap();
        let committed = p
            .state()
            .emergency(&EmergencyId::from("EMG-1"))
            .unwrap()
            .route
            .clone()
            .unwrap();
        drain(&mut rx);

        // Jam every segment of the committed route.
        for segment in &committed.segments {
            p.apply(&DispatchEvent::new(
                2000,
                EventKind::TrafficUpdate {
                    segment: segment.id.clone(),
                    congestion_factor: 3.0,
                },
            ))
            .unwrap();
        }

        let notifications = drain(&mut rx);
        assert!(notifications
            .iter()
            .any(|n| matches!(n.kind, NotificationKind::RouteRecomputed { .. })));
        let e = p.state().emergency(&EmergencyId::from("EMG-1")).unwrap();
        assert!(e.route.as_ref().unwrap().eta_min > committed.eta_min);
    }

    #[test]
    fn traffic_noise_within_hysteresis_leaves_assignment_untouched() {
        let roster = Roster {
            hospitals: vec![hospital("H001", 28.65, 5, &[Specialty::General])],
            ambulances: vec![ambulance("AMB-1", 28.60)],
        };
        let (mut p, mut rx) = processor(roster);
        p.apply(&create("EMG-1", 28.60, Condition::Other, 1000)).unwrap();
        let committed = p
            .state()
            .emergency(&EmergencyId::from("EMG-1"))
            .unwrap()
            .route
            .clone()
            .unwrap();
        drain(&mut rx);

        // Mild congestion on a single segment of a multi-segment route.
        assert!(committed.segments.len() >= 3);
        p.apply(&DispatchEvent::new(
            2000,
            EventKind::TrafficUpdate {
                segment: committed.segments[0].id.clone(),
                congestion_factor: 1.2,
            },
        ))
        .unwrap();

        assert!(drain(&mut rx).is_empty());
        let e = p.state().emergency(&EmergencyId::from("EMG-1")).unwrap();
        assert_eq!(e.route.as_ref().unwrap(), &committed);
    }

    #[test]
    fn escalation_abandons_an_incapable_incumbent() {
        let roster = Roster {
            hospitals: vec![
                hospital("H001", 28.61, 5, &[Specialty::General]),
                hospital("H002", 28.66, 5, &[Specialty::Neuro]),
            ],
            ambulances: vec![ambulance("AMB-1", 28.60)],
        };
        let (mut p, _rx) = processor(roster);
        p.apply(&create("EMG-1", 28.60, Condition::Other, 1000)).unwrap();
        assert_eq!(
            p.state().emergency(&EmergencyId::from("EMG-1")).unwrap().hospital,
            Some(HospitalId::from("H001"))
        );

        // Hypertensive, critical, stroke-patterned vitals.
        let mut vitals = normal_vitals(2000);
        vitals.systolic_bp = 185.0;
        vitals.heart_rate = 65.0;
        p.apply(&DispatchEvent::new(
            2000,
            EventKind::VitalsUpdate {
                ambulance: AmbulanceId::from("AMB-1"),
                vitals,
            },
        ))
        .unwrap();

        let e = p.state().emergency(&EmergencyId::from("EMG-1")).unwrap();
        assert_eq!(e.hospital, Some(HospitalId::from("H002")));
        assert_eq!(p.metrics.reallocations.get() as u64, 1);
    }

    #[test]
    fn manual_override_moves_the_reservation() {
        let roster = Roster {
            hospitals: vec![
                hospital("H001", 28.61, 5, &[Specialty::General]),
                hospital("H002", 28.66, 5, &[Specialty::General]),
            ],
            ambulances: vec![ambulance("AMB-1", 28.60)],
        };
        let (mut p, _rx) = processor(roster);
        p.apply(&create("EMG-1", 28.60, Condition::Other, 1000)).unwrap();
        assert_eq!(p.state().hospital(&HospitalId::from("H001")).unwrap().reserved_beds, 1);

        p.apply(&DispatchEvent::new(
            2000,
            EventKind::ManualOverride {
                emergency: EmergencyId::from("EMG-1"),
                hospital: HospitalId::from("H002"),
            },
        ))
        .unwrap();

        assert_eq!(p.state().hospital(&HospitalId::from("H001")).unwrap().reserved_beds, 0);
        assert_eq!(p.state().hospital(&HospitalId::from("H002")).unwrap().reserved_beds, 1);
        let e = p.state().emergency(&EmergencyId::from("EMG-1")).unwrap();
        assert_eq!(e.hospital, Some(HospitalId::from("H002")));
        assert!(!e.needs_manual_override);
    }

    #[test]
    fn cancel_releases_every_reservation() {
        let roster = Roster {
            hospitals: vec![hospital("H001", 28.63, 5, &[Specialty::General])],
            ambulances: vec![ambulance("AMB-1", 28.60)],
        };
        let (mut p, mut rx) = processor(roster);
        p.apply(&create("EMG-1", 28.60, Condition::Other, 1000)).unwrap();
        p.apply(&DispatchEvent::new(
            2000,
            EventKind::Cancel {
                emergency: EmergencyId::from("EMG-1"),
            },
        ))
        .unwrap();

        assert_eq!(p.state().hospital(&HospitalId::from("H001")).unwrap().reserved_beds, 0);
        let unit = p.state().ambulance(&AmbulanceId::from("AMB-1")).unwrap();
        assert!(unit.is_idle());
        assert!(p.state().emergency(&EmergencyId::from("EMG-1")).is_none());
        assert_eq!(p.state().archived().len(), 1);
        assert!(drain(&mut rx)
            .iter()
            .any(|n| matches!(n.kind, NotificationKind::EmergencyClosed { .. })));
    }

    #[test]
    fn closing_emits_a_handover_summary() {
        let roster = Roster {
            hospitals: vec![hospital("H001", 28.63, 5, &[Specialty::General])],
            ambulances: vec![ambulance("AMB-1", 28.60)],
        };
        let (mut p, mut rx) = processor(roster);
        let emg = EmergencyId::from("EMG-1");
        p.apply(&create("EMG-1", 28.60, Condition::Other, 1000)).unwrap();

        let mut early = normal_vitals(1500);
        early.spo2 = 96.0;
        let mut late = normal_vitals(2500);
        late.spo2 = 88.0;
        for vitals in [early, late] {
            p.apply(&DispatchEvent::new(
                vitals.timestamp_ms,
                EventKind::VitalsUpdate {
                    ambulance: AmbulanceId::from("AMB-1"),
                    vitals,
                },
            ))
            .unwrap();
        }

        p.apply(&DispatchEvent::new(3000, EventKind::Acknowledge { emergency: emg.clone() }))
            .unwrap();
        p.apply(&DispatchEvent::new(4000, EventKind::MarkArrived { emergency: emg.clone() }))
            .unwrap();
        p.apply(&DispatchEvent::new(5000, EventKind::Close { emergency: emg })).unwrap();

        let notifications = drain(&mut rx);
        let closed = notifications
            .iter()
            .find_map(|n| match &n.kind {
                NotificationKind::EmergencyClosed { handover } => handover.as_ref(),
                _ => None,
            })
            .expect("handover present");
        assert_eq!(
            closed.trends.spo2,
            Some(larmcentral_core::model::TrendDirection::Falling)
        );
        assert!(!closed.special_requirements.is_empty());
    }

    #[test]
    fn randomized_event_stream_never_double_books() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        let roster = Roster {
            hospitals: vec![
                hospital("H001", 28.61, 3, &[Specialty::General]),
                hospital("H002", 28.64, 2, &[Specialty::Cardiac, Specialty::General]),
                hospital("H003", 28.67, 4, &[Specialty::Trauma]),
            ],
            ambulances: vec![
                ambulance("AMB-1", 28.60),
                ambulance("AMB-2", 28.62),
                ambulance("AMB-3", 28.65),
            ],
        };
        let (mut p, _rx) = processor(roster);
        let mut rng = SmallRng::seed_from_u64(0x1a2b);
        let mut next_case = 0u32;

        for step in 0..600u64 {
            let ts = 1000 + step * 500;
            let roll: u8 = rng.random_range(0..10);
            let event = match roll {
                0 | 1 => {
                    next_case += 1;
                    let condition = match rng.random_range(0..4) {
                        0 => Condition::Cardiac,
                        1 => Condition::Trauma,
                        2 => Condition::Stroke,
                        _ => Condition::Other,
                    };
                    create(&format!("EMG-{next_case}"), 28.6 + rng.random_range(0.0..0.05), condition, ts)
                }
                2 => DispatchEvent::new(
                    ts,
                    EventKind::Acknowledge {
                        emergency: EmergencyId::new(format!("EMG-{}", rng.random_range(0..=next_case.max(1)))),
                    },
                ),
                3 => DispatchEvent::new(
                    ts,
                    EventKind::MarkArrived {
                        emergency: EmergencyId::new(format!("EMG-{}", rng.random_range(0..=next_case.max(1)))),
                    },
                ),
                4 => DispatchEvent::new(
                    ts,
                    EventKind::Close {
                        emergency: EmergencyId::new(format!("EMG-{}", rng.random_range(0..=next_case.max(1)))),
                    },
                ),
                5 => DispatchEvent::new(
                    ts,
                    EventKind::Cancel {
                        emergency: EmergencyId::new(format!("EMG-{}", rng.random_range(0..=next_case.max(1)))),
                    },
                ),
                6 => DispatchEvent::new(
                    ts,
                    EventKind::HospitalStatusUpdate {
                        hospital: HospitalId::new(format!("H00{}", rng.random_range(1..=3))),
                        available_beds: rng.random_range(0..6),
                        er_load: rng.random_range(0.0..1.0),
                        equipment: BTreeMap::new(),
                        on_call_doctors: rng.random_range(1..8),
                    },
                ),
                7 => DispatchEvent::new(
                    ts,
                    EventKind::TrafficUpdate {
                        segment: SegmentId::new(format!(
                            "S{}:{}",
                            rng.random_range(3170..3190),
                            rng.random_range(8570..8580)
                        )),
                        congestion_factor: rng.random_range(0.5..6.0),
                    },
                ),
                8 => {
                    let mut vitals = normal_vitals(ts);
                    vitals.heart_rate = rng.random_range(40.0..160.0);
                    vitals.spo2 = rng.random_range(80.0..100.0);
                    DispatchEvent::new(
                        ts,
                        EventKind::VitalsUpdate {
                            ambulance: AmbulanceId::new(format!("AMB-{}", rng.random_range(1..=3))),
                            vitals,
                        },
                    )
                }
                _ => DispatchEvent::new(
                    ts,
                    EventKind::LocationUpdate {
                        ambulance: AmbulanceId::new(format!("AMB-{}", rng.random_range(1..=3))),
                        location: GeoPoint::new(28.6 + rng.random_range(0.0..0.05), 77.2),
                    },
                ),
            };

            // Invalid references are rejected; everything else must keep
            // the cross-reference invariants intact.
            let _ = p.apply(&event);
            p.state().check_invariants().unwrap();
        }
    }
}
