//! Allocation decisions: assignment, reallocation, fallback, release.
//!
//! Every commit here happens inside one event's application. Reserving the
//! bed and flipping the ambulance are ordered so that a failed second step
//! rolls back the first, keeping "both or neither" true even for event
//! streams that should never occur.

use tracing::{debug, info, warn};

use larmcentral_core::events::{HandoverSummary, NotificationKind};
use larmcentral_core::geo::GeoPoint;
use larmcentral_core::model::{
    Emergency, EmergencyId, EmergencyStatus, Hospital, HospitalId, RiskLevel, Route, SegmentId,
};
use larmcentral_core::DispatchError;
use larmcentral_routing::RouteEstimator;
use larmcentral_scoring::{RankedHospital, Requirements};
use larmcentral_triage::vital_trends;

use super::processing::DispatchProcessor;

impl DispatchProcessor {
    /// Attempts the `Reported -> Assigned` transition: nearest idle unit by
    /// ETA plus the top-ranked eligible hospital, committed atomically.
    ///
    /// With no idle unit the case stays reported and is retried on the next
    /// availability change. With a unit but no eligible hospital, the
    /// degraded-mode fallback commits the nearest fresh hospital and flags
    /// the case for operator review.
    pub(crate) fn try_assign(
        &mut self,
        id: &EmergencyId,
        now: u64,
    ) -> Result<(), DispatchError> {
        let (pickup, requirements) = {
            let Some(e) = self.state.emergency(id) else {
                return Ok(());
            };
            if e.status != EmergencyStatus::Reported {
                return Ok(());
            }
            (e.pickup, self.requirements_for(e))
        };

        let Some(ambulance_id) = self.select_ambulance(&pickup) else {
            debug!("No idle ambulance for {id}; case stays reported");
            self.state.push_pending(id.clone());
            return Ok(());
        };

        let ranked = self.rank_hospitals(&pickup, &requirements, now, None);
        if let Some(top) = ranked.into_iter().next() {
            self.commit_assignment(id, &ambulance_id, top, None, false, now)
        } else {
            match self.nearest_fallback(&pickup, now) {
                Some(fallback) => {
                    warn!("No eligible hospital for {id}; committing fallback");
                    self.commit_assignment(id, &ambulance_id, fallback, None, true, now)
                }
                None => {
                    warn!(
                        "{}",
                        DispatchError::NoEligibleResource(format!(
                            "no fresh hospital with capacity for {id}"
                        ))
                    );
                    self.state.push_pending(id.clone());
                    Ok(())
                }
            }
        }
    }

    /// Re-runs assignment for every case still waiting, oldest first.
    pub(crate) fn retry_pending(&mut self, now: u64) {
        let waiting: Vec<EmergencyId> = self.state.pending().to_vec();
        for id in waiting {
            self.state.remove_pending(&id);
            if let Err(err) = self.try_assign(&id, now) {
                warn!("Retry for {id} failed: {err}");
            }
        }
    }

    /// Re-scores the committed hospital of one case and switches if a
    /// challenger beats the incumbent's re-scored value by more than the
    /// switch margin. On escalation (`escalation = true`) an incumbent that
    /// no longer meets the requirements is abandoned for the best eligible
    /// hospital regardless of margin, and a case stuck with no eligible
    /// destination is flagged for operator review.
    pub(crate) fn reevaluate(
        &mut self,
        id: &EmergencyId,
        requirements: &Requirements,
        escalation: bool,
        now: u64,
    ) -> Result<(), DispatchError> {
        let (pickup, incumbent_id) = {
            let Some(e) = self.state.emergency(id) else {
                return Ok(());
            };
            if !matches!(
                e.status,
                EmergencyStatus::Assigned | EmergencyStatus::EnRoute
            ) {
                return Ok(());
            }
            let Some(hospital) = e.hospital.clone() else {
                return Ok(());
            };
            (e.pickup, hospital)
        };

        // Score the incumbent as if our own reservation were not consuming
        // its bed, otherwise a one-bed hospital could never defend itself.
        let incumbent_score = self
            .state
            .hospital(&incumbent_id)
            .filter(|h| h.is_fresh(now, self.config.engine.freshness_window_secs))
            .map(|h| {
                let mut view = h.clone();
                view.reserved_beds = view.reserved_beds.saturating_sub(1);
                let eta = self.eta_to(&pickup, &view.location);
                self.scorer.score(&view, requirements, eta).score()
            })
            .unwrap_or(None);

        let challenger = self
            .rank_hospitals(&pickup, requirements, now, Some(&incumbent_id))
            .into_iter()
            .next();

        match (challenger, incumbent_score) {
            (Some(top), Some(incumbent)) => {
                let margin = self.config.engine.switch_margin;
                if top.breakdown.total > incumbent + margin {
                    self.switch_hospital(id, &incumbent_id, top, now)
                } else {
                    // Assignment stands; record the re-scored value.
                    if let Some(e) = self.state.emergency_mut(id) {
                        e.committed_score = Some(incumbent);
                    }
                    Ok(())
                }
            }
            (Some(top), None) => {
                // Incumbent went stale or ineligible under the (possibly
                // upgraded) requirements.
                self.switch_hospital(id, &incumbent_id, top, now)
            }
            (None, incumbent) => {
                if let Some(score) = incumbent {
                    if let Some(e) = self.state.emergency_mut(id) {
                        e.committed_score = Some(score);
                    }
                } else if escalation {
                    let snapshot = {
                        let e = self.state.emergency_mut(id).expect("active");
                        e.needs_manual_override = true;
                        e.clone()
                    };
                    self.notifier.publish(
                        now,
                        id.clone(),
                        NotificationKind::ManualOverrideRequired {
                            hospital: incumbent_id,
                        },
                        snapshot,
                    );
                }
                Ok(())
            }
        }
    }

    /// Re-evaluates every committed case, in id order for reproducibility.
    pub(crate) fn reevaluate_all(&mut self, now: u64) {
        let mut active: Vec<EmergencyId> = self
            .state
            .emergencies()
            .filter(|e| {
                matches!(
                    e.status,
                    EmergencyStatus::Assigned | EmergencyStatus::EnRoute
                )
            })
            .map(|e| e.id.clone())
            .collect();
        active.sort();

        for id in active {
            let requirements = match self.state.emergency(&id) {
                Some(e) => self.requirements_for(e),
                None => continue,
            };
            if let Err(err) = self.reevaluate(&id, &requirements, false, now) {
                warn!("Re-evaluation of {id} failed: {err}");
            }
        }
    }

    /// Reacts to a traffic change: re-estimates committed routes touching
    /// the segment, and only when the ETA moves beyond the hysteresis
    /// margin does the hospital choice get revisited.
    pub(crate) fn handle_traffic_change(&mut self, segment: SegmentId, now: u64) {
        let mut affected: Vec<(EmergencyId, GeoPoint, HospitalId, Route)> = self
            .state
            .emergencies()
            .filter(|e| {
                matches!(
                    e.status,
                    EmergencyStatus::Assigned | EmergencyStatus::EnRoute
                )
            })
            .filter_map(|e| {
                let route = e.route.as_ref()?;
                if !RouteEstimator::route_touches(route, &segment) {
                    return None;
                }
                Some((
                    e.id.clone(),
                    e.pickup,
                    e.hospital.clone()?,
                    route.clone(),
                ))
            })
            .collect();
        affected.sort_by(|a, b| a.0.cmp(&b.0));

        let hysteresis = self.config.routing.eta_hysteresis;
        for (id, pickup, hospital_id, committed_route) in affected {
            let Some(destination) = self.state.hospital(&hospital_id).map(|h| h.location) else {
                continue;
            };
            let fresh_route = self.estimator.estimate(&pickup, &destination, &self.traffic);

            if committed_route.eta_deviation(&fresh_route) <= hysteresis {
                continue;
            }

            info!(
                "ETA for {id} moved {:.1} -> {:.1} min; recomputing",
                committed_route.eta_min, fresh_route.eta_min
            );
            let snapshot = {
                let Some(e) = self.state.emergency_mut(&id) else {
                    continue;
                };
                e.route = Some(fresh_route.clone());
                e.clone()
            };
            self.notifier.publish(
                now,
                id.clone(),
                NotificationKind::RouteRecomputed { route: fresh_route },
                snapshot,
            );

            // Scoring is ETA-sensitive, so a real ETA shift re-opens the
            // hospital choice.
            let requirements = match self.state.emergency(&id) {
                Some(e) => self.requirements_for(e),
                None => continue,
            };
            if let Err(err) = self.reevaluate(&id, &requirements, false, now) {
                warn!("Post-traffic re-evaluation of {id} failed: {err}");
            }
        }
    }

    /// Terminal transition shared by close and cancel.
    pub(crate) fn close_case(
        &mut self,
        id: &EmergencyId,
        now: u64,
        handover: bool,
    ) -> Result<(), DispatchError> {
        let (ambulance_id, hospital_id) = {
            let e = self.state.emergency(id).expect("caller validated");
            (e.ambulance.clone(), e.hospital.clone())
        };

        if let Some(hospital) = &hospital_id {
            self.state.release_bed(hospital)?;
        }

        let summary = if handover {
            let trends = ambulance_id
                .as_ref()
                .and_then(|a| self.state.ambulance(a))
                .map(|unit| {
                    let history: Vec<_> = unit.vitals_history.iter().copied().collect();
                    vital_trends(&history)
                })
                .unwrap_or_default();
            let e = self.state.emergency(id).expect("caller validated");
            Some(HandoverSummary {
                condition: e.condition,
                suspected: e.suspected,
                risk_level: e.risk.as_ref().map(|r| r.level),
                trends,
                special_requirements: HandoverSummary::special_requirements(e.suspected),
            })
        } else {
            None
        };

        if let Some(ambulance) = &ambulance_id {
            self.state.detach_ambulance(ambulance)?;
        }

        let snapshot = {
            let e = self.state.emergency_mut(id).expect("caller validated");
            e.status = if handover {
                EmergencyStatus::Closed
            } else {
                EmergencyStatus::Cancelled
            };
            e.clone()
        };
        self.state.archive_emergency(id);

        self.notifier.publish(
            now,
            id.clone(),
            NotificationKind::EmergencyClosed { handover: summary },
            snapshot,
        );

        // A unit just went idle; waiting cases get another chance.
        self.retry_pending(now);
        Ok(())
    }

    /// Operator-forced destination. Bypasses the switch margin but never
    /// the bed invariant: a full hospital rejects the override.
    pub(crate) fn handle_manual_override(
        &mut self,
        id: EmergencyId,
        hospital_id: HospitalId,
        now: u64,
    ) -> Result<(), DispatchError> {
        let (pickup, current, condition) = {
            let e = self
                .state
                .emergency(&id)
                .ok_or_else(|| DispatchError::Validation(format!("unknown emergency {id}")))?;
            if !matches!(
                e.status,
                EmergencyStatus::Assigned | EmergencyStatus::EnRoute
            ) {
                return Err(DispatchError::Validation(format!(
                    "emergency {id} is {:?}, cannot override destination",
                    e.status
                )));
            }
            (e.pickup, e.hospital.clone().expect("assigned"), e.condition)
        };

        if current == hospital_id {
            if let Some(e) = self.state.emergency_mut(&id) {
                e.needs_manual_override = false;
            }
            return Ok(());
        }

        let target = self
            .state
            .hospital(&hospital_id)
            .ok_or_else(|| DispatchError::Validation(format!("unknown hospital {hospital_id}")))?;
        if target.available_beds() == 0 {
            return Err(DispatchError::NoEligibleResource(format!(
                "override target {hospital_id} has no free beds"
            )));
        }

        let destination = target.location;
        let eta = self.eta_to(&pickup, &destination);
        let soft = Requirements {
            condition,
            specialty: condition.required_specialty(),
            mandatory: false,
        };
        let score = self
            .state
            .hospital(&hospital_id)
            .and_then(|h| self.scorer.score(h, &soft, eta).score());

        self.state.reserve_bed(&hospital_id)?;
        if let Err(err) = self.state.release_bed(&current) {
            let _ = self.state.release_bed(&hospital_id);
            return Err(err);
        }

        let route = self.estimator.estimate(&pickup, &destination, &self.traffic);
        let snapshot = {
            let e = self.state.emergency_mut(&id).expect("active");
            e.hospital = Some(hospital_id.clone());
            e.committed_score = score;
            e.route = Some(route);
            e.needs_manual_override = false;
            e.clone()
        };

        self.metrics.reallocations.inc();
        self.notifier.publish(
            now,
            id,
            NotificationKind::AssignmentChanged {
                hospital: hospital_id,
                score: score.unwrap_or(0.0),
                previous: Some(current),
                reasons: vec!["Manual override by operator".to_string()],
            },
            snapshot,
        );
        Ok(())
    }

    /// Requirements for a case in its current risk state.
    pub(crate) fn requirements_for(&self, emergency: &Emergency) -> Requirements {
        let critical = emergency
            .risk
            .as_ref()
            .map(|r| r.level == RiskLevel::Critical)
            .unwrap_or(false);
        if critical {
            Requirements::escalated(emergency.condition, emergency.suspected)
        } else {
            Requirements::for_condition(emergency.condition)
        }
    }

    /// Nearest idle unit by ETA to the pickup point; ids break ties.
    fn select_ambulance(&self, pickup: &GeoPoint) -> Option<larmcentral_core::model::AmbulanceId> {
        self.state
            .ambulances()
            .filter(|a| a.is_idle())
            .map(|a| {
                let eta = self
                    .estimator
                    .estimate(&a.location, pickup, &self.traffic)
                    .eta_min;
                (eta, a.id.clone())
            })
            .min_by(|(ea, ia), (eb, ib)| {
                ea.partial_cmp(eb)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| ia.cmp(ib))
            })
            .map(|(_, id)| id)
    }

    /// Ranks fresh hospitals for the requirements; stale feeds are
    /// excluded before scoring, never scored with defaults.
    fn rank_hospitals(
        &self,
        pickup: &GeoPoint,
        requirements: &Requirements,
        now: u64,
        exclude: Option<&HospitalId>,
    ) -> Vec<RankedHospital> {
        let window = self.config.engine.freshness_window_secs;
        let candidates: Vec<(&Hospital, f64)> = self
            .state
            .hospitals()
            .filter(|h| h.is_fresh(now, window))
            .filter(|h| exclude.map_or(true, |ex| &h.id != ex))
            .map(|h| (h, self.eta_to(pickup, &h.location)))
            .collect();
        self.scorer.rank(&candidates, requirements)
    }

    /// Degraded-mode candidate: nearest fresh hospital with a free bed,
    /// specialty ignored.
    fn nearest_fallback(&self, pickup: &GeoPoint, now: u64) -> Option<RankedHospital> {
        let window = self.config.engine.freshness_window_secs;
        let nearest = self
            .state
            .hospitals()
            .filter(|h| h.is_fresh(now, window) && h.available_beds() > 0)
            .map(|h| (self.eta_to(pickup, &h.location), h))
            .min_by(|(ea, ha), (eb, hb)| {
                ea.partial_cmp(eb)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| ha.id.cmp(&hb.id))
            })?;

        let (eta, hospital) = nearest;
        let soft = Requirements {
            condition: larmcentral_core::model::Condition::Other,
            specialty: larmcentral_core::model::Specialty::General,
            mandatory: false,
        };
        match self.scorer.score(hospital, &soft, eta) {
            larmcentral_scoring::ScoreOutcome::Eligible(breakdown) => Some(RankedHospital {
                hospital: hospital.id.clone(),
                eta_min: eta,
                breakdown,
                reasons: vec!["Fallback: no hospital meets all requirements".to_string()],
            }),
            larmcentral_scoring::ScoreOutcome::Ineligible(_) => None,
        }
    }

    /// Commits ambulance and hospital in one step, or neither.
    fn commit_assignment(
        &mut self,
        id: &EmergencyId,
        ambulance_id: &larmcentral_core::model::AmbulanceId,
        choice: RankedHospital,
        previous: Option<HospitalId>,
        fallback: bool,
        now: u64,
    ) -> Result<(), DispatchError> {
        self.state.reserve_bed(&choice.hospital)?;
        if let Err(err) = self.state.attach_ambulance(ambulance_id, id) {
            let _ = self.state.release_bed(&choice.hospital);
            return Err(err);
        }

        let destination = self
            .state
            .hospital(&choice.hospital)
            .map(|h| h.location)
            .expect("ranked hospital exists");
        let pickup = self
            .state
            .emergency(id)
            .map(|e| e.pickup)
            .expect("caller validated");
        let route = self.estimator.estimate(&pickup, &destination, &self.traffic);

        let snapshot = {
            let e = self.state.emergency_mut(id).expect("caller validated");
            e.status = EmergencyStatus::Assigned;
            e.ambulance = Some(ambulance_id.clone());
            e.hospital = Some(choice.hospital.clone());
            e.committed_score = Some(choice.breakdown.total);
            e.route = Some(route);
            e.needs_manual_override = fallback;
            e.clone()
        };
        self.state.remove_pending(id);

        self.metrics.assignments.inc();
        if fallback {
            self.metrics.fallback_assignments.inc();
        }

        self.notifier.publish(
            now,
            id.clone(),
            NotificationKind::AssignmentChanged {
                hospital: choice.hospital.clone(),
                score: choice.breakdown.total,
                previous,
                reasons: choice.reasons.clone(),
            },
            snapshot.clone(),
        );
        if fallback {
            self.notifier.publish(
                now,
                id.clone(),
                NotificationKind::ManualOverrideRequired {
                    hospital: choice.hospital,
                },
                snapshot,
            );
        }
        Ok(())
    }

    /// Releases the incumbent's bed, commits the challenger's, and
    /// republishes the assignment.
    fn switch_hospital(
        &mut self,
        id: &EmergencyId,
        from: &HospitalId,
        to: RankedHospital,
        now: u64,
    ) -> Result<(), DispatchError> {
        self.state.reserve_bed(&to.hospital)?;
        if let Err(err) = self.state.release_bed(from) {
            let _ = self.state.release_bed(&to.hospital);
            return Err(err);
        }

        let destination = self
            .state
            .hospital(&to.hospital)
            .map(|h| h.location)
            .expect("ranked hospital exists");
        let pickup = self
            .state
            .emergency(id)
            .map(|e| e.pickup)
            .expect("active");
        let route = self.estimator.estimate(&pickup, &destination, &self.traffic);

        let snapshot = {
            let e = self.state.emergency_mut(id).expect("active");
            e.hospital = Some(to.hospital.clone());
            e.committed_score = Some(to.breakdown.total);
            e.route = Some(route);
            e.needs_manual_override = false;
            e.clone()
        };

        info!("Reallocating {id}: {from} -> {}", to.hospital);
        self.metrics.reallocations.inc();
        self.notifier.publish(
            now,
            id.clone(),
            NotificationKind::AssignmentChanged {
                hospital: to.hospital,
                score: to.breakdown.total,
                previous: Some(from.clone()),
                reasons: to.reasons,
            },
            snapshot,
        );
        Ok(())
    }

    /// ETA in minutes from a point to a destination under current traffic.
    fn eta_to(&self, from: &GeoPoint, to: &GeoPoint) -> f64 {
        self.estimator.estimate(from, to, &self.traffic).eta_min
    }
}
