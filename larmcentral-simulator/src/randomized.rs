//! Seeded random event generation for fuzz runs.
//!
//! Produces plausible interleaved telemetry, feed, and console streams
//! against a fixed roster. Same seed, same stream: the randomness lives
//! here, never inside the engine.

use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use larmcentral_core::events::{DispatchEvent, EventKind};
use larmcentral_core::geo::GeoPoint;
use larmcentral_core::model::{
    AmbulanceId, Condition, Consciousness, EmergencyId, HospitalId, SegmentId, VitalsSnapshot,
};
use larmcentral_core::time::VirtualClock;
use larmcentral_core::DispatchError;
use larmcentral_engine::Roster;

use crate::driver::DispatchDriver;

/// Generates a bounded stream of randomized intake events.
pub struct RandomizedEventDriver {
    rng: SmallRng,
    clock: VirtualClock,
    remaining: usize,
    hospitals: Vec<HospitalId>,
    ambulances: Vec<AmbulanceId>,
    created: Vec<EmergencyId>,
    next_case: u32,
}

impl RandomizedEventDriver {
    pub fn new(seed: u64, max_events: usize, roster: &Roster) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            clock: VirtualClock::new(0),
            remaining: max_events,
            hospitals: roster.hospitals.iter().map(|h| h.id.clone()).collect(),
            ambulances: roster.ambulances.iter().map(|a| a.id.clone()).collect(),
            created: Vec::new(),
            next_case: 0,
        }
    }

    fn random_case(&mut self) -> Option<EmergencyId> {
        if self.created.is_empty() {
            return None;
        }
        let idx = self.rng.random_range(0..self.created.len());
        Some(self.created[idx].clone())
    }

    fn random_vitals(&mut self, ts: u64) -> VitalsSnapshot {
        VitalsSnapshot {
            heart_rate: self.rng.random_range(45.0..155.0),
            systolic_bp: self.rng.random_range(75.0..190.0),
            diastolic_bp: self.rng.random_range(50.0..115.0),
            spo2: self.rng.random_range(82.0..100.0),
            respiratory_rate: self.rng.random_range(8.0..32.0),
            consciousness: match self.rng.random_range(0..10) {
                0 => Consciousness::Pain,
                1..=2 => Consciousness::Verbal,
                _ => Consciousness::Alert,
            },
            timestamp_ms: ts,
        }
    }
}

#[async_trait]
impl DispatchDriver for RandomizedEventDriver {
    async fn next_event(&mut self) -> Result<Option<DispatchEvent>, DispatchError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;

        // 200ms to 2s between submissions.
        self.clock
            .advance(self.rng.random_range(200u64..2000) * 1_000_000);
        let ts = self.clock.now_ms();

        let kind = match self.rng.random_range(0..10u8) {
            0 | 1 => {
                self.next_case += 1;
                let id = EmergencyId::new(format!("EMG-{}", self.next_case));
                self.created.push(id.clone());
                EventKind::CreateEmergency {
                    emergency: id,
                    pickup: GeoPoint::new(
                        28.56 + self.rng.random_range(0.0..0.08),
                        77.18 + self.rng.random_range(0.0..0.05),
                    ),
                    condition: match self.rng.random_range(0..4) {
                        0 => Condition::Cardiac,
                        1 => Condition::Trauma,
                        2 => Condition::Stroke,
                        _ => Condition::Other,
                    },
                }
            }
            2 => match self.random_case() {
                Some(emergency) => EventKind::Acknowledge { emergency },
                None => EventKind::TrafficUpdate {
                    segment: SegmentId::from("S0:0"),
                    congestion_factor: 1.0,
                },
            },
            3 => match self.random_case() {
                Some(emergency) => EventKind::MarkArrived { emergency },
                None => EventKind::TrafficUpdate {
                    segment: SegmentId::from("S0:0"),
                    congestion_factor: 1.0,
                },
            },
            4 => match self.random_case() {
                Some(emergency) => EventKind::Close { emergency },
                None => EventKind::TrafficUpdate {
                    segment: SegmentId::from("S0:0"),
                    congestion_factor: 1.0,
                },
            },
            5 => {
                let idx = self.rng.random_range(0..self.hospitals.len());
                EventKind::HospitalStatusUpdate {
                    hospital: self.hospitals[idx].clone(),
                    available_beds: self.rng.random_range(0..12),
                    er_load: self.rng.random_range(0.1..0.95),
                    equipment: Default::default(),
                    on_call_doctors: self.rng.random_range(1..9),
                }
            }
            6 => EventKind::TrafficUpdate {
                segment: SegmentId::new(format!(
                    "S{}:{}",
                    self.rng.random_range(3170..3180),
                    self.rng.random_range(8570..8580)
                )),
                congestion_factor: self.rng.random_range(1.0..6.0),
            },
            7 | 8 => {
                let idx = self.rng.random_range(0..self.ambulances.len());
                let vitals = self.random_vitals(ts);
                EventKind::VitalsUpdate {
                    ambulance: self.ambulances[idx].clone(),
                    vitals,
                }
            }
            _ => {
                let idx = self.rng.random_range(0..self.ambulances.len());
                EventKind::LocationUpdate {
                    ambulance: self.ambulances[idx].clone(),
                    location: GeoPoint::new(
                        28.56 + self.rng.random_range(0.0..0.08),
                        77.18 + self.rng.random_range(0.0..0.05),
                    ),
                }
            }
        };

        Ok(Some(DispatchEvent::new(ts, kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_seed_same_stream() {
        let roster = crate::default_roster();
        let mut a = RandomizedEventDriver::new(42, 50, &roster);
        let mut b = RandomizedEventDriver::new(42, 50, &roster);

        loop {
            let ea = a.next_event().await.unwrap();
            let eb = b.next_event().await.unwrap();
            assert_eq!(ea, eb);
            if ea.is_none() {
                break;
            }
        }
    }

    #[tokio::test]
    async fn stops_after_max_events() {
        let roster = crate::default_roster();
        let mut driver = RandomizedEventDriver::new(1, 10, &roster);
        let mut count = 0;
        while driver.next_event().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 10);
    }
}
