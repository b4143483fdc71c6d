//! Runtime wiring: intake drain loop, snapshot publication, queries.
//!
//! Producers submit events through [`DispatchRuntime::submit`]; one spawned
//! task drains the intake bus and applies events strictly in order. After
//! every applied event a fresh state snapshot is published, so dashboard
//! queries never block the engine and never observe a half-applied
//! transition.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, instrument};

use larmcentral_config::LarmcentralConfig;
use larmcentral_core::events::{
    DispatchEvent, EventBus, EventError, Notification, NotificationBus,
};
use larmcentral_core::DispatchError;
use larmcentral_telemetry::MetricsRecorder;

use super::processing::DispatchProcessor;
use super::state::{DispatchState, Roster};

/// Coordinates the allocation engine: intake bus, serialized processor,
/// notification fan-out, metrics, and the published read snapshot.
pub struct DispatchRuntime {
    config: Arc<LarmcentralConfig>,
    /// Intake bus for producer events.
    pub intake: Arc<EventBus>,
    /// Ordered notification fan-out for dashboards and consoles.
    pub notifications: Arc<NotificationBus>,
    /// Metrics collection subsystem.
    pub metrics: Arc<MetricsRecorder>,
    processor: Mutex<DispatchProcessor>,
    snapshot: RwLock<Arc<DispatchState>>,
    /// Serializes concurrent producers ahead of the SPSC intake ring.
    producer_lock: Mutex<()>,
}

impl DispatchRuntime {
    /// Creates a runtime with the given configuration, initial roster, and
    /// shared metrics registry.
    pub fn new(
        config: LarmcentralConfig,
        roster: Roster,
        metrics: MetricsRecorder,
    ) -> Result<Arc<Self>, DispatchError> {
        info!("Initializing dispatch runtime");
        debug!("Engine config: {:?}", config.engine);

        let config = Arc::new(config);
        let intake = Arc::new(
            EventBus::with_capacity(config.core.intake.capacity)
                .map_err(|e| DispatchError::Config(e.to_string()))?,
        );
        let notifications = Arc::new(NotificationBus::new());
        let metrics = Arc::new(metrics);

        let processor = DispatchProcessor::new(
            Arc::clone(&config),
            roster,
            Arc::clone(&notifications),
            Arc::clone(&metrics),
        )?;
        let snapshot = RwLock::new(Arc::new(processor.state().clone()));

        Ok(Arc::new(Self {
            config,
            intake,
            notifications,
            metrics,
            processor: Mutex::new(processor),
            snapshot,
            producer_lock: Mutex::new(()),
        }))
    }

    /// Submits a producer event to the intake queue.
    ///
    /// Concurrent producers are serialized here, preserving arrival order
    /// into the single-producer ring. The configured full-queue strategy
    /// decides between yielding until a slot frees up and dropping with an
    /// explicit error.
    pub fn submit(&self, event: DispatchEvent) -> Result<(), EventError> {
        let _guard = self.producer_lock.lock();
        match self.config.core.intake.full_queue_strategy.as_str() {
            "drop" => self.intake.send(event),
            _ => self.intake.send_blocking(event),
        }
    }

    /// Consistent read snapshot taken at the end of the last applied event.
    pub fn snapshot(&self) -> Arc<DispatchState> {
        self.snapshot.read().clone()
    }

    /// Subscribes to the ordered notification stream.
    pub fn subscribe(&self) -> UnboundedReceiver<Arc<Notification>> {
        self.notifications.subscribe()
    }

    /// Spawns the dedicated drain task. It runs until the intake bus is
    /// closed and empty.
    #[instrument(skip(self))]
    pub fn spawn_event_processor(self: &Arc<Self>) -> JoinHandle<Result<(), DispatchError>> {
        let runtime = Arc::clone(self);
        tokio::spawn(async move {
            info!("Event processor started");
            let mut processed: u64 = 0;

            loop {
                match runtime.intake.recv() {
                    Some(event) => {
                        processed += 1;
                        runtime.apply_now(&event);
                    }
                    None => {
                        if runtime.intake.is_exhausted() {
                            break;
                        }
                        // Queue empty, avoid busy-spin
                        sleep(Duration::from_millis(10)).await;
                    }
                }
            }

            info!("Event processor drained after {processed} events");
            Ok(())
        })
    }

    /// Applies one event synchronously and publishes the new snapshot.
    ///
    /// Rejected events are logged and dropped; the engine never crashes on
    /// a bad producer.
    pub fn apply_now(&self, event: &DispatchEvent) {
        let started = Instant::now();
        let mut processor = self.processor.lock();
        if let Err(err) = processor.apply(event) {
            debug!("Event dropped: {err}");
        }
        let next = Arc::new(processor.state().clone());
        drop(processor);

        *self.snapshot.write() = next;
        self.metrics
            .decision_latency
            .observe(started.elapsed().as_nanos() as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use larmcentral_core::events::{EventKind, NotificationKind};
    use larmcentral_core::geo::GeoPoint;
    use larmcentral_core::model::{
        Ambulance, AmbulanceId, Condition, EmergencyId, EmergencyStatus, Hospital, HospitalId,
        Specialty,
    };
    use std::collections::{BTreeMap, BTreeSet};

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

    fn roster() -> Roster {
        Roster {
            hospitals: vec![hospital("H001", 28.62, 5, &[Specialty::General])],
            ambulances: vec![Ambulance::new(
                AmbulanceId::from("AMB-1"),
                GeoPoint::new(28.60, 77.2),
            )],
        }
    }

    fn create_event(ts: u64) -> DispatchEvent {
        DispatchEvent::new(
            ts,
            EventKind::CreateEmergency {
                emergency: EmergencyId::from("EMG-1"),
                pickup: GeoPoint::new(28.61, 77.2),
                condition: Condition::Other,
            },
        )
    }

    #[tokio::test]
    async fn drains_bus_and_publishes_snapshot() {
        let runtime = DispatchRuntime::new(LarmcentralConfig::default(), roster(), MetricsRecorder::new()).unwrap();
        let processor = runtime.spawn_event_processor();

        runtime.submit(create_event(1000)).unwrap();
        runtime.intake.close();
        processor.await.unwrap().unwrap();

        let snapshot = runtime.snapshot();
        let emergency = snapshot.emergency(&EmergencyId::from("EMG-1")).unwrap();
        assert_eq!(emergency.status, EmergencyStatus::Assigned);
        assert_eq!(emergency.hospital, Some(HospitalId::from("H001")));
    }

    #[tokio::test]
    async fn notifications_arrive_in_decision_order() {
        let runtime = DispatchRuntime::new(LarmcentralConfig::default(), roster(), MetricsRecorder::new()).unwrap();
        let mut rx = runtime.subscribe();

        runtime.apply_now(&create_event(1000));
        runtime.apply_now(&DispatchEvent::new(
            2000,
            EventKind::Acknowledge {
                emergency: EmergencyId::from("EMG-1"),
            },
        ));
        runtime.apply_now(&DispatchEvent::new(
            3000,
            EventKind::MarkArrived {
                emergency: EmergencyId::from("EMG-1"),
            },
        ));
        runtime.apply_now(&DispatchEvent::new(
            4000,
            EventKind::Close {
                emergency: EmergencyId::from("EMG-1"),
            },
        ));

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert!(matches!(
            first.kind,
            NotificationKind::AssignmentChanged { .. }
        ));
        assert!(matches!(
            second.kind,
            NotificationKind::EmergencyClosed { .. }
        ));
        assert!(first.sequence < second.sequence);
    }

    #[tokio::test]
    async fn rejected_event_leaves_state_untouched() {
        let runtime = DispatchRuntime::new(LarmcentralConfig::default(), roster(), MetricsRecorder::new()).unwrap();
        runtime.apply_now(&DispatchEvent::new(
            1000,
            EventKind::Acknowledge {
                emergency: EmergencyId::from("EMG-404"),
            },
        ));
        assert_eq!(runtime.snapshot().emergencies().count(), 0);
        assert_eq!(runtime.metrics.rejected_events.get() as u64, 1);
    }
}
