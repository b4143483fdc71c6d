//! Ordered notification fan-out to dashboards and consoles.
//!
//! Every notification carries a sequence number assigned in decision order;
//! subscribers receive the stream in exactly that order. Delivery never
//! blocks the engine: each subscriber has an unbounded queue, and a closed
//! subscriber is dropped from the registry on the next publish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::model::{
    Condition, Emergency, EmergencyId, HospitalId, RiskAssessment, RiskLevel, Route,
    SuspectedCondition, TrendReport,
};

/// Summary handed to the receiving hospital console on arrival.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandoverSummary {
    pub condition: Condition,
    pub suspected: Option<SuspectedCondition>,
    pub risk_level: Option<RiskLevel>,
    pub trends: TrendReport,
    pub special_requirements: Vec<String>,
}

impl HandoverSummary {
    /// Preparation list for the receiving team, keyed on the suspected
    /// condition pattern.
    pub fn special_requirements(suspected: Option<SuspectedCondition>) -> Vec<String> {
        match suspected {
            Some(SuspectedCondition::CardiacArrest) => vec![
                "Cardiac team standby".into(),
                "Defibrillator ready".into(),
                "ICU bed preparation".into(),
            ],
            Some(SuspectedCondition::Stroke) => vec![
                "Stroke team activation".into(),
                "CT scan ready".into(),
                "Neurologist on standby".into(),
            ],
            Some(SuspectedCondition::TraumaticShock) => vec![
                "Trauma team activation".into(),
                "Blood bank notification".into(),
                "OR preparation if needed".into(),
            ],
            Some(SuspectedCondition::RespiratoryDistress) => vec![
                "Oxygen therapy ready".into(),
                "Intubation kit on standby".into(),
            ],
            None => Vec::new(),
        }
    }
}

/// What changed, with enough context for a console to render it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Ambulance and/or hospital assignment committed or switched.
    AssignmentChanged {
        hospital: HospitalId,
        score: f64,
        /// Previous destination when this is a reallocation.
        previous: Option<HospitalId>,
        /// Ranked reasons for the chosen destination.
        reasons: Vec<String>,
    },
    /// Patient risk stratification escalated.
    RiskEscalated { assessment: RiskAssessment },
    /// Committed route re-estimated after a traffic change.
    RouteRecomputed { route: Route },
    /// Degraded-mode fallback committed; operator review requested.
    ManualOverrideRequired { hospital: HospitalId },
    /// Case reached a terminal state; includes the handover summary on
    /// arrival-based closure.
    EmergencyClosed { handover: Option<HandoverSummary> },
}

/// One ordered notification with the affected case's state snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Monotonic decision order across all emergencies.
    pub sequence: u64,
    pub timestamp_ms: u64,
    pub emergency: EmergencyId,
    pub kind: NotificationKind,
    /// State of the emergency after the change was applied.
    pub snapshot: Emergency,
}

/// Fan-out bus: one writer (the engine), any number of subscribers.
pub struct NotificationBus {
    subscribers: RwLock<Vec<mpsc::UnboundedSender<Arc<Notification>>>>,
    sequence: AtomicU64,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Registers a new subscriber; the receiver sees every notification
    /// published after this call, in sequence order.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Arc<Notification>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Publishes a notification to all live subscribers and returns its
    /// sequence number. Closed subscribers are pruned.
    pub fn publish(
        &self,
        timestamp_ms: u64,
        emergency: EmergencyId,
        kind: NotificationKind,
        snapshot: Emergency,
    ) -> u64 {
        let sequence = self.sequence.fetch_add(1, Ordering::AcqRel);
        let notification = Arc::new(Notification {
            sequence,
            timestamp_ms,
            emergency,
            kind,
            snapshot,
        });

        self.subscribers
            .write()
            .retain(|tx| tx.send(Arc::clone(&notification)).is_ok());

        sequence
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;

    fn emergency(id: &str) -> Emergency {
        Emergency::new(
            EmergencyId::from(id),
            GeoPoint::new(0.0, 0.0),
            Condition::Other,
            0,
        )
    }

    fn publish_closed(bus: &NotificationBus, id: &str) -> u64 {
        bus.publish(
            0,
            EmergencyId::from(id),
            NotificationKind::EmergencyClosed { handover: None },
            emergency(id),
        )
    }

    #[test]
    fn sequences_are_monotonic() {
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe();

        let s0 = publish_closed(&bus, "EMG-1");
        let s1 = publish_closed(&bus, "EMG-2");
        assert!(s1 > s0);

        assert_eq!(rx.try_recv().unwrap().sequence, s0);
        assert_eq!(rx.try_recv().unwrap().sequence, s1);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = NotificationBus::new();
        let rx = bus.subscribe();
        drop(rx);
        publish_closed(&bus, "EMG-1");
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn cardiac_arrest_requirements_include_defibrillator() {
        let reqs = HandoverSummary::special_requirements(Some(SuspectedCondition::CardiacArrest));
        assert!(reqs.iter().any(|r| r.contains("Defibrillator")));
    }
}
