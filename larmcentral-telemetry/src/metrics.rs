//! Prometheus metrics for the allocation engine.

use prometheus::{Counter, Histogram, HistogramOpts, Registry};

/// Counters and histograms shared across the runtime.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    /// Intake events fully applied.
    pub processed_events: Counter,
    /// Events rejected by validation or invariant checks.
    pub rejected_events: Counter,
    /// Assignments committed (first-time).
    pub assignments: Counter,
    /// Assignments switched to a better hospital.
    pub reallocations: Counter,
    /// Degraded-mode fallback assignments.
    pub fallback_assignments: Counter,
    /// Risk escalations to critical.
    pub risk_escalations: Counter,
    /// Wall time spent applying one event, nanoseconds.
    pub decision_latency: Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();
        let processed_events =
            Counter::new("larmcentral_events_total", "Total processed intake events").unwrap();
        let rejected_events =
            Counter::new("larmcentral_rejected_events_total", "Rejected intake events").unwrap();
        let assignments =
            Counter::new("larmcentral_assignments_total", "Committed assignments").unwrap();
        let reallocations =
            Counter::new("larmcentral_reallocations_total", "Hospital switches").unwrap();
        let fallback_assignments = Counter::new(
            "larmcentral_fallback_assignments_total",
            "Degraded-mode fallback assignments",
        )
        .unwrap();
        let risk_escalations = Counter::new(
            "larmcentral_risk_escalations_total",
            "Escalations to critical risk",
        )
        .unwrap();

        let decision_latency = Histogram::with_opts(
            HistogramOpts::new(
                "larmcentral_decision_latency_ns",
                "Per-event decision processing time",
            )
            .buckets(vec![1_000.0, 10_000.0, 100_000.0, 1_000_000.0, 10_000_000.0]),
        )
        .unwrap();

        registry
            .register(Box::new(processed_events.clone()))
            .unwrap();
        registry.register(Box::new(rejected_events.clone())).unwrap();
        registry.register(Box::new(assignments.clone())).unwrap();
        registry.register(Box::new(reallocations.clone())).unwrap();
        registry
            .register(Box::new(fallback_assignments.clone()))
            .unwrap();
        registry
            .register(Box::new(risk_escalations.clone()))
            .unwrap();
        registry
            .register(Box::new(decision_latency.clone()))
            .unwrap();

        Self {
            registry,
            processed_events,
            rejected_events,
            assignments,
            reallocations,
            fallback_assignments,
            risk_escalations,
            decision_latency,
        }
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap())
    }

    pub fn inc_processed_events(&self) {
        self.processed_events.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_register_and_gather() {
        let metrics = MetricsRecorder::new();
        metrics.inc_processed_events();
        metrics.assignments.inc();
        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("larmcentral_events_total"));
        assert!(text.contains("larmcentral_assignments_total"));
    }
}
