//! Traffic snapshot: the estimator's view of the congestion model.
//!
//! The estimator never fetches traffic; the engine folds traffic-feed
//! events into this snapshot and hands it in. Entries carry their update
//! time so stale congestion can be aged out before estimation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use larmcentral_core::model::SegmentId;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
struct Entry {
    factor: f64,
    updated_ms: u64,
}

/// Congestion factors per road-grid segment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficSnapshot {
    entries: BTreeMap<SegmentId, Entry>,
}

impl TrafficSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a congestion factor for a segment.
    pub fn apply(&mut self, segment: SegmentId, factor: f64, updated_ms: u64) {
        self.entries.insert(segment, Entry { factor, updated_ms });
    }

    /// Raw congestion factor for a segment; unknown segments are free-flow.
    pub fn factor(&self, segment: &SegmentId) -> f64 {
        self.entries.get(segment).map_or(1.0, |e| e.factor)
    }

    /// Drops entries older than the freshness window; an aged-out segment
    /// reverts to free-flow rather than keeping a phantom congestion value.
    pub fn prune_stale(&mut self, now_ms: u64, freshness_window_secs: u64) {
        let horizon = freshness_window_secs * 1000;
        self.entries
            .retain(|_, e| now_ms.saturating_sub(e.updated_ms) <= horizon);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
