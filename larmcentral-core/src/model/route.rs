//! Route estimates: ephemeral, recomputed, never patched.

use serde::{Deserialize, Serialize};

use super::SegmentId;
use crate::geo::GeoPoint;

/// One hop of a route, mapped to a road-grid segment for traffic lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub id: SegmentId,
    pub from: GeoPoint,
    pub to: GeoPoint,
    pub length_km: f64,
    /// Congestion multiplier applied to this segment (>= 1.0, clamped).
    pub congestion: f64,
}

/// Congested segment surfaced for console display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrafficAlert {
    pub segment: SegmentId,
    pub congestion: f64,
}

/// A complete route estimate between pickup and destination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub distance_km: f64,
    pub eta_min: f64,
    pub segments: Vec<RouteSegment>,
    pub alerts: Vec<TrafficAlert>,
}

impl Route {
    /// Relative ETA deviation against another estimate of the same trip.
    pub fn eta_deviation(&self, other: &Route) -> f64 {
        if self.eta_min <= f64::EPSILON {
            return if other.eta_min <= f64::EPSILON { 0.0 } else { 1.0 };
        }
        (other.eta_min - self.eta_min).abs() / self.eta_min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(eta: f64) -> Route {
        Route {
            distance_km: 10.0,
            eta_min: eta,
            segments: Vec::new(),
            alerts: Vec::new(),
        }
    }

    #[test]
    fn deviation_is_relative_to_committed_eta() {
        let committed = route(20.0);
        assert!((committed.eta_deviation(&route(23.0)) - 0.15).abs() < 1e-9);
        assert!((committed.eta_deviation(&route(17.0)) - 0.15).abs() < 1e-9);
    }

    #[test]
    fn zero_eta_edge_case() {
        assert_eq!(route(0.0).eta_deviation(&route(0.0)), 0.0);
        assert_eq!(route(0.0).eta_deviation(&route(5.0)), 1.0);
    }
}
