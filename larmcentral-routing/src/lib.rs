//! ## larmcentral-routing
//! **Deterministic route and ETA estimation**
//!
//! `estimate(origin, destination, traffic)` subdivides the great-circle
//! line into road-grid segments, applies per-segment congestion from the
//! supplied snapshot, and returns distance, ETA, and the segment path.
//! Equal inputs always produce equal outputs; the engine decides when a
//! re-estimate is worth acting on.

use larmcentral_config::RoutingConfig;
use larmcentral_core::geo::GeoPoint;
use larmcentral_core::model::{Route, RouteSegment, SegmentId, TrafficAlert};

mod traffic;

pub use traffic::TrafficSnapshot;

/// Kilometers per degree of latitude, used for grid quantization.
const KM_PER_DEGREE: f64 = 111.0;

/// Configured route estimator.
#[derive(Clone, Debug)]
pub struct RouteEstimator {
    config: RoutingConfig,
}

impl RouteEstimator {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    /// Road-grid cell id for a coordinate.
    ///
    /// Cells are square in degree space, sized to the nominal segment
    /// length, so nearby trips share segment ids and traffic updates
    /// address stable locations.
    pub fn segment_id(&self, point: &GeoPoint) -> SegmentId {
        let cell_deg = self.config.segment_length_km / KM_PER_DEGREE;
        let lat_cell = (point.lat / cell_deg).floor() as i64;
        let lng_cell = (point.lng / cell_deg).floor() as i64;
        SegmentId::new(format!("S{lat_cell}:{lng_cell}"))
    }

    /// Estimates the route from `origin` to `destination` under the given
    /// traffic snapshot.
    ///
    /// ETA is base travel time per segment scaled by its congestion
    /// multiplier; multipliers are clamped to `[1.0, max_congestion_factor]`
    /// so pathological feed input cannot produce runaway ETAs.
    pub fn estimate(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
        traffic: &TrafficSnapshot,
    ) -> Route {
        let distance_km = origin.distance_km(destination);
        let segment_count = (distance_km / self.config.segment_length_km).ceil().max(1.0) as usize;
        let step_km = distance_km / segment_count as f64;

        let mut segments = Vec::with_capacity(segment_count);
        let mut alerts = Vec::new();
        let mut eta_min = 0.0;

        for i in 0..segment_count {
            let t0 = i as f64 / segment_count as f64;
            let t1 = (i + 1) as f64 / segment_count as f64;
            let from = origin.lerp(destination, t0);
            let to = origin.lerp(destination, t1);
            let midpoint = origin.lerp(destination, (t0 + t1) / 2.0);
            let id = self.segment_id(&midpoint);

            let congestion = traffic
                .factor(&id)
                .clamp(1.0, self.config.max_congestion_factor);

            eta_min += step_km / self.config.base_speed_kmh * 60.0 * congestion;

            if congestion >= self.config.alert_congestion_factor {
                alerts.push(TrafficAlert {
                    segment: id.clone(),
                    congestion,
                });
            }

            segments.push(RouteSegment {
                id,
                from,
                to,
                length_km: step_km,
                congestion,
            });
        }

        alerts.dedup_by(|a, b| a.segment == b.segment);

        Route {
            distance_km,
            eta_min,
            segments,
            alerts,
        }
    }

    /// Whether a traffic update for `segment` affects this route.
    pub fn route_touches(route: &Route, segment: &SegmentId) -> bool {
        route.segments.iter().any(|s| &s.id == segment)
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }
}
