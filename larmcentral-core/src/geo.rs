//! Coordinate primitives and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to `other` in kilometers (haversine formula).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// Linear interpolation toward `other`; `t` in [0, 1].
    ///
    /// Adequate for the short hops used in route segmentation; not a true
    /// geodesic midpoint.
    pub fn lerp(&self, other: &GeoPoint, t: f64) -> GeoPoint {
        GeoPoint {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_to_self() {
        let p = GeoPoint::new(28.6139, 77.2090);
        assert!(p.distance_km(&p) < 1e-9);
    }

    #[test]
    fn known_distance_delhi_landmarks() {
        // AIIMS to Connaught Place is roughly 7-8 km as the crow flies.
        let aiims = GeoPoint::new(28.5672, 77.2100);
        let cp = GeoPoint::new(28.6315, 77.2167);
        let d = aiims.distance_km(&cp);
        assert!(d > 6.0 && d < 9.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(28.0, 77.0);
        let b = GeoPoint::new(28.5, 77.5);
        assert!((a.distance_km(&b) - b.distance_km(&a)).abs() < 1e-9);
    }

    #[test]
    fn lerp_endpoints() {
        let a = GeoPoint::new(10.0, 20.0);
        let b = GeoPoint::new(11.0, 21.0);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
    }
}
