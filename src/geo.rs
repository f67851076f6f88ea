//! Geo-threshold policy: weaker quakes near the reference point are still
//! worth reporting, everything else has to clear the global threshold.

use serde::Deserialize;

use crate::quake::QuakeRecord;

const EARTH_RADIUS_KM: f64 = 6371.0;

pub const DEFAULT_REF_POINT_LAT: f64 = 10.32;
pub const DEFAULT_REF_POINT_LON: f64 = 123.90;
pub const DEFAULT_REF_RADIUS_KM: f64 = 110.0;
pub const DEFAULT_LOCAL_MAG_THRESH: f64 = 4.0;
pub const DEFAULT_GLOBAL_MAG_THRESH: f64 = 4.5;

/// Great-circle distance in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeoThresholdPolicy {
    pub ref_lat: f64,
    pub ref_lon: f64,
    pub radius_km: f64,
    /// Minimum magnitude within `radius_km` of the reference point.
    pub local_threshold: f64,
    /// Minimum magnitude everywhere else.
    pub global_threshold: f64,
}

impl Default for GeoThresholdPolicy {
    fn default() -> Self {
        Self {
            ref_lat: DEFAULT_REF_POINT_LAT,
            ref_lon: DEFAULT_REF_POINT_LON,
            radius_km: DEFAULT_REF_RADIUS_KM,
            local_threshold: DEFAULT_LOCAL_MAG_THRESH,
            global_threshold: DEFAULT_GLOBAL_MAG_THRESH,
        }
    }
}

impl GeoThresholdPolicy {
    /// Threshold for raw coordinate text. Unparsable input gets the global
    /// threshold so a record is never dropped for bad coordinates alone.
    pub fn threshold_for(&self, lat: &str, lon: &str) -> f64 {
        let parsed = lat
            .trim()
            .parse::<f64>()
            .ok()
            .zip(lon.trim().parse::<f64>().ok())
            .filter(|(a, b)| a.is_finite() && b.is_finite());
        match parsed {
            Some((lat, lon)) => self.threshold_at(lat, lon),
            None => self.global_threshold,
        }
    }

    pub fn threshold_at(&self, lat: f64, lon: f64) -> f64 {
        if haversine_km(lat, lon, self.ref_lat, self.ref_lon) <= self.radius_km {
            self.local_threshold
        } else {
            self.global_threshold
        }
    }

    pub fn threshold_for_record(&self, q: &QuakeRecord) -> f64 {
        self.threshold_for(&q.latitude, &q.longitude)
    }

    /// Magnitude at or above the record's own threshold.
    /// An unparsable magnitude is never significant.
    pub fn is_significant(&self, q: &QuakeRecord) -> bool {
        q.magnitude_value()
            .is_some_and(|m| m >= self.threshold_for_record(q))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_cebu_to_manila() {
        // Cebu City to Manila is ~570km
        let d = haversine_km(10.3157, 123.8854, 14.5995, 120.9842);
        assert!((d - 570.0).abs() < 15.0, "got {d}");
    }

    #[test]
    fn haversine_same_point_is_zero() {
        assert!(haversine_km(10.32, 123.90, 10.32, 123.90) < 1e-9);
    }

    #[test]
    fn local_inside_radius_global_outside() {
        let p = GeoThresholdPolicy::default();
        // ~50 km north of the reference point
        assert_eq!(p.threshold_for("10.77", "123.90"), 4.0);
        // Davao, ~330 km away
        assert_eq!(p.threshold_for("7.07", "125.61"), 4.5);
    }

    #[test]
    fn radius_edge_is_inclusive() {
        let p = GeoThresholdPolicy {
            radius_km: haversine_km(11.0, 123.90, 10.32, 123.90),
            ..GeoThresholdPolicy::default()
        };
        assert_eq!(p.threshold_at(11.0, 123.90), p.local_threshold);
        assert_eq!(p.threshold_at(11.01, 123.90), p.global_threshold);
    }

    #[test]
    fn invalid_coordinates_fail_open_to_global() {
        let p = GeoThresholdPolicy::default();
        assert_eq!(p.threshold_for("", "123.9"), 4.5);
        assert_eq!(p.threshold_for("10.3", "n/a"), 4.5);
        assert_eq!(p.threshold_for("NaN", "123.9"), 4.5);
    }

    #[test]
    fn significance_uses_own_location() {
        let p = GeoThresholdPolicy::default();
        let mut q = QuakeRecord::new("", "10.40", "123.95", "10", "4.1", "Cebu", "");
        assert!(p.is_significant(&q));
        q.latitude = "7.07".into();
        q.longitude = "125.61".into();
        assert!(!p.is_significant(&q));
        q.magnitude = "-".into();
        assert!(!p.is_significant(&q));
    }
}
