//! Geodesic helpers for relative geometry between two aircraft.

use std::f64::consts::{FRAC_PI_4, PI};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
pub const NM_TO_METERS: f64 = 1852.0;
pub const METERS_TO_NM: f64 = 1.0 / NM_TO_METERS;
pub const KNOTS_TO_MPS: f64 = 0.514444;

/// Great-circle distance between two points in meters (Haversine formula).
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial bearing from point 1 to point 2 in degrees `[0, 360)`.
///
/// Uses the Mercator (rhumb line) projection. The longitude difference is
/// wrapped across the antimeridian so the short way round is always taken.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();

    let mut dlon = (lon2 - lon1).to_radians();
    if dlon.abs() > PI {
        dlon = if dlon > 0.0 {
            -(2.0 * PI - dlon)
        } else {
            2.0 * PI + dlon
        };
    }

    let dphi = ((phi2 / 2.0 + FRAC_PI_4).tan() / (phi1 / 2.0 + FRAC_PI_4).tan()).ln();
    (dlon.atan2(dphi).to_degrees() + 360.0) % 360.0
}

/// Offset a position by distance and bearing.
///
/// # Arguments
/// * `lat`, `lon` - Starting position in degrees
/// * `distance_m` - Distance in meters
/// * `bearing_rad` - Bearing in radians (0 = north, π/2 = east)
///
/// # Returns
/// (new_lat, new_lon) in degrees
pub fn offset_by_bearing(lat: f64, lon: f64, distance_m: f64, bearing_rad: f64) -> (f64, f64) {
    if distance_m.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let lon2 = (lon1 + y.atan2(x) + PI).rem_euclid(2.0 * PI) - PI;

    (lat2.to_degrees(), lon2.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_one_degree_latitude() {
        let dist = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 111_195.0).abs() < 100.0);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        assert!(bearing(0.0, 0.0, 1.0, 0.0).abs() < 1e-9);
        assert!((bearing(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-9);
        assert!((bearing(1.0, 0.0, 0.0, 0.0) - 180.0).abs() < 1e-9);
        assert!((bearing(0.0, 1.0, 0.0, 0.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_wraps_across_antimeridian() {
        // 179E -> 179W is a short hop east, not a trip around the globe.
        let east = bearing(0.0, 179.0, 0.0, -179.0);
        assert!((east - 90.0).abs() < 1e-9);

        let west = bearing(0.0, -179.0, 0.0, 179.0);
        assert!((west - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_north_west_quadrant() {
        let b = bearing(53.80501925899087, 10.717892280311442, 53.83249016362793, 10.704628778867734);
        assert!(b > 270.0 && b < 360.0, "bearing was {b}");
    }

    #[test]
    fn test_offset_by_bearing_round_trip_distance() {
        let (lat, lon) = offset_by_bearing(53.8, 10.7, 5.0 * NM_TO_METERS, 90f64.to_radians());
        let dist = haversine_distance(53.8, 10.7, lat, lon);
        assert!((dist - 5.0 * NM_TO_METERS).abs() < 1.0);
        assert!((bearing(53.8, 10.7, lat, lon) - 90.0).abs() < 1.0);
    }

    #[test]
    fn test_offset_zero_distance_is_identity() {
        assert_eq!(offset_by_bearing(10.0, 20.0, 0.0, 1.0), (10.0, 20.0));
    }
}
