//! Great-circle kinematics.
//!
//! Pure functions deriving bearing, distance and speed from successive
//! positions. All functions are total: degenerate inputs (zero
//! displacement, antipodal points) produce a numerically defined result
//! rather than an error, and only the zero/negative time delta is
//! guarded because it would otherwise divide by zero on clock anomalies.

use super::Coordinate;

/// Mean Earth radius in meters, used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Computes the initial great-circle bearing from `from` to `to`.
///
/// Returns the forward azimuth in degrees, `[0, 360)`, 0 = north,
/// clockwise. At zero displacement the result follows the trigonometric
/// identity directly and may be any in-range value.
pub fn bearing_degrees(from: Coordinate, to: Coordinate) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let delta_lambda = (to.longitude - from.longitude).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Computes the haversine great-circle distance between two coordinates
/// in meters.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Computes instantaneous speed in km/h from a distance in meters
/// covered over `delta_seconds`.
///
/// Returns 0 when `delta_seconds <= 0` to guard against clock anomalies.
pub fn speed_kmh(distance_meters: f64, delta_seconds: f64) -> f64 {
    if delta_seconds <= 0.0 {
        return 0.0;
    }
    (distance_meters / delta_seconds) * 3.6
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 0.5;

    #[test]
    fn test_bearing_due_north() {
        let a = Coordinate::new(37.5, 127.0);
        let b = Coordinate::new(37.501, 127.0);
        let bearing = bearing_degrees(a, b);
        assert!(
            bearing < TOLERANCE || bearing > 360.0 - TOLERANCE,
            "expected ~0 degrees, got {}",
            bearing
        );
    }

    #[test]
    fn test_bearing_due_east() {
        let a = Coordinate::new(37.5, 127.0);
        let b = Coordinate::new(37.5, 127.001);
        let bearing = bearing_degrees(a, b);
        assert!(
            (bearing - 90.0).abs() < TOLERANCE,
            "expected ~90 degrees, got {}",
            bearing
        );
    }

    #[test]
    fn test_bearing_due_south() {
        let a = Coordinate::new(37.5, 127.0);
        let b = Coordinate::new(37.499, 127.0);
        let bearing = bearing_degrees(a, b);
        assert!(
            (bearing - 180.0).abs() < TOLERANCE,
            "expected ~180 degrees, got {}",
            bearing
        );
    }

    #[test]
    fn test_bearing_always_in_range() {
        let a = Coordinate::new(37.5, 127.0);
        for (lat, lon) in [(38.0, 126.0), (37.0, 128.0), (36.5, 126.5), (37.5, 127.0)] {
            let bearing = bearing_degrees(a, Coordinate::new(lat, lon));
            assert!((0.0..360.0).contains(&bearing), "got {}", bearing);
        }
    }

    #[test]
    fn test_distance_identical_points_is_zero() {
        let a = Coordinate::new(37.5665, 126.978);
        assert_eq!(distance_meters(a, a), 0.0);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        // One degree of latitude is roughly 111.2 km on the mean sphere.
        let a = Coordinate::new(37.0, 127.0);
        let b = Coordinate::new(38.0, 127.0);
        let d = distance_meters(a, b);
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Coordinate::new(37.5, 127.0);
        let b = Coordinate::new(37.6, 127.1);
        assert!((distance_meters(a, b) - distance_meters(b, a)).abs() < 1e-9);
    }

    #[test]
    fn test_speed_zero_delta_is_zero() {
        assert_eq!(speed_kmh(1000.0, 0.0), 0.0);
    }

    #[test]
    fn test_speed_negative_delta_is_zero() {
        assert_eq!(speed_kmh(1000.0, -5.0), 0.0);
    }

    #[test]
    fn test_speed_conversion() {
        // 10 m over 1 s = 36 km/h.
        assert!((speed_kmh(10.0, 1.0) - 36.0).abs() < 1e-9);
        // 1000 m over 60 s = 60 km/h.
        assert!((speed_kmh(1000.0, 60.0) - 60.0).abs() < 1e-9);
    }
}
