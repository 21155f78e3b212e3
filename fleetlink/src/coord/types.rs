//! Coordinate type definitions

use std::fmt;

use serde::{Deserialize, Serialize};

/// A WGS84 position in decimal degrees.
///
/// No range validation is performed: values outside the usual
/// [-90, 90] / [-180, 180] bounds pass through unchanged and the
/// kinematics functions remain defined over them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude and longitude in degrees.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_new() {
        let c = Coordinate::new(37.5665, 126.978);
        assert_eq!(c.latitude, 37.5665);
        assert_eq!(c.longitude, 126.978);
    }

    #[test]
    fn test_coordinate_display() {
        let c = Coordinate::new(37.5, 127.0);
        assert_eq!(c.to_string(), "37.500000,127.000000");
    }

    #[test]
    fn test_out_of_range_passes_through() {
        // Range validation is intentionally absent.
        let c = Coordinate::new(123.4, -370.0);
        assert_eq!(c.latitude, 123.4);
        assert_eq!(c.longitude, -370.0);
    }
}
