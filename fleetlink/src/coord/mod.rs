//! Coordinate types and kinematic derivation.
//!
//! Positions are plain WGS84 latitude/longitude pairs in decimal degrees.
//! The kinematics functions are total over the numeric domain: no range
//! validation is performed and out-of-range coordinates pass through
//! unchanged, matching the hub's pass-through contract.

mod kinematics;
mod types;

pub use kinematics::{bearing_degrees, distance_meters, speed_kmh, EARTH_RADIUS_METERS};
pub use types::Coordinate;
