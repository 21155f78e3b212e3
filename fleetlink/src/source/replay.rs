//! Replay sample source over an operator-authored path.

use std::time::Instant;

use rand::Rng;

use crate::coord::{self, Coordinate};

use super::{Sample, SourceError};

/// Seed range for the synthetic speed walk, in km/h.
const SPEED_SEED_RANGE: std::ops::RangeInclusive<f64> = 40.0..=120.0;
/// Maximum per-tick perturbation of the speed walk, in km/h.
const SPEED_STEP_KMH: f64 = 5.0;

/// Walks an ordered waypoint path, one waypoint per tick.
///
/// Bearing is computed by look-ahead to the next waypoint; the final
/// waypoint looks back to the previous one instead. Speed is a
/// pseudo-random walk: seeded uniformly in [40, 120] km/h on the first
/// tick, then perturbed by up to ±5 km/h per tick and clamped to
/// [0, 255]. Consuming the path to its end signals
/// [`SourceError::PathExhausted`], the normal end of a replay session.
pub struct ReplaySource {
    waypoints: Vec<Coordinate>,
    cursor: usize,
    speed_kmh: Option<f64>,
}

impl ReplaySource {
    pub fn new(waypoints: Vec<Coordinate>) -> Self {
        Self {
            waypoints,
            cursor: 0,
            speed_kmh: None,
        }
    }

    /// Appends a waypoint to the path. Consumed by the authoring UI.
    pub fn push_waypoint(&mut self, waypoint: Coordinate) {
        self.waypoints.push(waypoint);
    }

    /// Rewinds the cursor and discards the speed walk state.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.speed_kmh = None;
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Reads the next waypoint and advances the cursor.
    pub fn next_sample(&mut self) -> Result<Sample, SourceError> {
        if self.cursor >= self.waypoints.len() {
            return Err(SourceError::PathExhausted);
        }

        let coordinate = self.waypoints[self.cursor];
        let bearing_deg = if self.cursor + 1 < self.waypoints.len() {
            coord::bearing_degrees(coordinate, self.waypoints[self.cursor + 1])
        } else if self.cursor > 0 {
            coord::bearing_degrees(self.waypoints[self.cursor - 1], coordinate)
        } else {
            0.0
        };
        let speed_kmh = self.step_speed();
        self.cursor += 1;

        Ok(Sample {
            coordinate,
            timestamp: Instant::now(),
            speed_kmh,
            bearing_deg,
        })
    }

    /// Position used for session start/end events: the waypoint at the
    /// cursor, or the last one once the path is exhausted.
    pub fn reference_position(&self) -> Result<Coordinate, SourceError> {
        if self.waypoints.is_empty() {
            return Err(SourceError::Position("replay path is empty".to_string()));
        }
        let index = self.cursor.min(self.waypoints.len() - 1);
        Ok(self.waypoints[index])
    }

    fn step_speed(&mut self) -> f64 {
        let mut rng = rand::thread_rng();
        let next = match self.speed_kmh {
            None => rng.gen_range(SPEED_SEED_RANGE),
            Some(current) => {
                (current + rng.gen_range(-SPEED_STEP_KMH..=SPEED_STEP_KMH)).clamp(0.0, 255.0)
            }
        };
        self.speed_kmh = Some(next);
        next
    }
}
