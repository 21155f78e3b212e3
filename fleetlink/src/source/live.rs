//! Live sample source backed by a position provider.

use std::time::Instant;

use crate::coord::{self, Coordinate};

use super::{PositionProvider, Sample, SourceError};

/// Derives samples from successive fixes of a [`PositionProvider`].
///
/// Speed and bearing come from the delta against the previously
/// observed fix. The first sample of a session has speed 0 and a
/// bearing carried over from any prior session (0 if none).
pub struct LiveSource<P: PositionProvider> {
    provider: P,
    previous_fix: Option<(Coordinate, Instant)>,
    last_bearing_deg: f64,
}

impl<P: PositionProvider> LiveSource<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            previous_fix: None,
            last_bearing_deg: 0.0,
        }
    }

    pub(super) fn provider(&self) -> &P {
        &self.provider
    }

    /// Awaits the next fix and derives its kinematics.
    ///
    /// The previous-fix state is updated unconditionally on success, so
    /// a failed fix does not poison the next delta.
    pub async fn next_sample(&mut self) -> Result<Sample, SourceError> {
        let coordinate = self.provider.current_position().await?;
        let timestamp = Instant::now();

        let (speed_kmh, bearing_deg) = match self.previous_fix {
            Some((previous, at)) => {
                let distance = coord::distance_meters(previous, coordinate);
                let delta = timestamp.duration_since(at).as_secs_f64();
                (
                    coord::speed_kmh(distance, delta),
                    coord::bearing_degrees(previous, coordinate),
                )
            }
            None => (0.0, self.last_bearing_deg),
        };

        self.previous_fix = Some((coordinate, timestamp));
        self.last_bearing_deg = bearing_deg;

        Ok(Sample {
            coordinate,
            timestamp,
            speed_kmh,
            bearing_deg,
        })
    }

    /// Drops the previous fix. The last bearing intentionally survives
    /// so the first sample of the next session starts from it.
    pub fn reset_session_state(&mut self) {
        self.previous_fix = None;
    }
}
