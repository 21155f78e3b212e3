//! Positional sample sources.
//!
//! A sample source yields one [`Sample`] per collection tick. Two
//! variants exist:
//!
//! - [`LiveSource`] delegates to a [`PositionProvider`] (the abstracted
//!   geolocation capability) and derives speed and bearing from the
//!   delta against the previous fix.
//! - [`ReplaySource`] walks an operator-authored waypoint path, one
//!   waypoint per tick, with a synthetic random-walk speed. Running off
//!   the end of the path is the normal end of a session, not an error.

mod live;
mod replay;

use std::future::Future;
use std::time::Instant;

use thiserror::Error;

use crate::coord::Coordinate;

pub use live::LiveSource;
pub use replay::ReplaySource;

/// One resolved positional observation with its derived kinematics.
///
/// Immutable after creation; owned by the batch accumulator until
/// drained into an upload payload.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub coordinate: Coordinate,
    /// Monotonic instant the sample was taken.
    pub timestamp: Instant,
    /// Instantaneous speed in km/h, non-negative.
    pub speed_kmh: f64,
    /// Bearing in degrees, 0 = north, clockwise.
    pub bearing_deg: f64,
}

/// Errors yielded by a sample source.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// A single fix could not be resolved. The tick is skipped; the
    /// session stays up.
    #[error("position fix unavailable: {0}")]
    Position(String),

    /// The replay path has been fully consumed. Terminal for the
    /// session, not a retryable error.
    #[error("replay path exhausted")]
    PathExhausted,
}

/// The abstracted geolocation capability: yields one timestamped
/// coordinate per request, or fails.
pub trait PositionProvider: Send + Sync {
    /// Resolves the current position.
    fn current_position(
        &self,
    ) -> impl Future<Output = Result<Coordinate, SourceError>> + Send;
}

/// A sample source, polymorphic over live and replay operation.
pub enum SampleSource<P: PositionProvider> {
    Live(LiveSource<P>),
    Replay(ReplaySource),
}

impl<P: PositionProvider> SampleSource<P> {
    /// Produces the next sample.
    ///
    /// Live mode suspends until the position provider settles; replay
    /// mode returns immediately.
    pub async fn next_sample(&mut self) -> Result<Sample, SourceError> {
        match self {
            Self::Live(source) => source.next_sample().await,
            Self::Replay(source) => source.next_sample(),
        }
    }

    /// Resolves a one-shot position for session start/end events
    /// without consuming a sample.
    pub async fn reference_position(&self) -> Result<Coordinate, SourceError> {
        match self {
            Self::Live(source) => source.provider().current_position().await,
            Self::Replay(source) => source.reference_position(),
        }
    }

    /// Resets per-session derived state (previous fix, replay cursor,
    /// speed walk). Live bearing carries over across sessions.
    pub fn reset_session_state(&mut self) {
        match self {
            Self::Live(source) => source.reset_session_state(),
            Self::Replay(source) => source.reset(),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Position provider replaying a scripted list of results.
    ///
    /// Once the script is exhausted the last entry repeats.
    pub struct ScriptedPositionProvider {
        results: std::sync::Mutex<Vec<Result<Coordinate, SourceError>>>,
    }

    impl ScriptedPositionProvider {
        pub fn new(results: Vec<Result<Coordinate, SourceError>>) -> Self {
            Self {
                results: std::sync::Mutex::new(results),
            }
        }

        pub fn fixed(coordinate: Coordinate) -> Self {
            Self::new(vec![Ok(coordinate)])
        }
    }

    impl PositionProvider for ScriptedPositionProvider {
        async fn current_position(&self) -> Result<Coordinate, SourceError> {
            let mut results = self.results.lock().unwrap();
            if results.len() > 1 {
                results.remove(0)
            } else {
                results[0].clone()
            }
        }
    }

    #[tokio::test]
    async fn test_source_dispatches_to_replay() {
        let mut source: SampleSource<ScriptedPositionProvider> =
            SampleSource::Replay(ReplaySource::new(vec![Coordinate::new(37.5, 127.0)]));

        let sample = source.next_sample().await.unwrap();
        assert_eq!(sample.coordinate, Coordinate::new(37.5, 127.0));
        assert!(matches!(
            source.next_sample().await,
            Err(SourceError::PathExhausted)
        ));
    }

    #[tokio::test]
    async fn test_source_dispatches_to_live() {
        let provider = ScriptedPositionProvider::fixed(Coordinate::new(37.5, 127.0));
        let mut source = SampleSource::Live(LiveSource::new(provider));

        let sample = source.next_sample().await.unwrap();
        assert_eq!(sample.coordinate, Coordinate::new(37.5, 127.0));
        assert_eq!(sample.speed_kmh, 0.0);
    }

    #[tokio::test]
    async fn test_reference_position_does_not_consume_replay() {
        let source: SampleSource<ScriptedPositionProvider> =
            SampleSource::Replay(ReplaySource::new(vec![
                Coordinate::new(37.5, 127.0),
                Coordinate::new(37.6, 127.1),
            ]));

        assert_eq!(
            source.reference_position().await.unwrap(),
            Coordinate::new(37.5, 127.0)
        );
        assert_eq!(
            source.reference_position().await.unwrap(),
            Coordinate::new(37.5, 127.0)
        );
    }
}
