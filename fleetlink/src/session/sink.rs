//! Map rendering sink.
//!
//! The visual route renderer is an external collaborator: the session
//! worker pushes each accepted sample into it and clears it on
//! teardown, but never depends on its outcome.

use crate::coord::Coordinate;

/// Sink receiving accepted positions for rendering.
pub trait MapSink: Send + Sync {
    /// Adds a point to the rendered route.
    fn add_point(&self, coordinate: Coordinate);

    /// Re-centers the view on a coordinate.
    fn set_center(&self, coordinate: Coordinate);

    /// Clears the rendered route.
    fn clear_route(&self);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMapSink;

impl MapSink for NoopMapSink {
    fn add_point(&self, _coordinate: Coordinate) {}
    fn set_center(&self, _coordinate: Coordinate) {}
    fn clear_route(&self) {}
}

/// Sink that logs accepted points at debug level. Used by the CLI,
/// where there is no real map widget to draw on.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceMapSink;

impl MapSink for TraceMapSink {
    fn add_point(&self, coordinate: Coordinate) {
        tracing::debug!(position = %coordinate, "route point");
    }

    fn set_center(&self, _coordinate: Coordinate) {}

    fn clear_route(&self) {
        tracing::debug!("route cleared");
    }
}
