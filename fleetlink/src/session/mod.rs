//! Tracking session lifecycle.
//!
//! The session controller is the only component with externally visible
//! commands. `start` acquires a credential, emits the session-start
//! event and spawns the collection worker; the worker drives the sample
//! source on a fixed tick, feeds the batch uploader and the map sink,
//! and tears the session down on cancellation or path exhaustion;
//! `stop` cancels the worker and waits for the teardown to finish.

mod config;
mod controller;
mod sink;

pub use config::SessionConfig;
pub use controller::{SessionController, SessionError, SessionPhase, SessionStatus};
pub use sink::{MapSink, NoopMapSink, TraceMapSink};
