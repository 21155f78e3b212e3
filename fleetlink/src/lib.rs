//! FleetLink - vehicle telemetry emulator for a fleet-tracking hub.
//!
//! This library simulates a moving vehicle reporting telemetry to a
//! remote hub: it acquires a session credential, emits a session-start
//! event, collects positional samples at a fixed 1 Hz cadence, uploads
//! them in 60-sample batches, and emits a session-end event.
//!
//! # High-Level API
//!
//! ```ignore
//! use fleetlink::session::{SessionConfig, SessionController, NoopMapSink};
//! use fleetlink::source::{ReplaySource, SampleSource};
//! use fleetlink::transport::AsyncReqwestClient;
//!
//! let http = AsyncReqwestClient::new()?;
//! let source = SampleSource::Replay(ReplaySource::new(waypoints));
//! let mut controller = SessionController::new(
//!     SessionConfig::new("01012345678"),
//!     http,
//!     source,
//!     NoopMapSink,
//! );
//!
//! controller.start().await?;
//! // ... session runs until stop() or path exhaustion ...
//! controller.stop().await?;
//! ```

pub mod auth;
pub mod batch;
pub mod coord;
pub mod logging;
pub mod protocol;
pub mod session;
pub mod source;
pub mod transport;

/// Version of the FleetLink library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
