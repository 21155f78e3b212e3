//! FleetLink CLI - command-line vehicle telemetry emulator.
//!
//! Wires the library against real collaborators: a reqwest-backed HTTP
//! client, a replay path loaded from a route file (or a fixed position
//! for live mode on hosts without a GPS), and a tracing-backed map
//! sink. The session runs until the route is exhausted, the duration
//! elapses, or Ctrl-C.

use std::future;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::{error, info};

use fleetlink::coord::Coordinate;
use fleetlink::session::{SessionConfig, SessionController, SessionPhase, TraceMapSink};
use fleetlink::source::{LiveSource, PositionProvider, ReplaySource, SampleSource, SourceError};
use fleetlink::transport::AsyncReqwestClient;

#[derive(Debug, Clone, ValueEnum)]
enum Mode {
    /// Poll a position source every tick (here: a fixed coordinate).
    Live,
    /// Replay an operator-authored waypoint route.
    Replay,
}

#[derive(Parser)]
#[command(name = "fleetlink", version = fleetlink::VERSION)]
#[command(about = "Emulate a vehicle reporting telemetry to the fleet hub", long_about = None)]
struct Args {
    /// Vehicle identifier (MDN), digits only
    #[arg(long)]
    mdn: String,

    /// Sample source mode
    #[arg(long, value_enum, default_value = "replay")]
    mode: Mode,

    /// Route file for replay mode: JSON array of [lat, lon] pairs
    #[arg(long, required_if_eq("mode", "replay"))]
    route: Option<PathBuf>,

    /// Fixed latitude for live mode
    #[arg(long, default_value = "37.5665")]
    lat: f64,

    /// Fixed longitude for live mode
    #[arg(long, default_value = "126.978")]
    lon: f64,

    /// Token API base URL
    #[arg(long, default_value = "https://api.where-car.com:8080")]
    api_url: String,

    /// Fleet hub base URL
    #[arg(long, default_value = "http://ts.where-car.com:8090")]
    hub_url: String,

    /// Session duration in seconds (0 = run until Ctrl-C)
    #[arg(long, default_value = "0")]
    duration: u64,
}

/// Position provider returning a fixed coordinate, standing in for a
/// real geolocation capability on desktop hosts.
struct FixedPositionProvider {
    coordinate: Coordinate,
}

impl PositionProvider for FixedPositionProvider {
    async fn current_position(&self) -> Result<Coordinate, SourceError> {
        Ok(self.coordinate)
    }
}

fn load_route(path: &PathBuf) -> Result<Vec<Coordinate>, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read route file {}: {}", path.display(), e))?;
    let pairs: Vec<(f64, f64)> = serde_json::from_str(&raw)
        .map_err(|e| format!("invalid route file {}: {}", path.display(), e))?;
    Ok(pairs
        .into_iter()
        .map(|(lat, lon)| Coordinate::new(lat, lon))
        .collect())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if args.mdn.is_empty() || !args.mdn.chars().all(|c| c.is_ascii_digit()) {
        eprintln!("Error: --mdn must be a non-empty string of digits");
        process::exit(1);
    }

    let _guard = match fleetlink::logging::init_logging("logs", "fleetlink.log") {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    let http = match AsyncReqwestClient::new() {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to create HTTP client");
            process::exit(1);
        }
    };

    let source = match args.mode {
        Mode::Live => SampleSource::Live(LiveSource::new(FixedPositionProvider {
            coordinate: Coordinate::new(args.lat, args.lon),
        })),
        Mode::Replay => {
            // clap enforces --route for replay mode.
            let path = args.route.as_ref().expect("route argument");
            let waypoints = match load_route(path) {
                Ok(waypoints) if !waypoints.is_empty() => waypoints,
                Ok(_) => {
                    eprintln!("Error: route file contains no waypoints");
                    process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            };
            info!(waypoints = waypoints.len(), "route loaded");
            SampleSource::Replay(ReplaySource::new(waypoints))
        }
    };

    let config = SessionConfig::new(&args.mdn)
        .with_api_base_url(args.api_url)
        .with_hub_base_url(args.hub_url);
    let mut controller = SessionController::new(config, http, source, TraceMapSink);

    if let Err(e) = controller.start().await {
        error!(error = %e, "failed to start tracking session");
        process::exit(1);
    }
    info!(mdn = %args.mdn, "tracking session running");

    let mut status = controller.status();
    let session_ended = async {
        while status.borrow_and_update().phase != SessionPhase::Idle {
            if status.changed().await.is_err() {
                break;
            }
        }
    };
    let deadline = async {
        if args.duration > 0 {
            tokio::time::sleep(Duration::from_secs(args.duration)).await
        } else {
            future::pending::<()>().await
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("interrupt received, stopping session"),
        _ = session_ended => info!("session ended on its own"),
        _ = deadline => info!("session duration elapsed, stopping session"),
    }

    if controller.is_active() {
        if let Err(e) = controller.stop().await {
            error!(error = %e, "failed to stop tracking session");
            process::exit(1);
        }
    }
    info!("session stopped");
}
