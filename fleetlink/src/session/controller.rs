//! Session controller state machine.
//!
//! States: `Idle -> Starting -> Active -> Stopping -> Idle`. `Active`
//! is the only state with a live collection timer. All per-session
//! mutable state (start time, cancellation token, worker handle) lives
//! in a session-scoped struct created by `start` and discarded when the
//! worker finishes, never in ambient globals.
//!
//! Failure policy: anything failing during `start` aborts the whole
//! session atomically back to `Idle`; steady-state tick failures are
//! absorbed locally (log and skip); teardown failures are reported but
//! never block the return to `Idle`.

use std::sync::Arc;

use chrono::Local;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::auth::{AuthError, CredentialManager};
use crate::batch::BatchUploader;
use crate::protocol::{self, PowerEventRequest};
use crate::source::{PositionProvider, SampleSource, SourceError};
use crate::transport::AsyncHttpClient;

use super::{MapSink, SessionConfig};

/// Errors surfaced by the session commands.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A session is already active; stop it first.
    #[error("a tracking session is already active")]
    AlreadyActive,

    /// No session is active.
    #[error("no tracking session is active")]
    NotActive,

    /// Credential or hub failure during start.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The sample source could not provide a position during start.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Lifecycle phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Starting,
    Active,
    Stopping,
}

/// Phase plus a human-readable status line for the UI indicator.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    pub message: String,
}

impl SessionStatus {
    fn new(phase: SessionPhase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
        }
    }
}

/// State owned by one active session and discarded on stop.
struct ActiveSession {
    cancel: CancellationToken,
    worker: JoinHandle<()>,
}

/// Top-level tracking session state machine.
///
/// Exactly one session can be active at a time; `start` refuses while a
/// worker is live. The controller requires `&mut self` for both
/// commands, so start/stop transitions are serialized by ownership.
pub struct SessionController<C, P, M>
where
    C: AsyncHttpClient + 'static,
    P: PositionProvider + 'static,
    M: MapSink + 'static,
{
    config: SessionConfig,
    credentials: Arc<CredentialManager<C>>,
    uploader: Arc<BatchUploader>,
    source: Arc<Mutex<SampleSource<P>>>,
    map: Arc<M>,
    status_tx: Arc<watch::Sender<SessionStatus>>,
    active: Option<ActiveSession>,
}

impl<C, P, M> SessionController<C, P, M>
where
    C: AsyncHttpClient + 'static,
    P: PositionProvider + 'static,
    M: MapSink + 'static,
{
    pub fn new(config: SessionConfig, http: C, source: SampleSource<P>, map: M) -> Self {
        let credentials = Arc::new(CredentialManager::new(
            http,
            config.token_url(),
            config.descriptor(),
            config.firmware_version.clone(),
        ));
        let (status_tx, _) = watch::channel(SessionStatus::new(SessionPhase::Idle, "idle"));

        Self {
            config,
            credentials,
            uploader: Arc::new(BatchUploader::new()),
            source: Arc::new(Mutex::new(source)),
            map: Arc::new(map),
            status_tx: Arc::new(status_tx),
            active: None,
        }
    }

    /// Subscribes to phase/status updates.
    pub fn status(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// True while the collection worker is live.
    ///
    /// A replay session that ran its path to exhaustion counts as
    /// inactive even before `stop` is called.
    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|session| !session.worker.is_finished())
    }

    /// Starts a tracking session.
    ///
    /// Acquires a credential, captures one position and emits the
    /// session-start event; only then is the collection worker spawned.
    /// Any failure before that point aborts cleanly back to `Idle` with
    /// no partial session left running.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(SessionError::AlreadyActive);
        }
        // A finished worker (replay exhaustion) may still hold a slot.
        if let Some(finished) = self.active.take() {
            let _ = finished.worker.await;
        }

        self.set_status(SessionPhase::Starting, "acquiring session token");

        match self.start_session().await {
            Ok(session) => {
                self.active = Some(session);
                Ok(())
            }
            Err(e) => {
                self.set_status(SessionPhase::Idle, format!("start failed: {e}"));
                Err(e)
            }
        }
    }

    async fn start_session(&mut self) -> Result<ActiveSession, SessionError> {
        // Fresh per-session derived state: previous fix, replay cursor,
        // speed walk.
        self.source.lock().await.reset_session_state();

        self.credentials.get_token().await?;

        self.set_status(SessionPhase::Starting, "sending session start event");
        let position = self.source.lock().await.reference_position().await?;
        let started_at = protocol::format_timestamp_seconds(Local::now());
        let request =
            PowerEventRequest::power_on(self.config.descriptor(), &started_at, position);
        self.credentials
            .authenticated_call(&self.config.power_on_url(), &request)
            .await?;

        info!(
            vehicle = %self.config.vehicle_id,
            started_at = %started_at,
            "tracking session started"
        );

        let cancel = CancellationToken::new();
        let worker = Worker {
            config: self.config.clone(),
            credentials: Arc::clone(&self.credentials),
            uploader: Arc::clone(&self.uploader),
            source: Arc::clone(&self.source),
            map: Arc::clone(&self.map),
            status_tx: Arc::clone(&self.status_tx),
            started_at,
            upload_task: std::sync::Mutex::new(None),
        };
        let worker_cancel = cancel.clone();
        let handle = tokio::spawn(async move { worker.run(worker_cancel).await });

        self.set_status(SessionPhase::Active, "tracking");
        Ok(ActiveSession {
            cancel,
            worker: handle,
        })
    }

    /// Stops the active session.
    ///
    /// Cancellation is cooperative: a position fetch already in flight
    /// settles before the worker tears down. Teardown itself is
    /// best-effort; this returns `Ok` once the worker has finished,
    /// regardless of whether the end event or final drain succeeded.
    /// A session that already ended on its own (replay exhaustion)
    /// counts as not active.
    pub async fn stop(&mut self) -> Result<(), SessionError> {
        let Some(session) = self.active.take() else {
            return Err(SessionError::NotActive);
        };
        if session.worker.is_finished() {
            let _ = session.worker.await;
            return Err(SessionError::NotActive);
        }

        session.cancel.cancel();
        if let Err(e) = session.worker.await {
            error!(error = %e, "session worker task failed");
        }
        Ok(())
    }

    fn set_status(&self, phase: SessionPhase, message: impl Into<String>) {
        self.status_tx.send_replace(SessionStatus::new(phase, message));
    }
}

/// Collection worker for one session.
///
/// Owns the fixed-period tick loop. Ticks are processed sequentially:
/// a tick whose position fetch is still in flight suppresses the next
/// scheduled tick instead of overlapping it. Batch uploads run on
/// their own task so a slow uplink never holds up the ticks.
struct Worker<C, P, M>
where
    C: AsyncHttpClient + 'static,
    P: PositionProvider + 'static,
    M: MapSink + 'static,
{
    config: SessionConfig,
    credentials: Arc<CredentialManager<C>>,
    uploader: Arc<BatchUploader>,
    source: Arc<Mutex<SampleSource<P>>>,
    map: Arc<M>,
    status_tx: Arc<watch::Sender<SessionStatus>>,
    started_at: String,
    upload_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<C, P, M> Worker<C, P, M>
where
    C: AsyncHttpClient + 'static,
    P: PositionProvider + 'static,
    M: MapSink + 'static,
{
    async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.collect_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("stop requested");
                    break;
                }
                _ = ticker.tick() => {
                    match self.collect_once().await {
                        Ok(()) => {}
                        Err(SourceError::PathExhausted) => {
                            info!("replay path exhausted, ending session");
                            break;
                        }
                        Err(SourceError::Position(message)) => {
                            // A single missed fix does not tear the
                            // session down.
                            warn!(error = %message, "position fix failed, skipping tick");
                        }
                    }
                }
            }
        }

        self.teardown().await;
    }

    async fn collect_once(&self) -> Result<(), SourceError> {
        let sample = self.source.lock().await.next_sample().await?;

        self.map.add_point(sample.coordinate);
        self.map.set_center(sample.coordinate);
        self.uploader.append(sample);

        if self.uploader.len() >= self.config.batch_window {
            self.spawn_upload();
        }
        Ok(())
    }

    /// Ships the filled window on its own task so upload latency never
    /// holds up the tick loop. At most one upload is in flight at a
    /// time; while one is out, the next append past the window re-arms
    /// the trigger.
    fn spawn_upload(&self) {
        let mut slot = self.upload_task.lock().unwrap();
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let uploader = Arc::clone(&self.uploader);
        let credentials = Arc::clone(&self.credentials);
        let url = self.config.telemetry_url();
        let device = self.config.descriptor();
        *slot = Some(tokio::spawn(async move {
            if let Err(e) = uploader.drain(&credentials, &url, &device).await {
                // The window is lost; collection continues.
                warn!(error = %e, "telemetry batch upload failed");
            }
        }));
    }

    /// Best-effort teardown: end event, final drain, route clear.
    /// Every failure is reported but none blocks the Idle transition.
    async fn teardown(self) {
        self.set_status(SessionPhase::Stopping, "sending session end event");

        let stopped_at = protocol::format_timestamp_seconds(Local::now());
        match self.source.lock().await.reference_position().await {
            Ok(position) => {
                let request = PowerEventRequest::power_off(
                    self.config.descriptor(),
                    &self.started_at,
                    &stopped_at,
                    position,
                );
                if let Err(e) = self
                    .credentials
                    .authenticated_call(&self.config.power_off_url(), &request)
                    .await
                {
                    warn!(error = %e, "session end event failed");
                }
            }
            Err(e) => warn!(error = %e, "no position for session end event"),
        }

        // Let an upload still in flight settle before the final drain.
        let pending = self.upload_task.lock().unwrap().take();
        if let Some(task) = pending {
            let _ = task.await;
        }

        if let Err(e) = self
            .uploader
            .drain(
                &self.credentials,
                &self.config.telemetry_url(),
                &self.config.descriptor(),
            )
            .await
        {
            warn!(error = %e, "final telemetry drain failed");
        }

        self.source.lock().await.reset_session_state();
        self.map.clear_route();

        info!(
            vehicle = %self.config.vehicle_id,
            stopped_at = %stopped_at,
            "tracking session ended"
        );
        self.set_status(SessionPhase::Idle, "session ended");
    }

    fn set_status(&self, phase: SessionPhase, message: impl Into<String>) {
        self.status_tx.send_replace(SessionStatus::new(phase, message));
    }
}
