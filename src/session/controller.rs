//! Recording session controller
//!
//! Unifies the two capture transports behind one state machine. UI intent
//! (HTTP handlers, CLI) calls the command methods, which forward to the
//! transport; the state machine itself advances only on transport events,
//! consumed in arrival order by a single event task. A blocking stop call is
//! bridged to the asynchronous ingestion pipeline through a oneshot handed to
//! that task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::capture::{Artifact, CaptureError, CaptureEvent, CaptureTransport, PhotoRef};
use crate::ingest::{IngestError, IngestOutcome, IngestionPipeline};

use super::state::SessionState;
use super::ticker::ElapsedTicker;
use super::toast::ToastNotifier;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a recording session is already active")]
    SessionActive,

    #[error("no active recording session")]
    NoActiveSession,

    #[error("no failed ingestion awaiting retry")]
    NothingToRetry,

    #[error("session controller closed")]
    ControllerClosed,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Snapshot of the controller for status queries
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub elapsed_secs: u64,
    pub elapsed_display: String,
    pub photo_count: usize,
    pub toast_visible: bool,
    pub retry_pending: bool,
}

/// An ingestion failure kept around for a manual retry
struct PendingIngest {
    artifact: Artifact,
    photos: Vec<PhotoRef>,
}

type StopWaiter = oneshot::Sender<Result<IngestOutcome, SessionError>>;

struct Shared {
    state: Mutex<SessionState>,
    /// Guards against a second start while the first confirmation is pending
    start_pending: AtomicBool,
    session_id: Mutex<Option<String>>,
    photos: Mutex<Vec<PhotoRef>>,
    pending_retry: Mutex<Option<PendingIngest>>,
    stop_waiter: Mutex<Option<StopWaiter>>,
    ticker: ElapsedTicker,
    toast: ToastNotifier,
}

pub struct SessionController {
    transport: Box<dyn CaptureTransport>,
    pipeline: IngestionPipeline,
    shared: Arc<Shared>,
    event_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    /// Build the controller around a transport and its event stream
    ///
    /// Spawns the event task; dropping the controller tears it down along
    /// with any pending toast timer.
    pub fn new(
        transport: Box<dyn CaptureTransport>,
        events: mpsc::Receiver<CaptureEvent>,
        pipeline: IngestionPipeline,
    ) -> Arc<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(SessionState::Idle),
            start_pending: AtomicBool::new(false),
            session_id: Mutex::new(None),
            photos: Mutex::new(Vec::new()),
            pending_retry: Mutex::new(None),
            stop_waiter: Mutex::new(None),
            ticker: ElapsedTicker::new(),
            toast: ToastNotifier::new(),
        });

        info!("Session controller using {} transport", transport.name());

        let event_task = tokio::spawn(run_events(
            Arc::clone(&shared),
            pipeline.clone(),
            events,
        ));

        Arc::new(Self {
            transport,
            pipeline,
            shared,
            event_task: std::sync::Mutex::new(Some(event_task)),
        })
    }

    /// Request a new session
    ///
    /// Rejected while a session is active or a start confirmation is still
    /// outstanding; at most one session exists at a time.
    pub async fn start(&self) -> Result<(), SessionError> {
        {
            let state = self.shared.state.lock().await;
            if state.is_active() {
                return Err(SessionError::SessionActive);
            }
        }
        if self.shared.start_pending.swap(true, Ordering::SeqCst) {
            return Err(SessionError::SessionActive);
        }

        if let Err(e) = self.transport.start().await {
            self.shared.start_pending.store(false, Ordering::SeqCst);
            return Err(SessionError::Capture(e));
        }
        Ok(())
    }

    /// Request a pause; no-op outside `Recording`
    pub async fn pause(&self) -> Result<(), SessionError> {
        let state = *self.shared.state.lock().await;
        if state != SessionState::Recording {
            return Ok(());
        }
        self.transport.pause().await.map_err(SessionError::Capture)
    }

    /// Request a resume; no-op outside `Paused`
    pub async fn resume(&self) -> Result<(), SessionError> {
        let state = *self.shared.state.lock().await;
        if state != SessionState::Paused {
            return Ok(());
        }
        self.transport.resume().await.map_err(SessionError::Capture)
    }

    /// Ask the transport to capture a photo; only valid while active
    pub async fn capture_photo(&self) -> Result<(), SessionError> {
        let state = *self.shared.state.lock().await;
        if !state.is_active() {
            return Err(SessionError::NoActiveSession);
        }
        self.transport
            .capture_photo()
            .await
            .map_err(SessionError::Capture)
    }

    /// Stop the session and wait for ingestion to finish
    ///
    /// Returns the persisted memo id and review path. On ingestion failure
    /// the artifact is preserved and `retry_ingest` can complete the save.
    pub async fn stop(&self) -> Result<IngestOutcome, SessionError> {
        {
            let state = self.shared.state.lock().await;
            if !state.is_active() {
                return Err(SessionError::NoActiveSession);
            }
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut waiter = self.shared.stop_waiter.lock().await;
            *waiter = Some(tx);
        }

        if let Err(e) = self.transport.stop().await {
            let mut waiter = self.shared.stop_waiter.lock().await;
            *waiter = None;
            return Err(SessionError::Capture(e));
        }

        rx.await.map_err(|_| SessionError::ControllerClosed)?
    }

    /// Re-run ingestion for the artifact preserved by a failed stop
    pub async fn retry_ingest(&self) -> Result<IngestOutcome, SessionError> {
        let pending = {
            let mut slot = self.shared.pending_retry.lock().await;
            slot.take().ok_or(SessionError::NothingToRetry)?
        };

        match self
            .pipeline
            .ingest(&pending.artifact, &pending.photos)
            .await
        {
            Ok(outcome) => {
                self.shared.photos.lock().await.clear();
                self.shared.toast.show();
                info!("Retry succeeded: {}", outcome.memo_id);
                Ok(outcome)
            }
            Err(e) => {
                // Keep the artifact; the caller may retry again.
                let mut slot = self.shared.pending_retry.lock().await;
                *slot = Some(pending);
                Err(SessionError::Ingest(e))
            }
        }
    }

    pub async fn state(&self) -> SessionState {
        *self.shared.state.lock().await
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.shared.ticker.elapsed_secs()
    }

    pub fn toast_visible(&self) -> bool {
        self.shared.toast.is_visible()
    }

    pub async fn photos(&self) -> Vec<PhotoRef> {
        self.shared.photos.lock().await.clone()
    }

    pub async fn status(&self) -> SessionStatus {
        SessionStatus {
            state: *self.shared.state.lock().await,
            session_id: self.shared.session_id.lock().await.clone(),
            elapsed_secs: self.shared.ticker.elapsed_secs(),
            elapsed_display: self.shared.ticker.display(),
            photo_count: self.shared.photos.lock().await.len(),
            toast_visible: self.shared.toast.is_visible(),
            retry_pending: self.shared.pending_retry.lock().await.is_some(),
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        let mut task = self.event_task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }
}

/// Single consumer of the transport event stream
///
/// Every transition runs synchronously with respect to its event, in arrival
/// order. Events the state machine does not accept are logged and dropped.
async fn run_events(
    shared: Arc<Shared>,
    pipeline: IngestionPipeline,
    mut events: mpsc::Receiver<CaptureEvent>,
) {
    while let Some(event) = events.recv().await {
        let current = *shared.state.lock().await;
        let Some(next) = current.transition(&event) else {
            warn!(
                "Ignoring {} event in {} state",
                event_name(&event),
                current.as_str()
            );
            continue;
        };

        match event {
            CaptureEvent::Started => {
                let session_id = format!("session-{}", Uuid::new_v4());
                info!("Recording started: {}", session_id);

                *shared.session_id.lock().await = Some(session_id);
                shared.start_pending.store(false, Ordering::SeqCst);
                shared.photos.lock().await.clear();
                *shared.pending_retry.lock().await = None;
                shared.ticker.start_from_zero();
                *shared.state.lock().await = next;
            }

            CaptureEvent::Chunk(_) => {
                // Buffering progress only; no transition, nothing to drive.
            }

            CaptureEvent::Paused => {
                shared.ticker.freeze();
                *shared.state.lock().await = next;
                info!("Recording paused at {}", shared.ticker.display());
            }

            CaptureEvent::Resumed => {
                shared.ticker.resume();
                *shared.state.lock().await = next;
                info!("Recording resumed at {}", shared.ticker.display());
            }

            CaptureEvent::PhotoCaptured(photo) => {
                let mut photos = shared.photos.lock().await;
                photos.push(photo);
                info!("Photo captured ({} total)", photos.len());
            }

            CaptureEvent::Stopped(artifact) => {
                shared.ticker.freeze();
                shared.start_pending.store(false, Ordering::SeqCst);
                *shared.state.lock().await = next;
                *shared.session_id.lock().await = None;

                let elapsed = shared.ticker.display();
                info!(
                    "Recording stopped at {} ({} bytes)",
                    elapsed,
                    artifact.bytes.len()
                );

                finalize(&shared, &pipeline, artifact).await;
            }
        }
    }
}

/// Stop side of the state machine: ingest, persist, notify
async fn finalize(shared: &Shared, pipeline: &IngestionPipeline, artifact: Artifact) {
    let photos = shared.photos.lock().await.clone();

    let outcome = pipeline.ingest(&artifact, &photos).await;

    let waiter = shared.stop_waiter.lock().await.take();
    match outcome {
        Ok(outcome) => {
            shared.photos.lock().await.clear();
            shared.toast.show();
            info!("Session saved: {}", outcome.review_path);
            if let Some(waiter) = waiter {
                let _ = waiter.send(Ok(outcome));
            }
        }
        Err(e) => {
            error!("Ingestion failed, artifact preserved for retry: {}", e);
            *shared.pending_retry.lock().await = Some(PendingIngest { artifact, photos });
            if let Some(waiter) = waiter {
                let _ = waiter.send(Err(SessionError::Ingest(e)));
            }
        }
    }
}

fn event_name(event: &CaptureEvent) -> &'static str {
    match event {
        CaptureEvent::Started => "started",
        CaptureEvent::Chunk(_) => "chunk",
        CaptureEvent::Paused => "paused",
        CaptureEvent::Resumed => "resumed",
        CaptureEvent::Stopped(_) => "stopped",
        CaptureEvent::PhotoCaptured(_) => "photo-captured",
    }
}
