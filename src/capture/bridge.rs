//! Bridged capture transport
//!
//! Delegates capture to the hosting application shell. Commands go out
//! fire-and-forget; nothing here assumes a synchronous acknowledgement, and no
//! capture event is emitted until the host's confirmation arrives. If the
//! host's actual state diverges from a command just sent, local state never
//! drifts with it.

use base64::Engine;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::host::{HostCommand, HostEvent};

use super::transport::{
    event_channel, Artifact, CaptureError, CaptureEvent, CaptureTransport,
};

pub struct BridgedTransport {
    commands: mpsc::Sender<HostCommand>,
    translate_task: JoinHandle<()>,
}

impl BridgedTransport {
    /// Wire the transport over a command sender / event receiver pair
    ///
    /// The pair normally comes from `NatsBridge::connect`; tests hand in
    /// plain channels.
    pub fn new(
        commands: mpsc::Sender<HostCommand>,
        inbound: mpsc::Receiver<HostEvent>,
    ) -> (Self, mpsc::Receiver<CaptureEvent>) {
        let (events, events_rx) = event_channel();
        let translate_task = tokio::spawn(translate_events(inbound, events));
        (
            Self {
                commands,
                translate_task,
            },
            events_rx,
        )
    }

    async fn send(&self, command: HostCommand) -> Result<(), CaptureError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CaptureError::ChannelClosed)
    }
}

#[async_trait::async_trait]
impl CaptureTransport for BridgedTransport {
    async fn start(&self) -> Result<(), CaptureError> {
        self.send(HostCommand::StartRecord).await
    }

    async fn pause(&self) -> Result<(), CaptureError> {
        self.send(HostCommand::PauseRecord).await
    }

    async fn resume(&self) -> Result<(), CaptureError> {
        self.send(HostCommand::ResumeRecord).await
    }

    async fn stop(&self) -> Result<(), CaptureError> {
        self.send(HostCommand::StopRecord).await
    }

    async fn capture_photo(&self) -> Result<(), CaptureError> {
        self.send(HostCommand::OpenCamera).await
    }

    fn name(&self) -> &str {
        "bridged"
    }
}

impl Drop for BridgedTransport {
    fn drop(&mut self) {
        self.translate_task.abort();
    }
}

/// Maps host confirmations onto the transport-agnostic event stream
///
/// Inbound events are already serialized by the bridge carrier; this task
/// preserves their order.
async fn translate_events(
    mut inbound: mpsc::Receiver<HostEvent>,
    events: mpsc::Sender<CaptureEvent>,
) {
    while let Some(event) = inbound.recv().await {
        let mapped = match event {
            HostEvent::StartRecord => CaptureEvent::Started,
            HostEvent::PauseRecord => CaptureEvent::Paused,
            HostEvent::ResumeRecord => CaptureEvent::Resumed,
            HostEvent::TakePhoto(photo) => CaptureEvent::PhotoCaptured(photo),
            HostEvent::StopRecord(payload) => {
                let bytes = match base64::engine::general_purpose::STANDARD.decode(&payload.audio)
                {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("Dropping stop confirmation with invalid audio payload: {}", e);
                        continue;
                    }
                };
                info!(
                    "Host delivered artifact ({} bytes, {})",
                    bytes.len(),
                    payload.mime_type
                );
                CaptureEvent::Stopped(Artifact {
                    bytes,
                    mime_type: payload.mime_type,
                    ext: payload.ext,
                })
            }
        };

        if events.send(mapped).await.is_err() {
            break;
        }
    }
}
