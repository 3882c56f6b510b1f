use thiserror::Error;
use tokio::sync::mpsc;

/// A photo reference collected during a session (URL or host-side handle).
pub type PhotoRef = String;

/// The assembled audio payload of one completed recording.
///
/// Created exactly once per session, when a stop is confirmed, and consumed
/// by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Encoded audio bytes
    pub bytes: Vec<u8>,
    /// MIME type (e.g. "audio/wav")
    pub mime_type: String,
    /// File extension without the dot (e.g. "wav")
    pub ext: String,
}

impl Artifact {
    /// Filename used when uploading this artifact
    pub fn upload_filename(&self) -> String {
        format!("recording.{}", self.ext)
    }
}

/// Transport-agnostic capture event stream
///
/// Both transports emit these; the session controller only ever sees this
/// contract, never the transport underneath.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// Capture has actually started (confirmed, not merely commanded)
    Started,
    /// A chunk of audio was buffered (local capture only; sample count)
    Chunk(usize),
    /// Capture was paused
    Paused,
    /// Capture was resumed
    Resumed,
    /// Capture finished; carries the assembled artifact
    Stopped(Artifact),
    /// The host captured a photo during the session
    PhotoCaptured(PhotoRef),
}

/// Errors raised by a capture transport
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no audio input device available")]
    NoInputDevice,

    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("capture already in progress")]
    AlreadyCapturing,

    #[error("no capture in progress")]
    NotCapturing,

    #[error("failed to encode artifact: {0}")]
    Encode(String),

    #[error("transport channel closed")]
    ChannelClosed,
}

/// Configuration for a capture transport
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Preferred sample rate in Hz (device may override)
    pub sample_rate: u32,
    /// Preferred channel count (1 = mono)
    pub channels: u16,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
        }
    }
}

/// Capture transport contract
///
/// Exactly two implementations exist: `LocalTransport` (direct microphone
/// capture) and `BridgedTransport` (delegates to a hosting application over
/// the bridge protocol). The variant is selected once, at controller
/// construction; everything downstream depends only on this trait and on the
/// event receiver handed out by the constructor.
///
/// Commands are requests, not state changes: a transport may confirm
/// synchronously (local) or only when the host acknowledges (bridged). The
/// session state machine reacts to events alone.
#[async_trait::async_trait]
pub trait CaptureTransport: Send + Sync {
    /// Begin capturing audio
    async fn start(&self) -> Result<(), CaptureError>;

    /// Pause capturing without finalizing
    async fn pause(&self) -> Result<(), CaptureError>;

    /// Resume a paused capture
    async fn resume(&self) -> Result<(), CaptureError>;

    /// Stop capturing and assemble the artifact
    async fn stop(&self) -> Result<(), CaptureError>;

    /// Ask the host to open its camera (no-op for local capture)
    async fn capture_photo(&self) -> Result<(), CaptureError>;

    /// Transport name for logging
    fn name(&self) -> &str;
}

/// Channel capacity for capture event streams
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 256;

pub(crate) fn event_channel() -> (mpsc::Sender<CaptureEvent>, mpsc::Receiver<CaptureEvent>) {
    mpsc::channel(EVENT_CHANNEL_CAPACITY)
}
