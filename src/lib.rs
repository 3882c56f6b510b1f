pub mod capture;
pub mod config;
pub mod host;
pub mod http;
pub mod ingest;
pub mod session;
pub mod store;

pub use capture::{
    Artifact, AudioDevice, AudioFrame, AudioStream, BridgedTransport, CaptureConfig, CaptureError,
    CaptureEvent, CaptureTransport, CpalDevice, LocalTransport, PhotoRef,
};
pub use config::Config;
pub use host::{HostCommand, HostEvent, NatsBridge, StopRecordPayload};
pub use http::{create_router, AppState};
pub use ingest::{
    IngestError, IngestOutcome, IngestionPipeline, TranscriptionApi, TranscriptionClient,
    TranscriptionResult,
};
pub use session::{SessionController, SessionError, SessionState, SessionStatus};
pub use store::{MemoRecord, MemoStore, Segment};
