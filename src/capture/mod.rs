//! Capture transports
//!
//! Two variants of the same contract:
//! - `LocalTransport`: direct microphone capture via cpal
//! - `BridgedTransport`: delegates to a hosting application over the bridge

pub mod bridge;
pub mod local;
pub mod mic;
pub mod transport;

pub use bridge::BridgedTransport;
pub use local::LocalTransport;
pub use mic::{AudioDevice, AudioFrame, AudioStream, CpalDevice};
pub use transport::{
    Artifact, CaptureConfig, CaptureError, CaptureEvent, CaptureTransport, PhotoRef,
};
