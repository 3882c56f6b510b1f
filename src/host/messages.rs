//! Host bridge wire protocol (version 1)
//!
//! Closed message schema exchanged with the hosting application shell. Every
//! kind and payload shape is enumerated here and validated at the boundary;
//! unknown kinds fail deserialization and are dropped by the bridge wiring,
//! never forwarded.

use serde::{Deserialize, Serialize};

/// Protocol version spoken on the bridge subjects
pub const PROTOCOL_VERSION: u32 = 1;

/// Outbound command, service -> host
///
/// Fire-and-forget: issuing a command changes no local state. The host
/// answers with a `HostEvent` confirmation when (and if) it complies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostCommand {
    #[serde(rename = "start-record")]
    StartRecord,

    #[serde(rename = "pause-record")]
    PauseRecord,

    #[serde(rename = "resume-record")]
    ResumeRecord,

    #[serde(rename = "stop-record")]
    StopRecord,

    #[serde(rename = "open-camera")]
    OpenCamera,
}

/// Audio payload carried by the host's stop confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopRecordPayload {
    /// Base64-encoded audio bytes
    pub audio: String,

    #[serde(rename = "mimeType")]
    pub mime_type: String,

    /// File extension without the dot
    pub ext: String,
}

/// Inbound confirmation event, host -> service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum HostEvent {
    #[serde(rename = "onStartRecord")]
    StartRecord,

    #[serde(rename = "onPauseRecord")]
    PauseRecord,

    #[serde(rename = "onResumeRecord")]
    ResumeRecord,

    #[serde(rename = "onStopRecord")]
    StopRecord(StopRecordPayload),

    #[serde(rename = "onTakePhoto")]
    TakePhoto(String),
}
