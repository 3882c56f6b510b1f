use serde::{Deserialize, Serialize};

use crate::capture::CaptureEvent;

/// Lifecycle state of the recording controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No session in progress
    Idle,
    /// Actively capturing audio
    Recording,
    /// Session active but capture suspended
    Paused,
}

impl SessionState {
    /// Whether a session is in progress (photo capture is only valid here)
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Recording | SessionState::Paused)
    }

    /// Apply a capture event to the state machine
    ///
    /// Returns the successor state, or `None` when the event is not accepted
    /// from this state. Events returning `Some(self)` are accepted without a
    /// transition (photos, chunks).
    pub fn transition(self, event: &CaptureEvent) -> Option<SessionState> {
        use SessionState::*;
        match (self, event) {
            (Idle, CaptureEvent::Started) => Some(Recording),
            (Recording, CaptureEvent::Paused) => Some(Paused),
            (Paused, CaptureEvent::Resumed) => Some(Recording),
            (Recording | Paused, CaptureEvent::Stopped(_)) => Some(Idle),
            (Recording | Paused, CaptureEvent::PhotoCaptured(_)) => Some(self),
            (Recording | Paused, CaptureEvent::Chunk(_)) => Some(self),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Recording => "recording",
            SessionState::Paused => "paused",
        }
    }
}
