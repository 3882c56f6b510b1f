//! Transcript ingestion pipeline
//!
//! Upload the artifact, normalize the transcription, persist a memo record.

mod pipeline;
mod transcriber;

pub use pipeline::{IngestOutcome, IngestionPipeline};
pub use transcriber::{TranscriptionApi, TranscriptionClient, TranscriptionResult};

use thiserror::Error;

/// Errors on the ingestion path
///
/// None of these drop the artifact: the controller preserves it for a manual
/// retry whenever ingestion fails.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("transcription upload failed: {0}")]
    Upload(#[from] reqwest::Error),

    #[error("transcription service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("malformed transcription response: {0}")]
    MalformedResponse(String),

    #[error("artifact not uploadable: {0}")]
    InvalidArtifact(String),
}
