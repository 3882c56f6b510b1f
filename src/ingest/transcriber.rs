//! Transcription service client
//!
//! Uploads the capture artifact as a multipart form (field `file`, filename
//! `recording.<ext>`) and parses the structured transcription response.

use serde::Deserialize;
use tracing::info;

use crate::capture::Artifact;
use crate::store::Segment;

use super::IngestError;

/// Structured result returned by the transcription service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TranscriptionResult {
    /// Full transcript text
    pub text: String,
    /// Time-aligned segments, as returned (may be unsorted/untrimmed)
    pub segments: Vec<Segment>,
}

/// Seam between the pipeline and the transcription service
///
/// The HTTP client below is the production implementation; tests substitute
/// their own.
#[async_trait::async_trait]
pub trait TranscriptionApi: Send + Sync {
    async fn transcribe(&self, artifact: &Artifact) -> Result<TranscriptionResult, IngestError>;
}

pub struct TranscriptionClient {
    http: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    transcription: TranscriptionResult,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: String,
}

impl TranscriptionClient {
    pub fn new(url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait::async_trait]
impl TranscriptionApi for TranscriptionClient {
    async fn transcribe(&self, artifact: &Artifact) -> Result<TranscriptionResult, IngestError> {
        let part = reqwest::multipart::Part::bytes(artifact.bytes.clone())
            .file_name(artifact.upload_filename())
            .mime_str(&artifact.mime_type)
            .map_err(|e| IngestError::InvalidArtifact(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        info!(
            "Uploading artifact to {} ({} bytes as {})",
            self.url,
            artifact.bytes.len(),
            artifact.upload_filename()
        );

        let response = self
            .http
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(IngestError::Upload)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ServiceErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(IngestError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let body: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| IngestError::MalformedResponse(e.to_string()))?;

        Ok(body.transcription)
    }
}
