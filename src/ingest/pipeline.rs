use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::capture::{Artifact, PhotoRef};
use crate::store::{MemoRecord, MemoStore};

use super::transcriber::TranscriptionApi;
use super::IngestError;

/// Result of a successful ingestion: the persisted id and where to review it
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub memo_id: String,
    pub review_path: String,
}

/// Turns a finished capture artifact into a persisted memo record
///
/// Runs once per completed session: upload, normalize, persist. Callers keep
/// the artifact on failure, so a retry is a plain second call.
#[derive(Clone)]
pub struct IngestionPipeline {
    transcriber: Arc<dyn TranscriptionApi>,
    store: Arc<MemoStore>,
}

impl IngestionPipeline {
    pub fn new(transcriber: Arc<dyn TranscriptionApi>, store: Arc<MemoStore>) -> Self {
        Self { transcriber, store }
    }

    pub async fn ingest(
        &self,
        artifact: &Artifact,
        photos: &[PhotoRef],
    ) -> Result<IngestOutcome, IngestError> {
        let result = self.transcriber.transcribe(artifact).await?;

        let mut segments = result.segments;
        for segment in &mut segments {
            segment.text = segment.text.trim().to_string();
        }
        // Keep the ordering invariant even if the service returns segments
        // out of order. Stable sort preserves service order for equal starts.
        segments.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));

        // Timestamp plus a process-wide sequence keeps ids unique even when
        // two sessions finalize within the same millisecond.
        static SEQUENCE: AtomicU64 = AtomicU64::new(0);
        let memo_id = format!(
            "memo-{}-{}",
            Utc::now().timestamp_millis(),
            SEQUENCE.fetch_add(1, AtomicOrdering::SeqCst)
        );

        let record = MemoRecord {
            id: memo_id.clone(),
            text: result.text,
            segments,
            photos: photos.to_vec(),
            summary: None,
        };
        self.store.create(record).await;

        info!("Memo {} persisted ({} photos)", memo_id, photos.len());

        Ok(IngestOutcome {
            review_path: format!("/memos/{}", memo_id),
            memo_id,
        })
    }
}
