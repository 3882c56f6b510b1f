//! In-memory memo store
//!
//! Keyed store for finalized transcripts. Records are owned by the store once
//! created; the only later mutation is the summary update driven by the
//! external summarization flow.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::capture::PhotoRef;

/// A time-bounded span of transcript text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Span start, seconds from the beginning of the recording
    pub start: f64,
    /// Span end, seconds
    pub end: f64,
    /// Transcribed text for the span
    pub text: String,
}

/// One finalized voice memo
///
/// Invariant: `segments` is sorted by non-decreasing `start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoRecord {
    pub id: String,

    /// Full transcript text
    pub text: String,

    /// Time-aligned transcript segments
    pub segments: Vec<Segment>,

    /// Photos captured during the session, in capture order
    pub photos: Vec<PhotoRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

pub struct MemoStore {
    records: RwLock<HashMap<String, MemoRecord>>,
}

impl MemoStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create(&self, record: MemoRecord) {
        let mut records = self.records.write().await;
        records.insert(record.id.clone(), record);
    }

    pub async fn get(&self, id: &str) -> Option<MemoRecord> {
        let records = self.records.read().await;
        records.get(id).cloned()
    }

    /// Attach a summary to an existing record; false when the id is unknown
    pub async fn update_summary(&self, id: &str, summary: String) -> bool {
        let mut records = self.records.write().await;
        match records.get_mut(id) {
            Some(record) => {
                record.summary = Some(summary);
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for MemoStore {
    fn default() -> Self {
        Self::new()
    }
}
