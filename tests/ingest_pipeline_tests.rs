// Integration tests for the transcript ingestion pipeline.
//
// A local axum server stands in for the transcription service so the real
// multipart client is exercised end to end: upload shape, response mapping,
// and every failure branch.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{body::Bytes, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde_json::json;

use voicememo::capture::Artifact;
use voicememo::ingest::{IngestError, IngestionPipeline, TranscriptionApi, TranscriptionClient};
use voicememo::store::MemoStore;

async fn transcribe_ok(body: Bytes) -> impl IntoResponse {
    let body = String::from_utf8_lossy(&body);
    // The upload must be a multipart form with field `file` named after the
    // artifact's extension.
    if !body.contains("name=\"file\"") || !body.contains("filename=\"recording.wav\"") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "bad upload shape" })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "transcription": {
                "text": "first second",
                "segments": [
                    { "start": 4.0, "end": 6.0, "text": "  second  " },
                    { "start": 0.0, "end": 4.0, "text": " first " }
                ]
            }
        })),
    )
}

async fn transcribe_fail() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "stt exploded" })),
    )
}

async fn transcribe_garbled() -> impl IntoResponse {
    (StatusCode::OK, "this is not json")
}

async fn spawn_stub() -> SocketAddr {
    let app = Router::new()
        .route("/ok", post(transcribe_ok))
        .route("/fail", post(transcribe_fail))
        .route("/garbled", post(transcribe_garbled));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn artifact() -> Artifact {
    Artifact {
        bytes: b"RIFF-ish bytes".to_vec(),
        mime_type: "audio/wav".to_string(),
        ext: "wav".to_string(),
    }
}

fn pipeline_for(url: String, store: Arc<MemoStore>) -> IngestionPipeline {
    let client: Arc<dyn TranscriptionApi> = Arc::new(TranscriptionClient::new(url));
    IngestionPipeline::new(client, store)
}

#[tokio::test]
async fn uploads_and_persists_a_normalized_record() {
    let addr = spawn_stub().await;
    let store = Arc::new(MemoStore::new());
    let pipeline = pipeline_for(format!("http://{}/ok", addr), Arc::clone(&store));

    let photos = vec!["photos/1.jpg".to_string(), "photos/2.jpg".to_string()];
    let outcome = pipeline.ingest(&artifact(), &photos).await.unwrap();

    assert!(outcome.memo_id.starts_with("memo-"));
    assert_eq!(outcome.review_path, format!("/memos/{}", outcome.memo_id));

    let record = store.get(&outcome.memo_id).await.unwrap();
    assert_eq!(record.text, "first second");
    assert_eq!(record.photos, photos);

    // Segments are trimmed and sorted by non-decreasing start.
    assert_eq!(record.segments.len(), 2);
    assert_eq!(record.segments[0].text, "first");
    assert_eq!(record.segments[0].start, 0.0);
    assert_eq!(record.segments[1].text, "second");
    assert_eq!(record.segments[1].start, 4.0);
    assert_eq!(record.summary, None);
}

#[tokio::test]
async fn ids_are_unique_across_ingestions() {
    let addr = spawn_stub().await;
    let store = Arc::new(MemoStore::new());
    let pipeline = pipeline_for(format!("http://{}/ok", addr), Arc::clone(&store));

    let first = pipeline.ingest(&artifact(), &[]).await.unwrap();
    let second = pipeline.ingest(&artifact(), &[]).await.unwrap();

    assert_ne!(first.memo_id, second.memo_id);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn service_error_maps_to_status_and_message() {
    let addr = spawn_stub().await;
    let store = Arc::new(MemoStore::new());
    let pipeline = pipeline_for(format!("http://{}/fail", addr), Arc::clone(&store));

    let err = pipeline.ingest(&artifact(), &[]).await.unwrap_err();
    match err {
        IngestError::Service { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "stt exploded");
        }
        other => panic!("expected service error, got {:?}", other),
    }
    // Nothing was persisted.
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn garbled_response_maps_to_malformed_response() {
    let addr = spawn_stub().await;
    let store = Arc::new(MemoStore::new());
    let pipeline = pipeline_for(format!("http://{}/garbled", addr), Arc::clone(&store));

    let err = pipeline.ingest(&artifact(), &[]).await.unwrap_err();
    assert!(matches!(err, IngestError::MalformedResponse(_)));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn unreachable_service_maps_to_upload_error() {
    let store = Arc::new(MemoStore::new());
    // Port 1 is never listening.
    let pipeline = pipeline_for("http://127.0.0.1:1/ok".to_string(), Arc::clone(&store));

    let err = pipeline.ingest(&artifact(), &[]).await.unwrap_err();
    assert!(matches!(err, IngestError::Upload(_)));
    assert!(store.is_empty().await);
}
