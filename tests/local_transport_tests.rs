// Integration tests for the local capture transport.
//
// A channel-fed audio device stands in for the microphone so the tests can
// verify buffering across a pause, WAV artifact assembly, and that the
// hardware stream is released exactly once on every path.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use voicememo::capture::{
    AudioDevice, AudioFrame, AudioStream, CaptureConfig, CaptureError, CaptureEvent,
    CaptureTransport, LocalTransport,
};

struct TestStream {
    frames: mpsc::Receiver<AudioFrame>,
    released: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl AudioStream for TestStream {
    async fn next_frame(&mut self) -> Option<AudioFrame> {
        self.frames.recv().await
    }

    fn sample_rate(&self) -> u32 {
        16000
    }

    fn channels(&self) -> u16 {
        1
    }

    async fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

struct TestDevice {
    stream: Mutex<Option<mpsc::Receiver<AudioFrame>>>,
    released: Arc<AtomicUsize>,
}

impl TestDevice {
    fn new() -> (Arc<Self>, mpsc::Sender<AudioFrame>, Arc<AtomicUsize>) {
        let (tx, rx) = mpsc::channel(64);
        let released = Arc::new(AtomicUsize::new(0));
        (
            Arc::new(Self {
                stream: Mutex::new(Some(rx)),
                released: Arc::clone(&released),
            }),
            tx,
            released,
        )
    }
}

#[async_trait::async_trait]
impl AudioDevice for TestDevice {
    async fn open(&self, _config: &CaptureConfig) -> Result<Box<dyn AudioStream>, CaptureError> {
        let rx = self
            .stream
            .lock()
            .unwrap()
            .take()
            .ok_or(CaptureError::DeviceUnavailable("stream taken".into()))?;
        Ok(Box::new(TestStream {
            frames: rx,
            released: Arc::clone(&self.released),
        }))
    }
}

fn frame(samples: Vec<i16>) -> AudioFrame {
    AudioFrame {
        samples,
        sample_rate: 16000,
        channels: 1,
        timestamp_ms: 0,
    }
}

async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

async fn expect_event(events: &mut mpsc::Receiver<CaptureEvent>) -> CaptureEvent {
    tokio::time::timeout(std::time::Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for capture event")
        .expect("event channel closed")
}

fn wav_samples(bytes: &[u8]) -> Vec<i16> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).expect("artifact is valid WAV");
    reader.into_samples::<i16>().map(|s| s.unwrap()).collect()
}

#[tokio::test]
async fn assembles_wav_artifact_from_buffered_frames() {
    let (device, frames_tx, released) = TestDevice::new();
    let (transport, mut events) = LocalTransport::new(device, CaptureConfig::default());

    transport.start().await.unwrap();
    assert!(matches!(expect_event(&mut events).await, CaptureEvent::Started));

    frames_tx.send(frame(vec![1, 2, 3, 4])).await.unwrap();
    assert!(matches!(
        expect_event(&mut events).await,
        CaptureEvent::Chunk(4)
    ));
    frames_tx.send(frame(vec![5, 6])).await.unwrap();
    assert!(matches!(
        expect_event(&mut events).await,
        CaptureEvent::Chunk(2)
    ));

    transport.stop().await.unwrap();
    let CaptureEvent::Stopped(artifact) = expect_event(&mut events).await else {
        panic!("expected stopped event");
    };

    assert_eq!(artifact.mime_type, "audio/wav");
    assert_eq!(artifact.ext, "wav");
    assert_eq!(artifact.upload_filename(), "recording.wav");
    assert_eq!(wav_samples(&artifact.bytes), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stop_from_paused_keeps_all_pre_pause_samples() {
    let (device, frames_tx, released) = TestDevice::new();
    let (transport, mut events) = LocalTransport::new(device, CaptureConfig::default());

    transport.start().await.unwrap();
    assert!(matches!(expect_event(&mut events).await, CaptureEvent::Started));

    frames_tx.send(frame(vec![10, 20, 30])).await.unwrap();
    assert!(matches!(
        expect_event(&mut events).await,
        CaptureEvent::Chunk(3)
    ));

    transport.pause().await.unwrap();
    assert!(matches!(expect_event(&mut events).await, CaptureEvent::Paused));

    // Frames arriving during the pause are not part of the session.
    frames_tx.send(frame(vec![99, 99])).await.unwrap();
    settle().await;

    transport.stop().await.unwrap();
    let CaptureEvent::Stopped(artifact) = expect_event(&mut events).await else {
        panic!("expected stopped event");
    };

    assert_eq!(wav_samples(&artifact.bytes), vec![10, 20, 30]);
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn pause_resume_gates_buffering() {
    let (device, frames_tx, _released) = TestDevice::new();
    let (transport, mut events) = LocalTransport::new(device, CaptureConfig::default());

    transport.start().await.unwrap();
    assert!(matches!(expect_event(&mut events).await, CaptureEvent::Started));

    frames_tx.send(frame(vec![1])).await.unwrap();
    assert!(matches!(
        expect_event(&mut events).await,
        CaptureEvent::Chunk(1)
    ));

    transport.pause().await.unwrap();
    assert!(matches!(expect_event(&mut events).await, CaptureEvent::Paused));
    frames_tx.send(frame(vec![2])).await.unwrap();
    settle().await;

    transport.resume().await.unwrap();
    assert!(matches!(
        expect_event(&mut events).await,
        CaptureEvent::Resumed
    ));
    frames_tx.send(frame(vec![3])).await.unwrap();
    assert!(matches!(
        expect_event(&mut events).await,
        CaptureEvent::Chunk(1)
    ));

    transport.stop().await.unwrap();
    let CaptureEvent::Stopped(artifact) = expect_event(&mut events).await else {
        panic!("expected stopped event");
    };
    assert_eq!(wav_samples(&artifact.bytes), vec![1, 3]);
}

#[tokio::test]
async fn double_start_is_rejected_without_touching_the_device() {
    let (device, _frames_tx, _released) = TestDevice::new();
    let (transport, mut events) = LocalTransport::new(device, CaptureConfig::default());

    transport.start().await.unwrap();
    assert!(matches!(expect_event(&mut events).await, CaptureEvent::Started));

    assert!(matches!(
        transport.start().await,
        Err(CaptureError::AlreadyCapturing)
    ));
}

#[tokio::test]
async fn commands_without_capture_are_rejected() {
    let (device, _frames_tx, _released) = TestDevice::new();
    let (transport, _events) = LocalTransport::new(device, CaptureConfig::default());

    assert!(matches!(
        transport.pause().await,
        Err(CaptureError::NotCapturing)
    ));
    assert!(matches!(
        transport.resume().await,
        Err(CaptureError::NotCapturing)
    ));
    assert!(matches!(
        transport.stop().await,
        Err(CaptureError::NotCapturing)
    ));
    // Photo capture is a no-op locally, never an error.
    assert!(transport.capture_photo().await.is_ok());
}

#[tokio::test]
async fn failed_acquisition_surfaces_and_holds_nothing() {
    let (device, _frames_tx, released) = TestDevice::new();
    // First open consumes the stream; build a transport whose open must fail.
    let _ = device.open(&CaptureConfig::default()).await.unwrap();

    let (transport, _events) = LocalTransport::new(device, CaptureConfig::default());
    assert!(matches!(
        transport.start().await,
        Err(CaptureError::DeviceUnavailable(_))
    ));
    // Nothing was acquired, so nothing is released on drop.
    drop(transport);
    assert_eq!(released.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dropping_an_active_transport_still_releases_the_stream() {
    let (device, frames_tx, released) = TestDevice::new();
    let (transport, mut events) = LocalTransport::new(device, CaptureConfig::default());

    transport.start().await.unwrap();
    assert!(matches!(expect_event(&mut events).await, CaptureEvent::Started));
    frames_tx.send(frame(vec![7])).await.unwrap();
    assert!(matches!(
        expect_event(&mut events).await,
        CaptureEvent::Chunk(1)
    ));

    drop(transport);

    // The capture task finalizes on its own; the stream is released once.
    for _ in 0..1000 {
        if released.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(released.load(Ordering::SeqCst), 1);
}
