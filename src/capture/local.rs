//! Local capture transport
//!
//! Owns an exclusive microphone stream for the duration of one session,
//! buffers PCM frames, and on stop assembles the buffer into a single WAV
//! artifact. The stream is released exactly once, whichever way the capture
//! task exits.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::mic::{AudioDevice, AudioStream};
use super::transport::{
    event_channel, Artifact, CaptureConfig, CaptureError, CaptureEvent, CaptureTransport,
};

pub struct LocalTransport {
    device: Arc<dyn AudioDevice>,
    config: CaptureConfig,
    events: mpsc::Sender<CaptureEvent>,
    active: Mutex<Option<ActiveCapture>>,
}

struct ActiveCapture {
    paused: Arc<AtomicBool>,
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl LocalTransport {
    /// Create the transport and hand out its event stream
    pub fn new(
        device: Arc<dyn AudioDevice>,
        config: CaptureConfig,
    ) -> (Self, mpsc::Receiver<CaptureEvent>) {
        let (events, events_rx) = event_channel();
        (
            Self {
                device,
                config,
                events,
                active: Mutex::new(None),
            },
            events_rx,
        )
    }
}

#[async_trait::async_trait]
impl CaptureTransport for LocalTransport {
    async fn start(&self) -> Result<(), CaptureError> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(CaptureError::AlreadyCapturing);
        }

        // Acquire the hardware stream first; on failure nothing is held.
        let stream = self.device.open(&self.config).await?;

        // Confirm before the buffering task runs so no chunk can precede it.
        self.events
            .send(CaptureEvent::Started)
            .await
            .map_err(|_| CaptureError::ChannelClosed)?;

        let paused = Arc::new(AtomicBool::new(false));
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(capture_task(
            stream,
            Arc::clone(&paused),
            stop_rx,
            self.events.clone(),
        ));

        *active = Some(ActiveCapture {
            paused,
            stop_tx,
            task,
        });

        info!("Local capture started");
        Ok(())
    }

    async fn pause(&self) -> Result<(), CaptureError> {
        let active = self.active.lock().await;
        let Some(capture) = active.as_ref() else {
            return Err(CaptureError::NotCapturing);
        };
        capture.paused.store(true, Ordering::SeqCst);
        self.events
            .send(CaptureEvent::Paused)
            .await
            .map_err(|_| CaptureError::ChannelClosed)
    }

    async fn resume(&self) -> Result<(), CaptureError> {
        let active = self.active.lock().await;
        let Some(capture) = active.as_ref() else {
            return Err(CaptureError::NotCapturing);
        };
        capture.paused.store(false, Ordering::SeqCst);
        self.events
            .send(CaptureEvent::Resumed)
            .await
            .map_err(|_| CaptureError::ChannelClosed)
    }

    async fn stop(&self) -> Result<(), CaptureError> {
        let capture = {
            let mut active = self.active.lock().await;
            active.take().ok_or(CaptureError::NotCapturing)?
        };

        // Signal the capture task; it releases the stream, assembles the
        // artifact, and emits `Stopped`.
        let _ = capture.stop_tx.send(());
        if let Err(e) = capture.task.await {
            error!("Capture task panicked: {}", e);
            return Err(CaptureError::ChannelClosed);
        }
        Ok(())
    }

    async fn capture_photo(&self) -> Result<(), CaptureError> {
        // No camera on the local transport.
        Ok(())
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Buffers frames until stopped, then finalizes
///
/// Frames arriving while paused are discarded, so a stop from `Paused`
/// finalizes with exactly the samples buffered before the pause.
async fn capture_task(
    mut stream: Box<dyn AudioStream>,
    paused: Arc<AtomicBool>,
    mut stop_rx: oneshot::Receiver<()>,
    events: mpsc::Sender<CaptureEvent>,
) {
    let sample_rate = stream.sample_rate();
    let channels = stream.channels();
    let mut samples: Vec<i16> = Vec::new();

    loop {
        tokio::select! {
            // Stop signal, or the transport itself was dropped
            _ = &mut stop_rx => break,
            frame = stream.next_frame() => match frame {
                Some(frame) => {
                    if paused.load(Ordering::SeqCst) {
                        continue;
                    }
                    let count = frame.samples.len();
                    samples.extend_from_slice(&frame.samples);
                    let _ = events.send(CaptureEvent::Chunk(count)).await;
                }
                None => {
                    warn!("Audio stream ended before stop; finalizing early");
                    break;
                }
            }
        }
    }

    // Every exit path reaches here exactly once.
    stream.release().await;

    match encode_wav(&samples, sample_rate, channels) {
        Ok(bytes) => {
            samples.clear();
            info!("Local artifact assembled ({} bytes)", bytes.len());
            let _ = events
                .send(CaptureEvent::Stopped(Artifact {
                    bytes,
                    mime_type: "audio/wav".to_string(),
                    ext: "wav".to_string(),
                }))
                .await;
        }
        Err(e) => error!("Failed to assemble artifact: {}", e),
    }
}

fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Vec<u8>, CaptureError> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| CaptureError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
