//! Microphone acquisition for local capture
//!
//! The capture hardware sits behind the `AudioDevice` / `AudioStream` pair so
//! the local transport can be exercised in tests without a sound card. The
//! production implementation runs cpal on a dedicated thread (cpal streams are
//! not `Send`) and forwards PCM frames over an async channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use super::transport::{CaptureConfig, CaptureError};

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// An exclusively-owned live capture stream
///
/// Frames flow until `release` is called; release must be idempotent-safe to
/// reach exactly once per acquisition and must free the underlying hardware.
#[async_trait::async_trait]
pub trait AudioStream: Send {
    /// Receive the next frame; `None` once the stream has ended
    async fn next_frame(&mut self) -> Option<AudioFrame>;

    /// Sample rate the stream actually runs at
    fn sample_rate(&self) -> u32;

    /// Channel count the stream actually runs at
    fn channels(&self) -> u16;

    /// Release the hardware stream
    async fn release(&mut self);
}

/// Factory for capture streams; one `open` per session
#[async_trait::async_trait]
pub trait AudioDevice: Send + Sync {
    async fn open(&self, config: &CaptureConfig) -> Result<Box<dyn AudioStream>, CaptureError>;
}

/// Default-input-device microphone backed by cpal
pub struct CpalDevice;

#[async_trait::async_trait]
impl AudioDevice for CpalDevice {
    async fn open(&self, config: &CaptureConfig) -> Result<Box<dyn AudioStream>, CaptureError> {
        let stream = CpalStream::open(config.clone()).await?;
        Ok(Box::new(stream))
    }
}

struct CpalStream {
    frames: mpsc::Receiver<AudioFrame>,
    sample_rate: u32,
    channels: u16,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CpalStream {
    async fn open(config: CaptureConfig) -> Result<Self, CaptureError> {
        let running = Arc::new(AtomicBool::new(true));
        let (frame_tx, frame_rx) = mpsc::channel(600);
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread_running = Arc::clone(&running);
        let thread = std::thread::spawn(move || {
            run_capture_thread(config, thread_running, frame_tx, ready_tx);
        });

        // The thread reports the negotiated format once the stream is live,
        // or the acquisition error. Either way nothing is half-acquired: the
        // thread exits on failure before any stream exists.
        let (sample_rate, channels) = match ready_rx.await {
            Ok(Ok(spec)) => spec,
            Ok(Err(e)) => {
                running.store(false, Ordering::SeqCst);
                return Err(e);
            }
            Err(_) => {
                running.store(false, Ordering::SeqCst);
                return Err(CaptureError::DeviceUnavailable(
                    "capture thread exited before reporting".into(),
                ));
            }
        };

        info!("Microphone acquired: {} Hz, {} ch", sample_rate, channels);

        Ok(Self {
            frames: frame_rx,
            sample_rate,
            channels,
            running,
            thread: Some(thread),
        })
    }
}

#[async_trait::async_trait]
impl AudioStream for CpalStream {
    async fn next_frame(&mut self) -> Option<AudioFrame> {
        self.frames.recv().await
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    async fn release(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            // Join off the async runtime; the thread wakes within one poll tick
            let _ = tokio::task::spawn_blocking(move || {
                if handle.join().is_err() {
                    error!("Capture thread panicked");
                }
            })
            .await;
        }
        info!("Microphone released");
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        // Abnormal teardown still stops the hardware; the thread owns the
        // cpal stream and drops it on exit.
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Blocking body of the capture thread; owns the cpal stream for its lifetime
fn run_capture_thread(
    config: CaptureConfig,
    running: Arc<AtomicBool>,
    frame_tx: mpsc::Sender<AudioFrame>,
    ready_tx: oneshot::Sender<Result<(u32, u16), CaptureError>>,
) {
    let built = build_input_stream(&config, frame_tx);

    let (stream, spec) = match built {
        Ok(ok) => ok,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(CaptureError::DeviceUnavailable(e.to_string())));
        return;
    }

    let _ = ready_tx.send(Ok(spec));

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(std::time::Duration::from_millis(50));
    }

    // Dropping the stream here releases the device exactly once.
    drop(stream);
}

fn build_input_stream(
    config: &CaptureConfig,
    frame_tx: mpsc::Sender<AudioFrame>,
) -> Result<(cpal::Stream, (u32, u16)), CaptureError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(CaptureError::NoInputDevice)?;

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    info!("Using audio input device: {}", device_name);

    let supported = device
        .default_input_config()
        .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

    if supported.sample_rate().0 != config.sample_rate {
        warn!(
            "{} Hz not negotiated, capturing at {} Hz",
            config.sample_rate,
            supported.sample_rate().0
        );
    }

    let sample_format = supported.sample_format();
    let stream_config: cpal::StreamConfig = supported.into();
    let sample_rate = stream_config.sample_rate.0;
    let channels = stream_config.channels;

    let err_fn = |e: cpal::StreamError| error!("Audio input stream error: {}", e);

    let mut samples_sent: u64 = 0;
    let per_ms = (sample_rate as u64 * channels as u64).max(1);

    let stream = match sample_format {
        cpal::SampleFormat::I16 => device
            .build_input_stream(
                &stream_config,
                move |data: &[i16], _| {
                    let timestamp_ms = samples_sent * 1000 / per_ms;
                    samples_sent += data.len() as u64;
                    // try_send keeps the audio callback realtime-safe; a full
                    // channel drops the frame rather than blocking.
                    let _ = frame_tx.try_send(AudioFrame {
                        samples: data.to_vec(),
                        sample_rate,
                        channels,
                        timestamp_ms,
                    });
                },
                err_fn,
                None,
            )
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?,
        cpal::SampleFormat::F32 => device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _| {
                    let timestamp_ms = samples_sent * 1000 / per_ms;
                    samples_sent += data.len() as u64;
                    let samples: Vec<i16> = data
                        .iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                        .collect();
                    let _ = frame_tx.try_send(AudioFrame {
                        samples,
                        sample_rate,
                        channels,
                        timestamp_ms,
                    });
                },
                err_fn,
                None,
            )
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?,
        other => {
            return Err(CaptureError::DeviceUnavailable(format!(
                "unsupported sample format: {:?}",
                other
            )))
        }
    };

    Ok((stream, (sample_rate, channels)))
}
