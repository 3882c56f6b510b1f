use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub capture: CaptureSettings,
    pub transcription: TranscriptionConfig,
    pub bridge: BridgeConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct CaptureSettings {
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptionConfig {
    /// Transcription service endpoint (multipart POST)
    pub url: String,
}

/// Host bridge settings; when enabled, capture is delegated to the hosting
/// application over NATS instead of the local microphone
#[derive(Debug, Deserialize)]
pub struct BridgeConfig {
    pub enabled: bool,
    pub nats_url: String,
    pub command_subject: String,
    pub event_subject: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
