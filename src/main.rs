use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use voicememo::capture::{BridgedTransport, CaptureConfig, CaptureEvent, CaptureTransport, CpalDevice, LocalTransport};
use voicememo::host::NatsBridge;
use voicememo::ingest::{IngestionPipeline, TranscriptionClient};
use voicememo::session::SessionController;
use voicememo::store::MemoStore;
use voicememo::{create_router, AppState, Config};

#[derive(Debug, Parser)]
#[command(name = "voicememo", about = "Voice memo capture and transcription service")]
struct Cli {
    /// Configuration file (without extension)
    #[arg(long, default_value = "config/voicememo")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let capture_config = CaptureConfig {
        sample_rate: cfg.capture.sample_rate,
        channels: cfg.capture.channels,
    };

    // Transport selection happens exactly once, here. Everything downstream
    // sees only the shared event contract. The bridge handle must outlive the
    // server so its pump tasks keep running.
    let mut bridge = None;
    let (transport, events): (Box<dyn CaptureTransport>, mpsc::Receiver<CaptureEvent>) =
        if cfg.bridge.enabled {
            let (conn, commands, inbound) = NatsBridge::connect(
                &cfg.bridge.nats_url,
                &cfg.bridge.command_subject,
                &cfg.bridge.event_subject,
            )
            .await
            .context("Failed to connect host bridge")?;
            bridge = Some(conn);

            let (t, e) = BridgedTransport::new(commands, inbound);
            info!("Capture transport: bridged (host application)");
            (Box::new(t), e)
        } else {
            let (t, e) = LocalTransport::new(Arc::new(CpalDevice), capture_config);
            info!("Capture transport: local (microphone)");
            (Box::new(t), e)
        };

    let store = Arc::new(MemoStore::new());
    let transcriber = Arc::new(TranscriptionClient::new(cfg.transcription.url.clone()));
    let pipeline = IngestionPipeline::new(transcriber, Arc::clone(&store));
    let controller = SessionController::new(transport, events, pipeline);

    let app = create_router(AppState::new(controller, store));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP control surface listening on {}", addr);
    axum::serve(listener, app)
        .await
        .context("HTTP server error")?;

    drop(bridge);
    Ok(())
}
