//! NATS carrier for the host bridge protocol
//!
//! Commands are published as JSON on the command subject; confirmation events
//! arrive on the event subject, are validated against the closed schema, and
//! are forwarded in arrival order over a plain channel. Malformed or unknown
//! messages are logged and skipped. Both pump tasks are owned by the bridge
//! and aborted on drop, so the subscription never outlives its controller.

use anyhow::{Context, Result};
use futures::stream::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::messages::{HostCommand, HostEvent};

/// Channel capacity for bridge command/event pumps
const BRIDGE_CHANNEL_CAPACITY: usize = 64;

pub struct NatsBridge {
    outbound_task: JoinHandle<()>,
    inbound_task: JoinHandle<()>,
}

impl NatsBridge {
    /// Connect to NATS and wire both directions of the bridge
    ///
    /// Returns the bridge handle plus the command sender and event receiver
    /// the bridged transport speaks through.
    pub async fn connect(
        url: &str,
        command_subject: &str,
        event_subject: &str,
    ) -> Result<(Self, mpsc::Sender<HostCommand>, mpsc::Receiver<HostEvent>)> {
        info!("Connecting to host bridge at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        let mut subscriber = client
            .subscribe(event_subject.to_string())
            .await
            .context("Failed to subscribe to host events")?;

        info!(
            "Host bridge connected (commands: {}, events: {})",
            command_subject, event_subject
        );

        let (command_tx, mut command_rx) = mpsc::channel::<HostCommand>(BRIDGE_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel::<HostEvent>(BRIDGE_CHANNEL_CAPACITY);

        let subject = command_subject.to_string();
        let outbound_task = tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                let payload = match serde_json::to_vec(&command) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("Failed to encode host command: {}", e);
                        continue;
                    }
                };
                if let Err(e) = client.publish(subject.clone(), payload.into()).await {
                    warn!("Failed to publish host command: {}", e);
                }
            }
        });

        let inbound_task = tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                match serde_json::from_slice::<HostEvent>(&msg.payload) {
                    Ok(event) => {
                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        // Bridge protocol error: drop the message, keep going.
                        warn!("Ignoring malformed host event: {}", e);
                    }
                }
            }
        });

        Ok((
            Self {
                outbound_task,
                inbound_task,
            },
            command_tx,
            event_rx,
        ))
    }
}

impl Drop for NatsBridge {
    fn drop(&mut self) {
        self.outbound_task.abort();
        self.inbound_task.abort();
    }
}
