//! Host bridge: message schema and NATS carrier

pub mod messages;
pub mod nats;

pub use messages::{HostCommand, HostEvent, StopRecordPayload, PROTOCOL_VERSION};
pub use nats::NatsBridge;
