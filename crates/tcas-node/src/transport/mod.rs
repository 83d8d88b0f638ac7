//! Pub/sub transports.
//!
//! Topics are `/`-separated (`<channel>/<sender>`). A subscription covers
//! every topic below a channel root and forwards raw frames into a bounded
//! channel owned by the node.

pub mod memory;
pub mod nats;

use crate::error::TransportError;
use async_trait::async_trait;
use tokio::sync::mpsc;

pub use memory::{MemoryBus, MemoryEndpoint};
pub use nats::NatsTransport;

/// Raw frame as received from the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    pub topic: String,
    pub payload: Vec<u8>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Fire-and-forget publish.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Forward every frame published below `channel` into `sink`.
    async fn subscribe(
        &self,
        channel: &str,
        sink: mpsc::Sender<Inbound>,
    ) -> Result<(), TransportError>;

    /// Stop forwarding and release the connection.
    async fn disconnect(&self) -> Result<(), TransportError>;
}

/// `tcas/` prefix for a channel root, tolerating a trailing slash.
pub(crate) fn channel_prefix(channel: &str) -> String {
    format!("{}/", channel.trim_end_matches('/'))
}
