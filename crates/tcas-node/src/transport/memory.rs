//! In-process bus for tests and local encounters.

use super::{channel_prefix, Inbound, Transport};
use crate::error::TransportError;
use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;

const DEFAULT_CAPACITY: usize = 1024;

/// Shared pub/sub medium. Every handle sees every frame, including its own.
#[derive(Clone)]
pub struct MemoryBus {
    tx: broadcast::Sender<Inbound>,
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MemoryBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// New endpoint on this bus, one per node.
    pub fn endpoint(&self) -> MemoryEndpoint {
        MemoryEndpoint {
            tx: self.tx.clone(),
            forwarders: Mutex::new(Vec::new()),
        }
    }
}

pub struct MemoryEndpoint {
    tx: broadcast::Sender<Inbound>,
    forwarders: Mutex<Vec<JoinHandle<()>>>,
}

async fn forward(
    mut rx: broadcast::Receiver<Inbound>,
    prefix: String,
    sink: mpsc::Sender<Inbound>,
) {
    loop {
        match rx.recv().await {
            Ok(frame) => {
                if !frame.topic.starts_with(&prefix) {
                    continue;
                }
                if sink.send(frame).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Memory bus subscriber lagged, {} frames lost", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[async_trait]
impl Transport for MemoryEndpoint {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        // No subscribers is not an error on a broadcast medium.
        let _ = self.tx.send(Inbound {
            topic: topic.to_string(),
            payload,
        });
        Ok(())
    }

    async fn subscribe(
        &self,
        channel: &str,
        sink: mpsc::Sender<Inbound>,
    ) -> Result<(), TransportError> {
        let rx = self.tx.subscribe();
        let handle = tokio::spawn(forward(rx, channel_prefix(channel), sink));
        self.forwarders.lock().await.push(handle);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        for handle in self.forwarders.lock().await.drain(..) {
            handle.abort();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prefix_subscribe_and_loopback() {
        let bus = MemoryBus::default();
        let endpoint = bus.endpoint();
        let (tx, mut rx) = mpsc::channel(8);
        endpoint.subscribe("tcas", tx).await.unwrap();

        endpoint.publish("other/AAA", b"x".to_vec()).await.unwrap();
        endpoint.publish("tcas/AAA", b"y".to_vec()).await.unwrap();

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.topic, "tcas/AAA");
        assert_eq!(frame.payload, b"y".to_vec());
    }

    #[tokio::test]
    async fn test_frames_cross_endpoints() {
        let bus = MemoryBus::default();
        let (a, b) = (bus.endpoint(), bus.endpoint());
        let (tx, mut rx) = mpsc::channel(8);
        b.subscribe("tcas", tx).await.unwrap();

        a.publish("tcas/AAA", b"hello".to_vec()).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().payload, b"hello".to_vec());
    }

    #[tokio::test]
    async fn test_disconnect_stops_forwarding() {
        let bus = MemoryBus::default();
        let endpoint = bus.endpoint();
        let (tx, mut rx) = mpsc::channel(8);
        endpoint.subscribe("tcas", tx).await.unwrap();
        endpoint.disconnect().await.unwrap();

        endpoint.publish("tcas/AAA", b"late".to_vec()).await.unwrap();
        assert!(rx.recv().await.is_none());
    }
}
