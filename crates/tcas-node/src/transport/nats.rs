//! NATS transport.
//!
//! Topic `tcas/<id>` maps to subject `tcas.<id>`; a channel subscription
//! becomes the wildcard `tcas.>`. The mapping is one way: a channel root
//! may itself contain dots, so inbound frames carry the raw subject.

use super::{Inbound, Transport};
use crate::error::TransportError;
use async_nats::{Client, Subscriber};
use async_trait::async_trait;
use futures_util::stream::StreamExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

pub fn topic_to_subject(topic: &str) -> String {
    topic.trim_matches('/').replace('/', ".")
}

fn inbound_from(subject: &str, payload: &[u8]) -> Inbound {
    Inbound {
        topic: subject.to_string(),
        payload: payload.to_vec(),
    }
}

pub struct NatsTransport {
    client: Client,
    forwarders: Mutex<Vec<JoinHandle<()>>>,
}

impl NatsTransport {
    /// Connect to the server at `url`. `name` is reported to the server.
    pub async fn connect(url: &str, name: &str) -> Result<Self, TransportError> {
        let client = async_nats::ConnectOptions::new()
            .name(name)
            .connect(url)
            .await
            .map_err(|e| TransportError::Connect {
                url: url.to_string(),
                source: Box::new(e),
            })?;
        tracing::info!("Connected to NATS at {}", url);

        Ok(Self {
            client,
            forwarders: Mutex::new(Vec::new()),
        })
    }
}

async fn forward(mut subscriber: Subscriber, sink: mpsc::Sender<Inbound>) {
    while let Some(msg) = subscriber.next().await {
        let frame = inbound_from(msg.subject.as_str(), &msg.payload);
        if sink.send(frame).await.is_err() {
            break;
        }
    }
    tracing::debug!("NATS subscription closed");
}

#[async_trait]
impl Transport for NatsTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.client
            .publish(topic_to_subject(topic), payload.into())
            .await
            .map_err(|e| TransportError::Publish {
                topic: topic.to_string(),
                source: Box::new(e),
            })
    }

    async fn subscribe(
        &self,
        channel: &str,
        sink: mpsc::Sender<Inbound>,
    ) -> Result<(), TransportError> {
        let subject = format!("{}.>", topic_to_subject(channel));
        let subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .map_err(|e| TransportError::Subscribe {
                topic: channel.to_string(),
                source: Box::new(e),
            })?;
        tracing::info!("Subscribed to {}", subject);

        let handle = tokio::spawn(forward(subscriber, sink));
        self.forwarders.lock().await.push(handle);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        for handle in self.forwarders.lock().await.drain(..) {
            handle.abort();
        }
        self.client
            .flush()
            .await
            .map_err(|e| TransportError::Disconnect(Box::new(e)))?;
        tracing::info!("Disconnected from NATS");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_mapping() {
        assert_eq!(topic_to_subject("tcas/AAA"), "tcas.AAA");
        assert_eq!(topic_to_subject("/a/b/c/"), "a.b.c");
    }

    #[test]
    fn test_dotted_channel_root_keeps_subject() {
        let subject = topic_to_subject("cedricpump.de/thluebeck/tcas/AAA");
        assert_eq!(subject, "cedricpump.de.thluebeck.tcas.AAA");
        let frame = inbound_from(&subject, b"{}");
        assert_eq!(frame.topic, "cedricpump.de.thluebeck.tcas.AAA");
        assert_eq!(frame.payload, b"{}".to_vec());
    }
}
