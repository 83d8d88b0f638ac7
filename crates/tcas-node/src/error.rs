//! Node and transport errors.

use tcas_core::OwnshipError;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to subscribe to {topic}: {source}")]
    Subscribe {
        topic: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to publish on {topic}: {source}")]
    Publish {
        topic: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to disconnect: {0}")]
    Disconnect(#[source] BoxError),
}

#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Ownship(#[from] OwnshipError),
}
