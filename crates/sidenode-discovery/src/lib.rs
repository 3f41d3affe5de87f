// DID DISCOVERY
// Request handlers asking the network to discover a DID
pub mod noop_discovery;
pub mod local_discovery;

use async_trait::async_trait;
use thiserror::Error;

pub use noop_discovery::NoopDiscovery;
pub use local_discovery::{ChannelPublisher, LocalDiscovery};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Invalid DID: {0}")]
    InvalidDid(String),

    #[error("DID publisher closed")]
    PublisherClosed,

    #[error("Failed to publish DID: {0}")]
    PublishFailed(String),
}

/// Triggers discovery of a DID that could not be resolved locally
#[async_trait]
pub trait RequestDiscovery: Send + Sync {
    async fn request_discovery(&self, did: &str) -> Result<(), DiscoveryError>;
}

/// Publishes a DID so that peers can announce or fetch it
#[async_trait]
pub trait DidPublisher: Send + Sync {
    async fn publish_did(&self, did: &str) -> Result<(), DiscoveryError>;
}
