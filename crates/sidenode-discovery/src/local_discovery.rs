// LOCAL DISCOVERY
// Forwards discovery requests straight to an in-process DID publisher

use crate::{DidPublisher, DiscoveryError, RequestDiscovery};
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Discovery handler that publishes the requested DID locally
#[derive(Debug)]
pub struct LocalDiscovery<P> {
    publisher: Arc<P>,
}

impl<P: DidPublisher> LocalDiscovery<P> {
    pub fn new(publisher: Arc<P>) -> Self {
        LocalDiscovery { publisher }
    }
}

#[async_trait]
impl<P: DidPublisher> RequestDiscovery for LocalDiscovery<P> {
    async fn request_discovery(&self, did: &str) -> Result<(), DiscoveryError> {
        if !did.starts_with("did:") || did.len() == "did:".len() {
            return Err(DiscoveryError::InvalidDid(did.to_string()));
        }

        debug!("Requesting local discovery for {}", did);
        self.publisher.publish_did(did).await
    }
}

/// Publisher that hands DIDs to a consumer task over a channel
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: mpsc::Sender<String>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiving end of its channel
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (ChannelPublisher { sender }, receiver)
    }
}

#[async_trait]
impl DidPublisher for ChannelPublisher {
    async fn publish_did(&self, did: &str) -> Result<(), DiscoveryError> {
        self.sender.send(did.to_string()).await.map_err(|_| {
            warn!("Dropping DID {}: publisher channel closed", did);
            DiscoveryError::PublisherClosed
        })
    }
}
