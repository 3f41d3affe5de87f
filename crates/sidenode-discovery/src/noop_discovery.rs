use crate::{DiscoveryError, RequestDiscovery};
use async_trait::async_trait;
use log::debug;

/// Discovery handler for nodes with discovery disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiscovery;

impl NoopDiscovery {
    pub fn new() -> Self {
        NoopDiscovery
    }
}

#[async_trait]
impl RequestDiscovery for NoopDiscovery {
    async fn request_discovery(&self, did: &str) -> Result<(), DiscoveryError> {
        debug!("Discovery disabled, ignoring request for {}", did);
        Ok(())
    }
}
