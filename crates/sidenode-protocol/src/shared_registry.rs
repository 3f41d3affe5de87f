// SHARED REGISTRY
// Copy-on-publish handle for deployments that register namespaces at runtime
//
// SAFETY INVARIANTS:
// 1. A published registry snapshot is never mutated in place
// 2. Readers hold an Arc to a complete snapshot; writers swap whole snapshots
// 3. Concurrent registrations serialize on the write lock, none is lost

use crate::namespace_registry::{NamespaceRegistry, RegistryError};
use crate::version_set::VersionSet;
use log::info;
use parking_lot::RwLock;
use std::sync::Arc;

/// Thread-safe handle to the current registry snapshot
#[derive(Debug, Default)]
pub struct SharedRegistry {
    current: RwLock<Arc<NamespaceRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: NamespaceRegistry) -> Self {
        SharedRegistry {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    /// The registry as currently published
    pub fn snapshot(&self) -> Arc<NamespaceRegistry> {
        Arc::clone(&self.current.read())
    }

    /// Replace the whole registry
    pub fn publish(&self, registry: NamespaceRegistry) {
        let namespaces = registry.len();
        *self.current.write() = Arc::new(registry);
        info!("Published registry snapshot with {} namespace(s)", namespaces);
    }

    /// Register a namespace by publishing a new snapshot that includes it
    pub fn register(&self, namespace: impl Into<String>, version_set: impl Into<Arc<VersionSet>>) {
        let mut current = self.current.write();
        let mut next = NamespaceRegistry::clone(&current);
        next.add(namespace, version_set);
        *current = Arc::new(next);
    }

    /// Shorthand for `snapshot().for_namespace(namespace)`
    pub fn for_namespace(&self, namespace: &str) -> Result<Arc<VersionSet>, RegistryError> {
        self.current.read().for_namespace(namespace)
    }
}
