// NAMESPACE REGISTRY
// Maps DID namespaces to the protocol version sets that govern them
//
// SAFETY INVARIANTS:
// 1. Each namespace maps to exactly one version set (last registration wins)
// 2. Registration requires exclusive access; lookups only need shared access
// 3. Unknown namespaces are reported, never resolved to a default version set

use crate::version_set::{VersionSet, VersionSetError};
use log::{info, log_enabled, warn, Level};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("client version(s) not defined for namespace: {0}")]
    NamespaceNotRegistered(String),

    #[error(transparent)]
    VersionSet(#[from] VersionSetError),
}

/// Directory of version sets keyed by namespace (e.g. "did:orb")
#[derive(Debug, Clone, Default)]
pub struct NamespaceRegistry {
    version_sets: HashMap<String, Arc<VersionSet>>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the version set for a namespace, replacing any previous one
    pub fn add(&mut self, namespace: impl Into<String>, version_set: impl Into<Arc<VersionSet>>) {
        let namespace = namespace.into();
        let version_set = version_set.into();

        if log_enabled!(Level::Info) {
            match version_set.commitment() {
                Ok(commitment) => info!(
                    "Registered {} protocol version(s) for namespace {} (commitment {})",
                    version_set.len(), namespace, commitment
                ),
                Err(e) => warn!(
                    "Registered {} protocol version(s) for namespace {} without commitment: {}",
                    version_set.len(), namespace, e
                ),
            }
        }

        if self.version_sets.insert(namespace.clone(), version_set).is_some() {
            warn!("Replaced existing version set for namespace {}", namespace);
        }
    }

    /// Version set registered for `namespace`
    pub fn for_namespace(&self, namespace: &str) -> Result<Arc<VersionSet>, RegistryError> {
        self.version_sets
            .get(namespace)
            .cloned()
            .ok_or_else(|| RegistryError::NamespaceNotRegistered(namespace.to_string()))
    }

    /// Find the namespace governing a DID and return its version set.
    ///
    /// The longest registered namespace that prefixes `did` on a `:`
    /// boundary wins, so "did:orb:webcas" is preferred over "did:orb".
    pub fn resolve_did(&self, did: &str) -> Result<(&str, Arc<VersionSet>), RegistryError> {
        self.version_sets
            .iter()
            .filter(|(namespace, _)| {
                did.strip_prefix(namespace.as_str())
                    .map_or(false, |rest| rest.starts_with(':'))
            })
            .max_by_key(|(namespace, _)| namespace.len())
            .map(|(namespace, set)| (namespace.as_str(), Arc::clone(set)))
            .ok_or_else(|| RegistryError::NamespaceNotRegistered(did.to_string()))
    }

    /// Registered namespaces in sorted order
    pub fn namespaces(&self) -> Vec<&str> {
        let mut namespaces: Vec<&str> = self.version_sets.keys().map(String::as_str).collect();
        namespaces.sort_unstable();
        namespaces
    }

    pub fn len(&self) -> usize {
        self.version_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.version_sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol_parameters::ProtocolParameters;
    use crate::protocol_version::VersionDescriptor;

    fn single_version_set(max_operation_count: u64) -> VersionSet {
        VersionSet::from_versions(vec![VersionDescriptor::new(
            "1.0",
            0,
            ProtocolParameters::with_max_operation_count(max_operation_count),
        )])
        .unwrap()
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = NamespaceRegistry::new();
        registry.add("did:orb", single_version_set(10));

        let set = registry.for_namespace("did:orb").unwrap();
        assert_eq!(set.current().unwrap().protocol().max_operation_count, 10);
    }

    #[test]
    fn test_registration_without_info_logging() {
        assert!(!log_enabled!(Level::Info));

        let mut registry = NamespaceRegistry::new();
        registry.add("did:orb", single_version_set(10));
        registry.add("did:orb", single_version_set(20));

        let set = registry.for_namespace("did:orb").unwrap();
        assert_eq!(set.current().unwrap().protocol().max_operation_count, 20);
    }

    #[test]
    fn test_unknown_namespace() {
        let registry = NamespaceRegistry::new();

        let err = registry.for_namespace("invalid").unwrap_err();
        assert_eq!(err, RegistryError::NamespaceNotRegistered("invalid".to_string()));
        assert!(err
            .to_string()
            .contains("client version(s) not defined for namespace: invalid"));
    }

    #[test]
    fn test_returns_registered_instance() {
        let mut registry = NamespaceRegistry::new();
        let set = Arc::new(single_version_set(10));
        registry.add("did:orb", Arc::clone(&set));

        assert!(Arc::ptr_eq(&registry.for_namespace("did:orb").unwrap(), &set));
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = NamespaceRegistry::new();
        registry.add("did:orb", single_version_set(10));
        registry.add("did:orb", single_version_set(20));

        assert_eq!(registry.len(), 1);
        let set = registry.for_namespace("did:orb").unwrap();
        assert_eq!(set.current().unwrap().protocol().max_operation_count, 20);
    }

    #[test]
    fn test_resolve_did_prefers_longest_namespace() {
        let mut registry = NamespaceRegistry::new();
        registry.add("did:orb", single_version_set(10));
        registry.add("did:orb:webcas", single_version_set(20));

        let (namespace, set) = registry.resolve_did("did:orb:uAAA:EiDahaOGH").unwrap();
        assert_eq!(namespace, "did:orb");
        assert_eq!(set.current().unwrap().protocol().max_operation_count, 10);

        let (namespace, _) = registry.resolve_did("did:orb:webcas:example.com:EiDahaOGH").unwrap();
        assert_eq!(namespace, "did:orb:webcas");
    }

    #[test]
    fn test_resolve_did_requires_segment_boundary() {
        let mut registry = NamespaceRegistry::new();
        registry.add("did:orb", single_version_set(10));

        assert!(registry.resolve_did("did:orbit:EiDahaOGH").is_err());
        assert!(registry.resolve_did("did:orb").is_err());
    }

    #[test]
    fn test_errors_chain_through_registry() {
        let mut registry = NamespaceRegistry::new();
        registry.add(
            "did:orb",
            VersionSet::from_versions(vec![VersionDescriptor::new("1.0", 100, ProtocolParameters::default())]).unwrap(),
        );

        let lookup = || -> Result<u64, RegistryError> {
            Ok(registry.for_namespace("did:orb")?.at(50)?.genesis_time())
        };
        assert_eq!(
            lookup().unwrap_err(),
            RegistryError::VersionSet(VersionSetError::NoApplicableVersion(50))
        );
    }

    #[test]
    fn test_namespaces_sorted() {
        let mut registry = NamespaceRegistry::new();
        registry.add("did:orb", single_version_set(10));
        registry.add("did:ion", single_version_set(10));

        assert_eq!(registry.namespaces(), vec!["did:ion", "did:orb"]);
        assert!(!registry.is_empty());
    }
}
