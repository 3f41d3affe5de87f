// PROTOCOL VERSION SET
// Ordered, immutable history of protocol versions for a single namespace
//
// SAFETY INVARIANTS:
// 1. Versions are sorted by ascending genesis time at construction, never reordered
// 2. Genesis times and version labels are unique within a set
// 3. A constructed set holds at least one version
// 4. Resolution is pure: identical (set, time) inputs yield the identical version
//    on every node

use crate::protocol_version::{version_commitment, ProtocolVersion};
use crate::protocol_parameters::ParameterError;
use log::debug;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionSetError {
    #[error("No protocol versions configured")]
    NoVersionsConfigured,

    #[error("Duplicate genesis time: {0}")]
    DuplicateGenesisTime(u64),

    #[error("Duplicate protocol version: {0}")]
    DuplicateVersion(String),

    #[error("No protocol version applicable at time {0}")]
    NoApplicableVersion(u64),

    #[error("Protocol version not found: {0}")]
    UnknownVersion(String),
}

/// Immutable set of protocol versions for one namespace
#[derive(Debug, Clone)]
pub struct VersionSet {
    /// Versions ordered by ascending genesis time
    versions: Vec<Arc<dyn ProtocolVersion>>,
}

impl VersionSet {
    /// Build a version set from an unordered list of versions
    pub fn new(mut versions: Vec<Arc<dyn ProtocolVersion>>) -> Result<Self, VersionSetError> {
        if versions.is_empty() {
            return Err(VersionSetError::NoVersionsConfigured);
        }

        versions.sort_by_key(|v| v.genesis_time());

        if let Some(pair) = versions
            .windows(2)
            .find(|pair| pair[0].genesis_time() == pair[1].genesis_time())
        {
            return Err(VersionSetError::DuplicateGenesisTime(pair[0].genesis_time()));
        }

        let mut labels = HashSet::with_capacity(versions.len());
        if let Some(duplicate) = versions.iter().find(|v| !labels.insert(v.version())) {
            return Err(VersionSetError::DuplicateVersion(duplicate.version().to_string()));
        }

        Ok(VersionSet { versions })
    }

    /// Build a version set from concrete descriptors
    pub fn from_versions<V>(versions: impl IntoIterator<Item = V>) -> Result<Self, VersionSetError>
    where
        V: ProtocolVersion + 'static,
    {
        Self::new(
            versions
                .into_iter()
                .map(|v| Arc::new(v) as Arc<dyn ProtocolVersion>)
                .collect(),
        )
    }

    /// The latest registered version (maximum genesis time)
    pub fn current(&self) -> Result<Arc<dyn ProtocolVersion>, VersionSetError> {
        self.versions
            .last()
            .cloned()
            .ok_or(VersionSetError::NoVersionsConfigured)
    }

    /// The version in force at anchoring time `time`
    ///
    /// SAFETY: selects the rightmost version whose genesis time does not
    /// exceed `time`; never falls back to another version.
    pub fn at(&self, time: u64) -> Result<Arc<dyn ProtocolVersion>, VersionSetError> {
        if self.versions.is_empty() {
            return Err(VersionSetError::NoVersionsConfigured);
        }

        let active = self.versions.partition_point(|v| v.genesis_time() <= time);
        if active == 0 {
            return Err(VersionSetError::NoApplicableVersion(time));
        }

        let version = Arc::clone(&self.versions[active - 1]);
        debug!("Resolved protocol version {} at time {}", version.version(), time);
        Ok(version)
    }

    /// Look up a version by its label
    pub fn by_version(&self, label: &str) -> Result<Arc<dyn ProtocolVersion>, VersionSetError> {
        self.versions
            .iter()
            .find(|v| v.version() == label)
            .cloned()
            .ok_or_else(|| VersionSetError::UnknownVersion(label.to_string()))
    }

    /// All versions, ascending by genesis time
    pub fn versions(&self) -> &[Arc<dyn ProtocolVersion>] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Deterministic commitment hash (hex) over the ordered version history.
    ///
    /// Two nodes configured with the same history for a namespace produce
    /// the same commitment.
    pub fn commitment(&self) -> Result<String, ParameterError> {
        let mut hasher = Sha256::new();
        for version in &self.versions {
            hasher.update(version_commitment(version.as_ref())?.as_bytes());
        }
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Collects versions during startup and seals them into a [`VersionSet`].
#[derive(Default)]
pub struct VersionSetBuilder {
    versions: Vec<Arc<dyn ProtocolVersion>>,
}

impl VersionSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: impl ProtocolVersion + 'static) -> Self {
        self.versions.push(Arc::new(version));
        self
    }

    pub fn with_shared_version(mut self, version: Arc<dyn ProtocolVersion>) -> Self {
        self.versions.push(version);
        self
    }

    pub fn build(self) -> Result<VersionSet, VersionSetError> {
        VersionSet::new(self.versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol_parameters::ProtocolParameters;
    use crate::protocol_version::VersionDescriptor;
    use proptest::prelude::*;

    fn descriptor(label: &str, genesis_time: u64, max_operation_count: u64) -> VersionDescriptor {
        VersionDescriptor::new(
            label,
            genesis_time,
            ProtocolParameters::with_max_operation_count(max_operation_count),
        )
    }

    fn three_versions() -> VersionSet {
        VersionSet::from_versions(vec![
            descriptor("1.0", 0, 100),
            descriptor("1.1", 10, 110),
            descriptor("1.2", 20, 120),
        ])
        .unwrap()
    }

    #[test]
    fn test_at_resolves_rightmost_threshold() {
        let set = three_versions();

        assert_eq!(set.at(0).unwrap().version(), "1.0");
        assert_eq!(set.at(5).unwrap().version(), "1.0");
        assert_eq!(set.at(10).unwrap().version(), "1.1");
        assert_eq!(set.at(19).unwrap().version(), "1.1");
        assert_eq!(set.at(20).unwrap().version(), "1.2");
        assert_eq!(set.at(25).unwrap().protocol().max_operation_count, 120);
    }

    #[test]
    fn test_at_before_first_genesis_fails() {
        let set = VersionSet::from_versions(vec![
            descriptor("1.0", 5, 100),
            descriptor("1.1", 10, 110),
        ])
        .unwrap();

        assert_eq!(set.at(4).unwrap_err(), VersionSetError::NoApplicableVersion(4));
        assert_eq!(set.at(0).unwrap_err(), VersionSetError::NoApplicableVersion(0));
    }

    #[test]
    fn test_current_is_latest() {
        let set = three_versions();
        assert_eq!(set.current().unwrap().version(), "1.2");
        assert_eq!(set.current().unwrap().genesis_time(), 20);
    }

    #[test]
    fn test_unsorted_input_is_ordered() {
        let set = VersionSet::from_versions(vec![
            descriptor("1.2", 20, 120),
            descriptor("1.0", 0, 100),
            descriptor("1.1", 10, 110),
        ])
        .unwrap();

        let times: Vec<u64> = set.versions().iter().map(|v| v.genesis_time()).collect();
        assert_eq!(times, vec![0, 10, 20]);
        assert_eq!(set.current().unwrap().version(), "1.2");
    }

    #[test]
    fn test_duplicate_genesis_time_rejected() {
        let result = VersionSet::from_versions(vec![
            descriptor("1.0", 5, 100),
            descriptor("1.1", 5, 110),
        ]);

        assert_eq!(result.unwrap_err(), VersionSetError::DuplicateGenesisTime(5));
    }

    #[test]
    fn test_duplicate_version_label_rejected() {
        let result = VersionSet::from_versions(vec![
            descriptor("1.0", 0, 10),
            descriptor("1.0", 100, 99),
        ]);

        assert_eq!(
            result.unwrap_err(),
            VersionSetError::DuplicateVersion("1.0".to_string())
        );
    }

    #[test]
    fn test_empty_set_rejected() {
        let result = VersionSetBuilder::new().build();
        assert_eq!(result.unwrap_err(), VersionSetError::NoVersionsConfigured);
    }

    #[test]
    fn test_empty_set_resolution_fails() {
        let set = VersionSet { versions: Vec::new() };

        assert_eq!(set.current().unwrap_err(), VersionSetError::NoVersionsConfigured);
        assert_eq!(set.at(10).unwrap_err(), VersionSetError::NoVersionsConfigured);
    }

    #[test]
    fn test_by_version() {
        let set = three_versions();

        assert_eq!(set.by_version("1.1").unwrap().genesis_time(), 10);
        assert_eq!(
            set.by_version("9.9").unwrap_err(),
            VersionSetError::UnknownVersion("9.9".to_string())
        );
    }

    #[test]
    fn test_repeated_resolution_is_stable() {
        let set = three_versions();

        let first = set.at(15).unwrap();
        let second = set.at(15).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let current_a = set.current().unwrap();
        let current_b = set.current().unwrap();
        assert!(Arc::ptr_eq(&current_a, &current_b));
    }

    #[test]
    fn test_commitment_independent_of_input_order() {
        let ordered = three_versions();
        let shuffled = VersionSetBuilder::new()
            .with_version(descriptor("1.1", 10, 110))
            .with_version(descriptor("1.2", 20, 120))
            .with_version(descriptor("1.0", 0, 100))
            .build()
            .unwrap();

        assert_eq!(ordered.commitment().unwrap(), shuffled.commitment().unwrap());
    }

    proptest! {
        #[test]
        fn prop_current_has_max_genesis(times in prop::collection::btree_set(0u64..1_000_000, 1..32)) {
            let set = VersionSet::from_versions(
                times.iter().map(|&t| descriptor(&t.to_string(), t, t + 1))
            ).unwrap();

            let max = *times.iter().max().unwrap();
            prop_assert_eq!(set.current().unwrap().genesis_time(), max);
        }

        #[test]
        fn prop_at_matches_linear_scan(
            times in prop::collection::btree_set(0u64..10_000, 1..32),
            query in 0u64..12_000,
        ) {
            let set = VersionSet::from_versions(
                times.iter().map(|&t| descriptor(&t.to_string(), t, t + 1))
            ).unwrap();

            let expected = times.iter().rev().find(|&&t| t <= query).copied();
            match (set.at(query), expected) {
                (Ok(version), Some(t)) => prop_assert_eq!(version.genesis_time(), t),
                (Err(VersionSetError::NoApplicableVersion(q)), None) => prop_assert_eq!(q, query),
                (other, expected) => prop_assert!(false, "unexpected {:?} for {:?}", other.map(|v| v.genesis_time()), expected),
            }
        }
    }
}
