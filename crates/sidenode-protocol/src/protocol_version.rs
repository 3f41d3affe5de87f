// PROTOCOL VERSION DESCRIPTORS
// A protocol version pairs an activation threshold with a parameter bundle
//
// SAFETY INVARIANTS:
// 1. Descriptors are immutable once constructed
// 2. genesis_time is a position on the anchoring timeline, never wall-clock time
// 3. Consumers only see versions through the ProtocolVersion capability

use crate::protocol_parameters::{ParameterError, ProtocolParameters};
use serde::{Serialize, Deserialize};
use std::fmt;

/// Capability exposed by every protocol version a namespace supports.
///
/// Operation validators and resolvers only depend on this trait, so a
/// version may carry richer state than the plain [`VersionDescriptor`].
pub trait ProtocolVersion: fmt::Debug + Send + Sync {
    /// Human-readable version label, e.g. "1.0"
    fn version(&self) -> &str;

    /// Anchoring-timeline position from which this version's rules apply
    fn genesis_time(&self) -> u64;

    /// Parameter bundle governing operations under this version
    fn protocol(&self) -> &ProtocolParameters;
}

/// Plain immutable protocol version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    version: String,
    genesis_time: u64,
    protocol: ProtocolParameters,
}

impl VersionDescriptor {
    pub fn new(version: impl Into<String>, genesis_time: u64, protocol: ProtocolParameters) -> Self {
        VersionDescriptor {
            version: version.into(),
            genesis_time,
            protocol,
        }
    }

    /// Commitment over label, threshold and parameters
    pub fn commitment(&self) -> Result<String, ParameterError> {
        version_commitment(self)
    }
}

impl ProtocolVersion for VersionDescriptor {
    fn version(&self) -> &str {
        &self.version
    }

    fn genesis_time(&self) -> u64 {
        self.genesis_time
    }

    fn protocol(&self) -> &ProtocolParameters {
        &self.protocol
    }
}

impl fmt::Display for VersionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{} (genesis {})", self.version, self.genesis_time)
    }
}

/// Serializable view of any protocol version, used for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct VersionSummary<'a> {
    pub version: &'a str,
    pub genesis_time: u64,
    pub protocol: &'a ProtocolParameters,
}

impl<'a> VersionSummary<'a> {
    pub fn of(version: &'a dyn ProtocolVersion) -> Self {
        VersionSummary {
            version: version.version(),
            genesis_time: version.genesis_time(),
            protocol: version.protocol(),
        }
    }
}

pub(crate) fn version_commitment(version: &dyn ProtocolVersion) -> Result<String, ParameterError> {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(version.version().as_bytes());
    hasher.update([0u8]);
    hasher.update(version.genesis_time().to_le_bytes());
    hasher.update(version.protocol().commitment()?.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
