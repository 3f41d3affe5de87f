// PROTOCOL PARAMETERS
// Immutable, hash-committed parameter bundle carried by each protocol version
//
// SAFETY INVARIANTS:
// 1. A bundle is never mutated once handed to a version descriptor
// 2. Every numeric limit is non-zero and every algorithm list non-empty
// 3. The commitment hash is identical on all nodes for identical content
// 4. Unknown per-version fields are preserved in `extensions`, never dropped
// 5. No extension key shadows a typed field, so the encoding has no duplicate keys

use serde::{Serialize, Deserialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("Invalid protocol parameter: {0}")]
    InvalidParameter(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Multihash code for sha2-256.
pub const SHA2_256: u32 = 18;

/// Serialized names of the typed fields of [`ProtocolParameters`]
const TYPED_FIELDS: &[&str] = &[
    "multihash_algorithms",
    "max_operation_count",
    "max_operation_size",
    "max_operation_hash_length",
    "max_delta_size",
    "max_cas_uri_length",
    "compression_algorithm",
    "max_chunk_file_size",
    "max_provisional_index_file_size",
    "max_core_index_file_size",
    "max_proof_file_size",
    "patches",
    "signature_algorithms",
    "key_algorithms",
    "max_memory_decompression_factor",
    "nonce_size",
];

/// Sidetree protocol parameters governing operation validation.
///
/// Missing fields deserialize to the defaults of the first Sidetree
/// protocol release. Fields not known to this type land in `extensions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParameters {
    /// Multihash codes accepted for suffix data and commitments
    pub multihash_algorithms: Vec<u32>,

    /// Maximum number of operations per anchored batch
    pub max_operation_count: u64,

    /// Maximum size of a single operation in bytes
    pub max_operation_size: u64,

    /// Maximum length of an encoded operation hash
    pub max_operation_hash_length: u64,

    /// Maximum size of a delta object in bytes
    pub max_delta_size: u64,

    /// Maximum length of a content-addressable storage URI
    pub max_cas_uri_length: u64,

    /// Compression applied to batch files
    pub compression_algorithm: String,

    pub max_chunk_file_size: u64,
    pub max_provisional_index_file_size: u64,
    pub max_core_index_file_size: u64,
    pub max_proof_file_size: u64,

    /// Document patch actions this version accepts
    pub patches: Vec<String>,

    /// JWS signature algorithms accepted on signed operations
    pub signature_algorithms: Vec<String>,

    /// Key types accepted for operation keys
    pub key_algorithms: Vec<String>,

    /// Upper bound on decompressed size relative to compressed size
    pub max_memory_decompression_factor: u64,

    /// Size in bytes of the anchor nonce
    pub nonce_size: u64,

    /// Version-specific parameters not modelled above
    #[serde(flatten)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl Default for ProtocolParameters {
    fn default() -> Self {
        ProtocolParameters {
            multihash_algorithms: vec![SHA2_256],
            max_operation_count: 10_000,
            max_operation_size: 2_500,
            max_operation_hash_length: 100,
            max_delta_size: 1_700,
            max_cas_uri_length: 100,
            compression_algorithm: "GZIP".to_string(),
            max_chunk_file_size: 10_000_000,
            max_provisional_index_file_size: 1_000_000,
            max_core_index_file_size: 1_000_000,
            max_proof_file_size: 2_500_000,
            patches: [
                "add-public-keys",
                "remove-public-keys",
                "add-services",
                "remove-services",
                "ietf-json-patch",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            signature_algorithms: ["EdDSA", "ES256", "ES256K"]
                .iter()
                .map(|a| a.to_string())
                .collect(),
            key_algorithms: ["Ed25519", "P-256", "secp256k1"]
                .iter()
                .map(|a| a.to_string())
                .collect(),
            max_memory_decompression_factor: 3,
            nonce_size: 16,
            extensions: BTreeMap::new(),
        }
    }
}

impl ProtocolParameters {
    /// Default parameters with a specific batch size limit
    pub fn with_max_operation_count(max_operation_count: u64) -> Self {
        ProtocolParameters {
            max_operation_count,
            ..Default::default()
        }
    }

    /// Look up a version-specific extension value
    pub fn extension(&self, key: &str) -> Option<&serde_json::Value> {
        self.extensions.get(key)
    }

    /// Verify every limit is usable before the bundle is registered.
    pub fn validate(&self) -> Result<(), ParameterError> {
        let limits = [
            ("max_operation_count", self.max_operation_count),
            ("max_operation_size", self.max_operation_size),
            ("max_operation_hash_length", self.max_operation_hash_length),
            ("max_delta_size", self.max_delta_size),
            ("max_cas_uri_length", self.max_cas_uri_length),
            ("max_chunk_file_size", self.max_chunk_file_size),
            ("max_provisional_index_file_size", self.max_provisional_index_file_size),
            ("max_core_index_file_size", self.max_core_index_file_size),
            ("max_proof_file_size", self.max_proof_file_size),
            ("max_memory_decompression_factor", self.max_memory_decompression_factor),
            ("nonce_size", self.nonce_size),
        ];

        for (name, value) in limits {
            if value == 0 {
                return Err(ParameterError::InvalidParameter(
                    format!("{} must be greater than zero", name)
                ));
            }
        }

        if self.multihash_algorithms.is_empty() {
            return Err(ParameterError::InvalidParameter(
                "multihash_algorithms must not be empty".to_string()
            ));
        }

        if self.signature_algorithms.is_empty() {
            return Err(ParameterError::InvalidParameter(
                "signature_algorithms must not be empty".to_string()
            ));
        }

        if self.key_algorithms.is_empty() {
            return Err(ParameterError::InvalidParameter(
                "key_algorithms must not be empty".to_string()
            ));
        }

        if self.compression_algorithm.is_empty() {
            return Err(ParameterError::InvalidParameter(
                "compression_algorithm must not be empty".to_string()
            ));
        }

        if let Some(key) = self.extensions.keys().find(|k| TYPED_FIELDS.contains(&k.as_str())) {
            return Err(ParameterError::InvalidParameter(
                format!("extension {} shadows a protocol parameter", key)
            ));
        }

        Ok(())
    }

    /// Compute the deterministic commitment hash (hex) of this bundle
    ///
    /// SAFETY: struct fields serialize in declaration order and extensions
    /// are a BTreeMap, so the encoding is canonical across nodes.
    pub fn commitment(&self) -> Result<String, ParameterError> {
        let serialized = serde_json::to_vec(self)
            .map_err(|e| ParameterError::SerializationError(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&serialized);
        Ok(hex::encode(hasher.finalize()))
    }
}
