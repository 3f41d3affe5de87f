use log::info;
use serde::{Serialize, Deserialize};
use sidenode_protocol::{
    NamespaceRegistry, ParameterError, ProtocolParameters, VersionDescriptor, VersionSet,
    VersionSetError,
};
use std::path::Path;
use thiserror::Error;

/// Prefix of environment variables overriding file settings
pub const ENV_PREFIX: &str = "SIDENODE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid namespace: {0:?}")]
    InvalidNamespace(String),

    #[error("Invalid protocol version {version} for namespace {namespace}: {source}")]
    InvalidVersion {
        namespace: String,
        version: String,
        #[source]
        source: ParameterError,
    },

    #[error("Invalid version set for namespace {namespace}: {source}")]
    VersionSet {
        namespace: String,
        #[source]
        source: VersionSetError,
    },
}

/// One protocol version as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionConfig {
    /// Version label, e.g. "1.0"
    pub version: String,

    /// Anchoring time from which the version applies
    pub genesis_time: u64,

    /// Parameters; omitted fields take protocol defaults
    #[serde(default)]
    pub protocol: ProtocolParameters,
}

impl VersionConfig {
    fn to_descriptor(&self, namespace: &str) -> Result<VersionDescriptor, ConfigError> {
        self.protocol.validate().map_err(|source| ConfigError::InvalidVersion {
            namespace: namespace.to_string(),
            version: self.version.clone(),
            source,
        })?;

        Ok(VersionDescriptor::new(
            self.version.clone(),
            self.genesis_time,
            self.protocol.clone(),
        ))
    }
}

/// Supported protocol versions of one namespace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceConfig {
    pub namespace: String,

    #[serde(default)]
    pub versions: Vec<VersionConfig>,
}

impl NamespaceConfig {
    /// Validate and seal this namespace's versions into a version set
    pub fn build_version_set(&self) -> Result<VersionSet, ConfigError> {
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::InvalidNamespace(self.namespace.clone()));
        }

        let descriptors = self
            .versions
            .iter()
            .map(|v| v.to_descriptor(&self.namespace))
            .collect::<Result<Vec<_>, _>>()?;

        VersionSet::from_versions(descriptors).map_err(|source| ConfigError::VersionSet {
            namespace: self.namespace.clone(),
            source,
        })
    }
}

/// Top-level node configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub namespaces: Vec<NamespaceConfig>,
}

impl NodeConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Build the namespace registry described by this configuration.
    ///
    /// A namespace listed more than once is registered in file order, so
    /// the last entry wins.
    pub fn build_registry(&self) -> Result<NamespaceRegistry, ConfigError> {
        let mut registry = NamespaceRegistry::new();

        for namespace in &self.namespaces {
            let version_set = namespace.build_version_set()?;
            registry.add(namespace.namespace.clone(), version_set);
        }

        info!("Namespace registry built with {} namespace(s)", registry.len());
        Ok(registry)
    }
}

/// Load node configuration from a file with environment overrides.
///
/// The file format follows the extension (yaml, json, toml, ...).
/// Environment variables prefixed `SIDENODE_` (nested keys joined by `__`)
/// are layered over the file.
pub fn load_config(path: impl AsRef<Path>) -> Result<NodeConfig, ConfigError> {
    let path = path.as_ref();

    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let node_config: NodeConfig = settings.try_deserialize()?;
    info!(
        "Loaded configuration from {} ({} namespace(s))",
        path.display(),
        node_config.namespaces.len()
    );
    Ok(node_config)
}
