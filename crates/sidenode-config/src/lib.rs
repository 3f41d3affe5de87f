// NODE CONFIGURATION
// Static namespace/protocol-version configuration loaded once at startup
//
// SAFETY INVARIANTS:
// 1. Every parameter bundle is validated before it can be registered
// 2. A namespace is registered only with a well-formed, non-empty version set
// 3. The registry is fully built before it is handed to request handlers

pub mod node_config;

pub use node_config::{
    load_config, ConfigError, NamespaceConfig, NodeConfig, VersionConfig, ENV_PREFIX,
};
