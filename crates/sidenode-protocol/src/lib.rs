// Protocol version resolution for Sidetree-style DID namespaces
pub mod protocol_parameters;
pub mod protocol_version;
pub mod version_set;
pub mod namespace_registry;
pub mod shared_registry;

pub use protocol_parameters::{ParameterError, ProtocolParameters, SHA2_256};

pub use protocol_version::{ProtocolVersion, VersionDescriptor, VersionSummary};

pub use version_set::{VersionSet, VersionSetBuilder, VersionSetError};

pub use namespace_registry::{NamespaceRegistry, RegistryError};

pub use shared_registry::SharedRegistry;
