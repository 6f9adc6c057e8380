use crate::di::Key;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MeshwireError>;

/// Error type returned by fallible providers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum MeshwireError {
    #[error("Invalid provider for {result}: {reason}")]
    InvalidProviderShape { result: String, reason: String },

    #[error("{argument} is not a declared abstract capability")]
    InvalidCapabilityArgument { argument: String },

    #[error("{result} does not implement {capability}")]
    CapabilityNotImplemented { result: String, capability: String },

    #[error("{key} already provided")]
    DuplicateKey { key: Key },

    #[error("{requesting} depends on {missing}, which is not provided")]
    UnsatisfiedDependency { requesting: Key, missing: Key },

    #[error("{key} is implemented by more than one provider: {}", candidates.join(", "))]
    AmbiguousCapability { key: Key, candidates: Vec<String> },

    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    #[error("{key} not provided")]
    NotProvided { key: Key },

    #[error("Failed to construct {key}: {source}")]
    ConstructionFailed {
        key: Key,
        #[source]
        source: BoxError,
    },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Invalid configuration value {value:?} for {key}")]
    InvalidConfig { key: String, value: String },
}

impl MeshwireError {
    /// Returns the key a resolution error is about, if any.
    pub fn key(&self) -> Option<&Key> {
        match self {
            MeshwireError::DuplicateKey { key }
            | MeshwireError::AmbiguousCapability { key, .. }
            | MeshwireError::NotProvided { key }
            | MeshwireError::ConstructionFailed { key, .. } => Some(key),
            MeshwireError::UnsatisfiedDependency { requesting, .. } => Some(requesting),
            _ => None,
        }
    }
}
