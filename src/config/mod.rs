use crate::error::{MeshwireError, Result};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use strum_macros::{Display, EnumString};

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Snapshot of the process environment
    pub fn new() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }
}

/// How a capability key with several implementers is resolved
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// The implementer registered first wins
    #[default]
    FirstRegistered,
    /// Resolving an ambiguous capability is an error
    Reject,
}

/// Settings that change how a container compiles and resolves
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub ambiguity: AmbiguityPolicy,
}

impl ContainerConfig {
    pub const AMBIGUITY_VAR: &'static str = "MESHWIRE_AMBIGUITY";

    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::load(&ConfigService::new())
    }

    pub fn load(config: &ConfigService) -> Result<Self> {
        let mut loaded = Self::default();
        if let Some(value) = config.get(Self::AMBIGUITY_VAR) {
            loaded.ambiguity = value.trim().parse().map_err(|_: strum::ParseError| {
                MeshwireError::InvalidConfig {
                    key: Self::AMBIGUITY_VAR.to_string(),
                    value: value.clone(),
                }
            })?;
        }
        Ok(loaded)
    }

    /// Like [`load`](Self::load), falling back to the defaults on an invalid value
    pub fn load_or_default(config: &ConfigService) -> Self {
        Self::load(config).unwrap_or_else(|error| {
            tracing::warn!(%error, "Invalid container configuration, using defaults");
            Self::default()
        })
    }

    pub fn with_ambiguity(mut self, ambiguity: AmbiguityPolicy) -> Self {
        self.ambiguity = ambiguity;
        self
    }
}
