//! Registry configuration
//!
//! Values come from an optional config file layered under environment
//! variables prefixed `RIGHTS_REGISTRY_` (nested keys separated by `__`, e.g.
//! `RIGHTS_REGISTRY_STORAGE__BACKEND=sled`).

use crate::types::Identity;
use anyhow::{Context, Result};
use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "RIGHTS_REGISTRY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry administrator, fixed for the lifetime of the registry
    pub administrator: Identity,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database directory, used by the sled backend
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: PathBuf::from("./data/rights_registry"),
        }
    }
}

/// What happens to a right's metadata entry when it is revoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataRetention {
    /// Remove only the ownership entry; metadata stays queryable
    #[default]
    Retain,
    /// Remove the metadata entry together with the ownership entry
    Clear,
}

/// How batch registration treats entries with invalid metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchValidation {
    /// Validate every entry first; one invalid entry rejects the whole batch
    #[default]
    RejectAll,
    /// Register the valid entries and skip the invalid ones
    SkipInvalid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub metadata_on_revoke: MetadataRetention,
    pub batch_validation: BatchValidation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl RegistryConfig {
    pub fn new(administrator: Identity) -> Self {
        Self {
            administrator,
            storage: StorageConfig::default(),
            policy: PolicyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load from `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                anyhow::bail!("Configuration file {} not found", path.display());
            }
            builder = builder.add_source(ConfigFile::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder
            .build()
            .context("failed to read registry configuration")?;
        config
            .try_deserialize()
            .context("invalid registry configuration")
    }
}
