//! CLI Configuration.
//!
//! Configuration for the `tsd` tool, layered as: defaults, then an optional
//! JSON file, then `TSD_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cli::output::OutputFormat;
use crate::core::config::LedgerConfig;
use crate::storage::state::DEFAULT_DEPLOYMENT;
use crate::utils::constants::{DEFAULT_DATA_DIR_NAME, ENV_PREFIX};

// ═══════════════════════════════════════════════════════════════════════════════
// CLI CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// CLI Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Data directory holding persisted deployments
    pub data_dir: PathBuf,
    /// Name of the deployment to operate on
    pub deployment: String,
    /// Output format
    pub format: OutputFormat,
    /// Configuration applied to newly deployed ledgers
    pub ledger: LedgerConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            deployment: DEFAULT_DEPLOYMENT.to_string(),
            format: OutputFormat::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Load `path` if it exists, otherwise start from defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides from the process environment
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by full variable name
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(dir) = var("DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(name) = var("DEPLOYMENT") {
            self.deployment = name;
        }
        if let Some(format) = var("FORMAT") {
            self.format = format.parse().map_err(ConfigError::Validation)?;
        }
        if let Some(policy) = var("RECONFIGURATION") {
            self.ledger.reconfiguration = policy
                .parse()
                .map_err(|e: crate::error::Error| ConfigError::Validation(e.to_string()))?;
        }
        if let Some(max) = var("MAX_EVENTS") {
            self.ledger.max_events = max
                .parse()
                .map_err(|_| ConfigError::Validation(format!("invalid max events: {}", max)))?;
        }

        Ok(self)
    }

    /// Default config file path
    pub fn default_path() -> PathBuf {
        default_data_dir().join("config.json")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deployment.is_empty() {
            return Err(ConfigError::Validation("deployment name cannot be empty".into()));
        }
        self.ledger
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIG ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(String),
    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Get default data directory
fn default_data_dir() -> PathBuf {
    std::env::var("HOME")
        .map(|home| PathBuf::from(home).join(DEFAULT_DATA_DIR_NAME))
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR_NAME))
}
