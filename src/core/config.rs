//! Ledger configuration.
//!
//! Parameters fixed when a ledger is created:
//! - Reconfiguration policy for the managed token reference
//! - Size of the in-memory event log

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::utils::constants::DEFAULT_MAX_EVENTS;

// ═══════════════════════════════════════════════════════════════════════════════
// RECONFIGURATION POLICY
// ═══════════════════════════════════════════════════════════════════════════════

/// Whether the administrator may replace an already configured token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconfigurationPolicy {
    /// Any number of changes, even while funds are held
    Always,
    /// Changes only while the ledger holds none of the current token
    #[default]
    WhenEmpty,
    /// The first configuration is final
    Never,
}

impl fmt::Display for ReconfigurationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReconfigurationPolicy::Always => "always",
            ReconfigurationPolicy::WhenEmpty => "when-empty",
            ReconfigurationPolicy::Never => "never",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ReconfigurationPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "always" => Ok(ReconfigurationPolicy::Always),
            "when-empty" | "when_empty" | "whenempty" => Ok(ReconfigurationPolicy::WhenEmpty),
            "never" => Ok(ReconfigurationPolicy::Never),
            _ => Err(Error::InvalidParameter {
                name: "reconfiguration".into(),
                reason: format!("unknown policy: {}", s),
            }),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Custody ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Token reconfiguration policy
    pub reconfiguration: ReconfigurationPolicy,
    /// Maximum events kept in memory
    pub max_events: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reconfiguration: ReconfigurationPolicy::default(),
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

impl LedgerConfig {
    /// Set the reconfiguration policy
    pub fn with_reconfiguration(mut self, policy: ReconfigurationPolicy) -> Self {
        self.reconfiguration = policy;
        self
    }

    /// Set the event log size
    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    /// Validate parameters are consistent
    pub fn validate(&self) -> Result<()> {
        if self.max_events == 0 {
            return Err(Error::InvalidParameter {
                name: "max_events".into(),
                reason: "must be greater than 0".into(),
            });
        }
        Ok(())
    }
}
