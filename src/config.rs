//! Configuration System
//!
//! Layered engine configuration: built-in defaults, the user's global file, the project's
//! `stratus.toml` and `config/{STRATUS_ENV}.toml`, then `STRATUS_*` environment variables.

use crate::dom::MalformedPolicy;
use crate::error::EngineError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Stack name; keys persisted state and locks
    #[serde(default = "default_stack")]
    pub stack: String,

    /// Upper bound on reactive passes per deployment
    #[serde(default = "default_max_reactive_passes")]
    pub max_reactive_passes: usize,

    /// What to do with descriptors whose path normalizes to nothing
    #[serde(default)]
    pub malformed_descriptors: MalformedPolicy,

    /// State locking
    #[serde(default)]
    pub lock: LockConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// State lock settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Lock lifetime in seconds; a holder that outlives it loses the lock
    #[serde(default = "default_lock_ttl_secs")]
    pub ttl_secs: u64,
}

pub(crate) fn default_stack() -> String {
    "default".to_string()
}

pub(crate) fn default_max_reactive_passes() -> usize {
    10
}

pub(crate) fn default_lock_ttl_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            ttl_secs: default_lock_ttl_secs(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stack: default_stack(),
            max_reactive_passes: default_max_reactive_passes(),
            malformed_descriptors: MalformedPolicy::default(),
            lock: LockConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Configuration for a named stack with every other setting at its default
    pub fn for_stack(stack: impl Into<String>) -> Self {
        Self {
            stack: stack.into(),
            ..Self::default()
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut errors = Vec::new();

        if self.stack.trim().is_empty() {
            errors.push("stack name cannot be empty".to_string());
        }
        if self.max_reactive_passes == 0 {
            errors.push("max_reactive_passes must be at least 1".to_string());
        }
        if self.lock.enabled && self.lock.ttl_secs == 0 {
            errors.push("lock.ttl_secs must be greater than zero".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(EngineError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            )))
        }
    }
}
