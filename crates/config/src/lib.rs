//! Configuration loading and validation for the hookloop orchestrator.
//!
//! The orchestrator is configured from the mapping handed to `mount`, or
//! from `~/.hookloop/config.toml` with environment variable overrides.
//! Settings are validated before use.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Orchestrator settings.
///
/// Maps directly to `~/.hookloop/config.toml` and to the mount mapping.
/// Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum provider round-trips per session
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Preferred provider key; falls back to the first available provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
}

fn default_max_iterations() -> u32 {
    50
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            default_provider: None,
        }
    }
}

impl OrchestratorConfig {
    /// Build from a mount mapping. `null` yields the defaults.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_value(value)
            .map_err(|e| ConfigError::InvalidMapping(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default path (~/.hookloop/config.toml).
    ///
    /// Environment variables override file values:
    /// - `HOOKLOOP_MAX_ITERATIONS`
    /// - `HOOKLOOP_DEFAULT_PROVIDER`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("HOOKLOOP_MAX_ITERATIONS") {
            self.max_iterations = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "HOOKLOOP_MAX_ITERATIONS".into(),
                reason: format!("'{raw}' is not a positive integer"),
            })?;
        }

        if let Some(provider) = lookup("HOOKLOOP_DEFAULT_PROVIDER") {
            self.default_provider = Some(provider);
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".hookloop")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_iterations must be at least 1".into(),
            ));
        }

        if self
            .default_provider
            .as_deref()
            .is_some_and(|p| p.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "default_provider must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid configuration mapping: {0}")]
    InvalidMapping(String),

    #[error("Invalid environment override {var}: {reason}")]
    InvalidEnv { var: String, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
