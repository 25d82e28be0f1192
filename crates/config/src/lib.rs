//! Configuration loading, validation, and management for DeskPilot.
//!
//! Loads configuration from `~/.deskpilot/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use deskpilot_core::action::Resolution;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Hard ceiling for `agent.max_iterations`.
pub const MAX_ITERATIONS_LIMIT: u32 = 500;

/// The root configuration structure.
///
/// Maps directly to `~/.deskpilot/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Display and screenshot settings
    #[serde(default)]
    pub display: DisplayConfig,

    /// Which action vocabulary the model speaks
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model calls per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Capacity of the event channel handed to callers
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_max_iterations() -> u32 {
    50
}
fn default_event_buffer() -> usize {
    128
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            event_buffer: default_event_buffer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Longest screenshot side sent to the model; `None` sends native size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_dimension: Option<u32>,

    /// Display width used by the dry-run desktop
    #[serde(default = "default_width")]
    pub width: u32,

    /// Display height used by the dry-run desktop
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    1024
}
fn default_height() -> u32 {
    768
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_dimension: None,
            width: default_width(),
            height: default_height(),
        }
    }
}

impl DisplayConfig {
    /// The configured display size as a validated resolution.
    pub fn resolution(&self) -> Result<Resolution, ConfigError> {
        Resolution::new(self.width, self.height)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// Built-in vocabulary name: "gemini", "openai" or "anthropic"
    #[serde(default = "default_vocabulary")]
    pub name: String,

    /// Extra provider action names mapped onto names of the vocabulary table
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub aliases: HashMap<String, String>,
}

fn default_vocabulary() -> String {
    "gemini".into()
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            name: default_vocabulary(),
            aliases: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location.
    ///
    /// Searches `~/.deskpilot/config.toml`, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_path(&Self::config_dir().join("config.toml"))
    }

    /// Load `path`, then apply environment overrides.
    pub fn load_path(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load `path`, then apply overrides read through `lookup`, then validate.
    pub fn load_with(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, without environment overrides.
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

    /// Apply `DESKPILOT_*` overrides using `lookup` to read variables.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(name) = lookup("DESKPILOT_VOCABULARY") {
            self.vocabulary.name = name;
        }

        if let Some(raw) = lookup("DESKPILOT_MAX_ITERATIONS") {
            self.agent.max_iterations = raw.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "DESKPILOT_MAX_ITERATIONS must be a positive integer, got '{raw}'"
                ))
            })?;
        }

        if let Some(raw) = lookup("DESKPILOT_MAX_DIMENSION") {
            let value: u32 = raw.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "DESKPILOT_MAX_DIMENSION must be a positive integer, got '{raw}'"
                ))
            })?;
            self.display.max_dimension = Some(value);
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".deskpilot")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.max_iterations == 0 || self.agent.max_iterations > MAX_ITERATIONS_LIMIT {
            return Err(ConfigError::ValidationError(format!(
                "agent.max_iterations must be between 1 and {MAX_ITERATIONS_LIMIT}"
            )));
        }

        if self.agent.event_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "agent.event_buffer must be > 0".into(),
            ));
        }

        if self.display.max_dimension == Some(0) {
            return Err(ConfigError::ValidationError(
                "display.max_dimension must be > 0 when set".into(),
            ));
        }

        self.display.resolution()?;

        if self.vocabulary.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "vocabulary.name must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
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

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
