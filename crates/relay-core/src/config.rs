//! Configuration system for the relay.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $RELAY_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/relay/config.toml
//!   3. ~/.config/relay/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub network: NetworkConfig,
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address the stream listener binds to.
    pub listen_addr: String,
}

/// Processing-delay policy settings.
///
/// Real content processing is out of scope; the relay models its cost as
/// a delay keyed on packet class. Control packets wait a fixed small
/// delay; payload packets wait a uniform random delay within the
/// configured inclusive range, drawn independently per packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Fixed delay for control-class packets, in milliseconds.
    pub control_delay_ms: u64,
    /// Lower bound of the payload-class delay range, in milliseconds.
    pub payload_delay_min_ms: u64,
    /// Upper bound of the payload-class delay range, inclusive, in milliseconds.
    pub payload_delay_max_ms: u64,
}

impl ProcessingConfig {
    pub fn control_delay(&self) -> Duration {
        Duration::from_millis(self.control_delay_ms)
    }

    pub fn payload_delay_min(&self) -> Duration {
        Duration::from_millis(self.payload_delay_min_ms)
    }

    pub fn payload_delay_max(&self) -> Duration {
        Duration::from_millis(self.payload_delay_max_ms)
    }
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: "[::]:50051".to_string(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            control_delay_ms: 10,
            payload_delay_min_ms: 50,
            payload_delay_max_ms: 150,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("relay")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl RelayConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            RelayConfig::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("RELAY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&RelayConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Reject configurations the delay policy cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.payload_delay_min_ms > self.processing.payload_delay_max_ms {
            return Err(ConfigError::Invalid(format!(
                "payload_delay_min_ms ({}) exceeds payload_delay_max_ms ({})",
                self.processing.payload_delay_min_ms, self.processing.payload_delay_max_ms
            )));
        }
        Ok(())
    }

    /// Apply RELAY_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("RELAY_NETWORK__LISTEN_ADDR") {
            self.network.listen_addr = v;
        }
        if let Ok(v) = std::env::var("RELAY_PROCESSING__CONTROL_DELAY_MS") {
            if let Ok(ms) = v.parse() {
                self.processing.control_delay_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("RELAY_PROCESSING__PAYLOAD_DELAY_MIN_MS") {
            if let Ok(ms) = v.parse() {
                self.processing.payload_delay_min_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("RELAY_PROCESSING__PAYLOAD_DELAY_MAX_MS") {
            if let Ok(ms) = v.parse() {
                self.processing.payload_delay_max_ms = ms;
            }
        }
    }
}
