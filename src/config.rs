//! Configuration file handling.
//!
//! Configuration is stored as TOML at:
//! - Linux: `~/.config/mobscan/config.toml`
//! - macOS: `~/Library/Application Support/mobscan/config.toml`
//! - Windows: `%APPDATA%\mobscan\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! online = false
//!
//! [probe]
//! timeout_secs = 10
//! retries = 0
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether network probes run by default when no `--online` flag is
    /// provided.
    ///
    /// Default: false
    pub online: bool,

    /// Policy for outbound reachability probes.
    #[serde(default)]
    pub probe: ProbeConfig,
}

/// Policy for outbound reachability probes.
///
/// These are explicit configuration points rather than whatever the HTTP
/// client would default to: one probe per endpoint, with a bounded wait.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Per-request timeout, in seconds.
    ///
    /// Default: 10
    pub timeout_secs: u64,

    /// Extra attempts after a failed request. A request that completes with
    /// any status is never retried; failures after the last attempt are
    /// treated as "not exposed".
    ///
    /// Default: 0
    pub retries: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            retries: 0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            online: false,
            probe: ProbeConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file, falling back to defaults
    /// when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mobscan")
            .join("config.toml")
    }

    /// The default configuration rendered as TOML, for `config --init`
    /// output.
    pub fn generate_default_config() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }
}
