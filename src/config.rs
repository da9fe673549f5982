//! Client configuration types and loading

use eyre::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Main client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend API configuration
    pub api: ApiConfig,

    /// Durable passport storage configuration
    pub storage: StorageConfig,

    /// Loading indicator configuration
    pub loading: LoadingConfig,
}

impl ClientConfig {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with a clear message.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            return Err(eyre::eyre!("api.base-url must not be empty"));
        }
        if self.loading.watchdog_timeout_ms == 0 {
            return Err(eyre::eyre!("loading.watchdog-timeout-ms must be positive"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    ///
    /// Explicit path, then `.mission-client.yml` in the working directory,
    /// then the user config directory, then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from(".mission-client.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("mission-client").join("mission-client.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend, without a trailing slash
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Durable passport storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the persisted passport record
    #[serde(rename = "passport-path")]
    pub passport_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // XDG data directory (~/.local/share/mission-client on Linux)
        let passport_path = dirs::data_dir()
            .map(|d| d.join("mission-client"))
            .unwrap_or_else(|| PathBuf::from(".mission-client"))
            .join("passport.json");

        Self { passport_path }
    }
}

/// Loading indicator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingConfig {
    /// Watchdog window in milliseconds before a stuck counter is force-reset
    #[serde(rename = "watchdog-timeout-ms")]
    pub watchdog_timeout_ms: u64,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            watchdog_timeout_ms: 10_000,
        }
    }
}
