//! Configuration management.

use crate::error::{BerthError, Result};
use crate::network::{ControllerConfig, DEFAULT_DRIVER, DEFAULT_NETWORK};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent configuration shared by berthd and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Unix socket the daemon listens on and the CLI connects to
    pub socket_path: String,
    /// Default tracing filter for the daemon
    pub log_level: String,
    /// Network used for lookups of the empty name
    pub default_network: String,
    /// Driver used when a create request leaves it empty
    pub default_driver: String,
    /// Prometheus listener port; disabled when unset
    pub metrics_port: Option<u16>,
    /// Start the daemon without a network controller
    pub disable_networking: bool,
    /// Subnet of the cluster-managed ingress network; none is created when unset
    pub ingress_subnet: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: paths::DEFAULT_SOCKET_PATH.to_string(),
            log_level: "info".to_string(),
            default_network: DEFAULT_NETWORK.to_string(),
            default_driver: DEFAULT_DRIVER.to_string(),
            metrics_port: None,
            disable_networking: false,
            ingress_subnet: None,
        }
    }
}

impl Config {
    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        paths::config_path()
    }

    /// Load configuration from disk, then apply environment overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(Self::config_path())?;
        if let Ok(socket) = std::env::var("BERTH_SOCKET") {
            config.socket_path = socket;
        }
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| BerthError::InvalidConfig {
            reason: format!("Failed to read config: {}", e),
        })?;
        serde_json::from_str(&content).map_err(|e| BerthError::InvalidConfig {
            reason: format!("Failed to parse config: {}", e),
        })
    }

    /// Save configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| BerthError::IoError { path: parent.to_path_buf(), source: e })?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| BerthError::InvalidConfig {
            reason: format!("Failed to serialize config: {}", e),
        })?;
        std::fs::write(path, content)
            .map_err(|e| BerthError::IoError { path: path.to_path_buf(), source: e })
    }

    /// Controller settings derived from this configuration.
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            default_network: self.default_network.clone(),
            default_driver: self.default_driver.clone(),
        }
    }
}
