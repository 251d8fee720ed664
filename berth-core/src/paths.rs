//! Centralized path configuration for berth.
//!
//! All file locations should go through this module to ensure consistency
//! between daemon and CLI.

use std::path::PathBuf;

/// Default Unix socket of the berthd API.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/berth.sock";

/// Get the berth configuration directory.
///
/// Resolution order:
/// 1. `BERTH_CONFIG_DIR` environment variable
/// 2. `~/.berth` for the current user
/// 3. `/etc/berth` when no home directory is known
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BERTH_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    dirs::home_dir().map(|h| h.join(".berth")).unwrap_or_else(|| PathBuf::from("/etc/berth"))
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Get the registry credentials file path.
pub fn auth_path() -> PathBuf {
    config_dir().join("auth.json")
}
