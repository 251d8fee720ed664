//! Registry credentials forwarded with service create/update.
//!
//! Credentials live in `<config dir>/auth.json`:
//!
//! ```json
//! { "auths": { "registry.example.com": { "username": "me", "password": "..." } } }
//! ```

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use berth_core::paths;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const DEFAULT_REGISTRY: &str = "docker.io";
const DEFAULT_INDEX_SERVER: &str = "https://index.docker.io/v1/";

/// Credentials for one registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub auth: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub serveraddress: String,
}

#[derive(Debug, Default, Deserialize)]
struct AuthFile {
    #[serde(default)]
    auths: HashMap<String, AuthConfig>,
}

/// Stored credentials, keyed by registry host.
#[derive(Debug, Default)]
pub struct AuthStore {
    auths: HashMap<String, AuthConfig>,
}

impl AuthStore {
    /// Load the default credentials file. A missing file means no credentials.
    pub fn load() -> Result<Self> {
        Self::load_from(paths::auth_path())
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: AuthFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Self { auths: file.auths })
    }

    /// Encoded credentials for the registry `image` is pulled from.
    ///
    /// An image without stored credentials gets an encoded empty config.
    pub fn encoded_auth_for(&self, image: &str) -> Result<String> {
        let host = registry_host(image);
        let mut config = self.lookup(host).cloned().unwrap_or_default();
        if config.serveraddress.is_empty() && !config.username.is_empty() {
            config.serveraddress = host.to_string();
        }
        encode_auth(&config)
    }

    fn lookup(&self, host: &str) -> Option<&AuthConfig> {
        self.auths.get(host).or_else(|| {
            if host == DEFAULT_REGISTRY {
                self.auths.get(DEFAULT_INDEX_SERVER)
            } else {
                None
            }
        })
    }
}

/// Registry host of an image reference; `docker.io` when none is named.
pub fn registry_host(image: &str) -> &str {
    match image.split_once('/') {
        Some((first, _)) if first.contains('.') || first.contains(':') || first == "localhost" => {
            first
        }
        _ => DEFAULT_REGISTRY,
    }
}

/// JSON, then URL-safe base64.
pub fn encode_auth(config: &AuthConfig) -> Result<String> {
    let json = serde_json::to_vec(config)?;
    Ok(URL_SAFE.encode(json))
}
