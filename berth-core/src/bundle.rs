//! Distributed Application Bundle (DAB) files.
//!
//! A bundle is a JSON document describing the services of a stack:
//!
//! ```json
//! {
//!   "Version": "0.1",
//!   "Services": {
//!     "web": {
//!       "Image": "nginx@sha256:...",
//!       "Networks": ["front"],
//!       "Ports": [{ "Protocol": "tcp", "Port": 80 }]
//!     }
//!   }
//! }
//! ```

use crate::error::{BerthError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

/// Parsed bundle file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bundle {
    #[serde(default)]
    pub version: String,

    /// Services by name
    #[serde(default)]
    pub services: BTreeMap<String, BundleService>,
}

/// One service in a bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BundleService {
    pub image: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<BundlePort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,
}

/// Port exposed by a bundle service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BundlePort {
    #[serde(default)]
    pub protocol: String,
    pub port: u32,
}

impl Bundle {
    /// Parse a bundle from a reader.
    pub fn from_reader(reader: impl Read) -> std::result::Result<Self, String> {
        serde_json::from_reader(reader).map_err(|e| {
            if e.is_syntax() || e.is_eof() {
                format!("JSON syntax error at line {}, column {}: {}", e.line(), e.column(), e)
            } else {
                format!("Unexpected content at line {}, column {}: {}", e.line(), e.column(), e)
            }
        })
    }

    /// Load a bundle from disk.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| BerthError::IoError { path: path.to_path_buf(), source: e })?;

        Self::from_reader(std::io::BufReader::new(file))
            .map_err(|reason| BerthError::InvalidBundle { path: path.to_path_buf(), reason })
    }

    /// Every network referenced by any service, deduplicated and sorted.
    pub fn network_names(&self) -> Vec<String> {
        self.services
            .values()
            .flat_map(|service| service.networks.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
