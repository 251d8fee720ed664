//! Service domain types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;

/// Port protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

impl std::str::FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            _ => Err(format!("Unknown protocol: {}", s)),
        }
    }
}

/// Published port of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    pub protocol: Protocol,

    /// Port inside the container
    pub target_port: u32,

    /// Port on the routing mesh (0 = assigned by the manager)
    pub published_port: u32,
}

/// Attachment of a service to a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAttachment {
    /// Network name or ID
    pub target: String,

    /// DNS aliases on that network
    pub aliases: Vec<String>,
}

/// Desired state of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    pub labels: HashMap<String, String>,
    pub image: String,
    pub command: Vec<String>,
    pub args: Vec<String>,
    pub env: Vec<String>,
    pub container_labels: HashMap<String, String>,
    pub working_dir: String,
    pub user: String,
    pub networks: Vec<NetworkAttachment>,
    pub ports: Vec<PortConfig>,
    pub replicas: u64,
}

impl Default for ServiceSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            labels: HashMap::new(),
            image: String::new(),
            command: Vec::new(),
            args: Vec::new(),
            env: Vec::new(),
            container_labels: HashMap::new(),
            working_dir: String::new(),
            user: String::new(),
            networks: Vec::new(),
            ports: Vec::new(),
            replicas: 1,
        }
    }
}

/// A service known to the manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,

    /// Object version; updates must quote the current value
    pub version: u64,

    pub spec: ServiceSpec,

    pub created_at: SystemTime,
}
