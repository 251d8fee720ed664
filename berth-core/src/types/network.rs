//! Network domain types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;

/// Driver used for stack networks when none is given.
pub const DEFAULT_STACK_DRIVER: &str = "overlay";

/// IPAM driver name used when the caller leaves it empty.
pub const DEFAULT_IPAM_DRIVER: &str = "default";

/// Network scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NetworkScope {
    #[default]
    Local,
    Swarm,
}

impl std::fmt::Display for NetworkScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkScope::Local => write!(f, "local"),
            NetworkScope::Swarm => write!(f, "swarm"),
        }
    }
}

impl std::str::FromStr for NetworkScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "local" => Ok(NetworkScope::Local),
            "swarm" => Ok(NetworkScope::Swarm),
            _ => Err(format!("Unknown network scope: {}", s)),
        }
    }
}

/// One IPAM pool as requested by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpamPool {
    /// Pool in CIDR form (e.g., "10.0.9.0/24")
    pub subnet: String,

    /// Sub-range addresses are handed out from
    pub ip_range: String,

    /// Gateway address
    pub gateway: String,

    /// Reserved auxiliary addresses by host name
    pub aux_addresses: HashMap<String, String>,
}

/// IPAM request block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipam {
    /// IPAM driver name ("default" when empty)
    pub driver: String,

    /// Driver-specific options
    pub options: HashMap<String, String>,

    /// Requested pools
    pub config: Vec<IpamPool>,
}

/// Network as reported by the network controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    /// Network ID (64 hex characters)
    pub id: String,

    /// Network name
    pub name: String,

    /// Driver name (bridge, overlay, host, null, ...)
    pub driver: String,

    /// Scope
    pub scope: NetworkScope,

    /// User labels
    pub labels: HashMap<String, String>,

    /// IPAM configuration the network was created with
    pub ipam: Ipam,

    /// Whether external connectivity is restricted
    pub internal: bool,

    /// Whether IPv6 is enabled
    pub enable_ipv6: bool,

    /// Driver options
    pub options: HashMap<String, String>,

    /// Creation timestamp
    pub created_at: SystemTime,
}

impl Network {
    /// First 12 characters of the ID, as shown in listings.
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }
}

/// Truncate an ID to its 12-character display form.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(12) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Request to create a network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCreate {
    /// Network name
    pub name: String,

    /// Fail instead of warning when the name is taken
    pub check_duplicate: bool,

    /// Driver (controller default when empty)
    pub driver: String,

    /// IPAM request
    pub ipam: Ipam,

    /// Enable IPv6
    pub enable_ipv6: bool,

    /// Driver options
    pub options: HashMap<String, String>,

    /// User labels
    pub labels: HashMap<String, String>,

    /// Restrict external access
    pub internal: bool,
}

/// Result of a network creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCreateResponse {
    /// ID of the created network
    pub id: String,

    /// Non-fatal warning (empty when none)
    pub warning: String,
}
