//! Network controller abstraction.
//!
//! The controller owns network state, drivers and address management. The
//! daemon only looks networks up and forwards create/delete requests to it.

use super::ipam::IpamConf;
use crate::error::Result;
use crate::types::Network;
use async_trait::async_trait;
use std::collections::HashMap;

/// Static controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Network used when a lookup asks for the empty name
    pub default_network: String,
    /// Driver used when a create request leaves it empty
    pub default_driver: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            default_network: super::defaults::DEFAULT_NETWORK.to_string(),
            default_driver: super::defaults::DEFAULT_DRIVER.to_string(),
        }
    }
}

/// Options applied to a new network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkOptions {
    pub ipam_driver: String,
    pub ipam_v4: Vec<IpamConf>,
    pub ipam_v6: Vec<IpamConf>,
    pub ipam_options: HashMap<String, String>,
    pub enable_ipv6: bool,
    pub driver_opts: HashMap<String, String>,
    pub labels: HashMap<String, String>,
    pub internal: bool,
    /// Created on behalf of the cluster manager rather than a local user
    pub dynamic: bool,
    /// Whether the controller keeps the network across restarts
    pub persist: bool,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            ipam_driver: String::new(),
            ipam_v4: Vec::new(),
            ipam_v6: Vec::new(),
            ipam_options: HashMap::new(),
            enable_ipv6: false,
            driver_opts: HashMap::new(),
            labels: HashMap::new(),
            internal: false,
            dynamic: false,
            persist: true,
        }
    }
}

/// Interface to the networking library.
#[async_trait]
pub trait NetworkController: Send + Sync {
    /// Controller configuration.
    fn config(&self) -> &ControllerConfig;

    /// Look up a network by exact name.
    ///
    /// Returns `BerthError::NoSuchNetwork` when nothing matches.
    async fn network_by_name(&self, name: &str) -> Result<Network>;

    /// Every network the controller knows, in creation order.
    async fn networks(&self) -> Vec<Network>;

    /// Create a network. `id` is generated when `None`.
    async fn new_network(
        &self,
        driver: &str,
        name: &str,
        id: Option<&str>,
        options: NetworkOptions,
    ) -> Result<Network>;

    /// Delete a network by full ID.
    async fn delete_network(&self, id: &str) -> Result<()>;
}
