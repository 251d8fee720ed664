//! In-process network controller.
//!
//! Keeps network records in memory and seeds the pre-defined networks. It does
//! not program bridges or allocate addresses: requested IPAM pools are recorded
//! as given.

use super::controller::{ControllerConfig, NetworkController, NetworkOptions};
use super::defaults::PREDEFINED_NETWORKS;
use super::ipam::IpamConf;
use crate::error::{BerthError, Result};
use crate::types::{Ipam, IpamPool, Network, NetworkScope};
use async_trait::async_trait;
use std::time::SystemTime;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
struct Entry {
    network: Network,
    dynamic: bool,
    persist: bool,
}

/// Network controller backed by an in-memory list.
pub struct LocalController {
    config: ControllerConfig,
    entries: RwLock<Vec<Entry>>,
}

/// Generate a random 64-character hex network ID.
pub fn generate_id() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}

impl LocalController {
    /// Create a controller holding only the pre-defined networks.
    #[instrument(skip(config))]
    pub fn new(config: ControllerConfig) -> Self {
        let now = SystemTime::now();
        let entries = PREDEFINED_NETWORKS
            .iter()
            .map(|(name, driver)| Entry {
                network: Network {
                    id: generate_id(),
                    name: name.to_string(),
                    driver: driver.to_string(),
                    scope: NetworkScope::Local,
                    labels: Default::default(),
                    ipam: Ipam { driver: "default".to_string(), ..Default::default() },
                    internal: false,
                    enable_ipv6: false,
                    options: Default::default(),
                    created_at: now,
                },
                dynamic: false,
                persist: true,
            })
            .collect::<Vec<_>>();

        info!(count = entries.len(), "Local network controller initialized");
        Self { config, entries: RwLock::new(entries) }
    }

    /// Networks that would survive a controller restart.
    pub async fn persistent_networks(&self) -> Vec<Network> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.persist)
            .map(|e| e.network.clone())
            .collect()
    }

    /// Whether the network with `id` was created for the cluster manager.
    pub async fn is_dynamic(&self, id: &str) -> bool {
        self.entries.read().await.iter().any(|e| e.network.id == id && e.dynamic)
    }
}

impl Default for LocalController {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

fn to_pool(conf: &IpamConf) -> IpamPool {
    IpamPool {
        subnet: conf.preferred_pool.clone(),
        ip_range: conf.sub_pool.clone(),
        gateway: conf.gateway.clone(),
        aux_addresses: conf.aux_addresses.clone(),
    }
}

#[async_trait]
impl NetworkController for LocalController {
    fn config(&self) -> &ControllerConfig {
        &self.config
    }

    async fn network_by_name(&self, name: &str) -> Result<Network> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.network.name == name)
            .map(|e| e.network.clone())
            .ok_or_else(|| BerthError::NoSuchNetwork { id: name.to_string() })
    }

    async fn networks(&self) -> Vec<Network> {
        self.entries.read().await.iter().map(|e| e.network.clone()).collect()
    }

    #[instrument(skip(self, options))]
    async fn new_network(
        &self,
        driver: &str,
        name: &str,
        id: Option<&str>,
        options: NetworkOptions,
    ) -> Result<Network> {
        let mut entries = self.entries.write().await;

        let id = match id {
            Some(id) if !id.is_empty() => {
                if entries.iter().any(|e| e.network.id == id) {
                    return Err(BerthError::Internal(format!("network id {} already in use", id)));
                }
                id.to_string()
            }
            _ => generate_id(),
        };

        let scope = if driver == "overlay" { NetworkScope::Swarm } else { NetworkScope::Local };
        let ipam_driver = if options.ipam_driver.is_empty() {
            "default".to_string()
        } else {
            options.ipam_driver.clone()
        };
        let pools = options.ipam_v4.iter().chain(options.ipam_v6.iter()).map(to_pool).collect();

        let network = Network {
            id,
            name: name.to_string(),
            driver: driver.to_string(),
            scope,
            labels: options.labels,
            ipam: Ipam { driver: ipam_driver, options: options.ipam_options, config: pools },
            internal: options.internal,
            enable_ipv6: options.enable_ipv6,
            options: options.driver_opts,
            created_at: SystemTime::now(),
        };

        debug!(network_id = %network.id, "Recorded network");
        entries.push(Entry {
            network: network.clone(),
            dynamic: options.dynamic,
            persist: options.persist,
        });

        Ok(network)
    }

    #[instrument(skip(self))]
    async fn delete_network(&self, id: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.network.id != id);

        if entries.len() == before {
            return Err(BerthError::NoSuchNetwork { id: id.to_string() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_with_predefined_networks() {
        let controller = LocalController::default();

        let names: Vec<String> = controller.networks().await.into_iter().map(|n| n.name).collect();
        assert_eq!(names, vec!["bridge", "host", "none"]);

        let none = controller.network_by_name("none").await.unwrap();
        assert_eq!(none.driver, "null");
        assert_eq!(none.id.len(), 64);
    }

    #[tokio::test]
    async fn test_new_network_records_options() {
        let controller = LocalController::default();
        let mut options = NetworkOptions::default();
        options.labels.insert("team".to_string(), "blue".to_string());
        options.ipam_v6.push(IpamConf {
            preferred_pool: "fd00::/64".to_string(),
            ..Default::default()
        });
        options.ipam_v4.push(IpamConf {
            preferred_pool: "10.5.0.0/16".to_string(),
            ..Default::default()
        });
        options.enable_ipv6 = true;

        let network = controller.new_network("overlay", "app", None, options).await.unwrap();

        assert_eq!(network.scope, NetworkScope::Swarm);
        assert_eq!(network.ipam.driver, "default");
        assert_eq!(network.ipam.config[0].subnet, "10.5.0.0/16");
        assert_eq!(network.ipam.config[1].subnet, "fd00::/64");
        assert_eq!(network.labels.get("team").unwrap(), "blue");
        assert!(network.enable_ipv6);
    }

    #[tokio::test]
    async fn test_given_id_is_used_once() {
        let controller = LocalController::default();
        let opts = NetworkOptions { dynamic: true, persist: false, ..Default::default() };

        let network =
            controller.new_network("overlay", "ingress", Some("abc123"), opts.clone()).await.unwrap();
        assert_eq!(network.id, "abc123");
        assert!(controller.is_dynamic("abc123").await);
        assert!(!controller.persistent_networks().await.iter().any(|n| n.id == "abc123"));

        let err = controller.new_network("overlay", "again", Some("abc123"), opts).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_delete_network() {
        let controller = LocalController::default();
        let network = controller
            .new_network("bridge", "scratch", None, NetworkOptions::default())
            .await
            .unwrap();

        controller.delete_network(&network.id).await.unwrap();

        assert!(controller.network_by_name("scratch").await.unwrap_err().is_no_such_network());
        assert!(controller.delete_network(&network.id).await.unwrap_err().is_no_such_network());
    }
}
