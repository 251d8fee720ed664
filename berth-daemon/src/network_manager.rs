//! Network subsystem coordinator for the berth daemon.
//!
//! The manager resolves names and ID prefixes to networks, guards the
//! pre-defined networks, and turns API create requests into controller
//! calls. Drivers and address management stay inside the controller.

use crate::metrics;
use berth_core::events::{Event, EventBus, EventType};
use berth_core::network::local::generate_id;
use berth_core::network::{is_predefined_network, split_ipam_config, NetworkOptions};
use berth_core::{
    BerthError, Filters, IpamPool, Network, NetworkController, NetworkCreate,
    NetworkCreateResponse, Result,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Driver always reported as available, whether or not a network uses it.
const OVERLAY_DRIVER: &str = "overlay";

/// Name of the cluster-managed routing network.
pub const INGRESS_NETWORK: &str = "ingress";

/// Label marking the ingress network.
const INGRESS_LABEL: &str = "com.berth.network.ingress";

/// Filter keys accepted by [`NetworkManager::filter_networks`].
const NETWORK_FILTERS: &[&str] = &["driver", "id", "label", "name"];

/// Network manager wraps the network controller.
///
/// The controller is optional: on platforms without networking the daemon
/// runs without one and every lookup reports that no network exists.
pub struct NetworkManager {
    controller: Option<Arc<dyn NetworkController>>,
    events: EventBus,
}

impl NetworkManager {
    pub fn new(controller: Option<Arc<dyn NetworkController>>, events: EventBus) -> Self {
        info!(enabled = controller.is_some(), "Network manager initialized");
        Self { controller, events }
    }

    /// Whether a network controller is configured.
    pub fn controller_enabled(&self) -> bool {
        self.controller.is_some()
    }

    fn controller(&self) -> Result<&Arc<dyn NetworkController>> {
        self.controller.as_ref().ok_or(BerthError::NetworkingDisabled)
    }

    /// Find a network by name, falling back to an ID prefix.
    ///
    /// Only a "no such network" result from the name lookup moves on to the
    /// ID lookup; other errors are returned as-is.
    #[instrument(skip(self))]
    pub async fn find_network(&self, id_or_name: &str) -> Result<Network> {
        match self.get_network_by_name(id_or_name).await {
            Ok(network) => Ok(network),
            Err(e) if e.is_no_such_network() => self.get_network_by_id(id_or_name).await,
            Err(e) => Err(e),
        }
    }

    /// The single network whose ID starts with `partial_id`.
    ///
    /// Fails with `NoSuchNetwork` when nothing matches and `InvalidId` when
    /// the prefix is ambiguous.
    #[instrument(skip(self))]
    pub async fn get_network_by_id(&self, partial_id: &str) -> Result<Network> {
        let mut matches = self.get_networks_by_id(partial_id).await;

        match matches.len() {
            0 => Err(BerthError::NoSuchNetwork { id: partial_id.to_string() }),
            1 => Ok(matches.remove(0)),
            _ => Err(BerthError::InvalidId { id: partial_id.to_string() }),
        }
    }

    /// Look up a network by exact name; the empty name means the default network.
    #[instrument(skip(self))]
    pub async fn get_network_by_name(&self, name: &str) -> Result<Network> {
        let Some(controller) = self.controller.as_ref() else {
            return Err(BerthError::NoSuchNetwork { id: name.to_string() });
        };

        let name =
            if name.is_empty() { controller.config().default_network.as_str() } else { name };
        controller.network_by_name(name).await
    }

    /// Every network whose ID starts with `partial_id`.
    pub async fn get_networks_by_id(&self, partial_id: &str) -> Vec<Network> {
        match &self.controller {
            Some(controller) => controller
                .networks()
                .await
                .into_iter()
                .filter(|n| n.id.starts_with(partial_id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// All networks.
    pub async fn get_networks(&self) -> Vec<Network> {
        match &self.controller {
            Some(controller) => controller.networks().await,
            None => Vec::new(),
        }
    }

    /// Networks matching `filters`.
    ///
    /// `name` matches substrings, `id` prefixes, `driver` exact values and
    /// `label` the network labels.
    pub async fn filter_networks(&self, filters: &Filters) -> Result<Vec<Network>> {
        if let Some((key, _)) =
            filters.pairs().into_iter().find(|(key, _)| !NETWORK_FILTERS.contains(&key.as_str()))
        {
            return Err(BerthError::InvalidFilter { key });
        }

        Ok(self
            .get_networks()
            .await
            .into_iter()
            .filter(|n| filters.exact_match("driver", &n.driver))
            .filter(|n| filters.match_kv_list("label", &n.labels))
            .filter(|n| !filters.contains("id") || filters.get("id").any(|id| n.id.starts_with(id)))
            .filter(|n| {
                !filters.contains("name") || filters.get("name").any(|name| n.name.contains(name))
            })
            .collect())
    }

    /// Create a network on behalf of an API user.
    pub async fn create_network(&self, create: NetworkCreate) -> Result<NetworkCreateResponse> {
        self.create(create, None, false).await
    }

    /// Create a cluster-managed network with a caller-chosen ID.
    ///
    /// Managed networks are dynamic and not persisted by the controller, and
    /// may reuse pre-defined names.
    pub async fn create_managed_network(
        &self,
        create: NetworkCreate,
        id: &str,
    ) -> Result<NetworkCreateResponse> {
        self.create(create, Some(id), true).await
    }

    /// Create the ingress overlay network on `subnet` as a managed network.
    ///
    /// Returns its ID so the daemon can remove it again on shutdown.
    pub async fn create_ingress_network(&self, subnet: &str) -> Result<String> {
        let mut create = NetworkCreate {
            name: INGRESS_NETWORK.to_string(),
            check_duplicate: true,
            driver: OVERLAY_DRIVER.to_string(),
            ..Default::default()
        };
        create.ipam.driver = "default".to_string();
        create.ipam.config.push(IpamPool { subnet: subnet.to_string(), ..Default::default() });
        create.labels.insert(INGRESS_LABEL.to_string(), "true".to_string());

        let id = generate_id();
        self.create_managed_network(create, &id).await?;
        Ok(id)
    }

    #[instrument(skip(self, create), fields(name = %create.name))]
    async fn create(
        &self,
        create: NetworkCreate,
        id: Option<&str>,
        agent: bool,
    ) -> Result<NetworkCreateResponse> {
        if is_predefined_network(&create.name) && !agent {
            metrics::record_network_create_failure("predefined");
            return Err(BerthError::forbidden(format!(
                "{} is a pre-defined network and cannot be created",
                create.name
            )));
        }

        let mut warning = String::new();
        match self.get_network_by_name(&create.name).await {
            Ok(existing) => {
                if create.check_duplicate {
                    metrics::record_network_create_failure("duplicate");
                    return Err(BerthError::NetworkNameConflict { name: create.name });
                }
                warning = format!(
                    "Network with name {} (id : {}) already exists",
                    existing.name, existing.id
                );
                warn!("{}", warning);
            }
            Err(e) if e.is_no_such_network() => {}
            Err(e) => return Err(e),
        }

        let controller = self.controller()?;
        let driver = if create.driver.is_empty() {
            controller.config().default_driver.clone()
        } else {
            create.driver
        };

        let (ipam_v4, ipam_v6) = split_ipam_config(&create.ipam.config).inspect_err(|_| {
            metrics::record_network_create_failure("ipam");
        })?;

        let options = NetworkOptions {
            ipam_driver: create.ipam.driver,
            ipam_v4,
            ipam_v6,
            ipam_options: create.ipam.options,
            enable_ipv6: create.enable_ipv6,
            driver_opts: create.options,
            labels: create.labels,
            internal: create.internal,
            dynamic: agent,
            persist: !agent,
        };

        let network = controller.new_network(&driver, &create.name, id, options).await?;

        metrics::record_network_created(&network.driver, agent);
        self.log_network_event(&network, EventType::NetworkCreated);

        Ok(NetworkCreateResponse { id: network.id, warning })
    }

    /// Remove a network by name or ID prefix. Pre-defined networks are refused.
    pub async fn delete_network(&self, id_or_name: &str) -> Result<()> {
        self.delete(id_or_name, false).await
    }

    /// Remove a cluster-managed network.
    pub async fn delete_managed_network(&self, id: &str) -> Result<()> {
        self.delete(id, true).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id_or_name: &str, dynamic: bool) -> Result<()> {
        let network = self.find_network(id_or_name).await?;

        if is_predefined_network(&network.name) && !dynamic {
            return Err(BerthError::forbidden(format!(
                "{} is a pre-defined network and cannot be removed",
                network.name
            )));
        }

        self.controller()?.delete_network(&network.id).await?;

        metrics::record_network_removed();
        self.log_network_event(&network, EventType::NetworkDestroyed);
        Ok(())
    }

    /// Drivers of existing networks, plus overlay.
    ///
    /// Empty when networking is disabled.
    pub async fn network_driver_list(&self) -> BTreeSet<String> {
        let Some(controller) = self.controller.as_ref() else {
            return BTreeSet::new();
        };

        let mut drivers: BTreeSet<String> =
            controller.networks().await.into_iter().map(|n| n.driver).collect();
        drivers.insert(OVERLAY_DRIVER.to_string());
        drivers
    }

    fn log_network_event(&self, network: &Network, event_type: EventType) {
        info!(
            network_id = %network.id,
            name = %network.name,
            driver = %network.driver,
            "{}",
            event_type.as_str()
        );
        self.events.publish(
            Event::new(event_type, &network.id, &network.name)
                .with_attribute("type", &network.driver),
        );
    }
}
