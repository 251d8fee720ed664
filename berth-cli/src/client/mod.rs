//! gRPC client for the berth daemon

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use berth_api::berth::v1::manager_service_client::ManagerServiceClient;
use berth_api::berth::v1::*;
use berth_core::{
    Filters, Network, NetworkCreate, NetworkCreateResponse, Node, Service, ServiceSpec, Task,
};
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;

#[cfg(test)]
pub mod fake;

/// Daemon health as reported by the Health call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthInfo {
    pub status: String,
    pub version: String,
    pub network_drivers: Vec<String>,
}

/// Operations the CLI needs from the manager.
#[async_trait]
pub trait ManagerApi: Send + Sync {
    async fn health(&self) -> Result<HealthInfo>;

    async fn network_list(&self, filters: &Filters) -> Result<Vec<Network>>;
    async fn network_inspect(&self, id: &str) -> Result<Network>;
    async fn network_create(&self, create: NetworkCreate) -> Result<NetworkCreateResponse>;
    async fn network_remove(&self, id: &str) -> Result<()>;

    async fn service_list(&self, filters: &Filters) -> Result<Vec<Service>>;
    async fn service_inspect(&self, id: &str) -> Result<Service>;
    async fn service_create(&self, spec: ServiceSpec, encoded_auth: &str) -> Result<String>;
    async fn service_update(
        &self,
        id: &str,
        version: u64,
        spec: ServiceSpec,
        encoded_auth: &str,
    ) -> Result<()>;

    async fn task_list(&self, filters: &Filters) -> Result<Vec<Task>>;
    async fn node_inspect(&self, id: &str) -> Result<Node>;
}

/// Surface the daemon's message verbatim.
fn api_error(status: tonic::Status) -> anyhow::Error {
    anyhow!("{}", status.message())
}

/// berth gRPC client
#[derive(Clone)]
pub struct BerthClient {
    client: ManagerServiceClient<Channel>,
}

impl BerthClient {
    /// Connect to the berth daemon via Unix socket
    pub async fn connect(socket_path: &str) -> Result<Self> {
        let socket_path = socket_path.to_string();

        // Create a dummy URI (required by tonic but not used for Unix sockets)
        let channel = Endpoint::try_from("http://[::]:50051")?
            .connect_with_connector(service_fn(move |_: Uri| {
                let socket_path = socket_path.clone();
                async move {
                    Ok::<_, std::io::Error>(TokioIo::new(UnixStream::connect(socket_path).await?))
                }
            }))
            .await
            .context("Failed to connect to berthd. Is the daemon running?")?;

        Ok(Self { client: ManagerServiceClient::new(channel) })
    }
}

#[async_trait]
impl ManagerApi for BerthClient {
    async fn health(&self) -> Result<HealthInfo> {
        let response = self.client.clone().health(HealthRequest {}).await.map_err(api_error)?;
        let health = response.into_inner();

        Ok(HealthInfo {
            status: health.status,
            version: health.version,
            network_drivers: health.network_drivers,
        })
    }

    async fn network_list(&self, filters: &Filters) -> Result<Vec<Network>> {
        let request = ListNetworksRequest { filters: filters.into() };

        let response = self.client.clone().list_networks(request).await.map_err(api_error)?;
        let networks = response
            .into_inner()
            .networks
            .into_iter()
            .map(Network::try_from)
            .collect::<berth_core::Result<Vec<_>>>()?;

        Ok(networks)
    }

    async fn network_inspect(&self, id: &str) -> Result<Network> {
        let request = InspectNetworkRequest { id: id.to_string() };

        let response = self.client.clone().inspect_network(request).await.map_err(api_error)?;
        let network = response
            .into_inner()
            .network
            .ok_or_else(|| anyhow!("No network in response"))?;

        Ok(Network::try_from(network)?)
    }

    async fn network_create(&self, create: NetworkCreate) -> Result<NetworkCreateResponse> {
        let request = CreateNetworkRequest::from(create);

        let response = self.client.clone().create_network(request).await.map_err(api_error)?;
        let resp = response.into_inner();

        Ok(NetworkCreateResponse { id: resp.id, warning: resp.warning })
    }

    async fn network_remove(&self, id: &str) -> Result<()> {
        let request = RemoveNetworkRequest { id: id.to_string() };

        self.client.clone().remove_network(request).await.map_err(api_error)?;
        Ok(())
    }

    async fn service_list(&self, filters: &Filters) -> Result<Vec<Service>> {
        let request = ListServicesRequest { filters: filters.into() };

        let response = self.client.clone().list_services(request).await.map_err(api_error)?;
        let services = response
            .into_inner()
            .services
            .into_iter()
            .map(Service::try_from)
            .collect::<berth_core::Result<Vec<_>>>()?;

        Ok(services)
    }

    async fn service_inspect(&self, id: &str) -> Result<Service> {
        let request = InspectServiceRequest { id: id.to_string() };

        let response = self.client.clone().inspect_service(request).await.map_err(api_error)?;
        let service = response
            .into_inner()
            .service
            .ok_or_else(|| anyhow!("No service in response"))?;

        Ok(Service::try_from(service)?)
    }

    async fn service_create(&self, spec: ServiceSpec, encoded_auth: &str) -> Result<String> {
        let request = CreateServiceRequest {
            spec: Some(spec.into()),
            encoded_registry_auth: encoded_auth.to_string(),
        };

        let response = self.client.clone().create_service(request).await.map_err(api_error)?;
        Ok(response.into_inner().id)
    }

    async fn service_update(
        &self,
        id: &str,
        version: u64,
        spec: ServiceSpec,
        encoded_auth: &str,
    ) -> Result<()> {
        let request = UpdateServiceRequest {
            id: id.to_string(),
            version,
            spec: Some(spec.into()),
            encoded_registry_auth: encoded_auth.to_string(),
        };

        self.client.clone().update_service(request).await.map_err(api_error)?;
        Ok(())
    }

    async fn task_list(&self, filters: &Filters) -> Result<Vec<Task>> {
        let request = ListTasksRequest { filters: filters.into() };

        let response = self.client.clone().list_tasks(request).await.map_err(api_error)?;
        let tasks = response
            .into_inner()
            .tasks
            .into_iter()
            .map(Task::try_from)
            .collect::<berth_core::Result<Vec<_>>>()?;

        Ok(tasks)
    }

    async fn node_inspect(&self, id: &str) -> Result<Node> {
        let request = InspectNodeRequest { id: id.to_string() };

        let response = self.client.clone().inspect_node(request).await.map_err(api_error)?;
        let node = response.into_inner().node.ok_or_else(|| anyhow!("No node in response"))?;

        Ok(Node::from(node))
    }
}
