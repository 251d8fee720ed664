//! gRPC server implementation

use crate::metrics;
use crate::network_manager::NetworkManager;
use crate::services::ServiceStore;
use berth_api::berth::v1::manager_service_server::{ManagerService, ManagerServiceServer};
use berth_api::berth::v1::{self as proto, *};
use berth_core::{BerthError, Filters, HealthChecker, NetworkCreate, Result, ServiceSpec};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::net::UnixListener;
use tokio_stream::wrappers::UnixListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::{info, instrument, warn};

/// Map a domain error onto a gRPC status, keeping its message.
pub fn status_from(err: BerthError) -> Status {
    let message = err.to_string();
    match err {
        BerthError::NoSuchNetwork { .. }
        | BerthError::ServiceNotFound { .. }
        | BerthError::NodeNotFound { .. }
        | BerthError::BundleNotFound { .. } => Status::not_found(message),
        BerthError::InvalidId { .. }
        | BerthError::InvalidSubnet { .. }
        | BerthError::InvalidServiceSpec { .. }
        | BerthError::InvalidFilter { .. }
        | BerthError::InvalidBundle { .. }
        | BerthError::InvalidConfig { .. }
        | BerthError::ApiError { .. } => Status::invalid_argument(message),
        BerthError::Forbidden { .. } => Status::permission_denied(message),
        BerthError::NetworkNameConflict { .. } | BerthError::ServiceNameConflict { .. } => {
            Status::already_exists(message)
        }
        BerthError::ServiceVersionConflict { .. } | BerthError::NetworkingDisabled => {
            Status::failed_precondition(message)
        }
        BerthError::IoError { .. } | BerthError::Internal(_) | BerthError::Other(_) => {
            Status::internal(message)
        }
    }
}

/// gRPC service implementation
pub struct ManagerServiceImpl {
    network_mgr: Arc<NetworkManager>,
    services: Arc<ServiceStore>,
    health: HealthChecker,
}

impl ManagerServiceImpl {
    pub fn new(
        network_mgr: Arc<NetworkManager>,
        services: Arc<ServiceStore>,
        health: HealthChecker,
    ) -> Self {
        Self { network_mgr, services, health }
    }

    /// Every network a service attaches to must exist.
    async fn check_attachments(&self, spec: &ServiceSpec) -> Result<()> {
        if !self.network_mgr.controller_enabled() {
            return Ok(());
        }
        for attachment in &spec.networks {
            self.network_mgr.find_network(&attachment.target).await?;
        }
        Ok(())
    }
}

fn service_spec(spec: Option<proto::ServiceSpec>) -> std::result::Result<ServiceSpec, Status> {
    spec.ok_or_else(|| Status::invalid_argument("spec required"))?
        .try_into()
        .map_err(status_from)
}

#[tonic::async_trait]
impl ManagerService for ManagerServiceImpl {
    #[instrument(skip(self, _request))]
    async fn health(
        &self,
        _request: Request<HealthRequest>,
    ) -> std::result::Result<Response<HealthResponse>, Status> {
        metrics::record_api_request("Health");

        let report = self.health.report().await;
        let details = report
            .subsystems
            .iter()
            .map(|s| (s.name.clone(), s.status.to_string()))
            .collect();
        let network_drivers = self.network_mgr.network_driver_list().await.into_iter().collect();

        Ok(Response::new(HealthResponse {
            status: report.status.to_string(),
            version: report.version,
            details,
            network_drivers,
        }))
    }

    // =========================================================================
    // Network Operations
    // =========================================================================

    #[instrument(skip(self, request))]
    async fn list_networks(
        &self,
        request: Request<ListNetworksRequest>,
    ) -> std::result::Result<Response<ListNetworksResponse>, Status> {
        info!("gRPC: ListNetworks");
        metrics::record_api_request("ListNetworks");

        let filters = Filters::from(request.into_inner().filters);
        let networks = self.network_mgr.filter_networks(&filters).await.map_err(status_from)?;

        Ok(Response::new(ListNetworksResponse {
            networks: networks.into_iter().map(Into::into).collect(),
        }))
    }

    #[instrument(skip(self, request), fields(id = %request.get_ref().id))]
    async fn inspect_network(
        &self,
        request: Request<InspectNetworkRequest>,
    ) -> std::result::Result<Response<InspectNetworkResponse>, Status> {
        info!("gRPC: InspectNetwork");
        metrics::record_api_request("InspectNetwork");

        let network =
            self.network_mgr.find_network(&request.into_inner().id).await.map_err(status_from)?;

        Ok(Response::new(InspectNetworkResponse { network: Some(network.into()) }))
    }

    #[instrument(skip(self, request), fields(name = %request.get_ref().name))]
    async fn create_network(
        &self,
        request: Request<CreateNetworkRequest>,
    ) -> std::result::Result<Response<CreateNetworkResponse>, Status> {
        info!("gRPC: CreateNetwork");
        metrics::record_api_request("CreateNetwork");

        let create = NetworkCreate::from(request.into_inner());
        let resp = self.network_mgr.create_network(create).await.map_err(status_from)?;

        Ok(Response::new(CreateNetworkResponse { id: resp.id, warning: resp.warning }))
    }

    #[instrument(skip(self, request), fields(id = %request.get_ref().id))]
    async fn remove_network(
        &self,
        request: Request<RemoveNetworkRequest>,
    ) -> std::result::Result<Response<RemoveNetworkResponse>, Status> {
        info!("gRPC: RemoveNetwork");
        metrics::record_api_request("RemoveNetwork");

        self.network_mgr.delete_network(&request.into_inner().id).await.map_err(status_from)?;

        Ok(Response::new(RemoveNetworkResponse {}))
    }

    // =========================================================================
    // Service Operations
    // =========================================================================

    #[instrument(skip(self, request))]
    async fn list_services(
        &self,
        request: Request<ListServicesRequest>,
    ) -> std::result::Result<Response<ListServicesResponse>, Status> {
        info!("gRPC: ListServices");
        metrics::record_api_request("ListServices");

        let filters = Filters::from(request.into_inner().filters);
        let services = self.services.list(&filters).await.map_err(status_from)?;

        Ok(Response::new(ListServicesResponse {
            services: services.into_iter().map(Into::into).collect(),
        }))
    }

    #[instrument(skip(self, request), fields(id = %request.get_ref().id))]
    async fn inspect_service(
        &self,
        request: Request<InspectServiceRequest>,
    ) -> std::result::Result<Response<InspectServiceResponse>, Status> {
        metrics::record_api_request("InspectService");

        let service =
            self.services.inspect(&request.into_inner().id).await.map_err(status_from)?;

        Ok(Response::new(InspectServiceResponse { service: Some(service.into()) }))
    }

    #[instrument(skip(self, request))]
    async fn create_service(
        &self,
        request: Request<CreateServiceRequest>,
    ) -> std::result::Result<Response<CreateServiceResponse>, Status> {
        info!("gRPC: CreateService");
        metrics::record_api_request("CreateService");

        let req = request.into_inner();
        let spec = service_spec(req.spec)?;
        self.check_attachments(&spec).await.map_err(status_from)?;

        let id =
            self.services.create(spec, &req.encoded_registry_auth).await.map_err(status_from)?;

        Ok(Response::new(CreateServiceResponse { id }))
    }

    #[instrument(skip(self, request), fields(id = %request.get_ref().id))]
    async fn update_service(
        &self,
        request: Request<UpdateServiceRequest>,
    ) -> std::result::Result<Response<UpdateServiceResponse>, Status> {
        info!("gRPC: UpdateService");
        metrics::record_api_request("UpdateService");

        let req = request.into_inner();
        let spec = service_spec(req.spec)?;
        self.check_attachments(&spec).await.map_err(status_from)?;

        self.services
            .update(&req.id, req.version, spec, &req.encoded_registry_auth)
            .await
            .map_err(status_from)?;

        Ok(Response::new(UpdateServiceResponse {}))
    }

    // =========================================================================
    // Task and Node Operations
    // =========================================================================

    #[instrument(skip(self, request))]
    async fn list_tasks(
        &self,
        request: Request<ListTasksRequest>,
    ) -> std::result::Result<Response<ListTasksResponse>, Status> {
        metrics::record_api_request("ListTasks");

        let filters = Filters::from(request.into_inner().filters);
        let tasks = self.services.tasks(&filters).await.map_err(status_from)?;

        Ok(Response::new(ListTasksResponse { tasks: tasks.into_iter().map(Into::into).collect() }))
    }

    #[instrument(skip(self, request), fields(id = %request.get_ref().id))]
    async fn inspect_node(
        &self,
        request: Request<InspectNodeRequest>,
    ) -> std::result::Result<Response<InspectNodeResponse>, Status> {
        metrics::record_api_request("InspectNode");

        let node = self.services.node(&request.into_inner().id).await.map_err(status_from)?;

        Ok(Response::new(InspectNodeResponse { node: Some(node.into()) }))
    }
}

/// Bind the API socket, replacing a stale one.
pub fn bind_socket(socket_path: &Path) -> Result<UnixListener> {
    if socket_path.exists() {
        warn!("Removing stale socket {}", socket_path.display());
        std::fs::remove_file(socket_path)
            .map_err(|e| BerthError::IoError { path: socket_path.to_path_buf(), source: e })?;
    }

    let uds = UnixListener::bind(socket_path)
        .map_err(|e| BerthError::Internal(format!("Failed to bind socket: {}", e)))?;

    // Owner and group only
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o660))
        .map_err(|e| BerthError::Internal(format!("Failed to set socket permissions: {}", e)))?;

    Ok(uds)
}

/// Serve the manager API on `uds` until `shutdown` resolves.
#[instrument(skip_all)]
pub async fn serve(
    uds: UnixListener,
    service: ManagerServiceImpl,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let uds_stream = UnixListenerStream::new(uds);

    Server::builder()
        .add_service(ManagerServiceServer::new(service))
        .serve_with_incoming_shutdown(uds_stream, shutdown)
        .await
        .map_err(|e| BerthError::Internal(format!("Server error: {}", e)))?;

    info!("gRPC server stopped");
    Ok(())
}
