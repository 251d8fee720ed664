use berth_core::events::EventBus;
use berth_core::observability::health::HealthStatus;
use berth_core::{init_observability, Config, HealthChecker, LocalController, NetworkController};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

mod api;
mod metrics;
mod network_manager;
mod services;

use network_manager::NetworkManager;
use services::ServiceStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::load()?;

    // Initialize observability FIRST
    init_observability(&config.log_level)?;

    info!("berth daemon starting");

    if let Some(port) = config.metrics_port {
        metrics::install(port)?;
        info!(port, "Prometheus metrics exporter listening");
    }

    // Initialize health checker
    let health_checker = HealthChecker::new();
    let events = EventBus::new();

    // Log every event published by the subsystems
    let mut subscriber = events.subscribe(vec![]);
    tokio::spawn(async move {
        while let Some(event) = subscriber.recv().await {
            debug!(
                event_type = %event.event_type,
                resource_id = %event.resource_id,
                attributes = ?event.attributes,
                "Event"
            );
        }
    });

    let controller: Option<Arc<dyn NetworkController>> = if config.disable_networking {
        warn!("Networking disabled by configuration");
        health_checker
            .set("network", HealthStatus::Degraded, Some("networking disabled".to_string()))
            .await;
        None
    } else {
        health_checker.set("network", HealthStatus::Healthy, None).await;
        Some(Arc::new(LocalController::new(config.controller_config())))
    };

    let network_mgr = Arc::new(NetworkManager::new(controller, events.clone()));

    let ingress_id = match (&config.ingress_subnet, network_mgr.controller_enabled()) {
        (Some(subnet), true) => match network_mgr.create_ingress_network(subnet).await {
            Ok(id) => {
                info!(network_id = %id, subnet = %subnet, "Ingress network created");
                Some(id)
            }
            Err(e) => {
                error!("Failed to create ingress network: {}", e);
                health_checker
                    .set("network", HealthStatus::Degraded, Some(format!("ingress: {}", e)))
                    .await;
                None
            }
        },
        _ => None,
    };

    let services = Arc::new(ServiceStore::for_local_node(events.clone()));

    // Start gRPC API server
    let uds = api::bind_socket(Path::new(&config.socket_path))?;
    health_checker.set("api", HealthStatus::Healthy, None).await;

    let service = api::ManagerServiceImpl::new(network_mgr.clone(), services, health_checker);
    info!("gRPC server listening on {}", config.socket_path);
    info!("berth daemon ready");

    // Serve until shutdown signal
    api::serve(uds, service, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Received shutdown signal");
    })
    .await?;

    // Managed networks are not persisted
    if let Some(id) = ingress_id {
        if let Err(e) = network_mgr.delete_managed_network(&id).await {
            warn!("Failed to remove ingress network: {}", e);
        }
    }

    let _ = std::fs::remove_file(&config.socket_path);
    info!("berth daemon shutting down");
    Ok(())
}
