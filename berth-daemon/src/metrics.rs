//! Daemon metrics definitions.
//!
//! Counters follow Prometheus naming conventions (`_total` suffix).

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `port` and describe the daemon metrics.
pub fn install(port: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    PrometheusBuilder::new().with_http_listener(([0, 0, 0, 0], port)).install()?;
    register_metrics();
    Ok(())
}

/// Register all daemon metrics with descriptions.
pub fn register_metrics() {
    describe_counter!("berth_network_created_total", "Networks created (by driver, mode)");
    describe_counter!("berth_network_removed_total", "Networks removed");
    describe_counter!(
        "berth_network_create_failures_total",
        "Rejected or failed network creations (by reason)"
    );
    describe_counter!("berth_service_created_total", "Services created");
    describe_counter!("berth_service_updated_total", "Services updated");
    describe_counter!("berth_api_requests_total", "API requests (by method)");
}

pub fn record_network_created(driver: &str, agent: bool) {
    let mode = if agent { "agent" } else { "local" };
    counter!("berth_network_created_total", "driver" => driver.to_string(), "mode" => mode)
        .increment(1);
}

pub fn record_network_removed() {
    counter!("berth_network_removed_total").increment(1);
}

pub fn record_network_create_failure(reason: &'static str) {
    counter!("berth_network_create_failures_total", "reason" => reason).increment(1);
}

pub fn record_service_created() {
    counter!("berth_service_created_total").increment(1);
}

pub fn record_service_updated() {
    counter!("berth_service_updated_total").increment(1);
}

pub fn record_api_request(method: &'static str) {
    counter!("berth_api_requests_total", "method" => method).increment(1);
}
