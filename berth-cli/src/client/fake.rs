//! In-memory manager used by command tests.

use super::{HealthInfo, ManagerApi};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use berth_core::types::NetworkScope;
use berth_core::{
    Filters, Network, NetworkCreate, NetworkCreateResponse, Node, Service, ServiceSpec, Task,
};
use std::sync::Mutex;
use std::time::SystemTime;

#[derive(Default)]
struct State {
    networks: Vec<Network>,
    services: Vec<Service>,
    tasks: Vec<Task>,
    nodes: Vec<Node>,
    calls: Vec<String>,
    next_id: u64,
    network_create_error: Option<String>,
}

#[derive(Default)]
pub struct FakeManager {
    state: Mutex<State>,
}

impl FakeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_network(self, network: Network) -> Self {
        self.state.lock().unwrap().networks.push(network);
        self
    }

    pub fn with_service(self, service: Service) -> Self {
        self.state.lock().unwrap().services.push(service);
        self
    }

    pub fn with_task(self, task: Task) -> Self {
        self.state.lock().unwrap().tasks.push(task);
        self
    }

    pub fn with_node(self, node: Node) -> Self {
        self.state.lock().unwrap().nodes.push(node);
        self
    }

    /// Make every network creation fail with `message`.
    pub fn fail_network_create(self, message: &str) -> Self {
        self.state.lock().unwrap().network_create_error = Some(message.to_string());
        self
    }

    /// Calls made so far, as `"<method> <argument>"`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        let prefix = format!("{} ", method);
        self.calls().iter().filter(|c| c.starts_with(&prefix)).count()
    }

    pub fn networks(&self) -> Vec<Network> {
        self.state.lock().unwrap().networks.clone()
    }

    pub fn services(&self) -> Vec<Service> {
        self.state.lock().unwrap().services.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

pub fn network(id: &str, name: &str) -> Network {
    Network {
        id: id.to_string(),
        name: name.to_string(),
        driver: "overlay".to_string(),
        scope: NetworkScope::Swarm,
        labels: Default::default(),
        ipam: Default::default(),
        internal: false,
        enable_ipv6: false,
        options: Default::default(),
        created_at: SystemTime::UNIX_EPOCH,
    }
}

pub fn service(id: &str, spec: ServiceSpec) -> Service {
    Service { id: id.to_string(), version: 1, spec, created_at: SystemTime::UNIX_EPOCH }
}

#[async_trait]
impl ManagerApi for FakeManager {
    async fn health(&self) -> Result<HealthInfo> {
        self.record("health ".to_string());
        Ok(HealthInfo {
            status: "healthy".to_string(),
            version: "test".to_string(),
            network_drivers: vec!["bridge".to_string(), "overlay".to_string()],
        })
    }

    async fn network_list(&self, filters: &Filters) -> Result<Vec<Network>> {
        self.record("network_list ".to_string());
        let state = self.state.lock().unwrap();
        Ok(state
            .networks
            .iter()
            .filter(|n| filters.match_kv_list("label", &n.labels))
            .cloned()
            .collect())
    }

    async fn network_inspect(&self, id: &str) -> Result<Network> {
        self.record(format!("network_inspect {}", id));
        let state = self.state.lock().unwrap();
        state
            .networks
            .iter()
            .find(|n| n.id == id || n.name == id)
            .cloned()
            .ok_or_else(|| anyhow!("network {} not found", id))
    }

    async fn network_create(&self, create: NetworkCreate) -> Result<NetworkCreateResponse> {
        self.record(format!("network_create {}", create.name));
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.network_create_error {
            return Err(anyhow!("{}", message));
        }
        state.next_id += 1;
        let id = format!("net{}", state.next_id);

        let mut created = network(&id, &create.name);
        created.driver = create.driver;
        created.labels = create.labels;
        created.ipam = create.ipam;
        created.internal = create.internal;
        created.enable_ipv6 = create.enable_ipv6;
        created.options = create.options;
        state.networks.push(created);

        Ok(NetworkCreateResponse { id, warning: String::new() })
    }

    async fn network_remove(&self, id: &str) -> Result<()> {
        self.record(format!("network_remove {}", id));
        let mut state = self.state.lock().unwrap();
        let before = state.networks.len();
        state.networks.retain(|n| n.id != id && n.name != id);
        if state.networks.len() == before {
            return Err(anyhow!("network {} not found", id));
        }
        Ok(())
    }

    async fn service_list(&self, filters: &Filters) -> Result<Vec<Service>> {
        self.record("service_list ".to_string());
        let state = self.state.lock().unwrap();
        Ok(state
            .services
            .iter()
            .filter(|s| filters.match_kv_list("label", &s.spec.labels))
            .cloned()
            .collect())
    }

    async fn service_inspect(&self, id: &str) -> Result<Service> {
        self.record(format!("service_inspect {}", id));
        let state = self.state.lock().unwrap();
        state
            .services
            .iter()
            .find(|s| s.id == id || s.spec.name == id)
            .cloned()
            .ok_or_else(|| anyhow!("service {} not found", id))
    }

    async fn service_create(&self, spec: ServiceSpec, encoded_auth: &str) -> Result<String> {
        self.record(format!("service_create {} auth={}", spec.name, !encoded_auth.is_empty()));
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("svc{}", state.next_id);
        state.services.push(service(&id, spec));
        Ok(id)
    }

    async fn service_update(
        &self,
        id: &str,
        version: u64,
        spec: ServiceSpec,
        encoded_auth: &str,
    ) -> Result<()> {
        self.record(format!("service_update {} auth={}", id, !encoded_auth.is_empty()));
        let mut state = self.state.lock().unwrap();
        let existing = state
            .services
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| anyhow!("service {} not found", id))?;
        if existing.version != version {
            return Err(anyhow!("update out of sequence"));
        }
        existing.version += 1;
        existing.spec = spec;
        Ok(())
    }

    async fn task_list(&self, filters: &Filters) -> Result<Vec<Task>> {
        self.record("task_list ".to_string());
        let state = self.state.lock().unwrap();
        let labels_of = |task: &Task| {
            state
                .services
                .iter()
                .find(|s| s.id == task.service_id)
                .map(|s| s.spec.labels.clone())
                .unwrap_or_default()
        };
        Ok(state
            .tasks
            .iter()
            .filter(|t| filters.exact_match("service", &t.service_id))
            .filter(|t| filters.exact_match("desired-state", t.desired_state.as_str()))
            .filter(|t| filters.match_kv_list("label", &labels_of(t)))
            .cloned()
            .collect())
    }

    async fn node_inspect(&self, id: &str) -> Result<Node> {
        self.record(format!("node_inspect {}", id));
        let state = self.state.lock().unwrap();
        state
            .nodes
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("node {} not found", id))
    }
}
