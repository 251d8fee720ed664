//! Service and task records.
//!
//! berthd keeps the services it is given and one task per replica slot so
//! that clients can list them. Nothing is scheduled or started: tasks stay
//! in the `new` state on the local node.

use crate::metrics;
use berth_core::events::{Event, EventBus, EventType};
use berth_core::{
    BerthError, Filters, Node, Result, Service, ServiceSpec, Task, TaskState, TaskStatus,
};
use std::time::SystemTime;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Filter keys accepted by [`ServiceStore::list`].
const SERVICE_FILTERS: &[&str] = &["id", "label", "name"];

/// Filter keys accepted by [`ServiceStore::tasks`].
const TASK_FILTERS: &[&str] = &["desired-state", "label", "service"];

#[derive(Default)]
struct Records {
    services: Vec<Service>,
    tasks: Vec<Task>,
}

/// In-memory service and task store.
pub struct ServiceStore {
    node: Node,
    records: RwLock<Records>,
    events: EventBus,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn validate_filters(filters: &Filters, accepted: &[&str]) -> Result<()> {
    match filters.pairs().into_iter().find(|(key, _)| !accepted.contains(&key.as_str())) {
        Some((key, _)) => Err(BerthError::InvalidFilter { key }),
        None => Ok(()),
    }
}

fn validate_spec(spec: &ServiceSpec) -> Result<()> {
    if spec.name.is_empty() {
        return Err(BerthError::InvalidServiceSpec { reason: "name is required".to_string() });
    }
    if spec.image.is_empty() {
        return Err(BerthError::InvalidServiceSpec { reason: "image is required".to_string() });
    }
    Ok(())
}

/// Hostname of the machine berthd runs on.
pub fn local_hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

impl Records {
    fn find_service(&self, id_or_name: &str) -> Result<&Service> {
        if let Some(service) = self.services.iter().find(|s| s.id == id_or_name) {
            return Ok(service);
        }
        if let Some(service) = self.services.iter().find(|s| s.spec.name == id_or_name) {
            return Ok(service);
        }

        let mut prefixed = self.services.iter().filter(|s| s.id.starts_with(id_or_name));
        match (prefixed.next(), prefixed.next()) {
            (Some(service), None) if !id_or_name.is_empty() => Ok(service),
            _ => Err(BerthError::ServiceNotFound { id: id_or_name.to_string() }),
        }
    }

    fn new_task(service: &Service, slot: u64, node_id: &str, now: SystemTime) -> Task {
        Task {
            id: new_id(),
            service_id: service.id.clone(),
            slot,
            node_id: node_id.to_string(),
            image: service.spec.image.clone(),
            desired_state: TaskState::Running,
            status: TaskStatus { state: TaskState::New, timestamp: now, err: String::new() },
            created_at: now,
        }
    }

    /// Bring the tasks of `service` in line with its spec.
    ///
    /// A slot gets a fresh task when it has no live task or the live task runs
    /// another image; replaced and surplus tasks are shut down.
    fn reconcile_tasks(&mut self, service: &Service, node_id: &str) {
        let now = SystemTime::now();
        let replicas = service.spec.replicas;

        for task in self.tasks.iter_mut().filter(|t| t.service_id == service.id) {
            let live = task.desired_state == TaskState::Running;
            if live && (task.slot > replicas || task.image != service.spec.image) {
                task.desired_state = TaskState::Shutdown;
                task.status =
                    TaskStatus { state: TaskState::Shutdown, timestamp: now, err: String::new() };
            }
        }

        for slot in 1..=replicas {
            let has_live = self.tasks.iter().any(|t| {
                t.service_id == service.id
                    && t.slot == slot
                    && t.desired_state == TaskState::Running
            });
            if !has_live {
                self.tasks.push(Self::new_task(service, slot, node_id, now));
            }
        }
    }
}

impl ServiceStore {
    pub fn new(node: Node, events: EventBus) -> Self {
        info!(node_id = %node.id, hostname = %node.hostname, "Service store initialized");
        Self { node, records: RwLock::new(Records::default()), events }
    }

    /// Store backed by a node record for this host.
    pub fn for_local_node(events: EventBus) -> Self {
        let node = Node { id: new_id(), name: String::new(), hostname: local_hostname() };
        Self::new(node, events)
    }

    /// Create a service and its tasks. Returns the new service ID.
    #[instrument(skip(self, spec, registry_auth), fields(name = %spec.name))]
    pub async fn create(&self, spec: ServiceSpec, registry_auth: &str) -> Result<String> {
        validate_spec(&spec)?;

        let mut records = self.records.write().await;
        if records.services.iter().any(|s| s.spec.name == spec.name) {
            return Err(BerthError::ServiceNameConflict { name: spec.name });
        }

        debug!(with_registry_auth = !registry_auth.is_empty(), "Creating service");

        let service =
            Service { id: new_id(), version: 1, spec, created_at: SystemTime::now() };
        records.reconcile_tasks(&service, &self.node.id);
        records.services.push(service.clone());
        drop(records);

        metrics::record_service_created();
        self.events.publish(Event::new(EventType::ServiceCreated, &service.id, &service.spec.name));
        info!(service_id = %service.id, "Service created");

        Ok(service.id)
    }

    /// Replace the spec of service `id`, which must currently be at `version`.
    #[instrument(skip(self, spec, registry_auth))]
    pub async fn update(
        &self,
        id: &str,
        version: u64,
        spec: ServiceSpec,
        registry_auth: &str,
    ) -> Result<()> {
        validate_spec(&spec)?;

        let mut records = self.records.write().await;
        if records.services.iter().any(|s| s.id != id && s.spec.name == spec.name) {
            return Err(BerthError::ServiceNameConflict { name: spec.name });
        }

        let service = records
            .services
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| BerthError::ServiceNotFound { id: id.to_string() })?;

        if service.version != version {
            return Err(BerthError::ServiceVersionConflict {
                id: id.to_string(),
                expected: version,
                current: service.version,
            });
        }

        debug!(with_registry_auth = !registry_auth.is_empty(), "Updating service");

        service.version += 1;
        service.spec = spec;
        let service = service.clone();
        records.reconcile_tasks(&service, &self.node.id);
        drop(records);

        metrics::record_service_updated();
        self.events.publish(Event::new(EventType::ServiceUpdated, &service.id, &service.spec.name));
        info!(service_id = %service.id, version = service.version, "Service updated");

        Ok(())
    }

    /// Services matching `filters` (`id` prefix, `name` prefix, `label`).
    pub async fn list(&self, filters: &Filters) -> Result<Vec<Service>> {
        validate_filters(filters, SERVICE_FILTERS)?;

        let records = self.records.read().await;
        Ok(records
            .services
            .iter()
            .filter(|s| filters.match_kv_list("label", &s.spec.labels))
            .filter(|s| !filters.contains("id") || filters.get("id").any(|id| s.id.starts_with(id)))
            .filter(|s| {
                !filters.contains("name") || filters.get("name").any(|n| s.spec.name.starts_with(n))
            })
            .cloned()
            .collect())
    }

    /// Look up a service by ID, name or unique ID prefix.
    pub async fn inspect(&self, id_or_name: &str) -> Result<Service> {
        self.records.read().await.find_service(id_or_name).cloned()
    }

    /// Tasks matching `filters`.
    ///
    /// `service` takes IDs or names, `label` matches the owning service's
    /// labels and `desired-state` the task's desired state.
    pub async fn tasks(&self, filters: &Filters) -> Result<Vec<Task>> {
        validate_filters(filters, TASK_FILTERS)?;

        let records = self.records.read().await;
        let service_ids = filters
            .get("service")
            .map(|s| records.find_service(s).map(|service| service.id.clone()))
            .collect::<Result<Vec<_>>>()?;

        Ok(records
            .tasks
            .iter()
            .filter(|t| service_ids.is_empty() || service_ids.contains(&t.service_id))
            .filter(|t| filters.exact_match("desired-state", t.desired_state.as_str()))
            .filter(|t| {
                !filters.contains("label")
                    || records
                        .services
                        .iter()
                        .find(|s| s.id == t.service_id)
                        .map(|s| filters.match_kv_list("label", &s.spec.labels))
                        .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    /// Node record by ID.
    pub async fn node(&self, id: &str) -> Result<Node> {
        if id == self.node.id {
            Ok(self.node.clone())
        } else {
            Err(BerthError::NodeNotFound { id: id.to_string() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_core::stack::{stack_filter, stack_labels};

    fn store() -> ServiceStore {
        let node =
            Node { id: "node1".to_string(), name: String::new(), hostname: "h1".to_string() };
        ServiceStore::new(node, EventBus::new())
    }

    fn spec(name: &str, image: &str, replicas: u64) -> ServiceSpec {
        ServiceSpec {
            name: name.to_string(),
            image: image.to_string(),
            replicas,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_makes_one_task_per_slot() {
        let store = store();
        let id = store.create(spec("shop_web", "nginx:1", 3), "").await.unwrap();

        let tasks = store.tasks(&Filters::new().with("service", "shop_web")).await.unwrap();

        assert_eq!(tasks.len(), 3);
        let mut slots: Vec<u64> = tasks.iter().map(|t| t.slot).collect();
        slots.sort();
        assert_eq!(slots, vec![1, 2, 3]);
        assert!(tasks.iter().all(|t| t.service_id == id && t.node_id == "node1"));
        assert!(tasks.iter().all(|t| t.status.state == TaskState::New));
    }

    #[tokio::test]
    async fn test_duplicate_service_name() {
        let store = store();
        store.create(spec("web", "nginx:1", 1), "").await.unwrap();

        let err = store.create(spec("web", "nginx:2", 1), "").await.unwrap_err();
        assert!(matches!(err, BerthError::ServiceNameConflict { .. }));
    }

    #[tokio::test]
    async fn test_spec_requires_name_and_image() {
        let store = store();
        assert!(store.create(spec("", "nginx", 1), "").await.is_err());
        assert!(store.create(spec("web", "", 1), "").await.is_err());
    }

    #[tokio::test]
    async fn test_update_checks_version() {
        let store = store();
        let id = store.create(spec("web", "nginx:1", 1), "").await.unwrap();

        let err = store.update(&id, 7, spec("web", "nginx:2", 1), "").await.unwrap_err();
        assert!(matches!(err, BerthError::ServiceVersionConflict { current: 1, .. }));

        store.update(&id, 1, spec("web", "nginx:2", 1), "").await.unwrap();
        assert_eq!(store.inspect(&id).await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_update_image_replaces_tasks() {
        let store = store();
        let id = store.create(spec("web", "nginx:1", 2), "").await.unwrap();

        store.update(&id, 1, spec("web", "nginx:2", 1), "").await.unwrap();

        let tasks = store.tasks(&Filters::new().with("service", id.as_str())).await.unwrap();
        assert_eq!(tasks.len(), 3);

        let running = store
            .tasks(&Filters::new().with("service", id.as_str()).with("desired-state", "running"))
            .await
            .unwrap();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].slot, 1);
        assert_eq!(running[0].image, "nginx:2");
    }

    #[tokio::test]
    async fn test_list_by_stack_label() {
        let store = store();
        let mut web = spec("shop_web", "nginx", 1);
        web.labels = stack_labels("shop", None);
        store.create(web, "").await.unwrap();
        store.create(spec("blog_web", "nginx", 1), "").await.unwrap();

        let services = store.list(&stack_filter("shop")).await.unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].spec.name, "shop_web");

        let tasks = store.tasks(&stack_filter("shop")).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].service_id, services[0].id);
    }

    #[tokio::test]
    async fn test_inspect_by_prefix_and_name() {
        let store = store();
        let id = store.create(spec("web", "nginx", 1), "").await.unwrap();

        assert_eq!(store.inspect("web").await.unwrap().id, id);
        assert_eq!(store.inspect(&id[..6]).await.unwrap().id, id);
        assert!(store.inspect("").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_unknown_filter_rejected() {
        let store = store();
        let err = store.list(&Filters::new().with("color", "red")).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid filter 'color'");
    }

    #[tokio::test]
    async fn test_unknown_service_filter() {
        let store = store();
        let err = store.tasks(&Filters::new().with("service", "ghost")).await.unwrap_err();
        assert!(matches!(err, BerthError::ServiceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_node_lookup() {
        let store = store();
        assert_eq!(store.node("node1").await.unwrap().hostname, "h1");
        assert!(matches!(store.node("node2").await, Err(BerthError::NodeNotFound { .. })));
    }
}
