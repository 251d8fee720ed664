//! Turn node and service IDs into display names.

use crate::client::ManagerApi;
use std::collections::HashMap;
use tracing::debug;

/// Kind of object an ID refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveKind {
    Node,
    Service,
}

/// Resolves IDs to names, remembering every answer by ID.
///
/// Lookup failures are not errors: the ID itself is shown instead.
pub struct IdResolver<'a> {
    client: &'a dyn ManagerApi,
    no_resolve: bool,
    cache: HashMap<String, String>,
}

impl<'a> IdResolver<'a> {
    pub fn new(client: &'a dyn ManagerApi, no_resolve: bool) -> Self {
        Self { client, no_resolve, cache: HashMap::new() }
    }

    pub async fn resolve(&mut self, kind: ResolveKind, id: &str) -> String {
        if self.no_resolve {
            return id.to_string();
        }

        if let Some(name) = self.cache.get(id) {
            return name.clone();
        }

        let name = self.lookup(kind, id).await;
        self.cache.insert(id.to_string(), name.clone());
        name
    }

    async fn lookup(&self, kind: ResolveKind, id: &str) -> String {
        match kind {
            ResolveKind::Node => match self.client.node_inspect(id).await {
                Ok(node) if !node.name.is_empty() => node.name,
                Ok(node) if !node.hostname.is_empty() => node.hostname,
                Ok(_) => id.to_string(),
                Err(e) => {
                    debug!(node_id = %id, "Node lookup failed: {}", e);
                    id.to_string()
                }
            },
            ResolveKind::Service => match self.client.service_inspect(id).await {
                Ok(service) => service.spec.name,
                Err(e) => {
                    debug!(service_id = %id, "Service lookup failed: {}", e);
                    id.to_string()
                }
            },
        }
    }
}
