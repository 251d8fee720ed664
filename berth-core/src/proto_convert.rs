//! Type conversions between domain types and protobuf types.

use crate::error::{BerthError, Result};
use crate::types::{
    Filters, Ipam, IpamPool, Network, NetworkAttachment, NetworkCreate, NetworkScope, Node,
    PortConfig, Protocol, Service, ServiceSpec, Task, TaskState, TaskStatus,
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Re-export proto types for convenience
pub use berth_api::berth::v1;

/// Milliseconds since the Unix epoch (0 for times before it).
pub fn to_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0)
}

/// Inverse of [`to_millis`]; negative values clamp to the epoch.
pub fn from_millis(millis: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(millis.max(0) as u64)
}

fn parse_state(value: &str) -> Result<TaskState> {
    value.parse::<TaskState>().map_err(|reason| BerthError::ApiError { message: reason })
}

// ============================================================================
// Filters
// ============================================================================

impl From<&Filters> for Vec<v1::Filter> {
    fn from(filters: &Filters) -> Self {
        filters.pairs().into_iter().map(|(key, value)| v1::Filter { key, value }).collect()
    }
}

impl From<Vec<v1::Filter>> for Filters {
    fn from(filters: Vec<v1::Filter>) -> Self {
        filters.into_iter().map(|f| (f.key, f.value)).collect()
    }
}

// ============================================================================
// Network Conversions
// ============================================================================

impl From<IpamPool> for v1::IpamPool {
    fn from(pool: IpamPool) -> Self {
        Self {
            subnet: pool.subnet,
            ip_range: pool.ip_range,
            gateway: pool.gateway,
            aux_addresses: pool.aux_addresses,
        }
    }
}

impl From<v1::IpamPool> for IpamPool {
    fn from(pool: v1::IpamPool) -> Self {
        Self {
            subnet: pool.subnet,
            ip_range: pool.ip_range,
            gateway: pool.gateway,
            aux_addresses: pool.aux_addresses,
        }
    }
}

impl From<Ipam> for v1::Ipam {
    fn from(ipam: Ipam) -> Self {
        Self {
            driver: ipam.driver,
            options: ipam.options,
            config: ipam.config.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<v1::Ipam> for Ipam {
    fn from(ipam: v1::Ipam) -> Self {
        Self {
            driver: ipam.driver,
            options: ipam.options,
            config: ipam.config.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Network> for v1::Network {
    fn from(network: Network) -> Self {
        Self {
            id: network.id,
            name: network.name,
            driver: network.driver,
            scope: network.scope.to_string(),
            labels: network.labels,
            ipam: Some(network.ipam.into()),
            internal: network.internal,
            enable_ipv6: network.enable_ipv6,
            options: network.options,
            created_at: to_millis(network.created_at),
        }
    }
}

impl TryFrom<v1::Network> for Network {
    type Error = BerthError;

    fn try_from(proto: v1::Network) -> Result<Self> {
        let scope =
            proto.scope.parse::<NetworkScope>().map_err(|reason| BerthError::ApiError { message: reason })?;

        Ok(Self {
            id: proto.id,
            name: proto.name,
            driver: proto.driver,
            scope,
            labels: proto.labels,
            ipam: proto.ipam.map(Into::into).unwrap_or_default(),
            internal: proto.internal,
            enable_ipv6: proto.enable_ipv6,
            options: proto.options,
            created_at: from_millis(proto.created_at),
        })
    }
}

impl From<NetworkCreate> for v1::CreateNetworkRequest {
    fn from(create: NetworkCreate) -> Self {
        Self {
            name: create.name,
            check_duplicate: create.check_duplicate,
            driver: create.driver,
            ipam: Some(create.ipam.into()),
            enable_ipv6: create.enable_ipv6,
            options: create.options,
            labels: create.labels,
            internal: create.internal,
        }
    }
}

impl From<v1::CreateNetworkRequest> for NetworkCreate {
    fn from(req: v1::CreateNetworkRequest) -> Self {
        Self {
            name: req.name,
            check_duplicate: req.check_duplicate,
            driver: req.driver,
            ipam: req.ipam.map(Into::into).unwrap_or_default(),
            enable_ipv6: req.enable_ipv6,
            options: req.options,
            labels: req.labels,
            internal: req.internal,
        }
    }
}

// ============================================================================
// Service Conversions
// ============================================================================

impl From<ServiceSpec> for v1::ServiceSpec {
    fn from(spec: ServiceSpec) -> Self {
        Self {
            name: spec.name,
            labels: spec.labels,
            image: spec.image,
            command: spec.command,
            args: spec.args,
            env: spec.env,
            container_labels: spec.container_labels,
            working_dir: spec.working_dir,
            user: spec.user,
            networks: spec
                .networks
                .into_iter()
                .map(|n| v1::NetworkAttachment { target: n.target, aliases: n.aliases })
                .collect(),
            ports: spec
                .ports
                .into_iter()
                .map(|p| v1::PortConfig {
                    protocol: p.protocol.to_string(),
                    target_port: p.target_port,
                    published_port: p.published_port,
                })
                .collect(),
            replicas: spec.replicas,
        }
    }
}

impl TryFrom<v1::ServiceSpec> for ServiceSpec {
    type Error = BerthError;

    fn try_from(proto: v1::ServiceSpec) -> Result<Self> {
        let ports = proto
            .ports
            .into_iter()
            .map(|p| -> Result<PortConfig> {
                let protocol = p
                    .protocol
                    .parse::<Protocol>()
                    .map_err(|reason| BerthError::ApiError { message: reason })?;
                Ok(PortConfig {
                    protocol,
                    target_port: p.target_port,
                    published_port: p.published_port,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: proto.name,
            labels: proto.labels,
            image: proto.image,
            command: proto.command,
            args: proto.args,
            env: proto.env,
            container_labels: proto.container_labels,
            working_dir: proto.working_dir,
            user: proto.user,
            networks: proto
                .networks
                .into_iter()
                .map(|n| NetworkAttachment { target: n.target, aliases: n.aliases })
                .collect(),
            ports,
            replicas: proto.replicas,
        })
    }
}

impl From<Service> for v1::Service {
    fn from(service: Service) -> Self {
        Self {
            id: service.id,
            version: service.version,
            spec: Some(service.spec.into()),
            created_at: to_millis(service.created_at),
        }
    }
}

impl TryFrom<v1::Service> for Service {
    type Error = BerthError;

    fn try_from(proto: v1::Service) -> Result<Self> {
        let spec = proto
            .spec
            .ok_or_else(|| BerthError::ApiError { message: "Missing service spec".to_string() })?
            .try_into()?;

        Ok(Self {
            id: proto.id,
            version: proto.version,
            spec,
            created_at: from_millis(proto.created_at),
        })
    }
}

// ============================================================================
// Task and Node Conversions
// ============================================================================

impl From<Task> for v1::Task {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            service_id: task.service_id,
            slot: task.slot,
            node_id: task.node_id,
            image: task.image,
            desired_state: task.desired_state.to_string(),
            status: Some(v1::TaskStatus {
                state: task.status.state.to_string(),
                timestamp: to_millis(task.status.timestamp),
                err: task.status.err,
            }),
            created_at: to_millis(task.created_at),
        }
    }
}

impl TryFrom<v1::Task> for Task {
    type Error = BerthError;

    fn try_from(proto: v1::Task) -> Result<Self> {
        let status = proto
            .status
            .ok_or_else(|| BerthError::ApiError { message: "Missing task status".to_string() })?;

        Ok(Self {
            id: proto.id,
            service_id: proto.service_id,
            slot: proto.slot,
            node_id: proto.node_id,
            image: proto.image,
            desired_state: parse_state(&proto.desired_state)?,
            status: TaskStatus {
                state: parse_state(&status.state)?,
                timestamp: from_millis(status.timestamp),
                err: status.err,
            },
            created_at: from_millis(proto.created_at),
        })
    }
}

impl From<Node> for v1::Node {
    fn from(node: Node) -> Self {
        Self { id: node.id, name: node.name, hostname: node.hostname }
    }
}

impl From<v1::Node> for Node {
    fn from(node: v1::Node) -> Self {
        Self { id: node.id, name: node.name, hostname: node.hostname }
    }
}
