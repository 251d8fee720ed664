//! Core domain types for berth.

pub mod filters;
pub mod network;
pub mod service;
pub mod task;

// Re-exports
pub use filters::Filters;
pub use network::{
    short_id, Ipam, IpamPool, Network, NetworkCreate, NetworkCreateResponse, NetworkScope,
};
pub use service::{NetworkAttachment, PortConfig, Protocol, Service, ServiceSpec};
pub use task::{Node, Task, TaskState, TaskStatus};
