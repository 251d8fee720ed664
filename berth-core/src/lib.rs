//! Berth Core Library
//!
//! Shared types, traits, and utilities for the berth daemon and CLI.

pub mod bundle;
pub mod config;
pub mod error;
pub mod events;
pub mod network;
pub mod observability;
pub mod paths;
pub mod proto_convert;
pub mod stack;
pub mod types;

// Re-export commonly used items
pub use bundle::Bundle;
pub use config::Config;
pub use error::{BerthError, Result};
pub use network::{LocalController, NetworkController};
pub use observability::{health::HealthChecker, init as init_observability};
pub use types::{
    Filters, Ipam, IpamPool, Network, NetworkCreate, NetworkCreateResponse, Node, Service,
    ServiceSpec, Task, TaskState, TaskStatus,
};
