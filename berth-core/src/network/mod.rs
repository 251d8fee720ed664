//! Network controller seam.
//!
//! The daemon never manages addresses or drivers itself. It talks to a
//! [`NetworkController`], which owns network state:
//! - lookup by name and enumeration
//! - creation with IPAM, driver and label options
//! - deletion
//!
//! [`LocalController`] is the in-process implementation berthd runs with.

pub mod controller;
pub mod defaults;
pub mod ipam;
pub mod local;

// Re-exports for commonly used types
pub use controller::{ControllerConfig, NetworkController, NetworkOptions};
pub use defaults::{is_predefined_network, DEFAULT_DRIVER, DEFAULT_NETWORK, PREDEFINED_NETWORKS};
pub use ipam::{parse_cidr, split_ipam_config, IpamConf};
pub use local::LocalController;
