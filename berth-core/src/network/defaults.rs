//! Pre-defined networks and controller defaults.
//!
//! This module is the single source of truth for the networks every daemon
//! starts with. They can be neither created nor removed through the API;
//! only cluster-managed (agent) operations may touch them.
//!
//! | Name      | Driver  |
//! |-----------|---------|
//! | `bridge`  | bridge  |
//! | `host`    | host    |
//! | `none`    | null    |
//!
//! `default` is an alias that resolves to the default network.

/// Name of the network containers join when none is given.
pub const DEFAULT_NETWORK: &str = "bridge";

/// Driver used when a create request leaves it empty.
pub const DEFAULT_DRIVER: &str = "bridge";

/// Networks created by the controller itself, as (name, driver).
pub const PREDEFINED_NETWORKS: &[(&str, &str)] =
    &[("bridge", "bridge"), ("host", "host"), ("none", "null")];

/// Names reserved in addition to [`PREDEFINED_NETWORKS`].
const RESERVED_ALIASES: &[&str] = &["default"];

/// Whether `name` is one of the reserved pre-defined networks.
pub fn is_predefined_network(name: &str) -> bool {
    PREDEFINED_NETWORKS.iter().any(|(n, _)| *n == name) || RESERVED_ALIASES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_names() {
        for name in ["bridge", "host", "none", "default"] {
            assert!(is_predefined_network(name), "{} should be pre-defined", name);
        }
    }

    #[test]
    fn test_user_names_are_not_predefined() {
        assert!(!is_predefined_network("web_front"));
        assert!(!is_predefined_network("Bridge"));
        assert!(!is_predefined_network(""));
    }
}
