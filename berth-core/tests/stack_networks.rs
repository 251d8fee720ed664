//! Integration tests for bundle loading, stack naming and the local network
//! controller working together.
//!
//! These run entirely in-process and need no daemon.

use berth_core::network::{split_ipam_config, NetworkOptions};
use berth_core::stack::{scoped_name, stack_filter, stack_labels};
use berth_core::{Bundle, BerthError, IpamPool, LocalController, NetworkController};
use std::io::Write;

const BUNDLE: &str = r#"{
    "Version": "0.1",
    "Services": {
        "api": {"Image": "shop/api:2", "Networks": ["back", "front"]},
        "web": {"Image": "shop/web:1", "Networks": ["front"]},
        "worker": {"Image": "shop/worker:1"}
    }
}"#;

#[tokio::test]
async fn test_bundle_networks_become_stack_networks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.dab");
    std::fs::File::create(&path).unwrap().write_all(BUNDLE.as_bytes()).unwrap();

    let bundle = Bundle::load_file(&path).unwrap();
    let controller = LocalController::default();

    for name in bundle.network_names() {
        let options = NetworkOptions {
            ipam_driver: "default".to_string(),
            labels: stack_labels("shop", None),
            ..Default::default()
        };
        controller.new_network("overlay", &scoped_name("shop", &name), None, options).await.unwrap();
    }

    let filter = stack_filter("shop");
    let stack_networks: Vec<String> = controller
        .networks()
        .await
        .into_iter()
        .filter(|n| filter.match_kv_list("label", &n.labels))
        .map(|n| n.name)
        .collect();

    assert_eq!(stack_networks, vec!["shop_back", "shop_front"]);
}

#[tokio::test]
async fn test_invalid_bundle_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.dab");
    std::fs::write(&path, "{\"Services\": [").unwrap();

    match Bundle::load_file(&path) {
        Err(e @ BerthError::InvalidBundle { .. }) => {
            let message = e.to_string();
            let expected = format!("Error reading {}: JSON syntax error", path.display());
            assert!(message.starts_with(&expected), "{}", message);
        }
        other => panic!("expected InvalidBundle, got {:?}", other),
    }
}

#[tokio::test]
async fn test_split_pools_are_recorded_by_family() {
    let pools = vec![
        IpamPool { subnet: "fd12:3456::/64".to_string(), ..Default::default() },
        IpamPool {
            subnet: "172.28.0.0/16".to_string(),
            gateway: "172.28.0.1".to_string(),
            ..Default::default()
        },
    ];
    let (v4, v6) = split_ipam_config(&pools).unwrap();
    let controller = LocalController::default();

    let network = controller
        .new_network(
            "bridge",
            "dual",
            None,
            NetworkOptions { ipam_v4: v4, ipam_v6: v6, enable_ipv6: true, ..Default::default() },
        )
        .await
        .unwrap();

    // v4 pools are recorded first
    assert_eq!(network.ipam.config[0].subnet, "172.28.0.0/16");
    assert_eq!(network.ipam.config[0].gateway, "172.28.0.1");
    assert_eq!(network.ipam.config[1].subnet, "fd12:3456::/64");
}
