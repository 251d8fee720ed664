//! Network management commands.
//!
//! - berth network ls
//! - berth network create
//! - berth network rm
//! - berth network inspect

use crate::client::ManagerApi;
use anyhow::{bail, Result};
use berth_core::{Filters, Ipam, IpamPool, Network, NetworkCreate};
use colored::Colorize;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::time::UNIX_EPOCH;
use tabled::{Table, Tabled};

/// List networks
pub async fn ls(client: &dyn ManagerApi, filters: &Filters, out: &mut dyn Write) -> Result<()> {
    let networks = client.network_list(filters).await?;

    if networks.is_empty() {
        writeln!(out, "No networks found.")?;
        return Ok(());
    }

    #[derive(Tabled)]
    struct NetworkRow {
        #[tabled(rename = "NETWORK ID")]
        id: String,
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "DRIVER")]
        driver: String,
        #[tabled(rename = "SCOPE")]
        scope: String,
    }

    let rows: Vec<NetworkRow> = networks
        .into_iter()
        .map(|n| NetworkRow {
            id: n.short_id().to_string(),
            name: n.name,
            driver: n.driver,
            scope: n.scope.to_string(),
        })
        .collect();

    let table = Table::new(rows).to_string();
    writeln!(out, "{}", table)?;

    Ok(())
}

#[derive(Debug, Default)]
pub struct CreateOptions {
    pub name: String,
    pub driver: String,
    pub ipam_driver: String,
    pub subnets: Vec<String>,
    pub gateways: Vec<String>,
    pub ip_ranges: Vec<String>,
    pub internal: bool,
    pub ipv6: bool,
    pub labels: Vec<String>,
    pub options: Vec<String>,
}

/// Create a network and print its ID
pub async fn create(
    client: &dyn ManagerApi,
    opts: CreateOptions,
    out: &mut dyn Write,
) -> Result<()> {
    let request = NetworkCreate {
        name: opts.name,
        check_duplicate: true,
        driver: opts.driver,
        ipam: Ipam {
            driver: opts.ipam_driver,
            config: ipam_pools(&opts.subnets, &opts.gateways, &opts.ip_ranges)?,
            ..Default::default()
        },
        enable_ipv6: opts.ipv6,
        options: parse_key_values(&opts.options, "--opt")?,
        labels: parse_key_values(&opts.labels, "--label")?,
        internal: opts.internal,
    };

    let response = client.network_create(request).await?;
    if !response.warning.is_empty() {
        eprintln!("{} {}", "WARNING:".yellow().bold(), response.warning);
    }

    writeln!(out, "{}", response.id)?;
    Ok(())
}

/// Remove networks, reporting each failure and continuing with the rest
pub async fn rm(client: &dyn ManagerApi, names: &[String], out: &mut dyn Write) -> Result<()> {
    let mut failed = 0;

    for name in names {
        match client.network_remove(name).await {
            Ok(()) => writeln!(out, "{}", name)?,
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("Failed to remove {} network(s)", failed);
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct NetworkView {
    name: String,
    id: String,
    created: u64,
    scope: String,
    driver: String,
    #[serde(rename = "EnableIPv6")]
    enable_ipv6: bool,
    #[serde(rename = "IPAM")]
    ipam: IpamView,
    internal: bool,
    options: HashMap<String, String>,
    labels: HashMap<String, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct IpamView {
    driver: String,
    options: HashMap<String, String>,
    config: Vec<IpamPoolView>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct IpamPoolView {
    subnet: String,
    #[serde(rename = "IPRange", skip_serializing_if = "String::is_empty")]
    ip_range: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    gateway: String,
}

impl From<Network> for NetworkView {
    fn from(n: Network) -> Self {
        Self {
            created: n.created_at.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0),
            scope: n.scope.to_string(),
            name: n.name,
            id: n.id,
            driver: n.driver,
            enable_ipv6: n.enable_ipv6,
            ipam: IpamView {
                driver: n.ipam.driver,
                options: n.ipam.options,
                config: n
                    .ipam
                    .config
                    .into_iter()
                    .map(|p| IpamPoolView {
                        subnet: p.subnet,
                        ip_range: p.ip_range,
                        gateway: p.gateway,
                    })
                    .collect(),
            },
            internal: n.internal,
            options: n.options,
            labels: n.labels,
        }
    }
}

/// Display detailed information on a network as JSON
pub async fn inspect(client: &dyn ManagerApi, name: &str, out: &mut dyn Write) -> Result<()> {
    let network = client.network_inspect(name).await?;

    let view = vec![NetworkView::from(network)];
    writeln!(out, "{}", serde_json::to_string_pretty(&view)?)?;

    Ok(())
}

/// Pair the n-th gateway and IP range with the n-th subnet.
fn ipam_pools(
    subnets: &[String],
    gateways: &[String],
    ip_ranges: &[String],
) -> Result<Vec<IpamPool>> {
    if gateways.len() > subnets.len() {
        bail!("every --gateway needs a matching --subnet");
    }
    if ip_ranges.len() > subnets.len() {
        bail!("every --ip-range needs a matching --subnet");
    }

    Ok(subnets
        .iter()
        .enumerate()
        .map(|(i, subnet)| IpamPool {
            subnet: subnet.clone(),
            ip_range: ip_ranges.get(i).cloned().unwrap_or_default(),
            gateway: gateways.get(i).cloned().unwrap_or_default(),
            ..Default::default()
        })
        .collect())
}

fn parse_key_values(values: &[String], flag: &str) -> Result<HashMap<String, String>> {
    values
        .iter()
        .map(|value| match value.split_once('=') {
            Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
            None if !value.is_empty() => Ok((value.clone(), String::new())),
            _ => bail!("invalid {} value: {:?}", flag, value),
        })
        .collect()
}
