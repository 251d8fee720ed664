//! `berth stack deploy`

use super::common::{get_networks, get_services, load_bundlefile, DEFAULT_NETWORK_DRIVER};
use crate::client::ManagerApi;
use crate::registry_auth::AuthStore;
use anyhow::{anyhow, Result};
use berth_core::bundle::BundleService;
use berth_core::stack::{scoped_name, stack_labels};
use berth_core::types::{NetworkAttachment, PortConfig, Protocol};
use berth_core::{Ipam, NetworkCreate, Service, ServiceSpec};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;
use tracing::{debug, instrument, warn};

pub struct DeployOptions {
    pub namespace: String,
    pub bundlefile: Option<String>,
    pub send_registry_auth: bool,
}

/// Create the stack's missing networks, then create or update its services.
pub async fn run_deploy(
    client: &dyn ManagerApi,
    opts: &DeployOptions,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<()> {
    let bundle = load_bundlefile(err, &opts.namespace, opts.bundlefile.as_deref())?;

    let networks = bundle.network_names();
    update_networks(client, &networks, &opts.namespace, out).await?;

    let auth = if opts.send_registry_auth { Some(AuthStore::load()?) } else { None };
    deploy_services(client, &bundle.services, &opts.namespace, auth.as_ref(), out).await
}

/// Create every network in `networks` the stack does not have yet.
#[instrument(skip(client, out))]
pub async fn update_networks(
    client: &dyn ManagerApi,
    networks: &[String],
    namespace: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let existing: HashSet<String> =
        get_networks(client, namespace).await?.into_iter().map(|n| n.name).collect();

    let create_opts = NetworkCreate {
        labels: stack_labels(namespace, None),
        driver: DEFAULT_NETWORK_DRIVER.to_string(),
        ipam: Ipam { driver: "default".to_string(), ..Default::default() },
        ..Default::default()
    };

    for network in networks {
        let name = scoped_name(namespace, network);
        if existing.contains(&name) {
            debug!(network = %name, "Network exists");
            continue;
        }

        writeln!(out, "Creating network {}", name)?;
        let create = NetworkCreate { name: name.clone(), ..create_opts.clone() };
        let response = client.network_create(create).await?;
        if !response.warning.is_empty() {
            warn!(network = %name, "{}", response.warning);
        }
    }

    Ok(())
}

/// Create the bundle's services, updating those the stack already runs.
#[instrument(skip(client, services, auth, out))]
pub async fn deploy_services(
    client: &dyn ManagerApi,
    services: &BTreeMap<String, BundleService>,
    namespace: &str,
    auth: Option<&AuthStore>,
    out: &mut dyn Write,
) -> Result<()> {
    let existing: HashMap<String, Service> = get_services(client, namespace)
        .await?
        .into_iter()
        .map(|s| (s.spec.name.clone(), s))
        .collect();

    for (internal_name, service) in services {
        let name = scoped_name(namespace, internal_name);
        let mut spec = service_spec(namespace, internal_name, service)?;

        let encoded_auth = match auth {
            Some(store) => store.encoded_auth_for(&spec.image)?,
            None => String::new(),
        };

        match existing.get(&name) {
            Some(current) => {
                writeln!(out, "Updating service {} (id {})", name, current.id)?;
                spec.replicas = current.spec.replicas;
                client.service_update(&current.id, current.version, spec, &encoded_auth).await?;
            }
            None => {
                writeln!(out, "Creating service {}", name)?;
                client.service_create(spec, &encoded_auth).await?;
            }
        }
    }

    Ok(())
}

fn service_spec(
    namespace: &str,
    internal_name: &str,
    service: &BundleService,
) -> Result<ServiceSpec> {
    let ports = service
        .ports
        .iter()
        .map(|port| {
            let protocol = port.protocol.parse::<Protocol>().map_err(|e| anyhow!(e))?;
            Ok(PortConfig { protocol, target_port: port.port, published_port: 0 })
        })
        .collect::<Result<Vec<_>>>()?;

    let networks = service
        .networks
        .iter()
        .map(|network| NetworkAttachment {
            target: scoped_name(namespace, network),
            aliases: vec![internal_name.to_string()],
        })
        .collect();

    Ok(ServiceSpec {
        name: scoped_name(namespace, internal_name),
        labels: stack_labels(namespace, Some(service.labels.clone())),
        image: service.image.clone(),
        command: service.command.clone(),
        args: service.args.clone(),
        env: service.env.clone(),
        // Service labels are not copied to containers
        container_labels: stack_labels(namespace, None),
        working_dir: service.working_dir.clone().unwrap_or_default(),
        user: service.user.clone().unwrap_or_default(),
        networks,
        ports,
        ..Default::default()
    })
}
