use anyhow::Result;
use berth_core::{Config, Filters};
use clap::{Parser, Subcommand};
use colored::Colorize;

mod client;
mod commands;
mod idresolver;
mod registry_auth;
mod task;

use client::{BerthClient, ManagerApi};

#[derive(Parser)]
#[command(name = "berth")]
#[command(about = "berth container platform CLI", long_about = None)]
struct Cli {
    /// Daemon socket (defaults to the configured socket path)
    #[arg(long, global = true)]
    socket: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check daemon health
    Health,

    /// Manage stacks
    #[command(subcommand)]
    Stack(StackCommands),

    /// Manage services
    #[command(subcommand)]
    Service(ServiceCommands),

    /// Manage networks
    #[command(subcommand)]
    Network(NetworkCommands),
}

#[derive(Subcommand)]
enum StackCommands {
    /// Deploy a new stack or update an existing stack
    #[command(visible_alias = "up")]
    Deploy {
        /// Stack name
        stack: String,

        /// Path to a Distributed Application Bundle file (default "STACK.dab")
        #[arg(short = 'f', long = "file")]
        bundlefile: Option<String>,

        /// Send registry authentication details to the manager
        #[arg(long = "with-registry-auth")]
        send_registry_auth: bool,
    },

    /// List the tasks in the stack
    Ps {
        /// Stack name
        stack: String,

        /// Do not map IDs to names
        #[arg(short = 'n', long)]
        no_resolve: bool,

        /// Display all tasks, not only running ones
        #[arg(short, long)]
        all: bool,

        /// Filter output based on conditions provided (KEY=VALUE)
        #[arg(short, long, value_parser = Filters::parse_arg)]
        filter: Vec<(String, String)>,
    },
}

#[derive(Subcommand)]
enum ServiceCommands {
    /// List the tasks of a service
    Ps {
        /// Service ID or name
        service: String,

        /// Do not map IDs to names
        #[arg(short = 'n', long)]
        no_resolve: bool,

        /// Filter output based on conditions provided (KEY=VALUE)
        #[arg(short, long, value_parser = Filters::parse_arg)]
        filter: Vec<(String, String)>,
    },
}

#[derive(Subcommand)]
enum NetworkCommands {
    /// List networks
    Ls {
        /// Filter output based on conditions provided (KEY=VALUE)
        #[arg(short, long, value_parser = Filters::parse_arg)]
        filter: Vec<(String, String)>,
    },

    /// Create a network
    Create {
        /// Network name
        name: String,

        /// Driver to manage the network (daemon default when omitted)
        #[arg(short, long, default_value = "")]
        driver: String,

        /// IP address management driver
        #[arg(long, default_value = "default")]
        ipam_driver: String,

        /// Subnet in CIDR format
        #[arg(long)]
        subnet: Vec<String>,

        /// Gateway for the matching subnet
        #[arg(long)]
        gateway: Vec<String>,

        /// Allocate container IPs from a sub-range
        #[arg(long)]
        ip_range: Vec<String>,

        /// Restrict external access to the network
        #[arg(long)]
        internal: bool,

        /// Enable IPv6 networking
        #[arg(long)]
        ipv6: bool,

        /// Network labels (KEY=VALUE)
        #[arg(long)]
        label: Vec<String>,

        /// Driver specific options (KEY=VALUE)
        #[arg(short, long)]
        opt: Vec<String>,
    },

    /// Remove one or more networks
    Rm {
        /// Network names or IDs
        #[arg(required = true)]
        networks: Vec<String>,
    },

    /// Display detailed information on a network
    Inspect {
        /// Network name or ID
        network: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    berth_core::observability::init_cli();

    let cli = Cli::parse();

    let socket_path = match cli.socket {
        Some(path) => path,
        None => Config::load()?.socket_path,
    };
    let client = BerthClient::connect(&socket_path).await?;

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();

    match cli.command {
        Commands::Health => {
            let health = client.health().await?;
            let status = match health.status.as_str() {
                "healthy" => health.status.green().bold(),
                "degraded" => health.status.yellow().bold(),
                _ => health.status.red().bold(),
            };
            println!("Status: {}", status);
            println!("Version: {}", health.version);
            println!("Network drivers: {}", health.network_drivers.join(", "));
        }

        Commands::Stack(stack_cmd) => match stack_cmd {
            StackCommands::Deploy { stack, bundlefile, send_registry_auth } => {
                let opts = commands::stack::deploy::DeployOptions {
                    namespace: stack,
                    bundlefile,
                    send_registry_auth,
                };
                commands::stack::deploy::run_deploy(&client, &opts, &mut stdout, &mut stderr)
                    .await?;
            }

            StackCommands::Ps { stack, no_resolve, all, filter } => {
                let opts = commands::stack::ps::PsOptions {
                    namespace: stack,
                    no_resolve,
                    all,
                    filters: filter.into_iter().collect(),
                };
                commands::stack::ps::run_ps(&client, &opts, &mut stdout).await?;
            }
        },

        Commands::Service(service_cmd) => match service_cmd {
            ServiceCommands::Ps { service, no_resolve, filter } => {
                let opts = commands::service::PsOptions {
                    service,
                    no_resolve,
                    filters: filter.into_iter().collect(),
                };
                commands::service::ps(&client, &opts, &mut stdout).await?;
            }
        },

        Commands::Network(network_cmd) => match network_cmd {
            NetworkCommands::Ls { filter } => {
                let filters: Filters = filter.into_iter().collect();
                commands::network::ls(&client, &filters, &mut stdout).await?;
            }

            NetworkCommands::Create {
                name,
                driver,
                ipam_driver,
                subnet,
                gateway,
                ip_range,
                internal,
                ipv6,
                label,
                opt,
            } => {
                let opts = commands::network::CreateOptions {
                    name,
                    driver,
                    ipam_driver,
                    subnets: subnet,
                    gateways: gateway,
                    ip_ranges: ip_range,
                    internal,
                    ipv6,
                    labels: label,
                    options: opt,
                };
                commands::network::create(&client, opts, &mut stdout).await?;
            }

            NetworkCommands::Rm { networks } => {
                commands::network::rm(&client, &networks, &mut stdout).await?;
            }

            NetworkCommands::Inspect { network } => {
                commands::network::inspect(&client, &network, &mut stdout).await?;
            }
        },
    }

    Ok(())
}
