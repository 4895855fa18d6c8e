//! SABRES CLI - drive the network orchestrator from a terminal
//!
//! Wraps the service routes for topology builds, solver requests and slice
//! management.

mod api;
mod commands;
mod config;
mod output;

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// SABRES CLI - network slicing orchestrator client
#[derive(Parser)]
#[command(name = "sabres")]
#[command(author = "SABRES Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build network topologies, request solutions and manage slices")]
#[command(long_about = r#"
The SABRES CLI talks to a running network service.

Examples:
  sabres graph create                      # Build the topology from inventory
  sabres graph show | dot -Tsvg > net.svg  # Render the topology
  sabres cbs --host cbs --port 15045       # Point the service at a solver
  sabres solve constraints.json            # Ask the solver for a solution
  sabres slice create constraints.json     # Solve and store a slice
  sabres slice configure <uuid>            # Resolve the slice path
"#)]
struct Cli {
    /// Server URL (defaults to server.url from the config file)
    #[arg(long, env = "SABRES_SERVER_URL")]
    server: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show service status
    Status,

    /// Topology management
    Graph {
        #[command(subcommand)]
        action: GraphAction,
    },

    /// Set the solver location used by the service
    Cbs {
        /// Solver host (defaults to solver.host from the config file)
        #[arg(long)]
        host: Option<String>,

        /// Solver port (defaults to solver.port from the config file)
        #[arg(long)]
        port: Option<String>,
    },

    /// Send constraints to the solver and print its answer
    Solve {
        /// JSON file holding the constraint list
        file: PathBuf,
    },

    /// Slice management
    Slice {
        #[command(subcommand)]
        action: SliceAction,
    },

    /// Configuration management
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set a configuration value (key=value)
        #[arg(long)]
        set: Option<String>,
    },
}

#[derive(Subcommand)]
enum GraphAction {
    /// Build the topology from inventory
    Create,
    /// Drop the current topology
    Delete,
    /// Print the topology as Graphviz DOT
    Show,
    /// Print the topology as JSON
    Json,
}

#[derive(Subcommand)]
enum SliceAction {
    /// Solve the constraints and store the result as a slice
    Create {
        /// JSON file holding the constraint list
        file: PathBuf,

        /// Solver address (host:port) to use for this request
        #[arg(long)]
        cbs: Option<String>,
    },
    /// List stored slices
    List,
    /// Show one slice
    Show { uuid: String },
    /// Delete a slice
    Delete { uuid: String },
    /// Resolve the slice path and management addresses
    Configure { uuid: String },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        output::print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("sabres_cli={},warn", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = config::Config::load()?;
    let server_url = cli.server.clone().unwrap_or_else(|| config.server.url.clone());
    let api = api::ApiClient::new(&server_url, Duration::from_secs(config.server.timeout))?;

    match cli.command {
        Commands::Status => commands::status(&api).await?,
        Commands::Graph { action } => match action {
            GraphAction::Create => commands::create_graph(&api).await?,
            GraphAction::Delete => commands::delete_graph(&api).await?,
            GraphAction::Show => commands::show_graph(&api).await?,
            GraphAction::Json => commands::graph_json(&api).await?,
        },
        Commands::Cbs { host, port } => {
            let host = host.or_else(|| config.solver.host.clone());
            let port = port.or_else(|| config.solver.port.clone());
            match (host, port) {
                (Some(host), Some(port)) => commands::set_solver(&api, &host, &port).await?,
                _ => anyhow::bail!(
                    "Solver host and port are required. Pass --host/--port or run: \
                     sabres config --set solver.host=HOST"
                ),
            }
        }
        Commands::Solve { file } => commands::solve(&api, &file).await?,
        Commands::Slice { action } => match action {
            SliceAction::Create { file, cbs } => {
                let solver = cbs.or_else(|| config.solver.address());
                commands::create_slice(&api, &file, solver.as_deref()).await?
            }
            SliceAction::List => commands::list_slices(&api).await?,
            SliceAction::Show { uuid } => commands::show_slice(&api, &uuid).await?,
            SliceAction::Delete { uuid } => commands::delete_slice(&api, &uuid).await?,
            SliceAction::Configure { uuid } => commands::configure_slice(&api, &uuid).await?,
        },
        Commands::Config { show, set } => match set {
            Some(kv) if !show => commands::set_config(&mut config, &kv)?,
            _ => commands::show_config(&config)?,
        },
    }

    Ok(())
}
