use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use ocmtf_cli::config;
use ocmtf_client::OcmClient;
use ocmtf_core::Attr;
use ocmtf_provider::resources::{Groups, GroupsState};
use ocmtf_provider::{
    Diagnostics, OcmContext, ProviderState, Registry, ResourceAddr, Response, Severity,
    StateChange, StateStore,
};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "ocmtf")]
#[command(about = "Reconcile OpenShift Cluster Manager resources against local state")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// State file (overrides the config's state_path)
    #[arg(long, global = true, env = "OCMTF_STATE")]
    state: Option<PathBuf>,

    /// Log as JSON lines instead of human-readable text
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Resource(ResourceCommand),
    /// Write the API URL and token to the config file
    Configure {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },
}

/// Commands that talk to the API.
#[derive(Subcommand)]
enum ResourceCommand {
    /// Create a resource from a JSON plan (e.g. machine_pool.gpu --plan gpu.json)
    Create {
        addr: ResourceAddr,
        #[arg(long)]
        plan: PathBuf,
    },
    /// Refresh a managed resource from the API
    Read { addr: ResourceAddr },
    /// Move a managed resource to a new JSON plan
    Update {
        addr: ResourceAddr,
        #[arg(long)]
        plan: PathBuf,
    },
    /// Delete a managed resource
    Delete { addr: ResourceAddr },
    /// Start managing an existing resource by its import identifier
    Import {
        addr: ResourceAddr,
        #[arg(long)]
        id: String,
    },
    /// List supported resource types
    Types,
    /// List the access groups of a cluster
    Groups { cluster: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let command = match cli.command {
        Command::Configure { url, token } => return configure(url, token),
        Command::Resource(command) => command,
    };

    let config = config::load_config()?;
    let store = StateStore::new(match cli.state {
        Some(path) => path,
        None => config.state_path()?,
    });
    let client = OcmClient::new(&config.client_config())?;
    let ctx = OcmContext::new(client, config.poll_interval());
    let groups = Groups::new(ctx.clone());
    let registry = Registry::ocm(ctx);

    run(command, &registry, &groups, &store).await
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn configure(url: Option<String>, token: Option<String>) -> Result<()> {
    let path = config::config_path()?;
    let mut cfg = if path.exists() {
        config::load_from(&path)?
    } else {
        config::OcmtfConfig::default()
    };
    if let Some(url) = url {
        cfg.url = url;
    }
    if token.is_some() {
        cfg.token = token;
    }
    config::save_to(&cfg, &path)?;
    println!("Config written to {}", path.display());
    Ok(())
}

async fn list_groups(groups: &Groups, cluster: String) -> Result<()> {
    let resp = groups
        .read(GroupsState {
            cluster: Attr::Known(cluster.clone()),
            ..Default::default()
        })
        .await;
    for d in resp.diagnostics.iter() {
        eprintln!("{:?}: groups: {}\n  {}", d.severity, d.summary, d.detail);
    }
    if let StateChange::Set(found) = &resp.state {
        println!("{}", serde_json::to_string_pretty(&found.items)?);
    }
    if resp.diagnostics.has_errors() {
        eyre::bail!("failed to list groups of cluster {cluster}");
    }
    Ok(())
}

async fn run(
    command: ResourceCommand,
    registry: &Registry,
    groups: &Groups,
    store: &StateStore,
) -> Result<()> {
    let mut state = store.load()?;

    let (addr, resp) = match command {
        ResourceCommand::Types => {
            for name in registry.type_names() {
                println!("{name}");
            }
            println!("{}", ocmtf_provider::resources::groups::TYPE_NAME);
            return Ok(());
        }
        ResourceCommand::Groups { cluster } => return list_groups(groups, cluster).await,
        ResourceCommand::Create { addr, plan } => {
            if state.get(&addr).is_some() {
                eyre::bail!("{addr} is already managed; use `update` instead");
            }
            let plan = read_json(&plan)?;
            let resp = registry.get(&addr.resource_type)?.create(plan).await?;
            (addr, resp)
        }
        ResourceCommand::Read { addr } => {
            let current = stored(&state, &addr)?;
            let resp = registry.get(&addr.resource_type)?.read(current).await?;
            (addr, resp)
        }
        ResourceCommand::Update { addr, plan } => {
            let current = stored(&state, &addr)?;
            let plan = read_json(&plan)?;
            let resp = registry
                .get(&addr.resource_type)?
                .update(current, plan)
                .await?;
            (addr, resp)
        }
        ResourceCommand::Delete { addr } => {
            let current = stored(&state, &addr)?;
            let resp = registry.get(&addr.resource_type)?.delete(current).await?;
            (addr, resp)
        }
        ResourceCommand::Import { addr, id } => {
            if state.get(&addr).is_some() {
                eyre::bail!("{addr} is already managed; remove it from state before importing");
            }
            let resp = registry
                .get(&addr.resource_type)?
                .import_state(&id)
                .await?;
            (addr, resp)
        }
    };

    apply(&mut state, store, &addr, resp)
}

/// Record the outcome in state and print it.
fn apply(
    state: &mut ProviderState,
    store: &StateStore,
    addr: &ResourceAddr,
    resp: Response<Value>,
) -> Result<()> {
    print_diagnostics(addr, &resp.diagnostics);

    match &resp.state {
        StateChange::Set(attributes) => {
            state.set(addr, attributes.clone());
            store.flush(state)?;
            tracing::debug!(addr = %addr, "state updated");
            println!("{}", serde_json::to_string_pretty(attributes)?);
        }
        StateChange::Removed => {
            state.remove(addr);
            store.flush(state)?;
            tracing::info!(addr = %addr, "removed from state");
        }
        StateChange::Unchanged => {}
    }

    let errors = resp.diagnostics.errors().count();
    if errors > 0 {
        eyre::bail!("{addr}: {errors} error(s)");
    }
    Ok(())
}

fn print_diagnostics(addr: &ResourceAddr, diagnostics: &Diagnostics) {
    for d in diagnostics.iter() {
        let level = match d.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };
        eprintln!("{level}: {addr}: {}\n  {}", d.summary, d.detail);
    }
}

fn stored(state: &ProviderState, addr: &ResourceAddr) -> Result<Value> {
    state
        .attributes(addr)
        .cloned()
        .ok_or_else(|| eyre::eyre!("{addr} is not in state at this location"))
}

fn read_json(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read plan at {}", path.display()))?;
    serde_json::from_str(&contents).wrap_err_with(|| format!("invalid JSON in {}", path.display()))
}
