use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use serde_json::{json, Value};
use sidenode_config::load_config;
use sidenode_discovery::{ChannelPublisher, LocalDiscovery, RequestDiscovery};
use sidenode_protocol::{NamespaceRegistry, VersionSummary};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Configuration shipped with the node
const DEFAULT_CONFIG: &str = "config/sidenode.yaml";

#[derive(Parser)]
#[command(name = "sidenode")]
#[command(about = "Protocol version resolution for DID namespaces", long_about = None)]
struct Cli {
    /// Node configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured namespaces and their current protocol versions
    Namespaces,

    /// Show the protocol version governing a namespace or DID
    Resolve(ResolveArgs),

    /// Request network discovery of a DID
    Discover {
        did: String,
    },
}

#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).args(["namespace", "did"])))]
struct ResolveArgs {
    /// Namespace, e.g. did:orb
    #[arg(long)]
    namespace: Option<String>,

    /// Fully qualified DID; its namespace is looked up in the registry
    #[arg(long)]
    did: Option<String>,

    /// Anchoring time to resolve at (defaults to the current version)
    #[arg(long)]
    at: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Namespaces => build_registry(&cli.config)
            .and_then(|registry| namespaces_report(&registry))
            .and_then(print_json),
        Commands::Resolve(args) => build_registry(&cli.config)
            .and_then(|registry| resolve(&registry, &args))
            .and_then(print_json),
        Commands::Discover { did } => discover(&did).await,
    }
}

fn build_registry(path: &Path) -> Result<NamespaceRegistry> {
    let config = load_config(path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    let registry = config.build_registry().context("building namespace registry")?;
    Ok(registry)
}

fn namespaces_report(registry: &NamespaceRegistry) -> Result<Value> {
    let mut entries = Vec::with_capacity(registry.len());

    for namespace in registry.namespaces() {
        let version_set = registry.for_namespace(namespace)?;
        let current = version_set.current()?;
        entries.push(json!({
            "namespace": namespace,
            "versions": version_set.len(),
            "current": current.version(),
            "commitment": version_set.commitment()?,
        }));
    }

    Ok(Value::Array(entries))
}

fn resolve(registry: &NamespaceRegistry, args: &ResolveArgs) -> Result<Value> {
    let (namespace, version_set) = match (&args.namespace, &args.did) {
        (Some(namespace), _) => (namespace.as_str(), registry.for_namespace(namespace)?),
        (None, Some(did)) => registry.resolve_did(did)?,
        (None, None) => anyhow::bail!("either --namespace or --did is required"),
    };

    let version = match args.at {
        Some(time) => version_set
            .at(time)
            .with_context(|| format!("resolving {} at time {}", namespace, time))?,
        None => version_set.current()?,
    };

    info!("Namespace {} resolved to protocol version {}", namespace, version.version());

    Ok(json!({
        "namespace": namespace,
        "version": serde_json::to_value(VersionSummary::of(version.as_ref()))?,
    }))
}

async fn discover(did: &str) -> Result<()> {
    let (publisher, mut published) = ChannelPublisher::new(16);
    let discovery = LocalDiscovery::new(Arc::new(publisher));

    let listener = tokio::spawn(async move {
        while let Some(did) = published.recv().await {
            info!("Published {} for discovery", did);
        }
    });

    discovery
        .request_discovery(did)
        .await
        .with_context(|| format!("requesting discovery of {}", did))?;

    drop(discovery);
    listener.await.context("discovery listener stopped")?;
    Ok(())
}

fn print_json(value: Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
