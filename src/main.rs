//! Replication Operator
//!
//! Command-line entry point for creating, reading and deleting volume
//! replication relationships through the remote control plane.
//!
//! ```text
//! replication-operator [global options] create --source-id env-A --destination-id env-B \
//!     --source-volume vol1 --destination-volume vol1_mirror
//! replication-operator [global options] read   --id vol1_mirror --source-id env-A ...
//! replication-operator [global options] delete --id vol1_mirror --source-id env-A ...
//! ```

use clap::{Parser, Subcommand};
use prometheus::Registry;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use replication_operator::{
    metrics, EnvironmentRef, Error, HttpControlPlaneClient, OperatorConfig, RefreshTokenSource,
    ReplicationOrchestrator, ReplicationSpec, Result, TokenCache,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Replication Operator - cross-environment volume replication
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file; explicit flags override its values
    #[arg(long, env = "REPLICATION_CONFIG")]
    config: Option<PathBuf>,

    /// Connector API base URL
    #[arg(long, env = "CONNECTOR_URL")]
    connector_url: Option<String>,

    /// Hosted services API base URL
    #[arg(long, env = "SERVICES_URL")]
    services_url: Option<String>,

    /// OAuth token endpoint
    #[arg(long, env = "AUTH_URL")]
    auth_url: Option<String>,

    /// OAuth client id
    #[arg(long, env = "CLIENT_ID")]
    client_id: Option<String>,

    /// OAuth refresh token
    #[arg(long, env = "REFRESH_TOKEN", hide_env_values = true)]
    refresh_token: Option<String>,

    /// Connector agent id
    #[arg(long, env = "AGENT_ID")]
    agent_id: Option<String>,

    /// Seconds between job status polls
    #[arg(long, env = "POLL_INTERVAL_SECS")]
    poll_interval_secs: Option<u64>,

    /// Polls before a job is declared timed out
    #[arg(long, env = "MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    /// Print workflow metrics in the Prometheus text format on exit
    #[arg(long)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a replication relationship
    Create(RelationshipArgs),
    /// Report whether a relationship exists
    Read {
        /// Relationship id (the destination volume name)
        #[arg(long)]
        id: String,
        #[command(flatten)]
        relationship: RelationshipArgs,
    },
    /// Delete a replication relationship
    Delete {
        /// Relationship id (the destination volume name)
        #[arg(long)]
        id: String,
        #[command(flatten)]
        relationship: RelationshipArgs,
    },
}

#[derive(clap::Args, Debug)]
struct RelationshipArgs {
    /// Source environment id
    #[arg(long)]
    source_id: Option<String>,

    /// Source environment name
    #[arg(long)]
    source_name: Option<String>,

    /// Destination environment id
    #[arg(long)]
    destination_id: Option<String>,

    /// Destination environment name
    #[arg(long)]
    destination_name: Option<String>,

    /// Workspace owning managed file systems
    #[arg(long, env = "WORKSPACE_ID")]
    workspace_id: Option<String>,

    #[arg(long)]
    source_volume: String,

    #[arg(long)]
    source_svm: Option<String>,

    #[arg(long)]
    destination_volume: Option<String>,

    #[arg(long)]
    destination_svm: Option<String>,

    /// Explicit destination aggregate (skips the remote quote)
    #[arg(long)]
    destination_aggregate: Option<String>,

    /// Capacity tier, or "none" to disable tiering
    #[arg(long)]
    capacity_tier: Option<String>,

    #[arg(long)]
    provider_volume_type: Option<String>,

    #[arg(long)]
    policy: Option<String>,

    #[arg(long)]
    schedule: Option<String>,

    #[arg(long)]
    max_transfer_rate: Option<u64>,
}

impl RelationshipArgs {
    fn into_spec(self) -> ReplicationSpec {
        ReplicationSpec {
            source: EnvironmentRef {
                id: self.source_id,
                name: self.source_name,
            },
            destination: EnvironmentRef {
                id: self.destination_id,
                name: self.destination_name,
            },
            workspace_id: self.workspace_id,
            source_volume_name: self.source_volume,
            source_svm_name: self.source_svm,
            destination_volume_name: self.destination_volume,
            destination_svm_name: self.destination_svm,
            destination_aggregate_name: self.destination_aggregate,
            destination_capacity_tier: self.capacity_tier,
            destination_provider_volume_type: self.provider_volume_type,
            policy_name: self.policy,
            schedule_name: self.schedule,
            max_transfer_rate: self.max_transfer_rate,
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    info!("Starting Replication Operator");
    info!("  Version: {}", replication_operator::VERSION);

    let config = load_config(&args)?;
    info!("  Connector: {}", config.client.connector_url);
    info!(
        "  Job polling: {} x {}s",
        config.workflow.max_attempts, config.workflow.poll_interval_secs
    );

    let source = RefreshTokenSource::new(
        config.client.auth_url.clone(),
        config.client.client_id.clone(),
        config.client.refresh_token.clone(),
        config.client.timeout(),
    )?;
    let tokens = Arc::new(TokenCache::new(Arc::new(source)));
    let client = HttpControlPlaneClient::new(config.client.clone(), tokens)?;

    let registry = Registry::new();
    let orchestrator =
        ReplicationOrchestrator::new(Arc::new(client), config.workflow.clone(), &registry)?;

    let output = match args.command {
        Command::Create(relationship) => {
            let record = orchestrator.create(&relationship.into_spec()).await?;
            serde_json::to_value(&record)?
        }
        Command::Read { id, relationship } => {
            let exists = orchestrator.read(&id, &relationship.into_spec()).await?;
            json!({ "id": id, "exists": exists })
        }
        Command::Delete { id, relationship } => {
            orchestrator.delete(&id, &relationship.into_spec()).await?;
            json!({ "id": id, "deleted": true })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    if args.print_metrics {
        print!("{}", metrics::render(&registry)?);
    }

    Ok(())
}

// =============================================================================
// Configuration
// =============================================================================

fn load_config(args: &Args) -> Result<OperatorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            OperatorConfig::from_yaml_file(path)?
        }
        None => OperatorConfig::default(),
    };

    let client = &mut config.client;
    if let Some(url) = &args.connector_url {
        client.connector_url = url.clone();
    }
    if let Some(url) = &args.services_url {
        client.services_url = url.clone();
    }
    if let Some(url) = &args.auth_url {
        client.auth_url = url.clone();
    }
    if let Some(id) = &args.client_id {
        client.client_id = id.clone();
    }
    if let Some(token) = &args.refresh_token {
        client.refresh_token = token.clone();
    }
    if let Some(agent) = &args.agent_id {
        client.agent_id = Some(agent.clone());
    }

    let workflow = &mut config.workflow;
    if let Some(secs) = args.poll_interval_secs {
        workflow.poll_interval_secs = secs;
    }
    if let Some(attempts) = args.max_attempts {
        workflow.max_attempts = attempts;
    }

    config.client.validate()?;
    config.workflow.validate()?;
    Ok(config)
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "reqwest=warn"] {
        filter = filter.add_directive(directive.parse().map_err(|e| {
            Error::Configuration(format!("invalid log directive {}: {}", directive, e))
        })?);
    }

    let result = if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| Error::Internal(format!("logging already initialized: {}", e)))
}
