use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use complaint_relay::config::{RelayConfig, StatusConfig};
use complaint_relay::dispatch::GithubDispatcher;
use complaint_relay::form::SubmissionEvent;
use complaint_relay::relay::{Relay, RelaySettings, relay_to_local_store};
use complaint_relay::server::relay_routes;
use complaint_relay::status::{LibSqlStatusStore, StatusStore};

#[derive(Parser)]
#[command(name = "complaint-relay")]
#[command(version)]
#[command(about = "Relay form submissions to a status table and a GitHub repository_dispatch pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Relay a single submission event
    Relay {
        /// Path to the event JSON (`{"form": ..., "response": ...}`), or `-` for stdin
        #[arg(short, long, default_value = "-")]
        event: String,
    },

    /// Serve `POST /submissions` over HTTP
    Serve {
        /// Address to bind
        #[arg(short, long, env = "RELAY_BIND", default_value = "0.0.0.0:8080")]
        bind: String,
    },

    /// Create the status table
    InitStore {
        /// Database path (defaults to RELAY_STATUS_DB)
        #[arg(short, long)]
        destination: Option<PathBuf>,
    },

    /// Show recent status rows
    Status {
        /// Database path (defaults to RELAY_STATUS_DB)
        #[arg(short, long)]
        destination: Option<PathBuf>,

        /// Number of rows to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Relay { event } => relay_once(&event).await,
        Commands::Serve { bind } => serve(&bind).await,
        Commands::InitStore { destination } => init_store(destination).await,
        Commands::Status { destination, limit } => show_status(destination, limit).await,
    }
}

async fn relay_once(source: &str) -> anyhow::Result<()> {
    let config = RelayConfig::from_env()?;
    let event = read_event(source)?;
    let dispatcher = GithubDispatcher::new(config.dispatch.clone())?;

    let outcome = relay_to_local_store(&config, &event, Arc::new(dispatcher)).await?;
    println!("{}", outcome.complaint_id);
    Ok(())
}

async fn serve(bind: &str) -> anyhow::Result<()> {
    let config = RelayConfig::from_env()?;
    let destination = config.status.resolve_destination(None)?;
    let store = LibSqlStatusStore::new_local(Path::new(&destination), &config.status.table).await?;
    if !store.table_exists().await? {
        anyhow::bail!(
            "status table '{}' missing in {destination}; run `complaint-relay init-store` first",
            store.table()
        );
    }
    let relay = build_relay(&config, Arc::new(store))?;

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!(%bind, dispatch_url = %config.dispatch.dispatch_url(), "Relay server started");
    axum::serve(listener, relay_routes(Arc::new(relay))).await?;
    Ok(())
}

async fn init_store(destination: Option<PathBuf>) -> anyhow::Result<()> {
    let (path, table) = store_location(destination)?;
    let store = LibSqlStatusStore::new_local(&path, &table).await?;
    store.create_table().await?;
    println!("Status table '{}' ready in {}", store.table(), path.display());
    Ok(())
}

async fn show_status(destination: Option<PathBuf>, limit: usize) -> anyhow::Result<()> {
    let (path, table) = store_location(destination)?;
    let store = LibSqlStatusStore::new_local(&path, &table).await?;
    for record in store.recent(limit).await? {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            record.complaint_id,
            record.received_at.to_rfc3339(),
            record.status,
            record.updated_at.to_rfc3339(),
            record.notes
        );
    }
    Ok(())
}

fn build_relay(config: &RelayConfig, store: Arc<dyn StatusStore>) -> anyhow::Result<Relay> {
    let dispatcher = GithubDispatcher::new(config.dispatch.clone())?;
    Ok(Relay::new(
        RelaySettings::from(config),
        store,
        Arc::new(dispatcher),
    ))
}

/// Store commands only need the status settings, not dispatch credentials.
fn store_location(destination: Option<PathBuf>) -> anyhow::Result<(PathBuf, String)> {
    let status = StatusConfig::from_env()?;
    let path = match destination {
        Some(path) => path,
        None => PathBuf::from(status.resolve_destination(None)?),
    };
    Ok((path, status.table))
}

fn read_event(source: &str) -> anyhow::Result<SubmissionEvent> {
    let event = if source == "-" {
        SubmissionEvent::from_reader(std::io::stdin().lock(), "stdin")?
    } else {
        let file = std::fs::File::open(source)
            .with_context(|| format!("Failed to open event file {source}"))?;
        SubmissionEvent::from_reader(file, source)?
    };
    Ok(event)
}
