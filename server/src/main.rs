// rosterd server - main entry point
//
// This file contains only the application bootstrap logic, CLI commands,
// and initialization. Handlers, routes, and store logic live in their own
// modules.

pub use rosterd_server::*;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dotenvy::{Error as DotenvError, dotenv};
use rosterd_core::{AppConfig, BackupStore};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "rosterd server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Delete old backups of a document beyond the retention count
    Prune(PruneArgs),
}

#[derive(Args, Debug)]
struct PruneArgs {
    /// Document base name whose backups should be pruned
    #[arg(long, value_name = "NAME")]
    name: String,
    /// Number of backups to keep (defaults to the configured retention)
    #[arg(long, value_name = "N")]
    keep: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_status = load_env_file();
    init_tracing();
    report_env_status(&env_status);

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_serve(config).await,
        Command::Prune(args) => run_prune(config, args).await,
    }
}

async fn run_serve(config: AppConfig) -> anyhow::Result<()> {
    info!(
        bind_address = %config.bind_address,
        data_dir = %config.data_dir.display(),
        backup_dir = %config.backup_dir.display(),
        static_dir = %config.static_dir.display(),
        default_max_backups = config.default_max_backups,
        "Starting server"
    );

    let state = build_state(config.clone())?;
    let app = router::build_router(state);

    let listener = TcpListener::bind(config.bind_address)
        .await
        .context("failed to bind socket")?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read local address")?;

    info!("listening on {actual_addr}");

    if let Err(error) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(?error, "server terminated with error");
    }

    Ok(())
}

async fn run_prune(config: AppConfig, args: PruneArgs) -> anyhow::Result<()> {
    let keep = args.keep.unwrap_or(config.default_max_backups);
    if keep == 0 {
        anyhow::bail!("--keep must be positive");
    }

    let backup_store = BackupStore::open(&config.backup_dir)?;
    let deleted = backup_store.prune(&args.name, keep).await?;

    if deleted.is_empty() {
        println!("Nothing to prune for '{}' (retention {keep})", args.name);
    } else {
        for file_name in &deleted {
            println!("Deleted {file_name}");
        }
        println!("Deleted {} backups of '{}'", deleted.len(), args.name);
    }

    Ok(())
}

enum EnvLoadStatus {
    Loaded(PathBuf),
    NotFound,
    Failed(DotenvError),
}

fn load_env_file() -> EnvLoadStatus {
    match dotenv() {
        Ok(path) => EnvLoadStatus::Loaded(path),
        Err(DotenvError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            EnvLoadStatus::NotFound
        }
        Err(err) => EnvLoadStatus::Failed(err),
    }
}

fn report_env_status(status: &EnvLoadStatus) {
    match status {
        EnvLoadStatus::Loaded(path) => {
            info!("Loaded environment variables from {}", path.display());
        }
        EnvLoadStatus::NotFound => {
            info!("No .env file found; using process environment only");
        }
        EnvLoadStatus::Failed(err) => {
            warn!("Failed to load .env file: {err:?}");
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .init();
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut int = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

        tokio::select! {
            _ = term.recv() => {},
            _ = int.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
