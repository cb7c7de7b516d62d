mod cache;
mod commands;
mod config;
mod event;
mod manifest;
mod net;
mod worker;

use clap::Parser;
use color_eyre::Result;
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cache::SqliteStorage;
use commands::Command;
use net::HttpClient;
use worker::{ConsoleHost, Worker};

#[derive(Parser, Debug)]
#[command(name = "storycache")]
#[command(about = "Offline asset cache for the storybook app")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/storycache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Origin the app is served from
  #[arg(short, long)]
  origin: Option<String>,

  /// Cache version tag
  #[arg(long)]
  cache_version: Option<String>,

  #[command(subcommand)]
  command: Command,
}

/// Log to stderr, filtered by RUST_LOG (default: warn).
///
/// When STORYCACHE_LOG_DIR is set, also write a daily rolling log file there.
fn init_tracing() -> Option<WorkerGuard> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

  let (file_writer, guard) = match std::env::var_os("STORYCACHE_LOG_DIR") {
    Some(dir) => {
      let appender = tracing_appender::rolling::daily(dir, "storycache.log");
      let (writer, guard) = tracing_appender::non_blocking(appender);
      (Some(writer), Some(guard))
    }
    None => (None, None),
  };

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(io::stderr))
    .with(file_writer.map(|writer| fmt::layer().with_ansi(false).with_writer(writer)))
    .with(filter)
    .init();

  guard
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let _guard = init_tracing();

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?
    .with_overrides(args.origin, args.cache_version)?;

  let db_path = config.database_path()?;
  info!(database = %db_path.display(), version = %config.version, "Opening cache");

  let storage = SqliteStorage::open(&db_path)?;
  let network = HttpClient::new()?;
  let mut worker = Worker::new(&config, storage, network, ConsoleHost)?;

  commands::run(args.command, &mut worker).await
}
