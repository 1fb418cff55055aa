//! nocturne CLI.
//!
//! Subcommands:
//! - `start` runs the night-shift daemon in the foreground
//! - `check` verifies config, agent CLI, prompts, and journal directory
//! - `init`  walks through first-time setup

mod daemon;
mod init;
mod selfcheck;

use clap::{Parser, Subcommand};
use daemon::Daemon;
use nocturne_core::config::Config;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "nocturne",
    version,
    about = "Wakes a conversational agent through the night on a schedule"
)]
struct Cli {
    /// Path to nocturne.toml (skips the usual search order).
    #[arg(long, global = true, env = "NOCTURNE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler daemon in the foreground.
    Start,
    /// Verify the schedule, agent CLI, prompt files, and journal directory.
    Check,
    /// Interactive first-time setup.
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => init::run(),
        Commands::Check => {
            let config = load_config(cli.config)?;
            if !selfcheck::run(&config).await {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Start => {
            let config = load_config(cli.config)?;
            let _guard = init_logging(&config)?;
            load_env(&config);
            Daemon::new(config).run().await
        }
    }
}

/// Resolve and load the config file, or say where we looked.
fn load_config(explicit: Option<PathBuf>) -> anyhow::Result<Config> {
    let Some(path) = Config::resolve_path(explicit) else {
        anyhow::bail!(
            "no nocturne.toml found (searched ./nocturne.toml and ~/.config/nocturne/); \
             run 'nocturne init' to create one"
        );
    };
    Ok(Config::load(&path)?)
}

/// Log to stdout and to the configured file. The returned guard flushes
/// the file writer on drop and must stay alive for the process lifetime.
fn init_logging(config: &Config) -> anyhow::Result<WorkerGuard> {
    let log_file = &config.paths.log_file;
    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let file_name = log_file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("nocturne.log");

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_env("NOCTURNE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    Ok(guard)
}

/// Load the agent's env file if present, so API keys set there reach the
/// subprocess.
fn load_env(config: &Config) {
    let env_file = &config.paths.env_file;
    if env_file.exists() {
        match dotenvy::from_path(env_file) {
            Ok(()) => info!("Loaded environment from {}", env_file.display()),
            Err(e) => warn!("failed to load {}: {e}", env_file.display()),
        }
    } else {
        warn!("No env file at {}", env_file.display());
    }
}
