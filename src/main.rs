mod commands;
mod config;
mod git;
mod graph;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "worklog")]
#[command(about = "Publish a sanitized daily work log from your calendar and completed tasks")]
struct Cli {
    /// Config file (defaults to ./worklog.toml, then the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect, sanitize and commit the day's log
    Sync {
        /// Target date in the configured zone (defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Print the day's log without committing it
    Preview {
        /// Target date in the configured zone (defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Validate configuration and show the effective settings
    Check,
    /// Write a starter config file
    Init,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Sync { date } => commands::sync::run(config_path, date).await,
        Commands::Preview { date } => commands::preview::run(config_path, date).await,
        Commands::Check => commands::check::run(config_path),
        Commands::Init => commands::init::run(config_path),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}
