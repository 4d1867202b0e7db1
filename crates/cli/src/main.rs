//! lazyw - drive a debounce scheduler from the command line

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

/// lazyw - Debounced delayed-task scheduler
#[derive(Parser)]
#[command(name = "lazyw")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scheduler configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resubmit tasks in bursts and report how often each one fired
    Burst {
        /// Number of independent tasks
        #[arg(long, default_value = "4")]
        keys: usize,
        /// Submissions per task
        #[arg(long, default_value = "10")]
        bursts: usize,
        /// Pause between submission rounds in milliseconds
        #[arg(long, default_value = "20")]
        interval_ms: u64,
        /// Debounce delay in milliseconds
        #[arg(long, default_value = "200")]
        delay_ms: u64,
    },
    /// Print the effective scheduler configuration
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cmd::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Burst { keys, bursts, interval_ms, delay_ms } => {
            cmd::burst::run(config, keys, bursts, interval_ms, delay_ms)
        }
        Commands::Config => cmd::config::run(&config),
    }
}
