//! Orderdeck CLI - run and inspect sync runs.
//!
//! # Usage
//!
//! ```bash
//! # Run one sync across all platforms
//! odk sync
//!
//! # Use a specific config document
//! odk --config /etc/orderdeck/config.json sync
//!
//! # Show credential expiry and watermark state
//! odk status
//! ```
//!
//! # Configuration
//!
//! The config document path is taken from `--config`, then the
//! `ORDERDECK_CONFIG` environment variable, then `./config.json`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "odk")]
#[command(author, version, about = "Orderdeck sync tools")]
struct Cli {
    /// Path to the config document (default: $ORDERDECK_CONFIG or ./config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync across all platforms
    Sync,
    /// Show credential expiry and watermark state
    Status,
}

#[tokio::main]
async fn main() {
    // Load .env if present, then initialize tracing
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = cli
        .config
        .or_else(|| std::env::var_os("ORDERDECK_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.json"));

    match cli.command {
        Commands::Sync => commands::sync::run(&config_path).await?,
        Commands::Status => commands::status::run(&config_path)?,
    }
    Ok(())
}
