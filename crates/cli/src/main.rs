//! # CCTV Notifier CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Poll loop orchestration and lifecycle management
//! - Graceful shutdown handling

mod cli;
mod commands;
mod poller;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_notifier, run_parse, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "CCTV Notifier starting");

    let result = match &cli.command {
        Commands::Run(args) => run_notifier(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Parse(args) => run_parse(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(logging_config(cli))
}

/// Map verbosity and format flags onto the observability settings
///
/// `--quiet` pins the level to `warn` regardless of `RUST_LOG`. Metrics are
/// installed separately by the poller.
fn logging_config(cli: &Cli) -> ObservabilityConfig {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    ObservabilityConfig {
        log_format: cli.log_format,
        metrics_port: None,
        default_log_level: default_log_level.to_string(),
        ignore_env_filter: cli.quiet,
    }
}
