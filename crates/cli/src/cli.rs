//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use observability::LogFormat;
use std::path::PathBuf;

/// CCTV Notifier - records DVR clips for CCTV alert emails
#[derive(Parser, Debug)]
#[command(
    name = "cctv-notifier",
    author,
    version,
    about = "Record CCTV clips for DVR alert emails",
    long_about = "Polls an inbox for DVR alert emails, parses the detection events they \n\
                  describe, and records a clip of every camera involved from the DVR's \n\
                  RTSP playback stream. Failed captures are retried in rounds."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CCTV_NOTIFIER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        default_value_t = LogFormat::Pretty,
        global = true,
        env = "CCTV_NOTIFIER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll for alerts and capture clips
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Parse a single alert email body and print the event
    Parse(ParseArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "CCTV_NOTIFIER_CONFIG"
    )]
    pub config: PathBuf,

    /// Poll once, dispatch the batch, and exit
    #[arg(long, conflicts_with = "max_polls")]
    pub once: bool,

    /// Maximum number of polls before exiting (0 = unlimited)
    #[arg(long, default_value = "0", env = "CCTV_NOTIFIER_MAX_POLLS")]
    pub max_polls: u64,

    /// Generate random events instead of reading the inbox
    #[arg(long)]
    pub mock: bool,

    /// Log events instead of recording clips
    #[arg(long)]
    pub no_capture: bool,

    /// Override the number of capture workers from configuration
    #[arg(long, env = "CCTV_NOTIFIER_MAX_WORKERS")]
    pub max_workers: Option<usize>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "CCTV_NOTIFIER_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without polling
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `parse` command
#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// File holding the plain-text email body (`-` for stdin)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Output the event as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from([
            "cctv-notifier",
            "run",
            "--config",
            "notifier.toml",
            "--once",
            "--mock",
            "--max-workers",
            "2",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.once);
        assert!(args.mock);
        assert_eq!(args.max_workers, Some(2));
        assert_eq!(args.config, PathBuf::from("notifier.toml"));
    }

    #[test]
    fn test_log_format_flag() {
        let cli = Cli::parse_from([
            "cctv-notifier",
            "--log-format",
            "json",
            "validate",
            "-c",
            "a.toml",
        ]);
        assert_eq!(cli.log_format, LogFormat::Json);

        let cli = Cli::parse_from(["cctv-notifier", "validate", "-c", "a.toml"]);
        assert_eq!(cli.log_format, LogFormat::Pretty);

        let result = Cli::try_parse_from(["cctv-notifier", "--log-format", "xml", "validate"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_once_conflicts_with_max_polls() {
        let result = Cli::try_parse_from(["cctv-notifier", "run", "--once", "--max-polls", "3"]);
        assert!(result.is_err());
    }
}
