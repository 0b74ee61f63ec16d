//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::RunArgs;
use crate::poller::{Poller, PollerConfig, SourceMode};

/// Execute the `run` command
pub async fn run_notifier(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(max_workers) = args.max_workers {
        if max_workers == 0 {
            anyhow::bail!("--max-workers must be >= 1");
        }
        info!(max_workers, "Overriding worker count from CLI");
        config.dispatch.max_workers = max_workers;
    }

    info!(
        server = %config.imap.server,
        mailbox = %config.imap.mailbox,
        dvr = %config.dvr.host,
        max_workers = config.dispatch.max_workers,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let poller_config = PollerConfig {
        notifier: config,
        source_mode: if args.mock {
            SourceMode::Mock
        } else {
            SourceMode::Mailbox
        },
        capture: !args.no_capture,
        max_polls: if args.once {
            Some(1)
        } else if args.max_polls == 0 {
            None
        } else {
            Some(args.max_polls)
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    info!("Starting poller...");

    let stats = Poller::new(poller_config)
        .run(shutdown_signal())
        .await
        .context("Poller failed")?;

    info!(
        polls = stats.polls,
        duration_secs = stats.duration.as_secs_f64(),
        "Poller finished"
    );
    stats.print_summary();

    info!("CCTV Notifier finished");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::NotifierConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Inbox:");
    println!(
        "  {}@{}:{} / {}",
        config.imap.username, config.imap.server, config.imap.port, config.imap.mailbox
    );
    println!("  Poll every: {}s", config.imap.polling_frequency_secs);
    match config.imap.processed_folder_path(mailbox::source::FOLDER_DELIMITER) {
        Some(folder) => println!("  Processed folder: {folder}"),
        None => println!("  Processed folder: (none)"),
    }

    println!("\nAlerts:");
    println!("  Sender: {}", config.cctv_alerts.email_sender);
    if !config.cctv_alerts.email_subject_filter.is_empty() {
        println!("  Subject: {}", config.cctv_alerts.email_subject_filter);
    }

    println!("\nDVR:");
    println!("  {}@{}:{}", config.dvr.username, config.dvr.host, config.dvr.rtsp_port);

    println!("\nCapture:");
    println!("  Storage: {}", config.stream_capture.storage_location);
    println!("  Clip length: {}s", config.stream_capture.detection_clip_length_secs);

    let retry = &config.dispatch.retry;
    println!("\nDispatch:");
    println!("  Workers: {}", config.dispatch.max_workers);
    if retry.is_unbounded() {
        println!("  Rounds: unbounded");
    } else {
        println!("  Rounds: {}", retry.max_rounds);
    }
    println!(
        "  Backoff: {}ms x{} (max {}ms)",
        retry.initial_backoff_ms, retry.multiplier, retry.max_backoff_ms
    );

    println!();
}
