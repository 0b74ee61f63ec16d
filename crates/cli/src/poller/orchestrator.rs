//! Poller - drives the poll → dispatch cycle.
//!
//! Every tick polls the event source once and, when the batch is not empty,
//! hands it to the batch dispatcher and waits for it to finish before the
//! next tick. A failed poll is logged and retried on the next tick.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use capture::FfmpegCaptureHandler;
use contracts::{EventSource, NotifierConfig};
use dispatcher::{BatchDispatcher, DispatchReport, DispatcherConfig};
use observability::DispatchSample;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::{NotifierHandler, NotifierSource, PollStats, SourceMode};

/// Poller configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Loaded notifier configuration
    pub notifier: NotifierConfig,

    /// Where events come from
    pub source_mode: SourceMode,

    /// Record clips (false = log events only)
    pub capture: bool,

    /// Maximum number of polls (None = until shutdown)
    pub max_polls: Option<u64>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main poll loop orchestrator
pub struct Poller {
    config: PollerConfig,
}

impl Poller {
    /// Create a new poller with the given configuration
    pub fn new(config: PollerConfig) -> Self {
        Self { config }
    }

    /// Run until `max_polls` is reached or `shutdown` resolves
    ///
    /// Shutdown is only observed between polls: a batch that is being
    /// dispatched is finished first.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<PollStats> {
        let start_time = Instant::now();
        let notifier = &self.config.notifier;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let mut source = NotifierSource::build(self.config.source_mode, notifier)
            .context("Failed to set up event source")?;
        let handler = Arc::new(self.build_handler()?);
        let dispatcher = BatchDispatcher::new(DispatcherConfig::from(&notifier.dispatch))
            .context("Failed to create dispatcher")?;

        info!(
            source = source.name(),
            max_workers = dispatcher.config().max_workers,
            max_rounds = ?dispatcher.config().retry.max_rounds,
            polling_secs = notifier.imap.polling_frequency_secs,
            "Poller running"
        );

        let mut stats = PollStats {
            source: source.name().to_string(),
            ..Default::default()
        };

        let mut interval =
            tokio::time::interval(Duration::from_secs(notifier.imap.polling_frequency_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping poller...");
                    break;
                }
                _ = interval.tick() => {}
            }

            self.poll_once(&mut source, &dispatcher, &handler, &mut stats)
                .await?;
            stats.polls += 1;

            if let Some(max) = self.config.max_polls {
                if stats.polls >= max {
                    info!(polls = stats.polls, "Reached max polls limit");
                    break;
                }
            }
        }

        stats.duration = start_time.elapsed();
        let dispatch_metrics = dispatcher.metrics().snapshot();
        info!(
            duration_secs = stats.duration.as_secs_f64(),
            rounds = dispatch_metrics.round_count,
            attempts = dispatch_metrics.attempt_count,
            panics = dispatch_metrics.panic_count,
            "Poller shutdown complete"
        );

        Ok(stats)
    }

    fn build_handler(&self) -> Result<NotifierHandler> {
        if !self.config.capture {
            warn!("Clip capture disabled, events will only be logged");
            return Ok(NotifierHandler::LogOnly);
        }

        let notifier = &self.config.notifier;
        let password = config_loader::resolve_secret(&notifier.dvr.password_env)
            .context("DVR password is not available")?;
        let handler = FfmpegCaptureHandler::from_config(notifier, password);
        info!(
            storage = %handler.settings().storage.display(),
            clip_secs = handler.settings().clip_length.as_secs(),
            "Clip capture enabled"
        );
        Ok(NotifierHandler::Ffmpeg(handler))
    }

    async fn poll_once(
        &self,
        source: &mut NotifierSource,
        dispatcher: &BatchDispatcher,
        handler: &Arc<NotifierHandler>,
        stats: &mut PollStats,
    ) -> Result<()> {
        let events = match source.poll_events().await {
            Ok(events) => events,
            Err(e) => {
                warn!(source = source.name(), error = %e, "Poll failed, retrying next tick");
                observability::record_poll_failure(source.name());
                stats.aggregator.record_poll_failure();
                return Ok(());
            }
        };

        observability::record_events_polled(source.name(), &events);
        stats.aggregator.record_poll(&events);
        if events.is_empty() {
            return Ok(());
        }

        let batch_size = events.len();
        let started = Instant::now();
        let report = dispatcher
            .dispatch(events, Arc::clone(handler))
            .await
            .context("Dispatch failed")?;

        let sample = dispatch_sample(batch_size, &report, started.elapsed());
        observability::record_dispatch(&sample);
        stats.aggregator.record_dispatch(&sample);

        if report.is_complete() {
            info!(
                events = batch_size,
                rounds = report.rounds,
                attempts = report.attempts,
                "All events captured"
            );
        } else {
            error!(
                events = batch_size,
                unresolved = report.unresolved.len(),
                rounds = report.rounds,
                "Some events could not be captured"
            );
        }
        Ok(())
    }
}

fn dispatch_sample(events: usize, report: &DispatchReport, elapsed: Duration) -> DispatchSample {
    DispatchSample {
        events,
        rounds: report.rounds,
        attempts: report.attempts,
        succeeded: report.succeeded,
        unresolved: report.unresolved.len(),
        elapsed_ms: elapsed.as_secs_f64() * 1000.0,
    }
}
