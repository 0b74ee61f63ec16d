//! BatchDispatcher - runs a batch through the worker pool until it succeeds

use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use contracts::{CaptureHandler, DetectionEvent, DispatchSettings};

use crate::error::DispatcherError;
use crate::metrics::DispatchMetrics;
use crate::pool::WorkerPool;
use crate::retry::RetryPolicy;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Worker pool size (>= 1)
    pub max_workers: usize,
    /// When to stop retrying failed events
    pub retry: RetryPolicy,
}

impl From<&DispatchSettings> for DispatcherConfig {
    fn from(settings: &DispatchSettings) -> Self {
        Self {
            max_workers: settings.max_workers,
            retry: RetryPolicy::from(&settings.retry),
        }
    }
}

/// Outcome of one `dispatch` call
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// Rounds executed (0 for an empty batch)
    pub rounds: u32,
    /// Handler invocations across all rounds
    pub attempts: u64,
    /// Events whose last attempt succeeded
    pub succeeded: usize,
    /// Events still failing when the retry bound was reached, in batch order
    pub unresolved: Vec<DetectionEvent>,
    /// Status vector of every round, each aligned to that round's submissions
    pub round_statuses: Vec<Vec<bool>>,
}

impl DispatchReport {
    /// Whether every event ended with a successful attempt
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Batch capture dispatcher
///
/// Each `dispatch` call builds a fresh worker pool, runs the whole batch
/// once, then keeps resubmitting only the events that failed until none are
/// left or the retry policy says stop. The pool is joined before returning.
pub struct BatchDispatcher {
    config: DispatcherConfig,
    metrics: Arc<DispatchMetrics>,
}

impl BatchDispatcher {
    /// Create a dispatcher
    ///
    /// # Errors
    /// `InvalidWorkerCount` when `max_workers` is 0.
    pub fn new(config: DispatcherConfig) -> Result<Self, DispatcherError> {
        if config.max_workers == 0 {
            return Err(DispatcherError::InvalidWorkerCount(config.max_workers));
        }
        Ok(Self {
            config,
            metrics: Arc::new(DispatchMetrics::new()),
        })
    }

    /// Get dispatcher configuration
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Get cumulative metrics across every dispatch
    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Run `handler` over `events` until each succeeded or retries run out
    ///
    /// Individual failures and handler panics never surface as errors; they
    /// are retried, and reported in [`DispatchReport::unresolved`] once the
    /// policy's round limit is hit. With [`RetryPolicy::unbounded`] this only
    /// returns once every event succeeded.
    ///
    /// # Errors
    /// Pool-level failures only (`PoolClosed`).
    #[instrument(
        name = "batch_dispatch",
        skip_all,
        fields(events = events.len(), max_workers = self.config.max_workers)
    )]
    pub async fn dispatch<H>(
        &self,
        events: Vec<DetectionEvent>,
        handler: Arc<H>,
    ) -> Result<DispatchReport, DispatcherError>
    where
        H: CaptureHandler + Sync + 'static,
    {
        let mut report = DispatchReport::default();
        if events.is_empty() {
            debug!("Empty batch, nothing to dispatch");
            return Ok(report);
        }

        let pool = WorkerPool::spawn(self.config.max_workers, handler, Arc::clone(&self.metrics))?;
        let result = self.run_rounds(&pool, events, &mut report).await;
        pool.shutdown().await;

        result.map(|()| report)
    }

    async fn run_rounds(
        &self,
        pool: &WorkerPool,
        events: Vec<DetectionEvent>,
        report: &mut DispatchReport,
    ) -> Result<(), DispatcherError> {
        let total = events.len();
        let mut pending: Vec<Arc<DetectionEvent>> = events.into_iter().map(Arc::new).collect();

        loop {
            let round = report.rounds + 1;
            if round > 1 {
                let delay = self.config.retry.backoff_for(round - 1);
                if !delay.is_zero() {
                    debug!(round, delay_ms = delay.as_millis() as u64, "Backing off before retry");
                    tokio::time::sleep(delay).await;
                }
            }

            let statuses = pool.run_round(&pending).await?;
            self.metrics.inc_round_count();
            report.rounds = round;
            report.attempts += pending.len() as u64;

            let failed = retry_subsequence(&pending, &statuses);
            info!(
                round,
                submitted = pending.len(),
                failed = failed.len(),
                "Dispatch round complete"
            );
            report.round_statuses.push(statuses);

            if failed.is_empty() {
                break;
            }

            if !self.config.retry.allows_round(round + 1) {
                self.metrics.add_unresolved(failed.len());
                for event in &failed {
                    error!(event = %event, rounds = round, "Giving up on event after retry limit");
                }
                report.unresolved = failed.iter().map(|e| DetectionEvent::clone(e)).collect();
                break;
            }

            pending = failed;
        }

        report.succeeded = total - report.unresolved.len();
        Ok(())
    }
}

/// Items whose status is `false`, keeping their relative order
///
/// `statuses[i]` is the result for `items[i]`.
pub fn retry_subsequence<T: Clone>(items: &[T], statuses: &[bool]) -> Vec<T> {
    debug_assert_eq!(items.len(), statuses.len());
    items
        .iter()
        .zip(statuses)
        .filter(|(_, &ok)| !ok)
        .map(|(item, _)| item.clone())
        .collect()
}

/// Dispatch `events` with `max_workers` workers, retrying until all succeed
///
/// Convenience wrapper using [`RetryPolicy::unbounded`]: there is no retry
/// limit and no delay, so a handler that never succeeds for some event keeps
/// this future pending forever. Prefer [`BatchDispatcher`] with a bounded
/// policy in long-running services.
pub async fn dispatch<H>(
    events: Vec<DetectionEvent>,
    handler: Arc<H>,
    max_workers: usize,
) -> Result<DispatchReport, DispatcherError>
where
    H: CaptureHandler + Sync + 'static,
{
    let dispatcher = BatchDispatcher::new(DispatcherConfig {
        max_workers,
        retry: RetryPolicy::unbounded(),
    })?;
    dispatcher.dispatch(events, handler).await
}
