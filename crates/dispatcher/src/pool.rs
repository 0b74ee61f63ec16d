//! WorkerPool - bounded set of workers over a shared job queue

use std::sync::Arc;

use async_channel::{Receiver, Sender};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, trace, warn};

use contracts::{CaptureHandler, DetectionEvent};

use crate::error::DispatcherError;
use crate::metrics::DispatchMetrics;

/// One unit of work: the event at `index` of the current round
struct Job {
    index: usize,
    event: Arc<DetectionEvent>,
    reply: mpsc::UnboundedSender<(usize, bool)>,
}

/// Fixed-size worker pool
///
/// `size` workers pull jobs from one queue, so at most `size` handler
/// invocations are in flight at any instant. Every invocation runs in its own
/// task; a panicking handler is reported as a failed attempt and the worker
/// moves on to the next job.
pub struct WorkerPool {
    size: usize,
    job_tx: Sender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers running `handler`
    ///
    /// # Errors
    /// `InvalidWorkerCount` when `size` is 0.
    pub fn spawn<H>(
        size: usize,
        handler: Arc<H>,
        metrics: Arc<DispatchMetrics>,
    ) -> Result<Self, DispatcherError>
    where
        H: CaptureHandler + Sync + 'static,
    {
        if size == 0 {
            return Err(DispatcherError::InvalidWorkerCount(size));
        }

        let (job_tx, job_rx) = async_channel::bounded(size);

        let workers = (0..size)
            .map(|worker_id| {
                let job_rx = job_rx.clone();
                let handler = Arc::clone(&handler);
                let metrics = Arc::clone(&metrics);
                tokio::spawn(async move {
                    worker_loop(worker_id, job_rx, handler, metrics).await;
                })
            })
            .collect();

        debug!(workers = size, "Worker pool started");

        Ok(Self {
            size,
            job_tx,
            workers,
        })
    }

    /// Number of workers
    pub fn size(&self) -> usize {
        self.size
    }

    /// Run one round over `events` and collect their results
    ///
    /// The returned status vector is aligned with `events`, whatever order
    /// the workers finished in.
    ///
    /// # Errors
    /// `PoolClosed` if the workers stopped before every result came back.
    #[instrument(name = "worker_pool_run_round", skip_all, fields(jobs = events.len()))]
    pub async fn run_round(
        &self,
        events: &[Arc<DetectionEvent>],
    ) -> Result<Vec<bool>, DispatcherError> {
        let submitted = events.len();
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();

        for (index, event) in events.iter().enumerate() {
            let job = Job {
                index,
                event: Arc::clone(event),
                reply: reply_tx.clone(),
            };
            if self.job_tx.send(job).await.is_err() {
                return Err(DispatcherError::pool_closed(submitted, submitted - index));
            }
        }
        // Workers hold the remaining senders; the loop below ends once all jobs replied.
        drop(reply_tx);

        let mut statuses: Vec<Option<bool>> = vec![None; submitted];
        while let Some((index, success)) = reply_rx.recv().await {
            statuses[index] = Some(success);
        }

        let missing = statuses.iter().filter(|s| s.is_none()).count();
        if missing > 0 {
            return Err(DispatcherError::pool_closed(submitted, missing));
        }

        Ok(statuses.into_iter().flatten().collect())
    }

    /// Close the queue and join every worker
    #[instrument(name = "worker_pool_shutdown", skip(self), fields(workers = self.size))]
    pub async fn shutdown(self) {
        self.job_tx.close();
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!(error = ?e, "Worker task failed");
            }
        }
        debug!("Worker pool shutdown complete");
    }
}

/// Worker task: take a job, run the handler in an isolated task, report
async fn worker_loop<H>(
    worker_id: usize,
    job_rx: Receiver<Job>,
    handler: Arc<H>,
    metrics: Arc<DispatchMetrics>,
) where
    H: CaptureHandler + Sync + 'static,
{
    trace!(worker_id, "Worker started");

    while let Ok(job) = job_rx.recv().await {
        let invocation = {
            let handler = Arc::clone(&handler);
            let event = Arc::clone(&job.event);
            tokio::spawn(async move { handler.handle(&event).await })
        };

        let success = match invocation.await {
            Ok(success) => success,
            Err(e) if e.is_panic() => {
                metrics.inc_panic_count();
                warn!(
                    worker_id,
                    event = %job.event,
                    "Handler panicked, counting attempt as failed"
                );
                false
            }
            Err(e) => {
                warn!(worker_id, event = %job.event, error = %e, "Handler task cancelled");
                false
            }
        };

        metrics.record_attempt(success);

        // The round may have been abandoned; nothing to report to then.
        let _ = job.reply.send((job.index, success));
    }

    trace!(worker_id, "Worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::{handler_fn, EventType};
    use std::time::Duration;

    fn event(camera: u32) -> Arc<DetectionEvent> {
        Arc::new(DetectionEvent::new(
            EventType::Motion,
            vec![camera],
            NaiveDate::from_ymd_opt(2022, 1, 15)
                .unwrap()
                .and_hms_opt(19, 30, 0)
                .unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_zero_workers_rejected() {
        let handler = Arc::new(handler_fn(|_: &DetectionEvent| true));
        let result = WorkerPool::spawn(0, handler, Arc::new(DispatchMetrics::new()));
        assert!(matches!(result, Err(DispatcherError::InvalidWorkerCount(0))));
    }

    #[tokio::test]
    async fn test_round_statuses_follow_submission_order() {
        let handler = Arc::new(handler_fn(|e: &DetectionEvent| e.camera_ids[0] % 2 == 0));
        let pool = WorkerPool::spawn(3, handler, Arc::new(DispatchMetrics::new())).unwrap();

        let events: Vec<_> = (0..7).map(event).collect();
        let statuses = pool.run_round(&events).await.unwrap();
        assert_eq!(
            statuses,
            vec![true, false, true, false, true, false, true]
        );

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_pool_is_reusable_across_rounds() {
        let metrics = Arc::new(DispatchMetrics::new());
        let handler = Arc::new(handler_fn(|_: &DetectionEvent| true));
        let pool = WorkerPool::spawn(2, handler, Arc::clone(&metrics)).unwrap();

        let events: Vec<_> = (0..4).map(event).collect();
        assert_eq!(pool.run_round(&events).await.unwrap(), vec![true; 4]);
        assert_eq!(pool.run_round(&events[..1]).await.unwrap(), vec![true]);
        assert!(pool.run_round(&[]).await.unwrap().is_empty());

        pool.shutdown().await;
        assert_eq!(metrics.attempt_count(), 5);
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let metrics = Arc::new(DispatchMetrics::new());
        let handler = Arc::new(handler_fn(|e: &DetectionEvent| {
            if e.camera_ids[0] == 1 {
                panic!("capture blew up");
            }
            true
        }));
        let pool = WorkerPool::spawn(2, handler, Arc::clone(&metrics)).unwrap();

        let events: Vec<_> = (0..3).map(event).collect();
        let statuses = pool.run_round(&events).await.unwrap();
        assert_eq!(statuses, vec![true, false, true]);
        assert_eq!(metrics.panic_count(), 1);

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_round_on_stopped_workers_is_pool_closed() {
        let handler = Arc::new(handler_fn(|_: &DetectionEvent| true));
        let mut pool = WorkerPool::spawn(2, handler, Arc::new(DispatchMetrics::new())).unwrap();

        for worker in std::mem::take(&mut pool.workers) {
            worker.abort();
            let _ = worker.await;
        }

        let events: Vec<_> = (0..3).map(event).collect();
        let result = pool.run_round(&events).await;
        assert!(matches!(
            result,
            Err(DispatcherError::PoolClosed {
                submitted: 3,
                missing: 3
            })
        ));
    }

    /// Hangs on camera 1, answers immediately otherwise
    struct HangingHandler;

    impl CaptureHandler for HangingHandler {
        async fn handle(&self, event: &DetectionEvent) -> bool {
            if event.camera_ids[0] == 1 {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            true
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_lost_mid_round_is_pool_closed() {
        let pool =
            WorkerPool::spawn(1, Arc::new(HangingHandler), Arc::new(DispatchMetrics::new()))
                .unwrap();
        let events: Vec<_> = (0..2).map(event).collect();

        let stop_workers = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            for worker in &pool.workers {
                worker.abort();
            }
        };
        let (result, ()) = tokio::join!(pool.run_round(&events), stop_workers);

        assert!(matches!(
            result,
            Err(DispatcherError::PoolClosed {
                submitted: 2,
                missing: 1
            })
        ));
    }
}
