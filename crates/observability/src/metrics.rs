//! Notifier metrics
//!
//! Prometheus counters for polling and dispatch, plus an in-memory
//! aggregator used for the end-of-run summary.

use std::collections::BTreeMap;

use contracts::DetectionEvent;
use metrics::{counter, gauge, histogram};

/// Outcome of one dispatched batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchSample {
    /// Events in the batch
    pub events: usize,
    /// Rounds the dispatcher ran
    pub rounds: u32,
    /// Handler invocations across all rounds
    pub attempts: u64,
    /// Events whose capture finally succeeded
    pub succeeded: usize,
    /// Events given up on after the last allowed round
    pub unresolved: usize,
    /// Wall-clock time of the whole dispatch
    pub elapsed_ms: f64,
}

/// Record a poll that returned `events`
pub fn record_events_polled(source: &str, events: &[DetectionEvent]) {
    counter!("cctv_notifier_polls_total", "source" => source.to_string()).increment(1);
    for event in events {
        counter!(
            "cctv_notifier_events_total",
            "source" => source.to_string(),
            "event_type" => event.event_type.as_str()
        )
        .increment(1);
    }
    gauge!("cctv_notifier_last_batch_size").set(events.len() as f64);
}

/// Record a poll that failed before producing events
pub fn record_poll_failure(source: &str) {
    counter!("cctv_notifier_poll_failures_total", "source" => source.to_string()).increment(1);
}

/// Record a finished dispatch
pub fn record_dispatch(sample: &DispatchSample) {
    counter!("cctv_notifier_dispatches_total").increment(1);
    counter!("cctv_notifier_capture_attempts_total").increment(sample.attempts);
    counter!("cctv_notifier_captures_succeeded_total").increment(sample.succeeded as u64);
    if sample.unresolved > 0 {
        counter!("cctv_notifier_captures_unresolved_total").increment(sample.unresolved as u64);
    }
    histogram!("cctv_notifier_dispatch_rounds").record(f64::from(sample.rounds));
    histogram!("cctv_notifier_dispatch_duration_ms").record(sample.elapsed_ms);
}

/// Run-wide aggregator
#[derive(Debug, Clone, Default)]
pub struct RunAggregator {
    pub polls: u64,
    pub poll_failures: u64,
    pub events: u64,
    pub captured: u64,
    pub unresolved: u64,
    pub attempts: u64,
    pub events_by_type: BTreeMap<&'static str, u64>,
    pub rounds: RunningStats,
    pub dispatch_ms: RunningStats,
}

impl RunAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_poll(&mut self, events: &[DetectionEvent]) {
        self.polls += 1;
        self.events += events.len() as u64;
        for event in events {
            *self.events_by_type.entry(event.event_type.as_str()).or_insert(0) += 1;
        }
    }

    pub fn record_poll_failure(&mut self) {
        self.polls += 1;
        self.poll_failures += 1;
    }

    pub fn record_dispatch(&mut self, sample: &DispatchSample) {
        self.captured += sample.succeeded as u64;
        self.unresolved += sample.unresolved as u64;
        self.attempts += sample.attempts;
        self.rounds.push(f64::from(sample.rounds));
        self.dispatch_ms.push(sample.elapsed_ms);
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            polls: self.polls,
            poll_failures: self.poll_failures,
            events: self.events,
            captured: self.captured,
            unresolved: self.unresolved,
            attempts: self.attempts,
            events_by_type: self.events_by_type.clone(),
            rounds: StatsSummary::from(&self.rounds),
            dispatch_ms: StatsSummary::from(&self.dispatch_ms),
        }
    }
}

/// Run summary
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub polls: u64,
    pub poll_failures: u64,
    pub events: u64,
    pub captured: u64,
    pub unresolved: u64,
    pub attempts: u64,
    pub events_by_type: BTreeMap<&'static str, u64>,
    pub rounds: StatsSummary,
    pub dispatch_ms: StatsSummary,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Run Summary ===")?;
        writeln!(
            f,
            "Polls: {} ({} failed)",
            self.polls, self.poll_failures
        )?;
        writeln!(f, "Events: {}", self.events)?;
        for (event_type, count) in &self.events_by_type {
            writeln!(f, "  {event_type}: {count}")?;
        }
        writeln!(
            f,
            "Captured: {}, unresolved: {}, attempts: {}",
            self.captured, self.unresolved, self.attempts
        )?;
        writeln!(f, "Rounds per dispatch: {}", self.rounds)?;
        writeln!(f, "Dispatch time (ms): {}", self.dispatch_ms)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
