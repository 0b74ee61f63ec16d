//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by a dispatcher and its worker pools
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Rounds executed
    round_count: AtomicU64,
    /// Handler invocations
    attempt_count: AtomicU64,
    /// Invocations that returned true
    success_count: AtomicU64,
    /// Invocations that returned false or panicked
    failure_count: AtomicU64,
    /// Invocations that panicked
    panic_count: AtomicU64,
    /// Events given up on after the retry bound
    unresolved_count: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn round_count(&self) -> u64 {
        self.round_count.load(Ordering::Relaxed)
    }

    pub fn inc_round_count(&self) {
        self.round_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn attempt_count(&self) -> u64 {
        self.attempt_count.load(Ordering::Relaxed)
    }

    /// Record the outcome of one handler invocation
    pub fn record_attempt(&self, success: bool) {
        self.attempt_count.fetch_add(1, Ordering::Relaxed);
        if success {
            self.success_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn panic_count(&self) -> u64 {
        self.panic_count.load(Ordering::Relaxed)
    }

    pub fn inc_panic_count(&self) {
        self.panic_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn unresolved_count(&self) -> u64 {
        self.unresolved_count.load(Ordering::Relaxed)
    }

    pub fn add_unresolved(&self, count: usize) {
        self.unresolved_count
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            round_count: self.round_count(),
            attempt_count: self.attempt_count(),
            success_count: self.success_count(),
            failure_count: self.failure_count(),
            panic_count: self.panic_count(),
            unresolved_count: self.unresolved_count(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub round_count: u64,
    pub attempt_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub panic_count: u64,
    pub unresolved_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_attempt_splits_outcomes() {
        let metrics = DispatchMetrics::new();
        metrics.record_attempt(true);
        metrics.record_attempt(false);
        metrics.record_attempt(true);
        metrics.inc_panic_count();

        let snap = metrics.snapshot();
        assert_eq!(snap.attempt_count, 3);
        assert_eq!(snap.success_count, 2);
        assert_eq!(snap.failure_count, 1);
        assert_eq!(snap.panic_count, 1);
    }
}
