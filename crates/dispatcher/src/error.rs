//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-level errors
///
/// Per-event failures never show up here; they are absorbed by the retry
/// loop. Only pool-level failures abort a dispatch.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Worker pool cannot be built with this size
    #[error("invalid worker count {0}: max_workers must be >= 1")]
    InvalidWorkerCount(usize),

    /// Worker pool stopped before a round completed
    #[error("worker pool closed with {missing} of {submitted} results outstanding")]
    PoolClosed { submitted: usize, missing: usize },
}

impl DispatcherError {
    /// Create a pool closed error
    pub fn pool_closed(submitted: usize, missing: usize) -> Self {
        Self::PoolClosed { submitted, missing }
    }
}
