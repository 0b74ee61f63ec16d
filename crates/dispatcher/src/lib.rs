//! # Dispatcher
//!
//! Batch capture dispatch module.
//!
//! Responsibilities:
//! - Fan a batch of `DetectionEvent`s out over a fixed-size worker pool
//! - Isolate each handler invocation in its own task
//! - Retry only the failed subset, round after round, under a `RetryPolicy`

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod retry;

pub use contracts::{CaptureHandler, DetectionEvent};
pub use dispatcher::{
    dispatch, retry_subsequence, BatchDispatcher, DispatchReport, DispatcherConfig,
};
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use pool::WorkerPool;
pub use retry::RetryPolicy;
