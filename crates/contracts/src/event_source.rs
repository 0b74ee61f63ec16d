//! EventSource trait - poll loop input interface
//!
//! Abstracts where detection events come from: a mailbox, a mock generator,
//! or anything else that can produce a finite batch per poll.

use crate::{ContractError, DetectionEvent};

/// Detection event source
///
/// Each call to `poll_events` returns the events that arrived since the
/// previous call, in arrival order. An empty batch is a normal result.
#[trait_variant::make(EventSource: Send)]
pub trait LocalEventSource {
    /// Source name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Fetch the next batch of events
    ///
    /// # Errors
    /// Returns an error when the underlying source is unreachable. The caller
    /// is expected to log it and try again on the next poll.
    async fn poll_events(&mut self) -> Result<Vec<DetectionEvent>, ContractError>;
}
