//! CaptureHandler trait - dispatcher work interface
//!
//! Defines the unit of work the dispatcher runs once per event per round.

use crate::DetectionEvent;

/// Per-event work handler
///
/// Implementations perform the real work for one event (e.g. recording a
/// clip) and report success. The dispatcher may call `handle` again for the
/// same event after a failed attempt, so implementations must tolerate being
/// re-run over their own partial output.
#[trait_variant::make(CaptureHandler: Send)]
pub trait LocalCaptureHandler {
    /// Handle one event
    ///
    /// Returns `true` on success. Failures are reported as `false`, never as
    /// a panic; a panic is still contained by the dispatcher and counted as a
    /// failed attempt.
    async fn handle(&self, event: &DetectionEvent) -> bool;
}

/// Adapter turning a plain closure into a [`CaptureHandler`]
#[derive(Debug, Clone)]
pub struct HandlerFn<F>(F);

/// Wrap a synchronous `Fn(&DetectionEvent) -> bool` as a handler
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&DetectionEvent) -> bool + Send + Sync,
{
    HandlerFn(f)
}

impl<F> CaptureHandler for HandlerFn<F>
where
    F: Fn(&DetectionEvent) -> bool + Send + Sync,
{
    async fn handle(&self, event: &DetectionEvent) -> bool {
        (self.0)(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventType;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_handler_fn_forwards_result() {
        let event = DetectionEvent::new(
            EventType::Motion,
            vec![1],
            NaiveDate::from_ymd_opt(2022, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        );

        let only_motion = handler_fn(|e: &DetectionEvent| e.event_type == EventType::Motion);
        assert!(CaptureHandler::handle(&only_motion, &event).await);

        let never = handler_fn(|_: &DetectionEvent| false);
        assert!(!CaptureHandler::handle(&never, &event).await);
    }
}
