//! Random event generator
//!
//! Stands in for a real inbox when exercising the poll loop and the capture
//! pipeline: every poll yields between 0 and 10 events with random type,
//! up to 5 camera ids in `0..=5`, and a timestamp in January 2022.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use contracts::{ContractError, DetectionEvent, EventSource, EventType};

const MAX_EVENTS_PER_POLL: usize = 10;
const MAX_CAMERAS_PER_EVENT: usize = 5;
const MAX_CAMERA_ID: u32 = 5;

/// Event source producing random detection events
pub struct MockEventSource {
    rng: StdRng,
}

impl MockEventSource {
    /// Seeded from the OS
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic sequence for tests
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate one batch
    pub fn generate(&mut self) -> Vec<DetectionEvent> {
        let count = self.rng.random_range(0..=MAX_EVENTS_PER_POLL);
        (0..count).map(|_| self.random_event()).collect()
    }

    fn random_event(&mut self) -> DetectionEvent {
        let event_type = EventType::ALL[self.rng.random_range(0..EventType::ALL.len())];

        let camera_count = self.rng.random_range(0..=MAX_CAMERAS_PER_EVENT);
        let camera_ids = (0..camera_count)
            .map(|_| self.rng.random_range(0..=MAX_CAMERA_ID))
            .collect();

        let occurred_at = NaiveDate::from_ymd_opt(2022, 1, self.rng.random_range(1..=31))
            .and_then(|day| {
                day.and_hms_opt(
                    self.rng.random_range(0..24),
                    self.rng.random_range(0..60),
                    self.rng.random_range(0..60),
                )
            })
            .unwrap_or_default();

        DetectionEvent::new(event_type, camera_ids, occurred_at)
    }
}

impl Default for MockEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for MockEventSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn poll_events(&mut self) -> Result<Vec<DetectionEvent>, ContractError> {
        let events = self.generate();
        debug!(count = events.len(), "Generated mock events");
        Ok(events)
    }
}
