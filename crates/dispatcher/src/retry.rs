//! Retry policy for failed dispatch rounds

use std::time::Duration;

use contracts::RetrySettings;

/// How many rounds a dispatch may run and how long to wait between them
///
/// Round 1 is the initial submission of the whole batch; every later round
/// is a retry of the events that failed in the round before.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total rounds including the first (`None` = until every event succeeds)
    pub max_rounds: Option<u32>,
    /// Delay before the first retry round
    pub initial_backoff: Duration,
    /// Growth factor applied per further retry round
    pub multiplier: f64,
    /// Upper bound for any single delay
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Retry immediately and indefinitely until every event succeeds
    ///
    /// A handler that deterministically fails makes `dispatch` loop forever
    /// under this policy.
    pub fn unbounded() -> Self {
        Self {
            max_rounds: None,
            initial_backoff: Duration::ZERO,
            multiplier: 1.0,
            max_backoff: Duration::ZERO,
        }
    }

    /// At most `max_rounds` rounds, no delay between them
    pub fn bounded(max_rounds: u32) -> Self {
        Self {
            max_rounds: Some(max_rounds),
            ..Self::unbounded()
        }
    }

    /// Replace the backoff schedule
    pub fn with_backoff(mut self, initial: Duration, multiplier: f64, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.multiplier = multiplier;
        self.max_backoff = max;
        self
    }

    /// Whether round number `round` (1-based) may run
    pub fn allows_round(&self, round: u32) -> bool {
        self.max_rounds.is_none_or(|max| round <= max)
    }

    /// Delay before retry number `retry` (1 = the second round)
    ///
    /// `initial * multiplier^(retry - 1)`, capped at `max_backoff`.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        if retry == 0 || self.initial_backoff.is_zero() {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let nanos = self.initial_backoff.as_nanos() as f64 * self.multiplier.powi(exponent);
        let cap = self.max_backoff.max(self.initial_backoff);

        if !nanos.is_finite() || nanos >= cap.as_nanos() as f64 {
            cap
        } else {
            Duration::from_nanos(nanos as u64)
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_rounds: if settings.is_unbounded() {
                None
            } else {
                Some(settings.max_rounds)
            },
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            multiplier: settings.multiplier,
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
        }
    }
}
