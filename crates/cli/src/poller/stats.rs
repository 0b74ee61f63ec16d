//! Poll loop statistics.

use std::time::Duration;

use observability::RunAggregator;

/// Statistics from a notifier run
#[derive(Debug, Clone, Default)]
pub struct PollStats {
    /// Polls completed (successful or not)
    pub polls: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Name of the event source
    pub source: String,

    /// Poll and dispatch aggregates
    pub aggregator: RunAggregator,
}

impl PollStats {
    /// Events captured per minute of run time
    pub fn captures_per_minute(&self) -> f64 {
        let minutes = self.duration.as_secs_f64() / 60.0;
        if minutes > 0.0 {
            self.aggregator.captured as f64 / minutes
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let summary = self.aggregator.summary();

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Notifier Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("Overview");
        println!("   ├─ Source: {}", self.source);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Polls: {} ({} failed)", self.polls, summary.poll_failures);
        println!("   └─ Events: {}", summary.events);

        if !summary.events_by_type.is_empty() {
            println!("\nEvents by type");
            for (event_type, count) in &summary.events_by_type {
                println!("   ├─ {event_type}: {count}");
            }
        }

        println!("\nCapture");
        println!("   ├─ Captured: {}", summary.captured);
        println!("   ├─ Unresolved: {}", summary.unresolved);
        println!("   ├─ Attempts: {}", summary.attempts);
        println!("   ├─ Captures/min: {:.2}", self.captures_per_minute());
        println!("   ├─ Rounds per dispatch: {}", summary.rounds);
        println!("   └─ Dispatch time (ms): {}", summary.dispatch_ms);

        println!();
    }
}
