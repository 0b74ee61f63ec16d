//! Poll loop orchestration module.

mod handler;
mod orchestrator;
mod source;
mod stats;

pub use handler::NotifierHandler;
pub use orchestrator::{Poller, PollerConfig};
pub use source::{NotifierSource, SourceMode};
pub use stats::PollStats;
